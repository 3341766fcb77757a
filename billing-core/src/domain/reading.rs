use std::collections::BTreeMap;

use time::Date;

use crate::domain::BillingMonth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Utility {
    Electric,
    Water,
}

impl Utility {
    pub const ALL: [Utility; 2] = [Utility::Electric, Utility::Water];

    /// Field name used for this utility in stored readings.
    pub fn key(&self) -> &'static str {
        match self {
            Utility::Electric => "electric",
            Utility::Water => "water",
        }
    }
}

/// Cumulative counter values recorded for one date.
///
/// Electric is in kWh, water in m³. Either may be missing for a given date.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeterReading {
    pub electric: Option<f64>,
    pub water: Option<f64>,
}

impl MeterReading {
    pub fn new(electric: Option<f64>, water: Option<f64>) -> Self {
        Self { electric, water }
    }

    pub fn value(&self, utility: Utility) -> Option<f64> {
        match utility {
            Utility::Electric => self.electric,
            Utility::Water => self.water,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.electric.is_none() && self.water.is_none()
    }
}

/// A reading captured for one room on one date, as delivered by exports.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomReading {
    pub room_id: String,
    pub date: Date,
    pub reading: MeterReading,
}

impl RoomReading {
    /// `YYYY-MM-DD` key used by [`ReadingHistory`].
    pub fn date_key(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}",
            self.date.year(),
            u8::from(self.date.month()),
            self.date.day()
        )
    }
}

/// Per-room series of readings keyed by `YYYY-MM-DD` date strings.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ReadingHistory {
    entries: BTreeMap<String, MeterReading>,
}

impl ReadingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date_key: impl Into<String>, reading: MeterReading) {
        self.entries.insert(date_key.into(), reading);
    }

    /// Merge a reading into the entry for `date_key`.
    ///
    /// Present values overwrite, absent values keep whatever was there.
    pub fn merge(&mut self, date_key: impl Into<String>, reading: MeterReading) {
        let slot = self.entries.entry(date_key.into()).or_default();
        if reading.electric.is_some() {
            slot.electric = reading.electric;
        }
        if reading.water.is_some() {
            slot.water = reading.water;
        }
    }

    pub fn get(&self, date_key: &str) -> Option<&MeterReading> {
        self.entries.get(date_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MeterReading)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Values of `utility` dated inside `month`, in date-key order.
    pub fn values_in(&self, month: BillingMonth, utility: Utility) -> impl Iterator<Item = f64> + '_ {
        self.entries
            .iter()
            .filter(move |(k, _)| month.contains_key(k))
            .filter_map(move |(_, r)| r.value(utility))
    }
}

impl<K: Into<String>> FromIterator<(K, MeterReading)> for ReadingHistory {
    fn from_iter<I: IntoIterator<Item = (K, MeterReading)>>(iter: I) -> Self {
        let mut history = ReadingHistory::new();
        for (k, r) in iter {
            history.insert(k, r);
        }
        history
    }
}
