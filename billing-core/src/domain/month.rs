use std::{fmt, str::FromStr};

use time::{Date, Month};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MonthParseError {
    #[error("billing month must look like YYYY-MM, got '{0}'")]
    Format(String),
    #[error("month number out of range in '{0}'")]
    MonthRange(String),
}

/// A calendar billing month, rendered as `YYYY-MM`.
///
/// The rendering doubles as the prefix that selects `YYYY-MM-DD` date keys
/// belonging to the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BillingMonth {
    year: i32,
    month: Month,
}

impl BillingMonth {
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: Date) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    /// The calendar month immediately before this one.
    pub fn previous(&self) -> Self {
        match self.month {
            Month::January => Self::new(self.year - 1, Month::December),
            m => Self::new(self.year, m.previous()),
        }
    }

    pub fn next(&self) -> Self {
        match self.month {
            Month::December => Self::new(self.year + 1, Month::January),
            m => Self::new(self.year, m.next()),
        }
    }

    /// True when `date_key` falls inside this month by prefix.
    pub fn contains_key(&self, date_key: &str) -> bool {
        date_key.starts_with(&self.to_string())
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

impl FromStr for BillingMonth {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year_str, month_str) = s
            .split_once('-')
            .ok_or_else(|| MonthParseError::Format(s.to_string()))?;

        let all_digits = |p: &str, len: usize| p.len() == len && p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(year_str, 4) || !all_digits(month_str, 2) {
            return Err(MonthParseError::Format(s.to_string()));
        }

        let year: i32 = year_str
            .parse()
            .map_err(|_| MonthParseError::Format(s.to_string()))?;
        let month_num: u8 = month_str
            .parse()
            .map_err(|_| MonthParseError::Format(s.to_string()))?;
        let month = Month::try_from(month_num).map_err(|_| MonthParseError::MonthRange(s.to_string()))?;

        Ok(Self::new(year, month))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BillingMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for BillingMonth {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_and_renders_round_trip() {
        let m: BillingMonth = "2025-06".parse().unwrap();
        assert_eq!(m.year(), 2025);
        assert_eq!(m.month(), Month::June);
        assert_eq!(m.to_string(), "2025-06");
    }

    #[test]
    fn rejects_malformed_months() {
        for bad in ["2025-6", "25-06", "2025/06", "2025-06-01", "", "abcd-ef"] {
            assert!(
                matches!(bad.parse::<BillingMonth>(), Err(MonthParseError::Format(_))),
                "{bad} should be rejected"
            );
        }
        assert!(matches!(
            "2025-13".parse::<BillingMonth>(),
            Err(MonthParseError::MonthRange(_))
        ));
        assert!(matches!(
            "2025-00".parse::<BillingMonth>(),
            Err(MonthParseError::MonthRange(_))
        ));
    }

    #[test]
    fn previous_rolls_back_over_year_boundary() {
        let jan: BillingMonth = "2025-01".parse().unwrap();
        assert_eq!(jan.previous().to_string(), "2024-12");

        let jul: BillingMonth = "2025-07".parse().unwrap();
        assert_eq!(jul.previous().to_string(), "2025-06");
    }

    #[test]
    fn next_rolls_forward_over_year_boundary() {
        let dec: BillingMonth = "2024-12".parse().unwrap();
        assert_eq!(dec.next().to_string(), "2025-01");
    }

    #[test]
    fn contains_key_matches_by_prefix() {
        let m = BillingMonth::from_date(date!(2025 - 06 - 15));
        assert!(m.contains_key("2025-06-01"));
        assert!(m.contains_key("2025-06-30"));
        assert!(!m.contains_key("2025-05-31"));
        assert!(!m.contains_key("2025-07-01"));
    }
}
