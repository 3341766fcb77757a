use billing_core::domain::{
    BillingMonth, MeterReading, PaymentLookup, PaymentRecord, PaymentStatus, ReadingHistory, Tariff, Utility,
};
use serde_json::Value;
use time::{macros::format_description, Date};

use crate::store::{DocumentStore, StoreError};

#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error("no room registered for phone '{phone}'")]
    NotFound { phone: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where a room's data lives.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum RoomLocation {
    /// `buildings/{building_id}/rooms/{room_id}`
    Current { building_id: String, room_id: String },
    /// `rooms/{room_id}`, prices shared at the root.
    Legacy { room_id: String },
}

impl RoomLocation {
    pub fn room_id(&self) -> &str {
        match self {
            RoomLocation::Current { room_id, .. } | RoomLocation::Legacy { room_id } => room_id,
        }
    }

    pub fn building_id(&self) -> Option<&str> {
        match self {
            RoomLocation::Current { building_id, .. } => Some(building_id),
            RoomLocation::Legacy { .. } => None,
        }
    }

    fn room_path(&self) -> String {
        match self {
            RoomLocation::Current { building_id, room_id } => format!("buildings/{building_id}/rooms/{room_id}"),
            RoomLocation::Legacy { room_id } => format!("rooms/{room_id}"),
        }
    }

    fn prices_path(&self) -> String {
        match self {
            RoomLocation::Current { building_id, .. } => format!("buildings/{building_id}/prices"),
            RoomLocation::Legacy { .. } => "prices".to_string(),
        }
    }
}

/// Strip the separators people type into phone numbers.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect()
}

/// Children of an object or array node, keyed by name or index.
fn children(node: &Value) -> Vec<(String, &Value)> {
    match node {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

fn phone_matches(node: Option<&Value>, wanted: &str) -> bool {
    match node {
        Some(Value::String(s)) => normalize_phone(s) == wanted,
        Some(Value::Number(n)) => n.to_string() == wanted,
        _ => false,
    }
}

/// Non-negative finite number, integral or floating.
fn reading_value(node: Option<&Value>) -> Option<f64> {
    node.and_then(Value::as_f64).filter(|v| v.is_finite() && *v >= 0.0)
}

fn parse_reading(node: &Value) -> Option<MeterReading> {
    let reading = MeterReading::new(
        reading_value(node.get(Utility::Electric.key())),
        reading_value(node.get(Utility::Water.key())),
    );
    (!reading.is_empty()).then_some(reading)
}

fn is_date_key(key: &str) -> bool {
    Date::parse(key, format_description!("[year]-[month]-[day]")).is_ok()
}

fn parse_payment(month: BillingMonth, node: &Value) -> Option<PaymentRecord> {
    let status_str = node.get("status").and_then(Value::as_str)?;
    let status: PaymentStatus = match status_str.parse() {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(error = %e, %month, "ignoring payment record with unknown status");
            return None;
        }
    };
    Some(PaymentRecord {
        month,
        status,
        amount: node.get("amount").and_then(Value::as_f64),
    })
}

/// Room-scoped reads over a [`DocumentStore`].
pub struct RoomRepository<S> {
    store: S,
    default_tariff: Tariff,
}

impl<S: DocumentStore> RoomRepository<S> {
    pub fn new(store: S, default_tariff: Tariff) -> Self {
        Self { store, default_tariff }
    }

    /// Resolve a tenant phone number to a room, trying the current layout
    /// first and the legacy one second.
    pub async fn locate_room(&self, phone: &str) -> Result<RoomLocation, LookupError> {
        let wanted = normalize_phone(phone);
        if wanted.is_empty() {
            return Err(LookupError::NotFound { phone: phone.to_string() });
        }

        if let Some(location) = self.find_in_buildings(&wanted).await? {
            tracing::debug!(room_id = location.room_id(), "room found in buildings layout");
            return Ok(location);
        }

        if let Some(location) = self.find_in_legacy_rooms(&wanted).await? {
            metrics::counter!("room_lookup_legacy_fallback_total").increment(1);
            tracing::info!(room_id = location.room_id(), "room found in legacy layout");
            return Ok(location);
        }

        Err(LookupError::NotFound { phone: phone.to_string() })
    }

    async fn find_in_buildings(&self, wanted: &str) -> Result<Option<RoomLocation>, StoreError> {
        let Some(buildings) = self.store.get("buildings").await? else {
            return Ok(None);
        };

        for (building_id, building) in children(&buildings) {
            let Some(rooms) = building.get("rooms") else { continue };
            for (room_id, room) in children(rooms) {
                let Some(tenants) = room.get("tenants") else { continue };
                if children(tenants).into_iter().any(|(_, t)| phone_matches(t.get("phone"), wanted)) {
                    return Ok(Some(RoomLocation::Current { building_id, room_id }));
                }
            }
        }

        Ok(None)
    }

    async fn find_in_legacy_rooms(&self, wanted: &str) -> Result<Option<RoomLocation>, StoreError> {
        let Some(rooms) = self.store.get("rooms").await? else {
            return Ok(None);
        };

        Ok(children(&rooms)
            .into_iter()
            .find(|(_, room)| phone_matches(room.get("phone"), wanted))
            .map(|(room_id, _)| RoomLocation::Legacy { room_id }))
    }

    /// Readings recorded for a room. Malformed entries are skipped.
    pub async fn fetch_history(&self, location: &RoomLocation) -> Result<ReadingHistory, StoreError> {
        let path = format!("{}/history", location.room_path());
        let Some(node) = self.store.get(&path).await? else {
            return Ok(ReadingHistory::new());
        };

        let mut history = ReadingHistory::new();
        let mut skipped = 0u64;
        for (date_key, entry) in children(&node) {
            match parse_reading(entry) {
                Some(reading) if is_date_key(&date_key) => history.insert(date_key, reading),
                _ => {
                    skipped += 1;
                    tracing::debug!(room_id = location.room_id(), %date_key, "skipping malformed reading");
                }
            }
        }

        if skipped > 0 {
            metrics::counter!("store_malformed_readings_total").increment(skipped);
        }

        Ok(history)
    }

    /// Payment records stored for one month. A month may hold a single
    /// record or a map of attempts.
    pub async fn fetch_payments(
        &self,
        location: &RoomLocation,
        month: BillingMonth,
    ) -> Result<Vec<PaymentRecord>, StoreError> {
        let path = format!("{}/payments/{month}", location.room_path());
        let Some(node) = self.store.get(&path).await? else {
            return Ok(Vec::new());
        };

        if node.get("status").is_some() {
            return Ok(parse_payment(month, &node).into_iter().collect());
        }

        Ok(children(&node)
            .into_iter()
            .filter_map(|(_, attempt)| parse_payment(month, attempt))
            .collect())
    }

    /// Whether `month` has been paid. Store failures become `Unknown`.
    pub async fn fetch_payment_lookup(&self, location: &RoomLocation, month: BillingMonth) -> PaymentLookup {
        match self.fetch_payments(location, month).await {
            Ok(records) => PaymentLookup::from_records(&records),
            Err(e) => {
                metrics::counter!("payment_lookup_unknown_total").increment(1);
                tracing::warn!(error = %e, room_id = location.room_id(), %month, "payment status lookup failed");
                PaymentLookup::Unknown
            }
        }
    }

    /// Unit prices for the room's building. Missing prices use the defaults.
    pub async fn fetch_tariff(&self, location: &RoomLocation) -> Result<Tariff, StoreError> {
        let Some(node) = self.store.get(&location.prices_path()).await? else {
            return Ok(self.default_tariff);
        };

        Ok(Tariff::new(
            reading_value(node.get(Utility::Electric.key())).unwrap_or(self.default_tariff.electric_per_kwh),
            reading_value(node.get(Utility::Water.key())).unwrap_or(self.default_tariff.water_per_m3),
        ))
    }
}
