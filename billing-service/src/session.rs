use billing_core::{
    compute_usage,
    domain::{BillEstimate, BillingMonth, ReadingHistory, Tariff},
    suggest_from_lookup, usage_trend, MonthlyUsage, PaymentMonthSuggestion,
};
use serde::Serialize;

use crate::{
    repository::{LookupError, RoomLocation, RoomRepository},
    store::{DocumentStore, StoreError},
};

/// The signed-in tenant and the room they resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    phone: String,
    room: RoomLocation,
}

impl Session {
    pub async fn open<S: DocumentStore>(repo: &RoomRepository<S>, phone: &str) -> Result<Self, LookupError> {
        let room = repo.locate_room(phone).await?;
        tracing::info!(room_id = room.room_id(), building_id = room.building_id(), "session opened");
        Ok(Self {
            phone: phone.to_string(),
            room,
        })
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn room(&self) -> &RoomLocation {
        &self.room
    }
}

/// Latest derived values for one room, replaced on every refresh.
#[derive(Debug, Clone, Default)]
pub struct RoomState {
    history: ReadingHistory,
    usage: Option<MonthlyUsage>,
    tariff: Option<Tariff>,
    estimate: Option<BillEstimate>,
    suggestion: Option<PaymentMonthSuggestion>,
    refreshed_for: Option<BillingMonth>,
}

impl RoomState {
    pub fn set_history(&mut self, history: ReadingHistory) {
        self.history = history;
    }

    pub fn set_usage(&mut self, usage: MonthlyUsage) {
        self.usage = Some(usage);
    }

    pub fn set_pricing(&mut self, tariff: Tariff, estimate: BillEstimate) {
        self.tariff = Some(tariff);
        self.estimate = Some(estimate);
    }

    pub fn set_suggestion(&mut self, suggestion: PaymentMonthSuggestion) {
        self.suggestion = Some(suggestion);
    }

    pub fn mark_refreshed(&mut self, month: BillingMonth) {
        self.refreshed_for = Some(month);
    }

    pub fn history(&self) -> &ReadingHistory {
        &self.history
    }

    pub fn usage(&self) -> Option<&MonthlyUsage> {
        self.usage.as_ref()
    }

    pub fn tariff(&self) -> Option<&Tariff> {
        self.tariff.as_ref()
    }

    pub fn estimate(&self) -> Option<&BillEstimate> {
        self.estimate.as_ref()
    }

    pub fn suggestion(&self) -> Option<&PaymentMonthSuggestion> {
        self.suggestion.as_ref()
    }

    pub fn refreshed_for(&self) -> Option<BillingMonth> {
        self.refreshed_for
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub phone: String,
    pub room: RoomLocation,
    pub month: BillingMonth,
    pub readings: usize,
    pub usage: MonthlyUsage,
    pub tariff: Tariff,
    pub estimate: BillEstimate,
    pub suggestion: PaymentMonthSuggestion,
}

pub struct BillingService<S> {
    repo: RoomRepository<S>,
}

impl<S: DocumentStore> BillingService<S> {
    pub fn new(repo: RoomRepository<S>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &RoomRepository<S> {
        &self.repo
    }

    pub async fn open_session(&self, phone: &str) -> Result<Session, LookupError> {
        Session::open(&self.repo, phone).await
    }

    /// Re-derive everything shown for `current_month` and store it in `state`.
    ///
    /// `state` is only written once every fetch has succeeded, so a failed
    /// refresh leaves the previous refresh intact. The payment lookup never
    /// fails the refresh; an unknown status makes the previous month the
    /// suggestion.
    pub async fn refresh(
        &self,
        session: &Session,
        state: &mut RoomState,
        current_month: BillingMonth,
    ) -> Result<RoomSummary, StoreError> {
        let room = session.room();

        let history = self.repo.fetch_history(room).await?;
        let tariff = self.repo.fetch_tariff(room).await?;

        let usage = compute_usage(&history, current_month);
        let estimate = tariff.estimate(&usage);
        let readings = history.len();

        let previous_month = current_month.previous();
        let lookup = self.repo.fetch_payment_lookup(room, previous_month).await;
        let suggestion = suggest_from_lookup(lookup, current_month, previous_month);

        state.set_history(history);
        state.set_usage(usage);
        state.set_pricing(tariff, estimate);
        state.set_suggestion(suggestion);
        state.mark_refreshed(current_month);

        tracing::info!(
            room_id = room.room_id(),
            month = %current_month,
            electric = usage.electric,
            water = usage.water,
            suggested_month = %suggestion.target_month,
            "room refreshed"
        );

        Ok(RoomSummary {
            phone: session.phone().to_string(),
            room: room.clone(),
            month: current_month,
            readings,
            usage,
            tariff,
            estimate,
            suggestion,
        })
    }

    /// Monthly usage for the statistics view, oldest month first.
    pub async fn statistics(
        &self,
        session: &Session,
        last_month: BillingMonth,
        months: usize,
    ) -> Result<Vec<MonthlyUsage>, StoreError> {
        let history = self.repo.fetch_history(session.room()).await?;
        Ok(usage_trend(&history, last_month, months))
    }
}
