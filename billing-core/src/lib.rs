pub mod domain;
pub mod suggest;
pub mod usage;

pub use suggest::{suggest_from_lookup, suggest_payment_month, PaymentMonthSuggestion};
pub use usage::{compute_monthly_usage, compute_usage, usage_trend, MonthlyUsage};
