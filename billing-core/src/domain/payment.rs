use std::{fmt, str::FromStr};

use crate::domain::BillingMonth;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown payment status '{0}'")]
pub struct StatusParseError(pub String);

/// Settlement state of a monthly bill as recorded by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentStatus {
    Paid,
    Pending,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PAID" => Ok(PaymentStatus::Paid),
            "PENDING" => Ok(PaymentStatus::Pending),
            "FAILED" => Ok(PaymentStatus::Failed),
            "CANCELLED" | "CANCELED" => Ok(PaymentStatus::Cancelled),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaymentRecord {
    pub month: BillingMonth,
    pub status: PaymentStatus,
    pub amount: Option<f64>,
}

impl PaymentRecord {
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

/// Outcome of asking the store whether a month has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PaymentLookup {
    Paid,
    Unpaid,
    /// The lookup itself failed.
    Unknown,
}

impl From<bool> for PaymentLookup {
    fn from(paid: bool) -> Self {
        if paid {
            PaymentLookup::Paid
        } else {
            PaymentLookup::Unpaid
        }
    }
}

impl PaymentLookup {
    /// Build a lookup from the records stored for one month.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a PaymentRecord>,
    {
        records.into_iter().any(PaymentRecord::is_paid).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("PAID".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
        assert_eq!("paid".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
        assert_eq!(" Pending ".parse::<PaymentStatus>(), Ok(PaymentStatus::Pending));
        assert_eq!("canceled".parse::<PaymentStatus>(), Ok(PaymentStatus::Cancelled));
    }

    #[test]
    fn unknown_status_is_an_error_not_paid() {
        assert_eq!(
            "PAYED".parse::<PaymentStatus>(),
            Err(StatusParseError("PAYED".to_string()))
        );
    }

    #[test]
    fn lookup_from_records_requires_a_paid_record() {
        let month: BillingMonth = "2025-06".parse().unwrap();
        let pending = PaymentRecord { month, status: PaymentStatus::Pending, amount: Some(10.0) };
        let paid = PaymentRecord { month, status: PaymentStatus::Paid, amount: Some(10.0) };

        assert_eq!(PaymentLookup::from_records([&pending]), PaymentLookup::Unpaid);
        assert_eq!(PaymentLookup::from_records([&pending, &paid]), PaymentLookup::Paid);
        assert_eq!(PaymentLookup::from_records(std::iter::empty()), PaymentLookup::Unpaid);
    }
}
