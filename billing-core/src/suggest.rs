use crate::domain::{BillingMonth, PaymentLookup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaymentMonthSuggestion {
    pub target_month: BillingMonth,
    pub previous_month_status: PaymentLookup,
}

/// Month the tenant should pay next: the current month once the previous
/// one is settled, otherwise the previous month.
pub fn suggest_payment_month(
    previous_month_paid: bool,
    current_month: BillingMonth,
    previous_month: BillingMonth,
) -> BillingMonth {
    if previous_month_paid {
        current_month
    } else {
        previous_month
    }
}

/// Like [`suggest_payment_month`], but an `Unknown` lookup counts as unpaid.
pub fn suggest_from_lookup(
    lookup: PaymentLookup,
    current_month: BillingMonth,
    previous_month: BillingMonth,
) -> PaymentMonthSuggestion {
    let previous_month_paid = match lookup {
        PaymentLookup::Paid => true,
        PaymentLookup::Unpaid | PaymentLookup::Unknown => false,
    };

    PaymentMonthSuggestion {
        target_month: suggest_payment_month(previous_month_paid, current_month, previous_month),
        previous_month_status: lookup,
    }
}
