use crate::domain::{BillingMonth, ReadingHistory, Utility};

/// Usage of both utilities for one billing month.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonthlyUsage {
    pub month: BillingMonth,
    pub electric: f64,
    pub water: f64,
}

/// Usage of `utility` attributable to `target_month`.
///
/// Rules:
/// - no readings in the target month yields 0.
/// - baseline is the last previous-month reading by date key, or the
///   minimum target-month reading when the previous month is empty.
/// - result is `max(0, target_max - baseline)`; readings are trusted as
///   they are, even when they are not monotonic.
pub fn compute_monthly_usage(history: &ReadingHistory, target_month: BillingMonth, utility: Utility) -> f64 {
    let current: Vec<f64> = history.values_in(target_month, utility).collect();
    if current.is_empty() {
        return 0.0;
    }

    let current_max = current.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let baseline = match history.values_in(target_month.previous(), utility).last() {
        Some(last_prev) => last_prev,
        None => current.iter().copied().fold(f64::INFINITY, f64::min),
    };

    (current_max - baseline).max(0.0)
}

pub fn compute_usage(history: &ReadingHistory, month: BillingMonth) -> MonthlyUsage {
    MonthlyUsage {
        month,
        electric: compute_monthly_usage(history, month, Utility::Electric),
        water: compute_monthly_usage(history, month, Utility::Water),
    }
}

/// Usage for `months` consecutive months ending at `last_month`, oldest first.
pub fn usage_trend(history: &ReadingHistory, last_month: BillingMonth, months: usize) -> Vec<MonthlyUsage> {
    let mut trend: Vec<MonthlyUsage> = std::iter::successors(Some(last_month), |m| Some(m.previous()))
        .take(months)
        .map(|m| compute_usage(history, m))
        .collect();
    trend.reverse();
    trend
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MeterReading;

    fn month(s: &str) -> BillingMonth {
        s.parse().unwrap()
    }

    fn electric(v: f64) -> MeterReading {
        MeterReading::new(Some(v), None)
    }

    fn water(v: f64) -> MeterReading {
        MeterReading::new(None, Some(v))
    }

    #[test]
    fn baseline_is_last_previous_month_reading() {
        let history: ReadingHistory = [
            ("2025-05-31", electric(100.0)),
            ("2025-06-10", electric(140.0)),
            ("2025-06-20", electric(155.0)),
        ]
        .into_iter()
        .collect();

        assert_eq!(compute_monthly_usage(&history, month("2025-06"), Utility::Electric), 55.0);
    }

    #[test]
    fn baseline_falls_back_to_intra_month_minimum() {
        let history: ReadingHistory = [("2025-06-05", water(10.0)), ("2025-06-25", water(18.0))]
            .into_iter()
            .collect();

        assert_eq!(compute_monthly_usage(&history, month("2025-06"), Utility::Water), 8.0);
    }

    #[test]
    fn empty_history_yields_zero() {
        let history = ReadingHistory::new();
        assert_eq!(compute_monthly_usage(&history, month("2025-06"), Utility::Electric), 0.0);
        assert_eq!(compute_monthly_usage(&history, month("2025-06"), Utility::Water), 0.0);
    }

    #[test]
    fn no_target_month_readings_yields_zero_even_with_previous_month() {
        let history: ReadingHistory = [("2025-05-10", electric(50.0)), ("2025-07-01", electric(90.0))]
            .into_iter()
            .collect();

        assert_eq!(compute_monthly_usage(&history, month("2025-06"), Utility::Electric), 0.0);
    }

    #[test]
    fn other_utility_readings_do_not_count() {
        let history: ReadingHistory = [("2025-06-05", water(10.0)), ("2025-06-25", water(18.0))]
            .into_iter()
            .collect();

        assert_eq!(compute_monthly_usage(&history, month("2025-06"), Utility::Electric), 0.0);
    }

    #[test]
    fn previous_month_baseline_is_last_by_date_not_by_value() {
        let history: ReadingHistory = [
            ("2025-05-01", electric(120.0)),
            ("2025-05-28", electric(90.0)),
            ("2025-06-15", electric(130.0)),
        ]
        .into_iter()
        .collect();

        assert_eq!(compute_monthly_usage(&history, month("2025-06"), Utility::Electric), 40.0);
    }

    #[test]
    fn negative_delta_is_clamped_to_zero() {
        // Meter replaced mid-cycle: the new counter starts below last month's value.
        let history: ReadingHistory = [("2025-05-30", electric(500.0)), ("2025-06-10", electric(20.0))]
            .into_iter()
            .collect();

        assert_eq!(compute_monthly_usage(&history, month("2025-06"), Utility::Electric), 0.0);
    }

    #[test]
    fn january_uses_previous_december_baseline() {
        let history: ReadingHistory = [("2024-12-31", electric(1000.0)), ("2025-01-15", electric(1075.5))]
            .into_iter()
            .collect();

        assert_eq!(compute_monthly_usage(&history, month("2025-01"), Utility::Electric), 75.5);
    }

    #[test]
    fn single_reading_without_previous_month_is_zero() {
        let history: ReadingHistory = [("2025-06-05", electric(42.0))].into_iter().collect();
        assert_eq!(compute_monthly_usage(&history, month("2025-06"), Utility::Electric), 0.0);
    }

    #[test]
    fn result_is_never_negative_for_shuffled_series() {
        let values = [7.0, 3.0, 11.0, 2.0, 9.0, 0.0, 5.0];
        for (i, prev) in values.iter().enumerate() {
            let mut history = ReadingHistory::new();
            history.insert("2025-05-20", electric(*prev));
            for (day, v) in values.iter().cycle().skip(i).take(values.len()).enumerate() {
                history.insert(format!("2025-06-{:02}", day + 1), electric(*v));
            }
            let usage = compute_monthly_usage(&history, month("2025-06"), Utility::Electric);
            assert!(usage >= 0.0);
            assert_eq!(usage, (11.0 - prev).max(0.0));
        }
    }

    #[test]
    fn repeated_calls_are_idempotent() {
        let history: ReadingHistory = [
            ("2025-05-31", MeterReading::new(Some(100.0), Some(4.0))),
            ("2025-06-20", MeterReading::new(Some(155.0), Some(9.0))),
        ]
        .into_iter()
        .collect();

        let first = compute_usage(&history, month("2025-06"));
        let second = compute_usage(&history, month("2025-06"));
        assert_eq!(first, second);
        assert_eq!(first.electric, 55.0);
        assert_eq!(first.water, 5.0);
    }

    #[test]
    fn trend_covers_consecutive_months_oldest_first() {
        let history: ReadingHistory = [
            ("2025-04-30", electric(10.0)),
            ("2025-05-31", electric(30.0)),
            ("2025-06-30", electric(70.0)),
        ]
        .into_iter()
        .collect();

        let trend = usage_trend(&history, month("2025-06"), 3);
        let months: Vec<String> = trend.iter().map(|u| u.month.to_string()).collect();
        let electric_usage: Vec<f64> = trend.iter().map(|u| u.electric).collect();

        assert_eq!(months, vec!["2025-04", "2025-05", "2025-06"]);
        assert_eq!(electric_usage, vec![0.0, 20.0, 40.0]);
        assert!(usage_trend(&history, month("2025-06"), 0).is_empty());
    }
}
