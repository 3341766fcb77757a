use crate::pipeline::{Envelope, PipelineError, Transform};
use billing_core::domain::{RoomReading, Utility};
use time::macros::date;

/// Pure validation of a `RoomReading`.
///
/// Rules:
/// - at least one utility value must be present.
/// - values must be finite and non-negative (they are cumulative counters).
/// - date must be within [2000-01-01, 2100-01-01).
pub fn validate_reading(env: Envelope<RoomReading>) -> Result<Envelope<RoomReading>, PipelineError> {
    let r = &env.payload;

    if r.reading.is_empty() {
        return Err(PipelineError::Transform(format!(
            "reading for room {} on {} has no values",
            r.room_id,
            r.date_key()
        )));
    }

    for utility in Utility::ALL {
        if let Some(v) = r.reading.value(utility) {
            if !v.is_finite() || v < 0.0 {
                return Err(PipelineError::Transform(format!(
                    "{} reading must be a non-negative number",
                    utility.key()
                )));
            }
        }
    }

    let min_date = date!(2000 - 01 - 01);
    let max_date = date!(2100 - 01 - 01);

    if r.date < min_date || r.date >= max_date {
        return Err(PipelineError::Transform("reading date out of allowed range".to_string()));
    }

    Ok(env)
}

#[derive(Clone, Default)]
pub struct ReadingValidation;

#[async_trait::async_trait]
impl Transform<RoomReading, RoomReading> for ReadingValidation {
    async fn apply(&self, input: Envelope<RoomReading>) -> Result<Envelope<RoomReading>, PipelineError> {
        match validate_reading(input) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("reading_validation_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing_core::domain::MeterReading;
    use time::Date;

    fn env(date: Date, electric: Option<f64>, water: Option<f64>) -> Envelope<RoomReading> {
        Envelope::now(RoomReading {
            room_id: "101".to_string(),
            date,
            reading: MeterReading::new(electric, water),
        })
    }

    #[test]
    fn accepts_valid_reading() {
        let res = validate_reading(env(date!(2025 - 06 - 10), Some(140.0), None));
        assert!(res.is_ok());
    }

    #[test]
    fn rejects_reading_without_values() {
        let res = validate_reading(env(date!(2025 - 06 - 10), None, None));
        assert!(matches!(res, Err(PipelineError::Transform(_))));
    }

    #[test]
    fn rejects_negative_and_non_finite_values() {
        let neg = validate_reading(env(date!(2025 - 06 - 10), Some(-0.1), None));
        assert!(matches!(neg, Err(PipelineError::Transform(_))));

        let nan = validate_reading(env(date!(2025 - 06 - 10), None, Some(f64::NAN)));
        assert!(matches!(nan, Err(PipelineError::Transform(_))));
    }

    #[test]
    fn rejects_out_of_range_dates() {
        let old = validate_reading(env(date!(1999 - 12 - 31), Some(1.0), None));
        assert!(matches!(old, Err(PipelineError::Transform(_))));

        let future = validate_reading(env(date!(2100 - 01 - 01), Some(1.0), None));
        assert!(matches!(future, Err(PipelineError::Transform(_))));
    }

    #[tokio::test]
    async fn transform_passes_valid_readings_through() {
        let out = ReadingValidation
            .apply(env(date!(2025 - 06 - 10), Some(1.0), Some(2.0)))
            .await
            .unwrap();
        assert_eq!(out.payload.reading, MeterReading::new(Some(1.0), Some(2.0)));
    }
}
