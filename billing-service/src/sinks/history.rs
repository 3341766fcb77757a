use std::collections::BTreeMap;

use billing_core::domain::{ReadingHistory, RoomReading};
use futures::StreamExt;

use crate::pipeline::{Envelope, PipelineError, Sink};

/// Folds readings into one `ReadingHistory` per room.
///
/// Upstream errors are logged and skipped so one bad row never aborts an
/// import.
#[derive(Debug, Default)]
pub struct HistorySink {
    rooms: BTreeMap<String, ReadingHistory>,
    accepted: u64,
    rejected: u64,
}

impl HistorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn into_histories(self) -> BTreeMap<String, ReadingHistory> {
        self.rooms
    }

    fn absorb(&mut self, reading: RoomReading) {
        let key = reading.date_key();
        self.rooms
            .entry(reading.room_id)
            .or_default()
            .merge(key, reading.reading);
        self.accepted += 1;
    }
}

#[async_trait::async_trait]
impl Sink<RoomReading> for HistorySink {
    async fn run<S>(&mut self, mut input: S) -> Result<(), PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<RoomReading>, PipelineError>> + Send + Unpin + 'static,
    {
        while let Some(item) = input.next().await {
            match item {
                Ok(env) => self.absorb(env.payload),
                Err(e) => {
                    self.rejected += 1;
                    tracing::warn!(error = %e, "dropping reading from upstream pipeline");
                }
            }
        }

        tracing::info!(
            rooms = self.rooms.len(),
            accepted = self.accepted,
            rejected = self.rejected,
            "readings ingested"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pipeline::{EnvelopeStream, Pipeline, Source},
        transform::ReadingValidation,
    };
    use billing_core::{compute_usage, domain::MeterReading};
    use std::sync::Arc;
    use time::macros::date;

    struct VecSource(Vec<RoomReading>);

    #[async_trait::async_trait]
    impl Source<RoomReading> for VecSource {
        async fn stream(&self) -> EnvelopeStream<RoomReading> {
            let items: Vec<_> = self.0.iter().cloned().map(|r| Ok(Envelope::now(r))).collect();
            Box::pin(futures::stream::iter(items))
        }
    }

    fn reading(room: &str, date: time::Date, electric: Option<f64>, water: Option<f64>) -> RoomReading {
        RoomReading {
            room_id: room.to_string(),
            date,
            reading: MeterReading::new(electric, water),
        }
    }

    #[tokio::test]
    async fn pipeline_builds_per_room_histories_and_skips_invalid() {
        let source = VecSource(vec![
            reading("101", date!(2025 - 05 - 31), Some(100.0), None),
            reading("101", date!(2025 - 06 - 10), Some(140.0), None),
            reading("101", date!(2025 - 06 - 20), Some(155.0), None),
            reading("101", date!(2025 - 06 - 21), Some(-5.0), None),
            reading("A7", date!(2025 - 06 - 05), None, Some(10.0)),
            reading("A7", date!(2025 - 06 - 25), None, Some(18.0)),
            reading("A7", date!(2025 - 06 - 25), Some(7.0), None),
        ]);

        let pipeline: Pipeline<_, RoomReading, _> = Pipeline {
            source,
            transforms: vec![Arc::new(ReadingValidation)],
            sink: HistorySink::new(),
        };

        let sink = pipeline.run().await.unwrap();
        assert_eq!(sink.accepted(), 6);
        assert_eq!(sink.rejected(), 1);

        let histories = sink.into_histories();
        let june = "2025-06".parse().unwrap();

        assert_eq!(compute_usage(&histories["101"], june).electric, 55.0);

        let a7 = &histories["A7"];
        assert_eq!(a7.len(), 2);
        assert_eq!(a7.get("2025-06-25"), Some(&MeterReading::new(Some(7.0), Some(18.0))));
        assert_eq!(compute_usage(a7, june).water, 8.0);
    }
}
