use std::path::PathBuf;

use async_stream::try_stream;
use billing_core::domain::{MeterReading, RoomReading};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};

use crate::{
    pipeline::{Envelope, EnvelopeStream, PipelineError, Source},
    sources::parse_reading_date,
};

/// NDJSON export of meter readings, one object per line:
/// `{"room_id": "101", "date": "2025-06-10", "electric": 140, "water": 9.5}`.
///
/// Integral and floating values are both accepted. Blank lines are ignored.
pub struct ReadingsNdjsonFileSource {
    path: PathBuf,
}

#[derive(serde::Deserialize)]
struct IncomingReading {
    room_id: String,
    date: String,
    electric: Option<f64>,
    water: Option<f64>,
}

impl TryFrom<IncomingReading> for RoomReading {
    type Error = PipelineError;

    fn try_from(i: IncomingReading) -> Result<Self, Self::Error> {
        Ok(RoomReading {
            date: parse_reading_date(&i.date)?,
            room_id: i.room_id,
            reading: MeterReading::new(i.electric, i.water),
        })
    }
}

impl ReadingsNdjsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn parse_line(line: &str) -> Result<RoomReading, PipelineError> {
    let incoming: IncomingReading = serde_json::from_str(line)
        .map_err(|e| PipelineError::Source(format!("failed to parse reading json line: {e}")))?;
    incoming.try_into()
}

#[async_trait::async_trait]
impl Source<RoomReading> for ReadingsNdjsonFileSource {
    async fn stream(&self) -> EnvelopeStream<RoomReading> {
        let path = self.path.clone();
        let s = try_stream! {
            let file = File::open(&path).await.map_err(|e| {
                PipelineError::Source(format!("failed to open readings file: {e}"))
            })?;
            let mut lines = BufReader::new(file).lines();

            while let Some(line) = lines.next_line().await.map_err(|e| {
                PipelineError::Source(format!("failed to read readings line: {e}"))
            })? {
                if line.trim().is_empty() {
                    continue;
                }
                match parse_line(&line) {
                    Ok(reading) => {
                        yield Envelope::now(reading);
                    }
                    Err(e) => {
                        metrics::counter!("reading_ndjson_parse_errors_total").increment(1);
                        tracing::debug!(error = %e, "skipping unparseable reading line");
                    }
                }
            }
        };

        Box::pin(s)
    }
}
