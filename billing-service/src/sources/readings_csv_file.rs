use std::{fs::File, path::PathBuf};

use billing_core::domain::{MeterReading, RoomReading};
use csv::StringRecord;

use crate::{
    pipeline::{Envelope, EnvelopeStream, PipelineError, Source},
    sources::parse_reading_date,
};

const COLUMNS: [&str; 4] = ["room_id", "date", "electric", "water"];

/// CSV export of meter readings.
///
/// Columns (by header name, or in this order when the file has no header):
/// - room_id
/// - date (YYYY-MM-DD)
/// - electric (optional)
/// - water (optional)
pub struct ReadingsCsvFileSource {
    path: PathBuf,
    has_headers: bool,
}

impl ReadingsCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P, has_headers: bool) -> Self {
        Self {
            path: path.into(),
            has_headers,
        }
    }
}

fn parse_optional_f64(name: &str, s: &str) -> Result<Option<f64>, PipelineError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|e| PipelineError::Source(format!("invalid {name} '{trimmed}': {e}")))
}

fn column_index(headers: Option<&StringRecord>, name: &str) -> Option<usize> {
    match headers {
        Some(h) => h.iter().position(|col| col.trim() == name),
        None => COLUMNS.iter().position(|col| *col == name),
    }
}

fn field<'r>(record: &'r StringRecord, headers: Option<&StringRecord>, name: &str) -> Option<&'r str> {
    column_index(headers, name).and_then(|idx| record.get(idx))
}

fn required_field<'r>(
    record: &'r StringRecord,
    headers: Option<&StringRecord>,
    name: &str,
) -> Result<&'r str, PipelineError> {
    field(record, headers, name)
        .ok_or_else(|| PipelineError::Source(format!("missing column '{name}' in CSV record")))
}

fn record_to_reading(record: &StringRecord, headers: Option<&StringRecord>) -> Result<RoomReading, PipelineError> {
    let room_id = required_field(record, headers, "room_id")?.trim();
    if room_id.is_empty() {
        return Err(PipelineError::Source("empty room_id in CSV record".to_string()));
    }
    let date = parse_reading_date(required_field(record, headers, "date")?)?;
    let electric = parse_optional_f64("electric", field(record, headers, "electric").unwrap_or(""))?;
    let water = parse_optional_f64("water", field(record, headers, "water").unwrap_or(""))?;

    Ok(RoomReading {
        room_id: room_id.to_string(),
        date,
        reading: MeterReading::new(electric, water),
    })
}

#[async_trait::async_trait]
impl Source<RoomReading> for ReadingsCsvFileSource {
    async fn stream(&self) -> EnvelopeStream<RoomReading> {
        // Blocking reader; exports are small enough to read inline.
        let path = self.path.clone();
        let has_headers = self.has_headers;
        let s = async_stream::try_stream! {
            let file = File::open(&path)
                .map_err(|e| PipelineError::Source(format!("failed to open CSV file: {e}")))?;
            let mut rdr = csv::ReaderBuilder::new()
                .has_headers(has_headers)
                .flexible(true)
                .from_reader(file);
            let headers = if has_headers {
                Some(
                    rdr.headers()
                        .map_err(|e| PipelineError::Source(format!("failed to read CSV headers: {e}")))?
                        .clone(),
                )
            } else {
                None
            };

            for result in rdr.records() {
                let record = result.map_err(|e| PipelineError::Source(format!(
                    "failed to read CSV record: {e}"
                )))?;

                match record_to_reading(&record, headers.as_ref()) {
                    Ok(reading) => {
                        yield Envelope::now(reading);
                    }
                    Err(e) => {
                        metrics::counter!("reading_csv_parse_errors_total").increment(1);
                        tracing::debug!(error = %e, "skipping unparseable CSV reading");
                    }
                }
            }
        };

        Box::pin(s)
    }
}
