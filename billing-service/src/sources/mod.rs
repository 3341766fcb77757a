pub mod readings_csv_file;
pub mod readings_ndjson_file;

pub use readings_csv_file::ReadingsCsvFileSource;
pub use readings_ndjson_file::ReadingsNdjsonFileSource;

use time::{macros::format_description, Date};

use crate::pipeline::PipelineError;

/// Parse a `YYYY-MM-DD` reading date.
pub(crate) fn parse_reading_date(s: &str) -> Result<Date, PipelineError> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| PipelineError::Source(format!("invalid date '{s}': {e}")))
}
