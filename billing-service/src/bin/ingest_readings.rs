use anyhow::{bail, Context, Result};
use billing_core::{compute_usage, domain::BillingMonth, domain::RoomReading, MonthlyUsage};
use billing_service::{
    config::AppConfig,
    metrics_export, observability,
    pipeline::{Pipeline, Source},
    sinks::HistorySink,
    sources::{ReadingsCsvFileSource, ReadingsNdjsonFileSource},
    transform,
};
use std::{collections::BTreeMap, env, path::Path, sync::Arc};

async fn ingest<S>(source: S) -> Result<HistorySink>
where
    S: Source<RoomReading> + Send + Sync + 'static,
{
    let pipeline: Pipeline<_, RoomReading, _> = Pipeline {
        source,
        transforms: vec![Arc::new(transform::ReadingValidation)],
        sink: HistorySink::new(),
    };
    Ok(pipeline.run().await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        bail!("usage: ingest_readings <readings.csv|readings.ndjson> <YYYY-MM>");
    }
    let file_path = Path::new(&args[1]);
    let month: BillingMonth = args[2]
        .parse()
        .with_context(|| format!("invalid month argument '{}'", args[2]))?;

    // The config file is optional here. A file that exists must still parse.
    let cfg = AppConfig::load_optional()?;
    let has_headers = cfg.as_ref().map_or(true, |c| c.ingest.csv_has_headers);
    let export = cfg
        .as_ref()
        .and_then(|c| c.metrics.as_ref())
        .map(metrics_export::install)
        .transpose()?;

    let res = run(file_path, month, has_headers).await;

    if let Some(export) = &export {
        export.write()?;
    }

    res
}

async fn run(file_path: &Path, month: BillingMonth, has_headers: bool) -> Result<()> {
    let sink = match file_path.extension().and_then(|e| e.to_str()) {
        Some("csv") => ingest(ReadingsCsvFileSource::new(file_path, has_headers)).await?,
        Some("ndjson") | Some("jsonl") => ingest(ReadingsNdjsonFileSource::new(file_path)).await?,
        _ => bail!("unsupported readings file '{}': expected .csv or .ndjson", file_path.display()),
    };

    let usage: BTreeMap<String, MonthlyUsage> = sink
        .into_histories()
        .into_iter()
        .map(|(room_id, history)| {
            let u = compute_usage(&history, month);
            (room_id, u)
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&usage)?);

    Ok(())
}
