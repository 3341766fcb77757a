use anyhow::{bail, Context, Result};
use billing_core::domain::BillingMonth;
use billing_service::{
    config::AppConfig, metrics_export, observability, BillingService, JsonSnapshotStore, RoomRepository, RoomState,
};
use std::env;
use time::OffsetDateTime;

async fn run(cfg: &AppConfig, phone: &str, month: BillingMonth) -> Result<()> {
    let store = JsonSnapshotStore::load(&cfg.store.snapshot_path)
        .await
        .with_context(|| format!("failed to load snapshot {}", cfg.store.snapshot_path.display()))?;
    let service = BillingService::new(RoomRepository::new(store, cfg.billing.default_tariff()));

    let session = service.open_session(phone).await?;
    let mut state = RoomState::default();
    let summary = service.refresh(&session, &mut state, month).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        bail!("usage: billing-service <phone> [YYYY-MM]");
    }
    let phone = &args[1];
    let month: BillingMonth = match args.get(2) {
        Some(m) => m.parse().with_context(|| format!("invalid month argument '{m}'"))?,
        None => BillingMonth::from_date(OffsetDateTime::now_utc().date()),
    };

    let cfg = AppConfig::load()?;
    let export = cfg.metrics.as_ref().map(metrics_export::install).transpose()?;

    let res = run(&cfg, phone, month).await;

    // Counters from a failed run are still written.
    if let Some(export) = &export {
        export.write()?;
    }

    res
}
