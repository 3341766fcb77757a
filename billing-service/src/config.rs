use billing_core::domain::Tariff;
use anyhow::Context;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// JSON export of the whole building database.
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    pub default_electric_price: f64,
    pub default_water_price: f64,
}

impl BillingConfig {
    pub fn default_tariff(&self) -> Tariff {
        Tariff::new(self.default_electric_price, self.default_water_price)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_true")]
    pub csv_has_headers: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { csv_has_headers: true }
    }
}

fn default_true() -> bool {
    true
}

/// Counters are rendered in Prometheus text format when a binary exits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// Write the rendered counters here instead of stderr.
    pub dump_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub billing: BillingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn path() -> PathBuf {
        std::env::var_os("BILLING_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("billing-config.toml"))
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::path())
    }

    /// Like [`AppConfig::load`], but a missing file is `None`. A file that
    /// exists and fails to read or parse is still an error.
    pub fn load_optional() -> anyhow::Result<Option<Self>> {
        Self::load_optional_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn load_optional_from(path: &Path) -> anyhow::Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let cfg = Self::from_toml(&contents).with_context(|| format!("invalid config {}", path.display()))?;
                Ok(Some(cfg))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context(format!("failed to read config {}", path.display()))),
        }
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}
