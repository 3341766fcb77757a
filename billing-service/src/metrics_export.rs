use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Process-wide Prometheus recorder whose counters are written out once, when
/// a binary finishes its run.
pub struct MetricsExport {
    handle: PrometheusHandle,
    dump_path: Option<PathBuf>,
}

/// Install the Prometheus recorder as the global `metrics` recorder.
pub fn install(cfg: &MetricsConfig) -> anyhow::Result<MetricsExport> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus metrics recorder: {e}"))?;

    Ok(MetricsExport {
        handle,
        dump_path: cfg.dump_path.clone(),
    })
}

impl MetricsExport {
    /// Render every counter recorded so far to `dump_path`, or to stderr.
    pub fn write(&self) -> anyhow::Result<()> {
        write_rendered(&self.handle, self.dump_path.as_deref())
    }
}

pub fn write_rendered(handle: &PrometheusHandle, dump_path: Option<&Path>) -> anyhow::Result<()> {
    let rendered = handle.render();
    match dump_path {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("failed to write metrics to {}", path.display()))?;
            tracing::info!(path = %path.display(), "metrics written");
        }
        None => {
            let mut stderr = io::stderr().lock();
            stderr.write_all(rendered.as_bytes())?;
            stderr.flush()?;
        }
    }
    Ok(())
}
