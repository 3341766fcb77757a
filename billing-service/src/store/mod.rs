use std::path::Path;

use serde_json::Value;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to a hierarchical JSON document database.
///
/// Paths are `/`-separated; empty segments are ignored and the empty path
/// addresses the root.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;
}

pub(crate) fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Whole-database export held in memory.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    root: Value,
}

impl JsonSnapshotStore {
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let root: Value = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded json snapshot");
        Ok(Self::from_value(root))
    }

    fn lookup(&self, path: &str) -> Option<&Value> {
        path_segments(path).try_fold(&self.root, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

#[async_trait::async_trait]
impl DocumentStore for JsonSnapshotStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lookup(path).filter(|v| !v.is_null()).cloned())
    }
}
