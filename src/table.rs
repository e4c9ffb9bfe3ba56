use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::BackendConfig;
use crate::error::StoreError;

/// Header row plus data rows, as the remote spreadsheet hands them out.
///
/// Rows may be shorter than the header (trailing blanks are dropped by most
/// spreadsheet APIs); `cell` pads them with `Null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

static MISSING: Value = Value::Null;

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Build from a raw value grid whose first row is the header.
    pub fn from_grid(mut grid: Vec<Vec<Value>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let header = grid.remove(0);
        let columns = header.iter().map(cell_text).collect();
        Self { columns, rows: grid }
    }

    /// Inverse of `from_grid`. A table without columns yields an empty grid.
    pub fn to_grid(&self) -> Vec<Vec<Value>> {
        if self.columns.is_empty() {
            return Vec::new();
        }
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.columns.iter().cloned().map(Value::String).collect());
        grid.extend(self.rows.iter().cloned());
        grid
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&MISSING)
    }

    /// Hex SHA-256 over the JSON encoding of the table.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }
}

/// Text rendering of a cell. Null is the empty string.
pub fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The only two calls the question store needs from the remote table.
#[async_trait]
pub trait TableBackend: Send + Sync {
    async fn fetch_all_rows(&self) -> Result<Table, StoreError>;
    /// Replace the whole table. There is no partial update.
    async fn replace_all_rows(&self, table: &Table) -> Result<(), StoreError>;
}

pub mod inmem {
    use super::*;
    use std::path::{Path, PathBuf};
    use tokio::sync::RwLock;
    use tracing::{info, warn};

    const SNAPSHOT_FILE: &str = "questions.json";

    /// In-process table, optionally snapshotted to `<data_dir>/questions.json`
    /// after every replace.
    #[derive(Clone, Default)]
    pub struct InMemTable {
        state: Arc<RwLock<Table>>,
        snapshot_path: Option<Arc<PathBuf>>,
    }

    impl InMemTable {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_table(table: Table) -> Self {
            Self { state: Arc::new(RwLock::new(table)), snapshot_path: None }
        }

        pub fn with_snapshot_dir(dir: impl AsRef<Path>) -> Self {
            let path = dir.as_ref().join(SNAPSHOT_FILE);
            let table = Self::load_from(&path);
            Self {
                state: Arc::new(RwLock::new(table)),
                snapshot_path: Some(Arc::new(path)),
            }
        }

        fn load_from(path: &Path) -> Table {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<Table>(&bytes) {
                    Ok(t) => {
                        info!(path = %path.display(), rows = t.rows.len(), "loaded table snapshot");
                        t
                    }
                    Err(e) => {
                        warn!(path = %path.display(), "failed to parse table snapshot: {e}; starting empty");
                        Table::default()
                    }
                },
                Err(e) => {
                    info!(path = %path.display(), "no table snapshot ({e}); starting empty");
                    Table::default()
                }
            }
        }

        /// Write the snapshot file on the blocking pool. Callers hold the
        /// state write guard across the await, so snapshot writes never
        /// interleave.
        async fn persist(&self, table: &Table) -> Result<(), StoreError> {
            let Some(path) = self.snapshot_path.clone() else { return Ok(()) };
            let bytes = serde_json::to_vec_pretty(table)
                .map_err(|e| StoreError::Decode(e.to_string()))?;
            tokio::task::spawn_blocking(move || {
                if let Some(dir) = path.parent() {
                    std::fs::create_dir_all(dir)
                        .map_err(|e| StoreError::Transport(format!("{}: {e}", dir.display())))?;
                }
                std::fs::write(path.as_path(), bytes)
                    .map_err(|e| StoreError::Transport(format!("{}: {e}", path.display())))
            })
            .await
            .map_err(|e| StoreError::Transport(format!("snapshot writer: {e}")))?
        }
    }

    #[async_trait]
    impl TableBackend for InMemTable {
        async fn fetch_all_rows(&self) -> Result<Table, StoreError> {
            Ok(self.state.read().await.clone())
        }

        async fn replace_all_rows(&self, table: &Table) -> Result<(), StoreError> {
            let mut s = self.state.write().await;
            self.persist(table).await?;
            *s = table.clone();
            Ok(())
        }
    }
}

/// Pick the backend named by configuration.
pub fn build_backend(cfg: &BackendConfig) -> anyhow::Result<Arc<dyn TableBackend>> {
    match cfg {
        BackendConfig::InMem { data_dir: Some(dir) } => {
            Ok(Arc::new(inmem::InMemTable::with_snapshot_dir(dir)))
        }
        BackendConfig::InMem { data_dir: None } => Ok(Arc::new(inmem::InMemTable::new())),
        BackendConfig::Sheets(sheets) => Ok(Arc::new(crate::sheets::SheetsTable::new(sheets)?)),
    }
}
