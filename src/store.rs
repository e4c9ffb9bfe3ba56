use std::sync::Arc;

use chrono::Local;
use tracing::{debug, error, warn};

use crate::error::StoreError;
use crate::models::{Question, TIMESTAMP_FORMAT};
use crate::normalize::{questions_from_table, table_from_questions, version_of};
use crate::table::TableBackend;

/// Result of `QuestionStore::read`. On failure `questions` is empty.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub questions: Vec<Question>,
    pub error: Option<StoreError>,
    /// Content version of the table that was read; `None` on failure.
    pub version: Option<String>,
}

/// Result of `QuestionStore::write`.
#[derive(Debug, Clone, Default)]
pub struct WriteOutcome {
    pub ok: bool,
    pub error: Option<StoreError>,
    /// Content version of the table that was written; `None` on failure.
    pub version: Option<String>,
}

impl WriteOutcome {
    fn failed(e: StoreError) -> Self {
        Self { ok: false, error: Some(e), version: None }
    }

    pub fn into_result(self) -> Result<Option<String>, StoreError> {
        match (self.ok, self.error) {
            (true, _) => Ok(self.version),
            (false, Some(e)) => Err(e),
            (false, None) => Err(StoreError::Transport("write failed".into())),
        }
    }
}

pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Shared read/normalize/write contract over one remote table.
///
/// Neither operation returns `Err`: failures come back inside the outcome.
/// Writes replace the whole table and are not coordinated between writers
/// unless `version_check` is on and the caller uses `write_if_unchanged`.
#[derive(Clone)]
pub struct QuestionStore {
    backend: Arc<dyn TableBackend>,
    version_check: bool,
}

impl QuestionStore {
    pub fn new(backend: Arc<dyn TableBackend>) -> Self {
        Self { backend, version_check: false }
    }

    pub fn with_version_check(mut self, enabled: bool) -> Self {
        self.version_check = enabled;
        self
    }

    pub fn version_check(&self) -> bool {
        self.version_check
    }

    pub async fn read(&self) -> ReadOutcome {
        match self.backend.fetch_all_rows().await {
            Ok(table) => {
                let questions = questions_from_table(&table, &now_timestamp());
                debug!(rows = questions.len(), "read questions");
                ReadOutcome { questions, error: None, version: Some(version_of(&table)) }
            }
            Err(e) => {
                warn!("reading questions failed: {e}");
                ReadOutcome { questions: Vec::new(), error: Some(e), version: None }
            }
        }
    }

    pub async fn write(&self, questions: &[Question]) -> WriteOutcome {
        let table = table_from_questions(questions);
        match self.backend.replace_all_rows(&table).await {
            Ok(()) => {
                debug!(rows = questions.len(), "wrote questions");
                WriteOutcome { ok: true, error: None, version: Some(version_of(&table)) }
            }
            Err(e) => {
                error!("writing questions failed: {e}");
                WriteOutcome::failed(e)
            }
        }
    }

    /// Write only if the table still has content version `base`.
    ///
    /// The check and the write are two separate backend calls, so a writer
    /// landing between them is still lost.
    pub async fn write_if_unchanged(&self, questions: &[Question], base: &str) -> WriteOutcome {
        let current = match self.backend.fetch_all_rows().await {
            Ok(t) => version_of(&t),
            Err(e) => {
                error!("version check before write failed: {e}");
                return WriteOutcome::failed(e);
            }
        };
        if current != base {
            warn!("refusing write: table changed since last read");
            return WriteOutcome::failed(StoreError::Conflict);
        }
        self.write(questions).await
    }
}
