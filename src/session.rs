use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::models::*;
use crate::store::{now_timestamp, QuestionStore};
use crate::views;

/// One open dashboard: its own snapshot of the question list.
///
/// Every mutation copies the snapshot, applies one change and writes the
/// whole copy back. The snapshot is only replaced once the write succeeds.
pub struct Session {
    kind: DashboardKind,
    store: Arc<QuestionStore>,
    snapshot: Vec<Question>,
    version: Option<String>,
    refresh_every: Duration,
    refreshed_at: Instant,
    touched_at: Instant,
}

impl Session {
    pub fn new(kind: DashboardKind, store: Arc<QuestionStore>, refresh_every: Duration) -> Self {
        let now = Instant::now();
        Self {
            kind,
            store,
            snapshot: Vec::new(),
            version: None,
            refresh_every,
            refreshed_at: now,
            touched_at: now,
        }
    }

    pub fn kind(&self) -> DashboardKind {
        self.kind
    }

    pub fn questions(&self) -> &[Question] {
        &self.snapshot
    }

    fn touch(&mut self) {
        self.touched_at = Instant::now();
    }

    fn require(&self, kind: DashboardKind) -> Result<(), SessionError> {
        if self.kind != kind {
            return Err(SessionError::WrongDashboard);
        }
        Ok(())
    }

    /// Reload from the store. A failed read leaves an empty snapshot and is
    /// only logged.
    pub async fn refresh(&mut self) {
        self.touch();
        let outcome = self.store.read().await;
        if let Some(e) = &outcome.error {
            warn!(kind = ?self.kind, "refresh failed, showing empty list: {e}");
        }
        self.snapshot = outcome.questions;
        self.version = outcome.version;
        self.refreshed_at = Instant::now();
    }

    /// Refresh if the poll interval has elapsed (a zero interval never polls).
    pub async fn refresh_if_stale(&mut self) {
        if !self.refresh_every.is_zero() && self.refreshed_at.elapsed() >= self.refresh_every {
            self.refresh().await;
        }
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            kind: self.kind,
            questions: views::cards(&self.snapshot),
            counts: views::counts(&self.snapshot),
            by_status: match self.kind {
                DashboardKind::Moderator => Some(views::status_aggregate(&self.snapshot)),
                DashboardKind::Submitter => None,
            },
        }
    }

    async fn commit(&mut self, next: Vec<Question>) -> Result<(), SessionError> {
        let outcome = match self.version.as_deref() {
            Some(base) if self.store.version_check() => self.store.write_if_unchanged(&next, base).await,
            _ => self.store.write(&next).await,
        };
        self.version = outcome.into_result()?;
        self.snapshot = next;
        Ok(())
    }

    fn position(&self, id: Id) -> Result<usize, SessionError> {
        self.snapshot.iter().position(|q| q.id == id).ok_or(SessionError::NotFound(id))
    }

    pub async fn submit(&mut self, new: NewQuestion) -> Result<Question, SessionError> {
        self.touch();
        self.require(DashboardKind::Submitter)?;
        if new.text.trim().is_empty() {
            return Err(SessionError::EmptyText);
        }
        let submitter = new
            .submitter
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS.to_string());
        let id = self
            .snapshot
            .iter()
            .map(|q| q.id)
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or(SessionError::IdsExhausted)?;
        let question = Question {
            id,
            text: new.text,
            submitter,
            votes: 0,
            timestamp: now_timestamp(),
            status: Status::Pending,
        };
        let mut next = self.snapshot.clone();
        next.push(question.clone());
        self.commit(next).await?;
        info!(id = question.id, "question submitted");
        Ok(question)
    }

    pub async fn vote(&mut self, id: Id) -> Result<Question, SessionError> {
        self.touch();
        self.require(DashboardKind::Submitter)?;
        let idx = self.position(id)?;
        let mut next = self.snapshot.clone();
        next[idx].votes = next[idx]
            .votes
            .checked_add(1)
            .ok_or(SessionError::VoteLimit(id))?;
        let voted = next[idx].clone();
        self.commit(next).await?;
        Ok(voted)
    }

    pub async fn set_status(&mut self, id: Id, status: Status) -> Result<Question, SessionError> {
        self.touch();
        self.require(DashboardKind::Moderator)?;
        if let Status::Other(raw) = &status {
            return Err(SessionError::InvalidStatus(raw.clone()));
        }
        let idx = self.position(id)?;
        let mut next = self.snapshot.clone();
        next[idx].status = status;
        let updated = next[idx].clone();
        self.commit(next).await?;
        info!(id, status = %updated.status, "question status changed");
        Ok(updated)
    }

    /// Move every non-deleted `asked` question back to `pending`. Returns how
    /// many changed.
    pub async fn reset_all_to_pending(&mut self) -> Result<usize, SessionError> {
        self.touch();
        self.require(DashboardKind::Moderator)?;
        let mut next = self.snapshot.clone();
        let mut changed = 0;
        for q in next.iter_mut().filter(|q| q.status == Status::Asked) {
            q.status = Status::Pending;
            changed += 1;
        }
        self.commit(next).await?;
        info!(changed, "reset asked questions to pending");
        Ok(changed)
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

/// Open dashboards keyed by session id.
pub struct SessionRegistry {
    store: Arc<QuestionStore>,
    sessions: DashMap<Uuid, SharedSession>,
    refresh_every: Duration,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(store: Arc<QuestionStore>, refresh_every: Duration, ttl: Duration) -> Self {
        Self { store, sessions: DashMap::new(), refresh_every, ttl }
    }

    /// Open a dashboard and load its first snapshot.
    pub async fn open(&self, kind: DashboardKind) -> (Uuid, SharedSession) {
        self.prune_idle();
        let mut session = Session::new(kind, self.store.clone(), self.refresh_every);
        session.refresh().await;
        let id = Uuid::new_v4();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.insert(id, shared.clone());
        info!(%id, ?kind, "session opened");
        (id, shared)
    }

    pub fn get(&self, id: &Uuid) -> Option<SharedSession> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    pub fn close(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle longer than the TTL. Busy sessions are kept.
    pub fn prune_idle(&self) -> usize {
        let before = self.sessions.len();
        let ttl = self.ttl;
        self.sessions.retain(|_, s| match s.try_lock() {
            Ok(session) => session.touched_at.elapsed() < ttl,
            Err(_) => true,
        });
        let pruned = before.saturating_sub(self.sessions.len());
        if pruned > 0 {
            info!(pruned, "pruned idle sessions");
        }
        pruned
    }
}
