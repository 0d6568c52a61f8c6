use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{JobId, StoreError};
use super::stages::{PipelineStage, StageRecord, StageView};

/// Opaque reference to a job-seeker account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger key; at most one application may exist per (job, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplicationKey {
    pub job_id: JobId,
    pub user_id: UserId,
}

impl ApplicationKey {
    pub fn new(job_id: JobId, user_id: UserId) -> Self {
        Self { job_id, user_id }
    }
}

/// Lifecycle state of an application, derived from pipeline position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    InProgress,
    Completed,
    Cancelled,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Rejected stage move; the application is left untouched when this fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move from stage {current} to stage {target}")]
pub struct TransitionError {
    pub current: usize,
    pub target: usize,
}

/// One seeker's pursuit of one job, tracked across the full pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub job_id: JobId,
    pub user_id: UserId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub current_stage: usize,
    pub stages: Vec<StageRecord>,
}

impl Application {
    /// Open a fresh application with the first pipeline stage already
    /// stamped and every later stage pending.
    pub fn submit(job_id: JobId, user_id: UserId, at: DateTime<Utc>) -> Self {
        let mut stages: Vec<StageRecord> = PipelineStage::ordered()
            .into_iter()
            .map(StageRecord::pending)
            .collect();
        if let Some(first) = stages.first_mut() {
            first.mark_completed(at);
        }
        Self {
            job_id,
            user_id,
            status: ApplicationStatus::Applied,
            applied_at: at,
            completed_at: None,
            current_stage: 0,
            stages,
        }
    }

    pub fn key(&self) -> ApplicationKey {
        ApplicationKey::new(self.job_id.clone(), self.user_id.clone())
    }

    /// Move the pipeline to `target`, which must be the current stage (a
    /// timestamp refresh) or the immediate next one. Returns the stage on a
    /// genuine first arrival so callers can fan out counter events; a refresh
    /// yields `Ok(None)`. Any other target is rejected without side effects.
    pub fn advance_to(
        &mut self,
        target: usize,
        at: DateTime<Utc>,
    ) -> Result<Option<PipelineStage>, TransitionError> {
        if target >= self.stages.len()
            || target < self.current_stage
            || target > self.current_stage + 1
        {
            return Err(TransitionError {
                current: self.current_stage,
                target,
            });
        }

        if target == self.current_stage {
            self.stages[target].mark_completed(at);
            return Ok(None);
        }

        self.stages[target].mark_completed(at);
        self.current_stage = target;
        let stage = self.stages[target].stage;
        if stage.is_terminal() {
            self.status = ApplicationStatus::Completed;
            self.completed_at = Some(at);
        } else {
            self.status = ApplicationStatus::InProgress;
        }
        Ok(Some(stage))
    }

    /// Stage the pipeline has reached so far.
    pub fn furthest_stage(&self) -> PipelineStage {
        self.stages
            .get(self.current_stage)
            .map(|record| record.stage)
            .unwrap_or(PipelineStage::Applied)
    }

    pub fn current_stage_name(&self) -> &'static str {
        self.furthest_stage().label()
    }

    /// Whole-pipeline completion as an integer percentage.
    pub fn progress_percent(&self) -> u8 {
        let span = self.stages.len().saturating_sub(1).max(1);
        ((self.current_stage * 100) / span) as u8
    }

    pub fn mark_cancelled(&mut self) {
        self.status = ApplicationStatus::Cancelled;
    }

    pub fn to_view(&self) -> ApplicationView {
        ApplicationView {
            job_id: self.job_id.clone(),
            user_id: self.user_id.clone(),
            status: self.status.label(),
            applied_at: self.applied_at,
            completed_at: self.completed_at,
            current_stage: self.current_stage_name(),
            progress_percent: self.progress_percent(),
            stages: self.stages.iter().map(StageView::from).collect(),
        }
    }
}

/// Read-model row for presenting an application to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationView {
    pub job_id: JobId,
    pub user_id: UserId,
    pub status: &'static str,
    pub applied_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub current_stage: &'static str,
    pub progress_percent: u8,
    pub stages: Vec<StageView>,
}

/// Storage abstraction for the application ledger.
pub trait ApplicationStore: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, StoreError>;
    /// Replace the stored record for the application's key.
    fn update(&self, application: Application) -> Result<Application, StoreError>;
    fn fetch(&self, key: &ApplicationKey) -> Result<Option<Application>, StoreError>;
    fn remove(&self, key: &ApplicationKey) -> Result<Option<Application>, StoreError>;
    /// A user's applications in the order they were submitted.
    fn by_user(&self, user_id: &UserId) -> Result<Vec<Application>, StoreError>;
    /// A job's applications in the order they were submitted.
    fn by_job(&self, job_id: &JobId) -> Result<Vec<Application>, StoreError>;
    /// Drop every application for a job, returning the removed records.
    fn remove_for_job(&self, job_id: &JobId) -> Result<Vec<Application>, StoreError>;
}

#[derive(Default)]
struct LedgerState {
    entries: HashMap<ApplicationKey, Application>,
    order: Vec<ApplicationKey>,
}

/// Process-local ledger used by the server, the demo, and tests.
///
/// Submission order doubles as the `applied_at` ordering: entries are only
/// ever appended, so the order vector stays ascending by submission time.
#[derive(Default)]
pub struct InMemoryApplicationStore {
    state: Mutex<LedgerState>,
}

impl ApplicationStore for InMemoryApplicationStore {
    fn insert(&self, application: Application) -> Result<Application, StoreError> {
        let mut state = self.state.lock().expect("ledger mutex poisoned");
        let key = application.key();
        if state.entries.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        state.order.push(key.clone());
        state.entries.insert(key, application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<Application, StoreError> {
        let mut state = self.state.lock().expect("ledger mutex poisoned");
        let key = application.key();
        match state.entries.get_mut(&key) {
            Some(slot) => {
                *slot = application.clone();
                Ok(application)
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn fetch(&self, key: &ApplicationKey) -> Result<Option<Application>, StoreError> {
        let state = self.state.lock().expect("ledger mutex poisoned");
        Ok(state.entries.get(key).cloned())
    }

    fn remove(&self, key: &ApplicationKey) -> Result<Option<Application>, StoreError> {
        let mut state = self.state.lock().expect("ledger mutex poisoned");
        let removed = state.entries.remove(key);
        if removed.is_some() {
            state.order.retain(|known| known != key);
        }
        Ok(removed)
    }

    fn by_user(&self, user_id: &UserId) -> Result<Vec<Application>, StoreError> {
        let state = self.state.lock().expect("ledger mutex poisoned");
        Ok(state
            .order
            .iter()
            .filter(|key| &key.user_id == user_id)
            .filter_map(|key| state.entries.get(key).cloned())
            .collect())
    }

    fn by_job(&self, job_id: &JobId) -> Result<Vec<Application>, StoreError> {
        let state = self.state.lock().expect("ledger mutex poisoned");
        Ok(state
            .order
            .iter()
            .filter(|key| &key.job_id == job_id)
            .filter_map(|key| state.entries.get(key).cloned())
            .collect())
    }

    fn remove_for_job(&self, job_id: &JobId) -> Result<Vec<Application>, StoreError> {
        let mut state = self.state.lock().expect("ledger mutex poisoned");
        let doomed: Vec<ApplicationKey> = state
            .order
            .iter()
            .filter(|key| &key.job_id == job_id)
            .cloned()
            .collect();
        let mut removed = Vec::with_capacity(doomed.len());
        for key in &doomed {
            if let Some(application) = state.entries.remove(key) {
                removed.push(application);
            }
        }
        state.order.retain(|key| &key.job_id != job_id);
        Ok(removed)
    }
}
