use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for posted jobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to the provider account that posted a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(pub String);

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payment cadence attached to an opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayCadence {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Fixed,
}

impl PayCadence {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hourly => "Hourly",
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Fixed => "Fixed",
        }
    }

    /// Lenient parse for search input; anything unrecognized is `None`.
    pub fn parse_loose(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// Publication state of a job record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    Paused,
    Completed,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    pub const fn accepts_applications(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Lenient parse for imported data; anything unrecognized is `None`.
    pub fn parse_loose(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// A posted work opportunity owned by the catalog store.
///
/// The `applicants`, `shortlisted`, and `recruited` counters are derived
/// exclusively from the application ledger; only the counter coordinator
/// writes them, via [`JobCatalog::adjust_counters`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub provider: ProviderId,
    pub description: String,
    pub location: String,
    pub skills: BTreeSet<String>,
    pub pay_amount: u32,
    pub pay_cadence: PayCadence,
    pub work_type: String,
    pub min_rating: f32,
    pub applicants: u32,
    pub shortlisted: u32,
    pub recruited: u32,
    pub status: JobStatus,
    pub posted_at: DateTime<Utc>,
}

impl Job {
    /// Build a fresh Active record with zeroed counters from a draft.
    pub fn from_draft(id: JobId, draft: JobDraft, posted_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            provider: draft.provider,
            description: draft.description,
            location: draft.location,
            skills: draft.skills,
            pay_amount: draft.pay_amount,
            pay_cadence: draft.pay_cadence,
            work_type: draft.work_type,
            min_rating: draft.min_rating,
            applicants: 0,
            shortlisted: 0,
            recruited: 0,
            status: JobStatus::Active,
            posted_at,
        }
    }
}

/// Provider-supplied fields for a new posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    pub provider: ProviderId,
    #[serde(default)]
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    pub pay_amount: u32,
    pub pay_cadence: PayCadence,
    #[serde(default)]
    pub work_type: String,
    #[serde(default)]
    pub min_rating: f32,
}

/// Typed partial update for a job. Counter fields are deliberately not
/// representable here; edits cannot touch them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Option<BTreeSet<String>>,
    #[serde(default)]
    pub pay_amount: Option<u32>,
    #[serde(default)]
    pub pay_cadence: Option<PayCadence>,
    #[serde(default)]
    pub work_type: Option<String>,
    #[serde(default)]
    pub min_rating: Option<f32>,
    #[serde(default)]
    pub status: Option<JobStatus>,
}

/// Signed counter adjustment applied by the coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterDelta {
    pub applicants: i8,
    pub shortlisted: i8,
    pub recruited: i8,
}

/// Error enumeration shared by the catalog and ledger stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction for job records so the service and router can be
/// exercised against test doubles.
pub trait JobCatalog: Send + Sync {
    fn insert(&self, job: Job) -> Result<Job, StoreError>;
    /// Merge the populated patch fields; `NotFound` when the id is absent.
    fn update(&self, id: &JobId, patch: JobUpdate) -> Result<Job, StoreError>;
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, StoreError>;
    /// Every non-deleted job, most recent posting first.
    fn list(&self) -> Result<Vec<Job>, StoreError>;
    fn remove(&self, id: &JobId) -> Result<Option<Job>, StoreError>;
    /// Reserved for the counter coordinator; saturates at zero.
    fn adjust_counters(&self, id: &JobId, delta: CounterDelta) -> Result<(), StoreError>;
}

#[derive(Default)]
struct CatalogState {
    jobs: HashMap<JobId, Job>,
    order: Vec<JobId>,
}

/// Process-local catalog used by the server, the demo, and tests.
#[derive(Default)]
pub struct InMemoryJobCatalog {
    state: Mutex<CatalogState>,
}

impl JobCatalog for InMemoryJobCatalog {
    fn insert(&self, job: Job) -> Result<Job, StoreError> {
        let mut state = self.state.lock().expect("catalog mutex poisoned");
        if state.jobs.contains_key(&job.id) {
            return Err(StoreError::Conflict);
        }
        state.order.push(job.id.clone());
        state.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn update(&self, id: &JobId, patch: JobUpdate) -> Result<Job, StoreError> {
        let mut state = self.state.lock().expect("catalog mutex poisoned");
        let job = state.jobs.get_mut(id).ok_or(StoreError::NotFound)?;

        if let Some(title) = patch.title {
            job.title = title;
        }
        if let Some(description) = patch.description {
            job.description = description;
        }
        if let Some(location) = patch.location {
            job.location = location;
        }
        if let Some(skills) = patch.skills {
            job.skills = skills;
        }
        if let Some(pay_amount) = patch.pay_amount {
            job.pay_amount = pay_amount;
        }
        if let Some(pay_cadence) = patch.pay_cadence {
            job.pay_cadence = pay_cadence;
        }
        if let Some(work_type) = patch.work_type {
            job.work_type = work_type;
        }
        if let Some(min_rating) = patch.min_rating {
            job.min_rating = min_rating;
        }
        if let Some(status) = patch.status {
            job.status = status;
        }

        Ok(job.clone())
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, StoreError> {
        let state = self.state.lock().expect("catalog mutex poisoned");
        Ok(state.jobs.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Job>, StoreError> {
        let state = self.state.lock().expect("catalog mutex poisoned");
        Ok(state
            .order
            .iter()
            .rev()
            .filter_map(|id| state.jobs.get(id).cloned())
            .collect())
    }

    fn remove(&self, id: &JobId) -> Result<Option<Job>, StoreError> {
        let mut state = self.state.lock().expect("catalog mutex poisoned");
        let removed = state.jobs.remove(id);
        if removed.is_some() {
            state.order.retain(|known| known != id);
        }
        Ok(removed)
    }

    fn adjust_counters(&self, id: &JobId, delta: CounterDelta) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("catalog mutex poisoned");
        let job = state.jobs.get_mut(id).ok_or(StoreError::NotFound)?;
        job.applicants = shift(job.applicants, delta.applicants);
        job.shortlisted = shift(job.shortlisted, delta.shortlisted);
        job.recruited = shift(job.recruited, delta.recruited);
        Ok(())
    }
}

fn shift(value: u32, delta: i8) -> u32 {
    if delta >= 0 {
        value.saturating_add(delta as u32)
    } else {
        value.saturating_sub(u32::from(delta.unsigned_abs()))
    }
}
