use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::catalog::{Job, JobCatalog, JobDraft, JobId, JobUpdate, StoreError};
use super::coordinator::{CounterCoordinator, LedgerEvent};
use super::filter::{filter_jobs, SearchFilter, SearchQuery};
use super::ledger::{
    Application, ApplicationKey, ApplicationStore, ApplicationView, TransitionError, UserId,
};

/// Service composing the job catalog, the application ledger, and the
/// counter coordinator. All marketplace operations go through here; the
/// stores are never reached around it.
pub struct MarketplaceService<C, L> {
    catalog: Arc<C>,
    ledger: Arc<L>,
    coordinator: CounterCoordinator<C>,
    sequence: AtomicU64,
}

/// Result of an application attempt. Repeat attempts, missing jobs, and
/// closed jobs are all ordinary outcomes rather than errors; the ledger
/// stays silent on intents it cannot honor.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Submitted(Application),
    AlreadyApplied,
    JobUnavailable,
}

impl<C, L> MarketplaceService<C, L>
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    pub fn new(catalog: Arc<C>, ledger: Arc<L>) -> Self {
        let coordinator = CounterCoordinator::new(Arc::clone(&catalog));
        Self {
            catalog,
            ledger,
            coordinator,
            sequence: AtomicU64::new(1),
        }
    }

    fn next_job_id(&self) -> JobId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        JobId(format!("job-{id:06}"))
    }

    /// Every posted job, most recent first.
    pub fn list_jobs(&self) -> Result<Vec<Job>, MarketplaceError> {
        Ok(self.catalog.list()?)
    }

    pub fn get_job(&self, job_id: &JobId) -> Result<Job, MarketplaceError> {
        self.catalog
            .fetch(job_id)?
            .ok_or(MarketplaceError::JobNotFound)
    }

    /// Publish a draft as a fresh Active posting with zeroed counters.
    pub fn create_job(&self, draft: JobDraft) -> Result<Job, MarketplaceError> {
        let job = Job::from_draft(self.next_job_id(), draft, Utc::now());
        Ok(self.catalog.insert(job)?)
    }

    /// Merge a partial edit into a posting. Counters are not editable; the
    /// patch type cannot express them.
    pub fn update_job(&self, job_id: &JobId, patch: JobUpdate) -> Result<Job, MarketplaceError> {
        self.catalog.update(job_id, patch).map_err(|err| match err {
            StoreError::NotFound => MarketplaceError::JobNotFound,
            other => MarketplaceError::Store(other),
        })
    }

    /// Remove a posting and every application filed against it. The cascade
    /// raises no ledger events; the counters disappear with the job.
    pub fn delete_job(&self, job_id: &JobId) -> Result<Job, MarketplaceError> {
        let removed = self
            .catalog
            .remove(job_id)?
            .ok_or(MarketplaceError::JobNotFound)?;
        self.ledger.remove_for_job(job_id)?;
        Ok(removed)
    }

    /// Catalog listing narrowed by the caller's constraints, lazily and in
    /// listing order. Constraint parsing is lenient; garbage input widens
    /// the search instead of failing it.
    pub fn search(&self, query: SearchQuery) -> Result<Vec<Job>, MarketplaceError> {
        let filter = SearchFilter::from_query(query);
        let jobs = self.catalog.list()?;
        Ok(filter_jobs(jobs.iter(), &filter).cloned().collect())
    }

    /// File an application for `user_id` against `job_id`. A repeat attempt
    /// by the same user is a no-op reported as `AlreadyApplied`; a missing,
    /// paused, or completed job is the `JobUnavailable` no-op. The applicant
    /// counter moves only on a genuine submission.
    pub fn apply(&self, job_id: &JobId, user_id: &UserId) -> Result<ApplyOutcome, MarketplaceError> {
        let unavailable = match self.catalog.fetch(job_id)? {
            Some(job) => !job.status.accepts_applications(),
            None => true,
        };
        if unavailable {
            return Ok(ApplyOutcome::JobUnavailable);
        }

        let key = ApplicationKey::new(job_id.clone(), user_id.clone());
        if self.ledger.fetch(&key)?.is_some() {
            return Ok(ApplyOutcome::AlreadyApplied);
        }

        let application = Application::submit(job_id.clone(), user_id.clone(), Utc::now());
        let stored = match self.ledger.insert(application) {
            Ok(stored) => stored,
            Err(StoreError::Conflict) => return Ok(ApplyOutcome::AlreadyApplied),
            Err(other) => return Err(other.into()),
        };
        self.coordinator.observe(&LedgerEvent::Applied {
            job_id: job_id.clone(),
        })?;
        Ok(ApplyOutcome::Submitted(stored))
    }

    /// Withdraw an application, reversing whatever counter increments it
    /// earned. Returns the removed record marked `Cancelled`, or `None`
    /// when no such application exists.
    pub fn cancel(
        &self,
        job_id: &JobId,
        user_id: &UserId,
    ) -> Result<Option<Application>, MarketplaceError> {
        let key = ApplicationKey::new(job_id.clone(), user_id.clone());
        let Some(mut application) = self.ledger.remove(&key)? else {
            return Ok(None);
        };
        let furthest = application.furthest_stage();
        application.mark_cancelled();
        self.coordinator.observe(&LedgerEvent::Cancelled {
            job_id: job_id.clone(),
            furthest,
        })?;
        Ok(Some(application))
    }

    /// Move an application to `target_stage`. Only the immediate next stage
    /// (or the current one, refreshing its timestamp) is accepted; on
    /// rejection nothing is persisted.
    pub fn advance_stage(
        &self,
        job_id: &JobId,
        user_id: &UserId,
        target_stage: usize,
    ) -> Result<Application, MarketplaceError> {
        let key = ApplicationKey::new(job_id.clone(), user_id.clone());
        let mut application =
            self.ledger
                .fetch(&key)?
                .ok_or_else(|| MarketplaceError::ApplicationNotFound {
                    job_id: job_id.clone(),
                    user_id: user_id.clone(),
                })?;

        let reached = application.advance_to(target_stage, Utc::now())?;
        let stored = self.ledger.update(application)?;
        if let Some(stage) = reached {
            self.coordinator.observe(&LedgerEvent::StageReached {
                job_id: job_id.clone(),
                stage,
            })?;
        }
        Ok(stored)
    }

    /// A user's applications as presentation rows, oldest submission first.
    pub fn applications_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ApplicationView>, MarketplaceError> {
        let applications = self.ledger.by_user(user_id)?;
        Ok(applications.iter().map(Application::to_view).collect())
    }

    /// A job's applications as presentation rows, oldest submission first.
    /// Unlike the user projection, the job must exist.
    pub fn applications_for_job(
        &self,
        job_id: &JobId,
    ) -> Result<Vec<ApplicationView>, MarketplaceError> {
        if self.catalog.fetch(job_id)?.is_none() {
            return Err(MarketplaceError::JobNotFound);
        }
        let applications = self.ledger.by_job(job_id)?;
        Ok(applications.iter().map(Application::to_view).collect())
    }
}

/// Error raised by the marketplace service.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error("job not found")]
    JobNotFound,
    #[error("no application by user {user_id} for job {job_id}")]
    ApplicationNotFound { job_id: JobId, user_id: UserId },
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
