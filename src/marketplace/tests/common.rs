use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::marketplace::catalog::{
    CounterDelta, InMemoryJobCatalog, Job, JobCatalog, JobDraft, JobId, JobUpdate, PayCadence,
    ProviderId, StoreError,
};
use crate::marketplace::ledger::{
    Application, ApplicationKey, ApplicationStore, InMemoryApplicationStore, UserId,
};
use crate::marketplace::{marketplace_router, MarketplaceService};

pub(super) fn draft(title: &str, location: &str) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        provider: ProviderId("prov-001".to_string()),
        description: format!("{title} posted for testing"),
        location: location.to_string(),
        skills: BTreeSet::new(),
        pay_amount: 12_000,
        pay_cadence: PayCadence::Monthly,
        work_type: "Contract".to_string(),
        min_rating: 3.5,
    }
}

pub(super) fn plumbing_draft() -> JobDraft {
    let mut draft = draft("Residential Plumbing Rounds", "Chennai");
    draft.skills = skills(&["Plumbing", "Pipe Fitting"]);
    draft.pay_amount = 18_000;
    draft.min_rating = 4.0;
    draft
}

pub(super) fn cleaning_draft() -> JobDraft {
    let mut draft = draft("Office Deep Cleaning", "Mumbai");
    draft.skills = skills(&["Cleaning"]);
    draft.pay_amount = 15_000;
    draft
}

pub(super) fn security_draft() -> JobDraft {
    let mut draft = draft("Evening Security Shift", "Chennai");
    draft.skills = skills(&["Security"]);
    draft.pay_amount = 900;
    draft.pay_cadence = PayCadence::Daily;
    draft.min_rating = 4.2;
    draft
}

pub(super) fn skills(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

pub(super) fn job_from_draft(id: &str, draft: JobDraft) -> Job {
    Job::from_draft(JobId(id.to_string()), draft, Utc::now())
}

pub(super) fn user(name: &str) -> UserId {
    UserId(name.to_string())
}

pub(super) fn build_service() -> (
    MarketplaceService<InMemoryJobCatalog, InMemoryApplicationStore>,
    Arc<InMemoryJobCatalog>,
    Arc<InMemoryApplicationStore>,
) {
    let catalog = Arc::new(InMemoryJobCatalog::default());
    let ledger = Arc::new(InMemoryApplicationStore::default());
    let service = MarketplaceService::new(catalog.clone(), ledger.clone());
    (service, catalog, ledger)
}

pub(super) fn marketplace_router_with_service(
    service: MarketplaceService<InMemoryJobCatalog, InMemoryApplicationStore>,
) -> axum::Router {
    marketplace_router(Arc::new(service))
}

/// Ledger double whose insert always reports an existing record.
pub(super) struct ConflictLedger;

impl ApplicationStore for ConflictLedger {
    fn insert(&self, _application: Application) -> Result<Application, StoreError> {
        Err(StoreError::Conflict)
    }

    fn update(&self, _application: Application) -> Result<Application, StoreError> {
        Err(StoreError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, _key: &ApplicationKey) -> Result<Option<Application>, StoreError> {
        Ok(None)
    }

    fn remove(&self, _key: &ApplicationKey) -> Result<Option<Application>, StoreError> {
        Ok(None)
    }

    fn by_user(&self, _user_id: &UserId) -> Result<Vec<Application>, StoreError> {
        Ok(Vec::new())
    }

    fn by_job(&self, _job_id: &JobId) -> Result<Vec<Application>, StoreError> {
        Ok(Vec::new())
    }

    fn remove_for_job(&self, _job_id: &JobId) -> Result<Vec<Application>, StoreError> {
        Ok(Vec::new())
    }
}

/// Ledger double that fails every call.
pub(super) struct UnavailableLedger;

impl ApplicationStore for UnavailableLedger {
    fn insert(&self, _application: Application) -> Result<Application, StoreError> {
        Err(StoreError::Unavailable("ledger offline".to_string()))
    }

    fn update(&self, _application: Application) -> Result<Application, StoreError> {
        Err(StoreError::Unavailable("ledger offline".to_string()))
    }

    fn fetch(&self, _key: &ApplicationKey) -> Result<Option<Application>, StoreError> {
        Err(StoreError::Unavailable("ledger offline".to_string()))
    }

    fn remove(&self, _key: &ApplicationKey) -> Result<Option<Application>, StoreError> {
        Err(StoreError::Unavailable("ledger offline".to_string()))
    }

    fn by_user(&self, _user_id: &UserId) -> Result<Vec<Application>, StoreError> {
        Err(StoreError::Unavailable("ledger offline".to_string()))
    }

    fn by_job(&self, _job_id: &JobId) -> Result<Vec<Application>, StoreError> {
        Err(StoreError::Unavailable("ledger offline".to_string()))
    }

    fn remove_for_job(&self, _job_id: &JobId) -> Result<Vec<Application>, StoreError> {
        Err(StoreError::Unavailable("ledger offline".to_string()))
    }
}

/// Catalog double that fails every call.
pub(super) struct UnavailableCatalog;

impl JobCatalog for UnavailableCatalog {
    fn insert(&self, _job: Job) -> Result<Job, StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }

    fn update(&self, _id: &JobId, _patch: JobUpdate) -> Result<Job, StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }

    fn fetch(&self, _id: &JobId) -> Result<Option<Job>, StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }

    fn list(&self) -> Result<Vec<Job>, StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }

    fn remove(&self, _id: &JobId) -> Result<Option<Job>, StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }

    fn adjust_counters(&self, _id: &JobId, _delta: CounterDelta) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
