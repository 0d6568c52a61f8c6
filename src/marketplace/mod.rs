//! Job marketplace engine: catalog, search filtering, application ledger,
//! stage tracking, and the counter coordinator that keeps the denormalized
//! job counters honest.

pub mod catalog;
pub mod coordinator;
pub mod filter;
pub mod ledger;
pub mod router;
pub mod seed;
pub mod service;
pub mod stages;

#[cfg(test)]
mod tests;

pub use catalog::{
    CounterDelta, InMemoryJobCatalog, Job, JobCatalog, JobDraft, JobId, JobStatus, JobUpdate,
    PayCadence, ProviderId, StoreError,
};
pub use coordinator::{CounterCoordinator, LedgerEvent};
pub use filter::{filter_jobs, SearchFilter, SearchQuery};
pub use ledger::{
    Application, ApplicationKey, ApplicationStatus, ApplicationStore, ApplicationView,
    InMemoryApplicationStore, TransitionError, UserId,
};
pub use router::marketplace_router;
pub use seed::{CatalogSeeder, SeedImportError, SeedSummary};
pub use service::{ApplyOutcome, MarketplaceError, MarketplaceService};
pub use stages::{PipelineStage, StageRecord, StageView};
