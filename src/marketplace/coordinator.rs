use std::sync::Arc;

use tracing::debug;

use super::catalog::{CounterDelta, JobCatalog, JobId, StoreError};
use super::stages::PipelineStage;

/// Ledger mutation notifications. The coordinator is the only subscriber
/// and the only writer of job counters; nothing else touches them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    /// A new application was committed to the ledger.
    Applied { job_id: JobId },
    /// An application arrived at `stage` for the first time. Timestamp
    /// refreshes of an already-reached stage do not raise this event.
    StageReached { job_id: JobId, stage: PipelineStage },
    /// An application was withdrawn after having reached `furthest`.
    Cancelled { job_id: JobId, furthest: PipelineStage },
}

impl LedgerEvent {
    pub fn job_id(&self) -> &JobId {
        match self {
            Self::Applied { job_id }
            | Self::StageReached { job_id, .. }
            | Self::Cancelled { job_id, .. } => job_id,
        }
    }
}

/// Keeps the denormalized counters on job records consistent with the
/// application ledger by folding ledger events into counter deltas.
pub struct CounterCoordinator<C> {
    catalog: Arc<C>,
}

impl<C> CounterCoordinator<C>
where
    C: JobCatalog,
{
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    /// Apply the counter consequences of one ledger event. A job that was
    /// deleted between the ledger commit and this call is skipped; its
    /// counters died with it.
    pub fn observe(&self, event: &LedgerEvent) -> Result<(), StoreError> {
        let delta = delta_for(event);
        if delta == CounterDelta::default() {
            return Ok(());
        }
        match self.catalog.adjust_counters(event.job_id(), delta) {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => {
                debug!(job = %event.job_id(), "counter adjustment skipped; job no longer present");
                Ok(())
            }
            Err(other) => Err(other),
        }
    }
}

fn delta_for(event: &LedgerEvent) -> CounterDelta {
    match event {
        LedgerEvent::Applied { .. } => CounterDelta {
            applicants: 1,
            ..CounterDelta::default()
        },
        LedgerEvent::StageReached { stage, .. } => match stage {
            PipelineStage::Shortlisted => CounterDelta {
                shortlisted: 1,
                ..CounterDelta::default()
            },
            PipelineStage::Completed => CounterDelta {
                recruited: 1,
                ..CounterDelta::default()
            },
            _ => CounterDelta::default(),
        },
        LedgerEvent::Cancelled { furthest, .. } => {
            let mut delta = CounterDelta {
                applicants: -1,
                ..CounterDelta::default()
            };
            if furthest.index() >= PipelineStage::Shortlisted.index() {
                delta.shortlisted = -1;
            }
            if furthest.is_terminal() {
                delta.recruited = -1;
            }
            delta
        }
    }
}
