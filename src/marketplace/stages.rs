use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed recruitment pipeline every application walks through, in order.
/// Progress may only move to the immediate next stage, never backwards
/// and never skipping ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Applied,
    Shortlisted,
    DocumentVerification,
    JobOffer,
    Completed,
}

impl PipelineStage {
    pub const fn ordered() -> [PipelineStage; 5] {
        [
            Self::Applied,
            Self::Shortlisted,
            Self::DocumentVerification,
            Self::JobOffer,
            Self::Completed,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::Shortlisted => "Shortlisted",
            Self::DocumentVerification => "Document Verification",
            Self::JobOffer => "Job Offer",
            Self::Completed => "Completed",
        }
    }

    /// Position within [`PipelineStage::ordered`].
    pub fn index(self) -> usize {
        Self::ordered()
            .iter()
            .position(|stage| *stage == self)
            .unwrap_or_default()
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Per-stage completion record kept inside an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: PipelineStage,
    pub completed: bool,
    pub completed_on: Option<DateTime<Utc>>,
}

impl StageRecord {
    pub fn pending(stage: PipelineStage) -> Self {
        Self {
            stage,
            completed: false,
            completed_on: None,
        }
    }

    pub fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.completed = true;
        self.completed_on = Some(at);
    }
}

/// Read-model row for rendering a pipeline to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageView {
    pub name: &'static str,
    pub completed: bool,
    pub completed_on: Option<DateTime<Utc>>,
}

impl From<&StageRecord> for StageView {
    fn from(record: &StageRecord) -> Self {
        Self {
            name: record.stage.label(),
            completed: record.completed,
            completed_on: record.completed_on,
        }
    }
}
