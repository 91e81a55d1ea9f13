//! Run-audit record written once per invocation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rankings::Source;

/// Final outcome of one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialFailure,
    Failure,
}

impl RunStatus {
    /// Derives the run status from what was persisted and whether any
    /// non-fatal errors accumulated along the way.
    ///
    /// - nothing saved → [`RunStatus::Failure`]
    /// - something saved, errors recorded → [`RunStatus::PartialFailure`]
    /// - everything saved cleanly → [`RunStatus::Success`]
    #[must_use]
    pub fn derive(documents_saved: u64, had_errors: bool) -> Self {
        match (documents_saved, had_errors) {
            (0, _) => RunStatus::Failure,
            (_, true) => RunStatus::PartialFailure,
            (_, false) => RunStatus::Success,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::PartialFailure => "partial_failure",
            RunStatus::Failure => "failure",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label for the source a run used; `"none"` when no source produced data.
#[must_use]
pub fn source_label(source: Option<Source>) -> &'static str {
    source.map_or("none", Source::as_str)
}

/// Audit record for one invocation. Written exactly once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub status: RunStatus,
    pub source_used: Option<Source>,
    pub documents_saved: u64,
    pub errors: Vec<String>,
}

impl RunRecord {
    /// Finalizes a record for a run that began at `started_at`, stamping
    /// `completed_at` with the current time and deriving the status.
    #[must_use]
    pub fn finish(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        source_used: Option<Source>,
        documents_saved: u64,
        errors: Vec<String>,
    ) -> Self {
        let status = RunStatus::derive(documents_saved, !errors.is_empty());
        Self {
            run_id,
            started_at,
            completed_at: Utc::now(),
            status,
            source_used,
            documents_saved,
            errors,
        }
    }

    #[must_use]
    pub fn source_label(&self) -> &'static str {
        source_label(self.source_used)
    }
}
