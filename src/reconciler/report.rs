//! Reconciliation reports.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::tags::{ResourceKind, TagDiff, TagSet};

/// Tag changes computed (and possibly applied) for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceOutcome {
    /// Kind of resource.
    pub kind: ResourceKind,
    /// Resource name or id.
    pub id: String,
    /// Tags added or overwritten.
    pub upserted: TagSet,
    /// Tag keys removed.
    pub deleted: BTreeSet<String>,
    /// Whether the changes were sent to AWS (false in dry-run mode).
    pub applied: bool,
}

impl ResourceOutcome {
    /// Creates an outcome from a computed diff.
    #[must_use]
    pub fn from_diff(
        kind: ResourceKind,
        id: impl Into<String>,
        diff: TagDiff,
        applied: bool,
    ) -> Self {
        Self {
            kind,
            id: id.into(),
            upserted: diff.to_upsert,
            deleted: diff.to_delete,
            applied,
        }
    }

    /// Returns true if the resource already had the desired tags.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.upserted.is_empty() && self.deleted.is_empty()
    }
}

/// Report of a reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    /// Unique id of this run, also attached to log lines.
    pub run_id: Uuid,
    /// Cluster being reconciled.
    pub cluster: String,
    /// Whether mutating calls were skipped.
    pub dry_run: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Per-resource outcomes in processing order.
    pub resources: Vec<ResourceOutcome>,
}

impl ReconciliationReport {
    /// Starts a new report.
    #[must_use]
    pub fn new(cluster: impl Into<String>, dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            cluster: cluster.into(),
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            resources: Vec::new(),
        }
    }

    /// Records the outcome for one resource.
    pub fn record(&mut self, outcome: ResourceOutcome) {
        self.resources.push(outcome);
    }

    /// Marks the run as finished.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of resources whose tags changed (or would change).
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.resources.iter().filter(|r| !r.is_converged()).count()
    }

    /// Number of resources already converged.
    #[must_use]
    pub fn unchanged_count(&self) -> usize {
        self.resources.iter().filter(|r| r.is_converged()).count()
    }

    /// Number of resources of `kind` visited.
    #[must_use]
    pub fn count_of(&self, kind: ResourceKind) -> usize {
        self.resources.iter().filter(|r| r.kind == kind).count()
    }

    /// Returns true if no resource needed changes.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.changed_count() == 0
    }
}

impl std::fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = if self.dry_run { "plan" } else { "apply" };
        writeln!(f, "Tag reconciliation ({mode}) for cluster {}:", self.cluster)?;
        writeln!(f, "  Resources: {}", self.resources.len())?;
        writeln!(f, "  Changed: {}", self.changed_count())?;
        writeln!(f, "  Unchanged: {}", self.unchanged_count())?;
        Ok(())
    }
}
