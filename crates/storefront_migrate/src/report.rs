//! Run report.
//!
//! Records what each pass did and every problem found along the way, so a
//! run can be audited after the fact.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::entity::EntityKind;
use crate::error::MigrateError;

/// Lifecycle of one entity pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassState {
    #[default]
    NotStarted,
    Reading,
    Transforming,
    Writing,
    Done,
    Failed,
}

/// Counters for one entity pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassSummary {
    pub entity: EntityKind,
    pub state: PassState,
    /// Rows read from the entity's main table
    pub read: usize,
    pub written: usize,
    /// Records dropped by the transformer
    pub skipped: usize,
    pub failed_writes: usize,
    /// Why the pass failed, if it did
    pub error: Option<String>,
}

impl PassSummary {
    pub fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            state: PassState::NotStarted,
            read: 0,
            written: 0,
            skipped: 0,
            failed_writes: 0,
            error: None,
        }
    }

    pub fn fail(&mut self, error: impl ToString) {
        self.state = PassState::Failed;
        self.error = Some(error.to_string());
    }

    pub fn log(&self) {
        match self.state {
            PassState::Failed => error!(
                entity = %self.entity,
                error = self.error.as_deref().unwrap_or_default(),
                "Pass failed"
            ),
            _ => info!(
                entity = %self.entity,
                read = self.read,
                written = self.written,
                skipped = self.skipped,
                failed = self.failed_writes,
                "Pass complete"
            ),
        }
    }
}

/// Issue severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Field defaulted or child line dropped; the record was migrated
    Warning,
    /// Record was not migrated
    Error,
    /// A whole pass was abandoned
    Critical,
}

/// A problem found during the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationIssue {
    pub severity: IssueSeverity,
    pub entity: EntityKind,
    /// Legacy id of the record involved, if any
    pub legacy_id: Option<i64>,
    pub description: String,
    /// What the migration did about it
    pub resolution: Option<String>,
}

impl MigrationIssue {
    pub fn new(
        severity: IssueSeverity,
        entity: EntityKind,
        legacy_id: Option<i64>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            entity,
            legacy_id,
            description: description.into(),
            resolution: None,
        }
    }

    pub fn resolved(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }
}

/// Everything a run did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    /// Description of the legacy source
    pub source: String,
    /// Description of the target store
    pub target: String,
    pub dry_run: bool,
    pub passes: Vec<PassSummary>,
    pub issues: Vec<MigrationIssue>,
}

impl MigrationReport {
    pub fn new(source: String, target: String, dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            duration_ms: 0,
            source,
            target,
            dry_run,
            passes: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
        self.duration_ms = (self.finished_at - self.started_at).num_milliseconds();
    }

    pub fn pass(&self, entity: EntityKind) -> Option<&PassSummary> {
        self.passes.iter().find(|pass| pass.entity == entity)
    }

    pub fn failed_passes(&self) -> impl Iterator<Item = &PassSummary> {
        self.passes
            .iter()
            .filter(|pass| pass.state == PassState::Failed)
    }

    pub fn issue_count(&self, severity: IssueSeverity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }

    /// Log one closing line for the whole run.
    pub fn log_summary(&self) {
        let written: usize = self.passes.iter().map(|pass| pass.written).sum();
        let skipped: usize = self.passes.iter().map(|pass| pass.skipped).sum();
        let failed_writes: usize = self.passes.iter().map(|pass| pass.failed_writes).sum();
        let failed_passes = self.failed_passes().count();

        if failed_passes > 0 {
            warn!(
                written,
                skipped,
                failed_writes,
                failed_passes,
                duration_ms = self.duration_ms,
                "Migration finished with failed passes"
            );
        } else {
            info!(
                written,
                skipped,
                failed_writes,
                warnings = self.issue_count(IssueSeverity::Warning),
                duration_ms = self.duration_ms,
                "Migration finished"
            );
        }
    }

    /// Write the report as pretty-printed JSON.
    pub async fn write_to(&self, path: &Path) -> Result<(), MigrateError> {
        let report_error = |cause: std::io::Error| MigrateError::ReportWrite {
            path: path.to_path_buf(),
            cause,
        };

        let json = serde_json::to_vec_pretty(self).map_err(|e| report_error(e.into()))?;
        tokio::fs::write(path, json).await.map_err(report_error)?;

        info!("Wrote migration report to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_fail() {
        let mut pass = PassSummary::new(EntityKind::Order);
        assert_eq!(pass.state, PassState::NotStarted);
        pass.fail("orders.json missing");
        assert_eq!(pass.state, PassState::Failed);
        assert_eq!(pass.error.as_deref(), Some("orders.json missing"));
    }

    #[test]
    fn test_issue_serialization() {
        let issue = MigrationIssue::new(
            IssueSeverity::Error,
            EntityKind::Review,
            Some(4),
            "missing required field `rating`",
        )
        .resolved("record skipped");

        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["severity"], "error");
        assert_eq!(value["entity"], "review");
        assert_eq!(value["legacy_id"], 4);
        assert_eq!(value["resolution"], "record skipped");
    }

    #[tokio::test]
    async fn test_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let mut report = MigrationReport::new("json:/tmp".into(), "in-memory store".into(), true);
        let mut pass = PassSummary::new(EntityKind::User);
        pass.state = PassState::Done;
        pass.read = 2;
        pass.written = 2;
        report.passes.push(pass);
        report.finish();
        report.write_to(&path).await.unwrap();

        let loaded: MigrationReport =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);
        assert_eq!(loaded.pass(EntityKind::User).unwrap().written, 2);
    }

    #[tokio::test]
    async fn test_write_to_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let report = MigrationReport::new("json:/tmp".into(), "in-memory store".into(), false);
        let err = report
            .write_to(&dir.path().join("nope").join("report.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::ReportWrite { .. }));
    }
}
