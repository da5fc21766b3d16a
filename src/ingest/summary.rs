use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::components::ComponentKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum KindStatus {
    Ok,
    Failed(String),
    Skipped(String),
}

/// Outcome of one kind's upsert + link pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct KindReport {
    pub kind: ComponentKind,
    /// (entity, value) pairs collected during extraction.
    pub occurrences: usize,
    pub distinct: usize,
    /// Junction rows newly created; pre-existing links are not counted.
    pub linked: u64,
    #[serde(flatten)]
    pub status: KindStatus,
}

impl KindReport {
    pub fn is_ok(&self) -> bool {
        self.status == KindStatus::Ok
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub rows_seen: usize,
    pub rows_extracted: usize,
    pub malformed_fields: usize,
    pub row_failures: Vec<RowFailure>,
    pub kinds: Vec<KindReport>,
}

impl IngestSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            elapsed_ms: 0,
            rows_seen: 0,
            rows_extracted: 0,
            malformed_fields: 0,
            row_failures: Vec::new(),
            kinds: Vec::new(),
        }
    }

    pub fn kind(&self, kind: ComponentKind) -> Option<&KindReport> {
        self.kinds.iter().find(|r| r.kind == kind)
    }

    pub fn failed_kinds(&self) -> impl Iterator<Item = &KindReport> {
        self.kinds.iter().filter(|r| !r.is_ok())
    }

    /// Every row produced an entity and every kind pipeline completed.
    /// Malformed fields do not count against success.
    pub fn is_success(&self) -> bool {
        self.row_failures.is_empty() && self.kinds.iter().all(KindReport::is_ok)
    }

    pub fn log(&self) {
        for report in &self.kinds {
            match &report.status {
                KindStatus::Ok => info!(
                    kind = %report.kind,
                    occurrences = report.occurrences,
                    distinct = report.distinct,
                    linked = report.linked,
                    "component kind ingested"
                ),
                KindStatus::Failed(reason) => error!(kind = %report.kind, %reason, "component kind failed"),
                KindStatus::Skipped(reason) => warn!(kind = %report.kind, %reason, "component kind skipped"),
            }
        }
        let message = if self.is_success() {
            "ingestion complete"
        } else {
            "ingestion finished with partial success"
        };
        info!(
            rows_seen = self.rows_seen,
            rows_extracted = self.rows_extracted,
            row_failures = self.row_failures.len(),
            malformed_fields = self.malformed_fields,
            failed_kinds = self.failed_kinds().count(),
            elapsed_ms = self.elapsed_ms,
            "{message}"
        );
    }
}
