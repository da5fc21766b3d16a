use thiserror::Error;

use crate::components::ComponentKind;

/// Failure taxonomy for the ingestion core.
///
/// `MalformedValue` is soft: the extractor reports it and skips the field.
/// Everything else aborts the pipeline it happened in (one kind, or one row's
/// entity creation) and leaves the other pipelines running.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("malformed value {value:?} in column {column:?}: {reason}")]
    MalformedValue {
        column: String,
        value: String,
        reason: String,
    },

    #[error("{kind}: no component id for value {value}")]
    CorrelationFailure { kind: ComponentKind, value: String },

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    #[error("{kind}: upsert returned {actual} ids for {expected} values")]
    LengthMismatch {
        kind: ComponentKind,
        expected: usize,
        actual: usize,
    },

    #[error("{kind}: expected {expected} values, got {got}")]
    KindMismatch {
        kind: ComponentKind,
        expected: &'static str,
        got: &'static str,
    },

    #[error("unknown component kind {0:?}")]
    UnknownKind(String),
}

impl IngestError {
    pub fn malformed(column: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::MalformedValue {
            column: column.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors the extractor recovers from by skipping a field.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::MalformedValue { .. })
    }
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;
