pub mod dedup;
pub mod extract;
pub mod link;
pub mod pipeline;
pub mod source;
pub mod summary;

pub use extract::{Accumulator, Occurrence, RowExtractor, RowRecord};
pub use pipeline::{sync_kind, Ingestor, KindSync};
pub use summary::{IngestSummary, KindReport, KindStatus, RowFailure};
