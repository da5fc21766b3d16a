use async_trait::async_trait;

use crate::components::{ComponentId, ComponentKind, ComponentLink, ComponentValue, EntityId, PriceValue};
use crate::error::{IngestError, IngestResult};

/// The storage primitives the ingestion pipeline is built on.
///
/// Implementations must be safe to call concurrently from per-kind tasks.
#[async_trait]
pub trait ComponentStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Create one entity and return its freshly assigned id.
    async fn create_entity(&self) -> IngestResult<EntityId>;

    /// Upsert-and-fetch: insert each value unless its natural key already
    /// exists, and return one id per input value, where `ids[i]` belongs to
    /// `values[i]`. Values must be distinct. Empty input returns an empty
    /// vector without touching the store.
    async fn upsert(
        &self,
        kind: ComponentKind,
        values: &[ComponentValue],
    ) -> IngestResult<Vec<ComponentId>>;

    /// Insert junction rows, ignoring pairs that already exist. Returns the
    /// number of rows actually created.
    async fn link(&self, kind: ComponentKind, links: &[ComponentLink]) -> IngestResult<u64>;
}

/// Borrow the text payloads of a single-value kind.
pub fn expect_text(kind: ComponentKind, values: &[ComponentValue]) -> IngestResult<Vec<&str>> {
    values
        .iter()
        .map(|v| {
            v.as_text().ok_or(IngestError::KindMismatch {
                kind,
                expected: "text",
                got: v.shape(),
            })
        })
        .collect()
}

/// Borrow the (currency, cents) payloads of the price kind.
pub fn expect_prices(
    kind: ComponentKind,
    values: &[ComponentValue],
) -> IngestResult<Vec<&PriceValue>> {
    values
        .iter()
        .map(|v| {
            v.as_price().ok_or(IngestError::KindMismatch {
                kind,
                expected: "price",
                got: v.shape(),
            })
        })
        .collect()
}

/// Check that a value list matches the shape `kind` stores.
pub fn check_shape(kind: ComponentKind, values: &[ComponentValue]) -> IngestResult<()> {
    if kind.is_price() {
        expect_prices(kind, values).map(|_| ())
    } else {
        expect_text(kind, values).map(|_| ())
    }
}
