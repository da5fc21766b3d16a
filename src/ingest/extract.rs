use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::components::{ComponentKind, ComponentValue, EntityId};
use crate::error::IngestError;
use crate::ingest::dedup;
use crate::normalization::{parse_price_minor, ColumnClass, ColumnMap};

/// One input row: column name -> raw cell text, in file order.
pub type RowRecord = IndexMap<String, String>;

/// Delimiter for multi-valued fields.
pub const LIST_DELIMITER: char = ';';

/// A value seen on a row, waiting to be upserted and linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub entity_id: EntityId,
    pub value: ComponentValue,
    pub sort_order: i32,
}

/// Per-kind (entity, value) pairs collected over a whole run.
#[derive(Debug, Default)]
pub struct Accumulator {
    by_kind: BTreeMap<ComponentKind, Vec<Occurrence>>,
}

impl Accumulator {
    pub fn push(&mut self, kind: ComponentKind, entity_id: EntityId, value: ComponentValue) {
        self.by_kind.entry(kind).or_default().push(Occurrence {
            entity_id,
            value,
            sort_order: 0,
        });
    }

    pub fn occurrences(&self, kind: ComponentKind) -> &[Occurrence] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Distinct values for `kind`, first appearance first.
    pub fn distinct(&self, kind: ComponentKind) -> Vec<ComponentValue> {
        dedup::distinct(self.occurrences(kind).iter().map(|o| &o.value))
    }

    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.by_kind.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }

    pub fn into_parts(self) -> BTreeMap<ComponentKind, Vec<Occurrence>> {
        self.by_kind
    }
}

/// Currency codes are stored upper-case, so `usd` and `USD` are one row.
pub fn normalize_currency(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Walks rows and sorts their fields into an [`Accumulator`].
///
/// Pure apart from the caller-supplied entity id; no I/O happens here.
#[derive(Debug, Clone)]
pub struct RowExtractor<'a> {
    columns: &'a ColumnMap,
    default_currency: String,
}

impl<'a> RowExtractor<'a> {
    pub fn new(columns: &'a ColumnMap, default_currency: impl Into<String>) -> Self {
        Self {
            columns,
            default_currency: normalize_currency(&default_currency.into()),
        }
    }

    /// Extract one row for `entity_id`. Fields that fail to parse are skipped
    /// and returned so the caller can report them.
    pub fn extract(
        &self,
        entity_id: EntityId,
        row: &RowRecord,
        acc: &mut Accumulator,
    ) -> Vec<IngestError> {
        let mut skipped = Vec::new();

        // A row may name its own currency; prices fall back to the default.
        let row_currency = row
            .iter()
            .find(|(column, value)| {
                self.columns.get(column) == Some(ComponentKind::Currency)
                    && !value.trim().is_empty()
            })
            .map(|(_, value)| normalize_currency(value));
        let currency = row_currency.as_deref().unwrap_or(&self.default_currency);

        for (column, raw) in row {
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }

            match self.columns.classify(column) {
                ColumnClass::Component(ComponentKind::Pattern) => {
                    for piece in value.split(LIST_DELIMITER).map(str::trim) {
                        if !piece.is_empty() {
                            acc.push(ComponentKind::Pattern, entity_id, ComponentValue::text(piece));
                        }
                    }
                }
                ColumnClass::Component(ComponentKind::Currency) => {
                    acc.push(
                        ComponentKind::Currency,
                        entity_id,
                        ComponentValue::text(normalize_currency(value)),
                    );
                }
                ColumnClass::Component(ComponentKind::Price) => {
                    match parse_price_minor(column, value, currency) {
                        Ok(price) => {
                            acc.push(ComponentKind::Price, entity_id, ComponentValue::Price(price));
                            if row_currency.is_none() {
                                acc.push(
                                    ComponentKind::Currency,
                                    entity_id,
                                    ComponentValue::text(currency),
                                );
                            }
                        }
                        Err(err) => skipped.push(err),
                    }
                }
                ColumnClass::Component(ComponentKind::Image)
                | ColumnClass::Attachment { image: true } => {
                    acc.push(ComponentKind::File, entity_id, ComponentValue::text(value));
                    acc.push(ComponentKind::Image, entity_id, ComponentValue::text(value));
                }
                ColumnClass::Attachment { image: false } => {
                    acc.push(ComponentKind::File, entity_id, ComponentValue::text(value));
                }
                ColumnClass::Component(kind) => {
                    acc.push(kind, entity_id, ComponentValue::text(value));
                }
                ColumnClass::Ignored => {}
            }
        }

        skipped
    }
}
