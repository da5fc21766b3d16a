use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monotonic id assigned by the store to each ingested row.
pub type EntityId = i64;

/// Opaque id of a stored component row.
pub type ComponentId = Uuid;

/// An amount in the currency's minor unit (cents for USD).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PriceValue {
    pub currency: String,
    pub cents: i64,
}

impl PriceValue {
    pub fn new(currency: impl Into<String>, cents: i64) -> Self {
        Self {
            currency: currency.into(),
            cents,
        }
    }
}

impl fmt::Display for PriceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency, self.cents)
    }
}

/// A kind-tagged scalar. Distinctness (and therefore storage identity) is
/// decided by the whole value: two prices with equal cents but different
/// currencies are different components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentValue {
    Text(String),
    Price(PriceValue),
}

impl ComponentValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn shape(&self) -> &'static str {
        match self {
            ComponentValue::Text(_) => "text",
            ComponentValue::Price(_) => "price",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ComponentValue::Text(s) => Some(s),
            ComponentValue::Price(_) => None,
        }
    }

    pub fn as_price(&self) -> Option<&PriceValue> {
        match self {
            ComponentValue::Price(p) => Some(p),
            ComponentValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ComponentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentValue::Text(s) => write!(f, "{s:?}"),
            ComponentValue::Price(p) => write!(f, "{p}"),
        }
    }
}

/// One row of an `entity_<kind>` junction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentLink {
    pub entity_id: EntityId,
    pub component_id: ComponentId,
    /// Only persisted for image links.
    pub sort_order: i32,
}

impl ComponentLink {
    pub fn new(entity_id: EntityId, component_id: ComponentId) -> Self {
        Self {
            entity_id,
            component_id,
            sort_order: 0,
        }
    }
}
