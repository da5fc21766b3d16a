//! Component model: the closed set of kinds and the values stored under them.

pub mod kind;
pub mod value;

pub use kind::ComponentKind;
pub use value::{ComponentId, ComponentLink, ComponentValue, EntityId, PriceValue};
