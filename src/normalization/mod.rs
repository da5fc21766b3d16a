pub mod columns;
pub mod price;

pub use columns::{ColumnClass, ColumnMap};
pub use price::{parse_price_minor, CENTS_PER_UNIT};
