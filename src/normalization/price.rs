use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};

use crate::components::PriceValue;
use crate::error::{IngestError, IngestResult};

/// Minor units per major unit. Every currency we ingest today has two decimals.
pub const CENTS_PER_UNIT: i64 = 100;

/// Parse a decimal amount such as `129.99`, `$1,299.00` or `45` into minor
/// units under `currency`. Sub-cent digits round to the nearest cent.
pub fn parse_price_minor(column: &str, raw: &str, currency: &str) -> IngestResult<PriceValue> {
    let trimmed = raw.trim();
    let cleaned: String = trimmed
        .strip_prefix('$')
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return Err(IngestError::malformed(column, raw, "empty amount"));
    }

    let amount = BigDecimal::from_str(&cleaned)
        .map_err(|e| IngestError::malformed(column, raw, format!("not a decimal amount: {e}")))?;
    if amount < BigDecimal::from(0) {
        return Err(IngestError::malformed(column, raw, "negative amount"));
    }

    let cents = (amount * BigDecimal::from(CENTS_PER_UNIT))
        .round(0)
        .to_i64()
        .ok_or_else(|| IngestError::malformed(column, raw, "amount out of range"))?;

    Ok(PriceValue::new(currency, cents))
}
