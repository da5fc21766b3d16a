use serde::Serialize;

use crate::util::env as env_util;

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;
pub const DEFAULT_CURRENCY: &str = "USD";

/// Run settings resolved from the environment; CLI flags override field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestConfig {
    /// Values per upsert/link statement.
    pub batch_size: usize,
    /// Pool capacity, which also caps concurrent round trips.
    pub max_connections: u32,
    /// Currency code for price columns when the row names none.
    pub currency: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl IngestConfig {
    pub const ENV_KEYS: [&'static str; 3] = ["INGEST_BATCH_SIZE", "DB_MAX_CONNS", "INGEST_CURRENCY"];

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_size: env_util::env_parse("INGEST_BATCH_SIZE", defaults.batch_size).max(1),
            max_connections: env_util::env_parse("DB_MAX_CONNS", defaults.max_connections).max(1),
            currency: env_util::env_opt("INGEST_CURRENCY")
                .map(|c| c.trim().to_ascii_uppercase())
                .unwrap_or(defaults.currency),
        }
    }

    pub fn with_overrides(
        mut self,
        batch_size: Option<usize>,
        max_connections: Option<u32>,
        currency: Option<String>,
    ) -> Self {
        if let Some(n) = batch_size {
            self.batch_size = n.max(1);
        }
        if let Some(n) = max_connections {
            self.max_connections = n.max(1);
        }
        if let Some(c) = currency {
            self.currency = c.trim().to_ascii_uppercase();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_field_by_field() {
        let cfg = IngestConfig::default().with_overrides(Some(0), None, Some(" cad ".into()));
        assert_eq!(cfg.batch_size, 1);
        assert_eq!(cfg.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(cfg.currency, "CAD");
    }
}
