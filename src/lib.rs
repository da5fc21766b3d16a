//! Entity-component ingestion of flat product CSV exports.
//!
//! Each row becomes an entity; each mapped column value becomes a
//! deduplicated component row linked back to that entity.

pub mod components;
pub mod config;
pub mod database_ops;
pub mod error;
pub mod ingest;
pub mod normalization;

pub mod util {
    pub mod env;
    pub mod logging;
}

pub use error::{IngestError, IngestResult};
