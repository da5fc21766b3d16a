//! Storage boundary: the `ComponentStore` primitives and their backends.

pub mod db;
pub mod handlers;
pub mod memory;
pub mod pg_store;
pub mod store;

pub use db::Db;
pub use memory::MemoryStore;
pub use pg_store::PgStore;
pub use store::ComponentStore;
