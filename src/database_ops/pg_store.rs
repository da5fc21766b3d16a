use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::components::{ComponentId, ComponentKind, ComponentLink, ComponentValue, EntityId};
use crate::config::DEFAULT_BATCH_SIZE;
use crate::database_ops::db::Db;
use crate::database_ops::handlers::handler_for;
use crate::database_ops::store::{check_shape, ComponentStore};
use crate::error::IngestResult;

/// Postgres-backed store. Large inputs are split into `batch_size` chunks
/// that run one after another, so positional correlation survives chunking.
#[derive(Clone)]
pub struct PgStore {
    db: Db,
    batch_size: usize,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn db(&self) -> &Db {
        &self.db
    }
}

#[async_trait]
impl ComponentStore for PgStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    #[instrument(skip(self))]
    async fn create_entity(&self) -> IngestResult<EntityId> {
        let id: EntityId = sqlx::query_scalar("INSERT INTO entity DEFAULT VALUES RETURNING id")
            .persistent(false)
            .fetch_one(&self.db.pool)
            .await?;
        debug!(entity_id = id, "created entity");
        Ok(id)
    }

    #[instrument(skip_all, fields(kind = %kind, values = values.len()))]
    async fn upsert(
        &self,
        kind: ComponentKind,
        values: &[ComponentValue],
    ) -> IngestResult<Vec<ComponentId>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        check_shape(kind, values)?;

        let handler = handler_for(kind);
        let mut ids = Vec::with_capacity(values.len());
        for chunk in values.chunks(self.batch_size) {
            ids.extend(handler.upsert(&self.db.pool, chunk).await?);
        }
        Ok(ids)
    }

    #[instrument(skip_all, fields(kind = %kind, links = links.len()))]
    async fn link(&self, kind: ComponentKind, links: &[ComponentLink]) -> IngestResult<u64> {
        if links.is_empty() {
            return Ok(0);
        }

        let handler = handler_for(kind);
        let mut created = 0;
        for chunk in links.chunks(self.batch_size) {
            created += handler.link(&self.db.pool, chunk).await?;
        }
        Ok(created)
    }
}
