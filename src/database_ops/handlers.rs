//! Per-kind Postgres strategies for upsert-and-fetch and junction links.
//!
//! Every upsert is a single statement: the input arrays are unnested
//! `WITH ORDINALITY`, inserted with `ON CONFLICT ... DO UPDATE` (a no-op
//! update so conflicting rows still come back from `RETURNING`), and the
//! returned rows are joined back to the input by natural key and ordered by
//! ordinal. `RETURNING` order alone is never trusted.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::components::{ComponentId, ComponentKind, ComponentLink, ComponentValue};
use crate::database_ops::store::{expect_prices, expect_text};
use crate::error::{IngestError, IngestResult};

#[async_trait]
pub trait ComponentHandler: Send + Sync {
    fn kind(&self) -> ComponentKind;

    async fn upsert(
        &self,
        pool: &PgPool,
        values: &[ComponentValue],
    ) -> IngestResult<Vec<ComponentId>>;

    async fn link(&self, pool: &PgPool, links: &[ComponentLink]) -> IngestResult<u64>;
}

/// Kinds keyed on one text column.
pub struct TextHandler {
    kind: ComponentKind,
}

impl TextHandler {
    pub const fn new(kind: ComponentKind) -> Self {
        Self { kind }
    }
}

/// Keyed on `(currency_id, value)`; currency codes must already exist.
pub struct PriceHandler;

/// Keyed on `file_id`; the file rows for each source must already exist.
pub struct ImageHandler;

static CURRENCY: TextHandler = TextHandler::new(ComponentKind::Currency);
static DESCRIPTION: TextHandler = TextHandler::new(ComponentKind::Description);
static FEATURE: TextHandler = TextHandler::new(ComponentKind::Feature);
static FILE: TextHandler = TextHandler::new(ComponentKind::File);
static MERCHANDISED_COLOR: TextHandler = TextHandler::new(ComponentKind::MerchandisedColor);
static PATTERN: TextHandler = TextHandler::new(ComponentKind::Pattern);
static PRIMARY_COLOR: TextHandler = TextHandler::new(ComponentKind::PrimaryColor);
static SKU: TextHandler = TextHandler::new(ComponentKind::Sku);
static STYLE: TextHandler = TextHandler::new(ComponentKind::Style);
static PRICE: PriceHandler = PriceHandler;
static IMAGE: ImageHandler = ImageHandler;

pub fn handler_for(kind: ComponentKind) -> &'static dyn ComponentHandler {
    match kind {
        ComponentKind::Currency => &CURRENCY,
        ComponentKind::Description => &DESCRIPTION,
        ComponentKind::Feature => &FEATURE,
        ComponentKind::File => &FILE,
        ComponentKind::Image => &IMAGE,
        ComponentKind::MerchandisedColor => &MERCHANDISED_COLOR,
        ComponentKind::Pattern => &PATTERN,
        ComponentKind::Price => &PRICE,
        ComponentKind::PrimaryColor => &PRIMARY_COLOR,
        ComponentKind::Sku => &SKU,
        ComponentKind::Style => &STYLE,
    }
}

fn ensure_len(kind: ComponentKind, expected: usize, ids: &[ComponentId]) -> IngestResult<()> {
    if ids.len() == expected {
        Ok(())
    } else {
        Err(IngestError::LengthMismatch {
            kind,
            expected,
            actual: ids.len(),
        })
    }
}

/// `INSERT INTO entity_<kind> ... ON CONFLICT DO NOTHING` for kinds without extra link columns.
async fn link_pairs(pool: &PgPool, kind: ComponentKind, links: &[ComponentLink]) -> IngestResult<u64> {
    let entity_ids: Vec<i64> = links.iter().map(|l| l.entity_id).collect();
    let component_ids: Vec<ComponentId> = links.iter().map(|l| l.component_id).collect();
    let sql = format!(
        "INSERT INTO {junction} (entity_id, {column})
         SELECT * FROM UNNEST($1::bigint[], $2::uuid[])
         ON CONFLICT (entity_id, {column}) DO NOTHING",
        junction = kind.junction_table(),
        column = kind.junction_column(),
    );
    let done = sqlx::query(&sql)
        .persistent(false)
        .bind(&entity_ids)
        .bind(&component_ids)
        .execute(pool)
        .await?;
    Ok(done.rows_affected())
}

#[async_trait]
impl ComponentHandler for TextHandler {
    fn kind(&self) -> ComponentKind {
        self.kind
    }

    async fn upsert(
        &self,
        pool: &PgPool,
        values: &[ComponentValue],
    ) -> IngestResult<Vec<ComponentId>> {
        let texts: Vec<String> = expect_text(self.kind, values)?
            .into_iter()
            .map(str::to_string)
            .collect();
        let sql = format!(
            "WITH input AS (
                SELECT t.value, t.ord
                FROM UNNEST($1::text[]) WITH ORDINALITY AS t(value, ord)
            ),
            upserted AS (
                INSERT INTO {table} ({key})
                SELECT value FROM input
                ON CONFLICT ({key}) DO UPDATE
                SET {key} = EXCLUDED.{key}
                RETURNING id, {key} AS value
            )
            SELECT u.id
            FROM input i
            JOIN upserted u ON u.value = i.value
            ORDER BY i.ord",
            table = self.kind.table(),
            key = self.kind.key_column(),
        );
        let ids: Vec<ComponentId> = sqlx::query_scalar(&sql)
            .persistent(false)
            .bind(&texts)
            .fetch_all(pool)
            .await?;
        debug!(kind = %self.kind, values = texts.len(), "upserted text components");
        ensure_len(self.kind, texts.len(), &ids)?;
        Ok(ids)
    }

    async fn link(&self, pool: &PgPool, links: &[ComponentLink]) -> IngestResult<u64> {
        link_pairs(pool, self.kind, links).await
    }
}

#[async_trait]
impl ComponentHandler for PriceHandler {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Price
    }

    async fn upsert(
        &self,
        pool: &PgPool,
        values: &[ComponentValue],
    ) -> IngestResult<Vec<ComponentId>> {
        let prices = expect_prices(ComponentKind::Price, values)?;
        let codes: Vec<String> = prices.iter().map(|p| p.currency.clone()).collect();
        let cents: Vec<i64> = prices.iter().map(|p| p.cents).collect();

        let ids: Vec<ComponentId> = sqlx::query_scalar(
            "WITH input AS (
                SELECT t.code, t.value, t.ord
                FROM UNNEST($1::text[], $2::bigint[]) WITH ORDINALITY AS t(code, value, ord)
            ),
            resolved AS (
                SELECT i.ord, c.id AS currency_id, i.value
                FROM input i
                JOIN currency c ON c.code = i.code
            ),
            upserted AS (
                INSERT INTO price (currency_id, value)
                SELECT currency_id, value FROM resolved
                ON CONFLICT (currency_id, value) DO UPDATE
                SET value = EXCLUDED.value
                RETURNING id, currency_id, value
            )
            SELECT u.id
            FROM resolved r
            JOIN upserted u ON u.currency_id = r.currency_id AND u.value = r.value
            ORDER BY r.ord",
        )
        .persistent(false)
        .bind(&codes)
        .bind(&cents)
        .fetch_all(pool)
        .await?;
        debug!(values = cents.len(), "upserted price components");
        // A short result means a currency code was never upserted.
        ensure_len(ComponentKind::Price, cents.len(), &ids)?;
        Ok(ids)
    }

    async fn link(&self, pool: &PgPool, links: &[ComponentLink]) -> IngestResult<u64> {
        link_pairs(pool, ComponentKind::Price, links).await
    }
}

#[async_trait]
impl ComponentHandler for ImageHandler {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Image
    }

    async fn upsert(
        &self,
        pool: &PgPool,
        values: &[ComponentValue],
    ) -> IngestResult<Vec<ComponentId>> {
        let sources: Vec<String> = expect_text(ComponentKind::Image, values)?
            .into_iter()
            .map(str::to_string)
            .collect();

        let ids: Vec<ComponentId> = sqlx::query_scalar(
            "WITH input AS (
                SELECT t.source, t.ord
                FROM UNNEST($1::text[]) WITH ORDINALITY AS t(source, ord)
            ),
            resolved AS (
                SELECT i.ord, f.id AS file_id
                FROM input i
                JOIN file f ON f.source = i.source
            ),
            upserted AS (
                INSERT INTO image (file_id)
                SELECT file_id FROM resolved
                ON CONFLICT (file_id) DO UPDATE
                SET file_id = EXCLUDED.file_id
                RETURNING id, file_id
            )
            SELECT u.id
            FROM resolved r
            JOIN upserted u ON u.file_id = r.file_id
            ORDER BY r.ord",
        )
        .persistent(false)
        .bind(&sources)
        .fetch_all(pool)
        .await?;
        debug!(values = sources.len(), "upserted image components");
        // A short result means a source has no file row yet.
        ensure_len(ComponentKind::Image, sources.len(), &ids)?;
        Ok(ids)
    }

    async fn link(&self, pool: &PgPool, links: &[ComponentLink]) -> IngestResult<u64> {
        let entity_ids: Vec<i64> = links.iter().map(|l| l.entity_id).collect();
        let image_ids: Vec<ComponentId> = links.iter().map(|l| l.component_id).collect();
        let sort_orders: Vec<i32> = links.iter().map(|l| l.sort_order).collect();
        let done = sqlx::query(
            "INSERT INTO entity_image (entity_id, image_id, sort_order)
             SELECT * FROM UNNEST($1::bigint[], $2::uuid[], $3::integer[])
             ON CONFLICT (entity_id, image_id) DO NOTHING",
        )
        .persistent(false)
        .bind(&entity_ids)
        .bind(&image_ids)
        .bind(&sort_orders)
        .execute(pool)
        .await?;
        Ok(done.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_its_own_handler() {
        for kind in ComponentKind::ALL {
            assert_eq!(handler_for(kind).kind(), kind);
        }
    }
}
