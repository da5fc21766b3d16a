//! Postgres integration harness.
//!
//! One container is started for the whole test binary; every test gets its
//! own freshly created database with the fixture schema applied.

use anyhow::{Context, Result};
use catalog_ingest::database_ops::Db;
use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

const SCHEMA: &str = include_str!("../fixtures/schema.sql");

struct SharedPostgres {
    base_url: String,
    // keeps the container alive for the test run
    _container: ContainerAsync<Postgres>,
}

static SHARED: OnceCell<SharedPostgres> = OnceCell::const_new();

impl SharedPostgres {
    async fn init() -> Result<Self> {
        // RUST_LOG=debug cargo test -- --ignored --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let container = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("failed to start Postgres container")?;
        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432).await?;
        Ok(Self {
            base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
            _container: container,
        })
    }

    async fn get() -> &'static Self {
        SHARED
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("failed to start shared Postgres")
            })
            .await
    }
}

/// Create an isolated database with the schema loaded.
pub async fn fresh_db() -> Result<Db> {
    let shared = SharedPostgres::get().await;
    let name = format!("ingest_{}", Uuid::new_v4().simple());

    let admin = PgPool::connect(&format!("{}/postgres", shared.base_url))
        .await
        .context("connecting to admin database")?;
    sqlx::query(&format!("CREATE DATABASE {name}"))
        .execute(&admin)
        .await?;
    admin.close().await;

    let db = Db::connect(&format!("{}/{name}", shared.base_url), 8).await?;
    sqlx::raw_sql(SCHEMA)
        .execute(&db.pool)
        .await
        .context("applying schema fixture")?;
    Ok(db)
}

pub async fn count(db: &Db, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(&db.pool)
        .await
        .expect("count query")
}
