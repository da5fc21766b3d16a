//! Postgres store tests. They start a container, so they only run with
//! `cargo test -- --ignored`.

mod common;

use std::sync::Arc;

use catalog_ingest::components::{ComponentKind, ComponentLink, ComponentValue, PriceValue};
use catalog_ingest::database_ops::{ComponentStore, PgStore};
use catalog_ingest::ingest::{source, Ingestor, KindStatus};
use catalog_ingest::normalization::ColumnMap;
use catalog_ingest::IngestError;

fn texts(values: &[&str]) -> Vec<ComponentValue> {
    values.iter().map(|v| ComponentValue::text(*v)).collect()
}

#[tokio::test]
#[ignore = "requires docker"]
async fn upsert_is_idempotent_and_positional() {
    let db = common::fresh_db().await.unwrap();
    let store = PgStore::new(db.clone()).with_batch_size(2);

    let first = store
        .upsert(ComponentKind::Style, &texts(&["Modern", "Casual", "Traditional"]))
        .await
        .unwrap();
    let shuffled = store
        .upsert(ComponentKind::Style, &texts(&["Traditional", "Modern", "Casual"]))
        .await
        .unwrap();

    assert_eq!(shuffled, vec![first[2], first[0], first[1]]);
    assert_eq!(common::count(&db, "style").await, 3);

    for (id, name) in first.iter().zip(["Modern", "Casual", "Traditional"]) {
        let stored: String = sqlx::query_scalar("SELECT name FROM style WHERE id = $1")
            .bind(id)
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(stored, name);
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn concurrent_overlapping_upserts_agree() {
    let db = common::fresh_db().await.unwrap();
    let a = PgStore::new(db.clone());
    let b = PgStore::new(db.clone());
    let codes = texts(&["USD", "CAD"]);

    let (left, right) = tokio::join!(
        a.upsert(ComponentKind::Currency, &codes),
        b.upsert(ComponentKind::Currency, &codes),
    );
    let (left, right) = (left.unwrap(), right.unwrap());

    assert_eq!(left.len(), 2);
    assert_eq!(left, right);
    assert_eq!(common::count(&db, "currency").await, 2);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn empty_upsert_touches_nothing() {
    let db = common::fresh_db().await.unwrap();
    let store = PgStore::new(db.clone());

    assert!(store.upsert(ComponentKind::Sku, &[]).await.unwrap().is_empty());
    assert_eq!(store.link(ComponentKind::Sku, &[]).await.unwrap(), 0);
    assert_eq!(common::count(&db, "sku").await, 0);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn links_ignore_existing_pairs() {
    let db = common::fresh_db().await.unwrap();
    let store = PgStore::new(db.clone());

    let entity = store.create_entity().await.unwrap();
    let ids = store
        .upsert(ComponentKind::Pattern, &texts(&["Floral", "Striped"]))
        .await
        .unwrap();
    let links: Vec<ComponentLink> = ids.iter().map(|id| ComponentLink::new(entity, *id)).collect();

    assert_eq!(store.link(ComponentKind::Pattern, &links).await.unwrap(), 2);
    assert_eq!(store.link(ComponentKind::Pattern, &links).await.unwrap(), 0);
    assert_eq!(common::count(&db, "entity_pattern").await, 2);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn price_needs_its_currency_row() {
    let db = common::fresh_db().await.unwrap();
    let store = PgStore::new(db.clone());
    let prices = vec![
        ComponentValue::Price(PriceValue::new("USD", 12999)),
        ComponentValue::Price(PriceValue::new("USD", 8900)),
    ];

    let err = store.upsert(ComponentKind::Price, &prices).await.unwrap_err();
    assert!(matches!(err, IngestError::LengthMismatch { expected: 2, actual: 0, .. }));

    store.upsert(ComponentKind::Currency, &texts(&["USD"])).await.unwrap();
    let first = store.upsert(ComponentKind::Price, &prices).await.unwrap();
    let again = store.upsert(ComponentKind::Price, &prices).await.unwrap();
    assert_eq!(first, again);
    assert_eq!(common::count(&db, "price").await, 2);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn csv_ingest_end_to_end() {
    let db = common::fresh_db().await.unwrap();
    let store = Arc::new(PgStore::new(db.clone()));
    let csv = r#"Inventory Sku Number,Rug Copy,Pattern,MSRP,Style,Basic Color Group,Color Name,Hero Image URL,Weight
KAR-100,Soft pile.,Floral;Striped,129.99,Modern,Blue,Harbor Mist,https://cdn.example.com/100.jpg,12 lbs
KAR-101,Soft pile.,Floral,"$1,299.00",Modern,Blue,Sandstone,https://cdn.example.com/101.jpg,14 lbs
KAR-102,,,TBD,Casual,,,,
"#;
    let rows = source::read_rows_from(csv.as_bytes()).unwrap();
    let ingestor = Ingestor::new(store, Arc::new(ColumnMap::karastan()), "USD");

    let summary = ingestor.run(rows.clone()).await;
    assert!(summary.is_success(), "{summary:?}");
    assert_eq!(summary.rows_extracted, 3);
    assert_eq!(summary.malformed_fields, 1);

    assert_eq!(common::count(&db, "entity").await, 3);
    assert_eq!(common::count(&db, "style").await, 2);
    assert_eq!(common::count(&db, "description").await, 1);
    assert_eq!(common::count(&db, "pattern").await, 2);
    assert_eq!(common::count(&db, "entity_pattern").await, 3);
    assert_eq!(common::count(&db, "currency").await, 1);
    assert_eq!(common::count(&db, "file").await, 2);
    assert_eq!(common::count(&db, "image").await, 2);

    let cents: Vec<i64> = sqlx::query_scalar("SELECT value FROM price ORDER BY value")
        .fetch_all(&db.pool)
        .await
        .unwrap();
    assert_eq!(cents, vec![12999, 129900]);

    // second run: new entities, no new components
    let rerun = ingestor.run(rows).await;
    assert!(rerun.is_success());
    assert_eq!(common::count(&db, "entity").await, 6);
    assert_eq!(common::count(&db, "style").await, 2);
    assert_eq!(common::count(&db, "price").await, 2);
    assert!(rerun
        .kinds
        .iter()
        .all(|k| k.status == KindStatus::Ok));
}
