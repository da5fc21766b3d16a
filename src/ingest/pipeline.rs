use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::components::ComponentKind;
use crate::database_ops::ComponentStore;
use crate::error::IngestResult;
use crate::ingest::dedup;
use crate::ingest::extract::{Accumulator, Occurrence, RowExtractor, RowRecord};
use crate::ingest::link::correlate;
use crate::ingest::summary::{IngestSummary, KindReport, KindStatus, RowFailure};
use crate::normalization::ColumnMap;

/// Counts from one successful kind pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSync {
    pub distinct: usize,
    pub linked: u64,
}

/// Dedup -> upsert -> correlate -> link for one kind.
pub async fn sync_kind(
    store: &dyn ComponentStore,
    kind: ComponentKind,
    occurrences: &[Occurrence],
) -> IngestResult<KindSync> {
    let values = dedup::distinct(occurrences.iter().map(|o| &o.value));
    let ids = store.upsert(kind, &values).await?;
    let links = correlate(kind, occurrences, &values, &ids)?;
    let linked = store.link(kind, &links).await?;
    Ok(KindSync {
        distinct: values.len(),
        linked,
    })
}

/// Drives a whole run: one entity per row, extraction, then the per-kind
/// pipelines as concurrent tasks.
///
/// Kinds other kinds depend on (currency, file) go first; the rest follow
/// once they finish. A failing kind never cancels the others, and a kind
/// whose prerequisite failed is reported as skipped.
pub struct Ingestor {
    store: Arc<dyn ComponentStore>,
    columns: Arc<ColumnMap>,
    currency: String,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn ComponentStore>,
        columns: Arc<ColumnMap>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            columns,
            currency: currency.into(),
        }
    }

    pub async fn run<I>(&self, rows: I) -> IngestSummary
    where
        I: IntoIterator<Item = RowRecord>,
    {
        let started = Instant::now();
        let mut summary = IngestSummary::new(Utc::now());
        info!(store = self.store.name(), columns = self.columns.len(), "starting ingestion");

        let acc = self.extract_rows(rows, &mut summary).await;
        info!(
            rows = summary.rows_extracted,
            kinds = acc.kinds().count(),
            "extraction complete"
        );

        let mut parts = acc.into_parts();
        let first_wave: BTreeMap<_, _> = ComponentKind::ALL
            .into_iter()
            .filter(|k| k.is_prerequisite())
            .filter_map(|k| parts.remove_entry(&k))
            .collect();

        let mut reports = self.run_wave(first_wave).await;
        let failed: HashSet<ComponentKind> = reports
            .iter()
            .filter(|r| !r.is_ok())
            .map(|r| r.kind)
            .collect();

        let mut second_wave = BTreeMap::new();
        for (kind, occurrences) in parts {
            match kind.prerequisite() {
                Some(pre) if failed.contains(&pre) => {
                    warn!(kind = %kind, prerequisite = %pre, "skipping kind; prerequisite failed");
                    reports.push(KindReport {
                        kind,
                        occurrences: occurrences.len(),
                        distinct: 0,
                        linked: 0,
                        status: KindStatus::Skipped(format!("prerequisite {pre} failed")),
                    });
                }
                _ => {
                    second_wave.insert(kind, occurrences);
                }
            }
        }
        reports.extend(self.run_wave(second_wave).await);

        reports.sort_by_key(|r| r.kind);
        summary.kinds = reports;
        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        summary.log();
        summary
    }

    async fn extract_rows<I>(&self, rows: I, summary: &mut IngestSummary) -> Accumulator
    where
        I: IntoIterator<Item = RowRecord>,
    {
        let extractor = RowExtractor::new(&self.columns, self.currency.clone());
        let mut acc = Accumulator::default();

        for (index, row) in rows.into_iter().enumerate() {
            let row_number = index + 1;
            summary.rows_seen += 1;

            let entity_id = match self.store.create_entity().await {
                Ok(id) => id,
                Err(e) => {
                    error!(row = row_number, error = %e, "entity creation failed; skipping row");
                    summary.row_failures.push(RowFailure {
                        row: row_number,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for skipped in extractor.extract(entity_id, &row, &mut acc) {
                warn!(row = row_number, entity_id, error = %skipped, "skipping malformed field");
                summary.malformed_fields += 1;
            }
            summary.rows_extracted += 1;
        }
        acc
    }

    async fn run_wave(&self, wave: BTreeMap<ComponentKind, Vec<Occurrence>>) -> Vec<KindReport> {
        let mut tasks = Vec::with_capacity(wave.len());
        let mut spawned = Vec::with_capacity(wave.len());
        for (kind, occurrences) in wave {
            let store = Arc::clone(&self.store);
            spawned.push((kind, occurrences.len()));
            tasks.push(tokio::spawn(async move {
                let res = sync_kind(store.as_ref(), kind, &occurrences).await;
                let status = match &res {
                    Ok(sync) => {
                        debug!(kind = %kind, distinct = sync.distinct, linked = sync.linked, "kind finished");
                        KindStatus::Ok
                    }
                    Err(e) => {
                        error!(kind = %kind, error = %e, "kind failed");
                        KindStatus::Failed(e.to_string())
                    }
                };
                let sync = res.unwrap_or(KindSync {
                    distinct: 0,
                    linked: 0,
                });
                KindReport {
                    kind,
                    occurrences: occurrences.len(),
                    distinct: sync.distinct,
                    linked: sync.linked,
                    status,
                }
            }));
        }

        join_all(tasks)
            .await
            .into_iter()
            .zip(spawned)
            .map(|(joined, (kind, occurrences))| match joined {
                Ok(report) => report,
                Err(join_err) => {
                    error!(kind = %kind, error = %join_err, "kind task panicked");
                    KindReport {
                        kind,
                        occurrences,
                        distinct: 0,
                        linked: 0,
                        status: KindStatus::Failed(format!("task panicked: {join_err}")),
                    }
                }
            })
            .collect()
    }
}
