use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::debug;
use uuid::Uuid;

use crate::components::{ComponentId, ComponentKind, ComponentLink, ComponentValue, EntityId};
use crate::database_ops::store::{check_shape, ComponentStore};
use crate::error::{IngestError, IngestResult};

/// Natural key a component row is unique on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NaturalKey {
    Text(String),
    Price { currency_id: ComponentId, cents: i64 },
    File(ComponentId),
}

#[derive(Debug, Default)]
struct Tables {
    last_entity: EntityId,
    components: HashMap<ComponentKind, IndexMap<NaturalKey, ComponentId>>,
    links: HashMap<ComponentKind, IndexMap<(EntityId, ComponentId), i32>>,
}

impl Tables {
    fn lookup(&self, kind: ComponentKind, key: &NaturalKey) -> Option<ComponentId> {
        self.components.get(&kind)?.get(key).copied()
    }

    /// Resolve a value to its natural key; `None` when a referenced
    /// currency or file row does not exist (the row is then dropped, as an
    /// inner join would).
    fn natural_key(&self, kind: ComponentKind, value: &ComponentValue) -> Option<NaturalKey> {
        match (kind, value) {
            (ComponentKind::Price, ComponentValue::Price(p)) => {
                let currency_id =
                    self.lookup(ComponentKind::Currency, &NaturalKey::Text(p.currency.clone()))?;
                Some(NaturalKey::Price {
                    currency_id,
                    cents: p.cents,
                })
            }
            (ComponentKind::Image, ComponentValue::Text(source)) => self
                .lookup(ComponentKind::File, &NaturalKey::Text(source.clone()))
                .map(NaturalKey::File),
            (_, ComponentValue::Text(text)) => Some(NaturalKey::Text(text.clone())),
            (_, ComponentValue::Price(_)) => None,
        }
    }
}

/// In-process store with the same uniqueness and conflict rules as the
/// Postgres schema. Backs `--dry-run` and the pipeline tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        // A poisoned lock only means another task panicked mid-write; the
        // maps themselves are still consistent for every completed call.
        let mut guard = self
            .tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub fn entity_count(&self) -> usize {
        self.with_tables(|t| t.last_entity as usize)
    }

    pub fn component_count(&self, kind: ComponentKind) -> usize {
        self.with_tables(|t| t.components.get(&kind).map_or(0, IndexMap::len))
    }

    pub fn link_count(&self, kind: ComponentKind) -> usize {
        self.with_tables(|t| t.links.get(&kind).map_or(0, IndexMap::len))
    }

    pub fn links(&self, kind: ComponentKind) -> Vec<ComponentLink> {
        self.with_tables(|t| {
            t.links
                .get(&kind)
                .map(|links| {
                    links
                        .iter()
                        .map(|(&(entity_id, component_id), &sort_order)| ComponentLink {
                            entity_id,
                            component_id,
                            sort_order,
                        })
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    /// Component ids linked to `entity_id` under `kind`.
    pub fn components_of(&self, kind: ComponentKind, entity_id: EntityId) -> Vec<ComponentId> {
        self.links(kind)
            .into_iter()
            .filter(|l| l.entity_id == entity_id)
            .map(|l| l.component_id)
            .collect()
    }
}

#[async_trait]
impl ComponentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_entity(&self) -> IngestResult<EntityId> {
        Ok(self.with_tables(|t| {
            t.last_entity += 1;
            t.last_entity
        }))
    }

    async fn upsert(
        &self,
        kind: ComponentKind,
        values: &[ComponentValue],
    ) -> IngestResult<Vec<ComponentId>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        check_shape(kind, values)?;

        let ids = self.with_tables(|t| {
            let keys: Vec<NaturalKey> = values
                .iter()
                .filter_map(|v| t.natural_key(kind, v))
                .collect();
            let table = t.components.entry(kind).or_default();
            keys.into_iter()
                .map(|key| *table.entry(key).or_insert_with(Uuid::now_v7))
                .collect::<Vec<_>>()
        });
        debug!(kind = %kind, values = values.len(), ids = ids.len(), "memory upsert");

        if ids.len() != values.len() {
            return Err(IngestError::LengthMismatch {
                kind,
                expected: values.len(),
                actual: ids.len(),
            });
        }
        Ok(ids)
    }

    async fn link(&self, kind: ComponentKind, links: &[ComponentLink]) -> IngestResult<u64> {
        if links.is_empty() {
            return Ok(0);
        }
        Ok(self.with_tables(|t| {
            let junction = t.links.entry(kind).or_default();
            links
                .iter()
                .filter(|l| {
                    let key = (l.entity_id, l.component_id);
                    if junction.contains_key(&key) {
                        false
                    } else {
                        junction.insert(key, l.sort_order);
                        true
                    }
                })
                .count() as u64
        }))
    }
}
