use std::collections::HashMap;

use indexmap::IndexMap;

use crate::components::{ComponentId, ComponentKind, ComponentLink, ComponentValue, EntityId};
use crate::error::{IngestError, IngestResult};
use crate::ingest::extract::Occurrence;

/// Join accumulated occurrences with the ids an upsert returned.
///
/// `values[i]` must correspond to `ids[i]`. The result holds one link per
/// `(entity, component)` pair; repeats keep the first sort order seen.
pub fn correlate(
    kind: ComponentKind,
    occurrences: &[Occurrence],
    values: &[ComponentValue],
    ids: &[ComponentId],
) -> IngestResult<Vec<ComponentLink>> {
    if values.len() != ids.len() {
        return Err(IngestError::LengthMismatch {
            kind,
            expected: values.len(),
            actual: ids.len(),
        });
    }

    let by_value: HashMap<&ComponentValue, ComponentId> =
        values.iter().zip(ids.iter().copied()).collect();

    let mut links: IndexMap<(EntityId, ComponentId), ComponentLink> =
        IndexMap::with_capacity(occurrences.len());
    for occurrence in occurrences {
        let component_id = *by_value.get(&occurrence.value).ok_or_else(|| {
            IngestError::CorrelationFailure {
                kind,
                value: occurrence.value.to_string(),
            }
        })?;
        links
            .entry((occurrence.entity_id, component_id))
            .or_insert(ComponentLink {
                entity_id: occurrence.entity_id,
                component_id,
                sort_order: occurrence.sort_order,
            });
    }

    Ok(links.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn occ(entity_id: EntityId, value: &str) -> Occurrence {
        Occurrence {
            entity_id,
            value: ComponentValue::text(value),
            sort_order: 0,
        }
    }

    #[test]
    fn pairs_entities_with_positional_ids() {
        let values = vec![ComponentValue::text("Modern"), ComponentValue::text("Casual")];
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let occurrences = vec![occ(1, "Casual"), occ(2, "Modern"), occ(3, "Casual")];

        let links = correlate(ComponentKind::Style, &occurrences, &values, &ids).unwrap();

        assert_eq!(
            links,
            vec![
                ComponentLink::new(1, ids[1]),
                ComponentLink::new(2, ids[0]),
                ComponentLink::new(3, ids[1]),
            ]
        );
    }

    #[test]
    fn collapses_repeated_pairs() {
        let values = vec![ComponentValue::text("Wool")];
        let ids = vec![Uuid::new_v4()];
        let occurrences = vec![occ(1, "Wool"), occ(1, "Wool")];

        let links = correlate(ComponentKind::Feature, &occurrences, &values, &ids).unwrap();
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn missing_value_is_a_correlation_failure() {
        let values = vec![ComponentValue::text("Wool")];
        let ids = vec![Uuid::new_v4()];
        let occurrences = vec![occ(1, "Silk")];

        let err = correlate(ComponentKind::Feature, &occurrences, &values, &ids).unwrap_err();
        assert!(matches!(
            err,
            IngestError::CorrelationFailure { kind: ComponentKind::Feature, .. }
        ));
    }

    #[test]
    fn short_id_list_is_a_length_mismatch() {
        let values = vec![ComponentValue::text("a"), ComponentValue::text("b")];
        let ids = vec![Uuid::new_v4()];

        let err = correlate(ComponentKind::Sku, &[], &values, &ids).unwrap_err();
        assert!(matches!(
            err,
            IngestError::LengthMismatch { expected: 2, actual: 1, .. }
        ));
    }
}
