use std::hash::Hash;

use indexmap::IndexSet;

/// Collapse a sequence of occurrences into its distinct values, keeping the
/// order of first appearance.
///
/// Every value handed to a bulk upsert must be distinct: Postgres refuses an
/// `ON CONFLICT DO UPDATE` that touches the same row twice in one statement.
pub fn distinct<'a, T, I>(values: I) -> Vec<T>
where
    T: Eq + Hash + Clone + 'a,
    I: IntoIterator<Item = &'a T>,
{
    values
        .into_iter()
        .collect::<IndexSet<&T>>()
        .into_iter()
        .cloned()
        .collect()
}
