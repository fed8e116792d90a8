// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ancestor expansion: the fan-out shared by every aggregator.

use hashbrown::HashSet;
use lifemap_tree::{TaxId, TreeIndex};

/// Fan each `(node, payload)` row out to one `(ancestor, payload)` row per
/// strict ancestor of `node`, parent first and root last.
///
/// The node itself is never emitted, so rows at the root expand to nothing.
/// Rows whose node is unknown to `index` also expand to nothing.
///
/// ```rust
/// # use lifemap_tree::{LoadOptions, TaxId, TreeIndex};
/// use lifemap_aggregate::expand_ancestors;
/// # let index = TreeIndex::from_json_slice(br#"[
/// #     {"taxid": 0, "zoom": 4, "x": 0.0, "y": 0.0, "ancestors": []},
/// #     {"taxid": 2759, "zoom": 6, "x": 0.0, "y": 0.0, "ancestors": [0]},
/// #     {"taxid": 33154, "zoom": 8, "x": 0.0, "y": 0.0, "ancestors": [2759, 0]}
/// # ]"#, &LoadOptions::default()).unwrap();
///
/// let rows = [(TaxId(33154), "a"), (TaxId(0), "b"), (TaxId(-1), "c")];
/// let expanded: Vec<_> = expand_ancestors(&index, rows).collect();
/// assert_eq!(expanded, vec![(TaxId(2759), "a"), (TaxId(0), "a")]);
/// ```
pub fn expand_ancestors<'a, P, I>(
    index: &'a TreeIndex,
    rows: I,
) -> impl Iterator<Item = (TaxId, P)> + 'a
where
    P: Clone + 'a,
    I: IntoIterator<Item = (TaxId, P)>,
    I::IntoIter: 'a,
{
    rows.into_iter().flat_map(move |(node, payload)| {
        index
            .ancestors(node)
            .unwrap_or_default()
            .iter()
            .map(move |&ancestor| (ancestor, payload.clone()))
    })
}

/// Positions of the rows whose id is present in the tree.
///
/// Unknown ids are a data quality issue, not an error: they are reported once
/// and then left out of every aggregate.
pub(crate) fn known_rows(index: &TreeIndex, ids: &[i64]) -> Vec<usize> {
    let mut unknown: HashSet<i64> = HashSet::new();
    let known: Vec<usize> = ids
        .iter()
        .enumerate()
        .filter_map(|(row, &id)| {
            if index.contains(TaxId(id)) {
                Some(row)
            } else {
                unknown.insert(id);
                None
            }
        })
        .collect();
    if !unknown.is_empty() {
        let mut unknown: Vec<i64> = unknown.into_iter().collect();
        unknown.sort_unstable();
        log::warn!(
            "{} row(s) reference {} id(s) absent from the tree and are ignored: {:?}",
            ids.len() - known.len(),
            unknown.len(),
            unknown
        );
    }
    known
}
