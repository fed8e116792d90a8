// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifemap Tree: the read-only taxonomy index behind every Lifemap aggregation.
//!
//! The tree-layout dataset is produced once, outside this crate, and maps each
//! taxonomy id to a zoom level, a 2D placement and its ordered ancestor chain.
//! This crate turns that table into an immutable [`TreeIndex`]:
//!
//! - Exact-id lookups of zoom, position, parent, ancestors and leaf flag.
//! - Ancestor chains stored once in a flat buffer, so fan-out to ancestors is a slice.
//! - Structural validation on load: unique ids, a single root, consistent chains.
//!
//! It does not compute layouts. Coordinates and zoom levels are opaque inputs.
//!
//! ## API overview
//!
//! - [`TreeIndex`]: the index. Build it with [`TreeIndex::from_records`] or one of the
//!   JSON loaders ([`TreeIndex::from_json_slice`], [`TreeIndex::from_reader`],
//!   [`TreeIndex::from_path`]).
//! - [`NodeRecord`]: one row of the producer's table.
//! - [`TreeNode`]: borrowed view returned by lookups.
//! - [`TaxId`] and [`NodeFlags`].
//! - [`TreeIndex::unknown_ids`]: the data-quality check for caller ids missing from the tree.
//!
//! # Example
//!
//! ```rust
//! use lifemap_tree::{LoadOptions, TaxId, TreeIndex};
//!
//! let json = br#"[
//!     {"taxid": 0, "zoom": 4, "x": 0.0, "y": 0.0, "ancestors": []},
//!     {"taxid": 2759, "zoom": 6, "x": 1.5, "y": 9.0, "ancestors": [0]},
//!     {"taxid": 33154, "zoom": 8, "x": 3.0, "y": 11.5, "ancestors": [2759, 0]}
//! ]"#;
//! let index = TreeIndex::from_json_slice(json, &LoadOptions::default()).unwrap();
//!
//! let node = index.get(TaxId(33154)).unwrap();
//! assert_eq!(node.parent, Some(TaxId(2759)));
//! assert_eq!(node.ancestors, &[TaxId(2759), TaxId(0)]);
//! assert!(node.is_leaf());
//! ```

mod error;
mod index;
mod load;
mod types;

pub use error::TreeError;
pub use index::{LoadOptions, TreeIndex};
pub use types::{NodeFlags, NodeRecord, TaxId, TreeNode};

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_TREE: &str = include_str!("../../testdata/sample_tree.json");

    pub(crate) fn sample_index() -> TreeIndex {
        TreeIndex::from_json_slice(SAMPLE_TREE.as_bytes(), &LoadOptions::default())
            .expect("sample tree is valid")
    }

    pub(crate) fn record(id: i64, zoom: u8, ancestors: &[i64]) -> NodeRecord {
        NodeRecord {
            taxid: TaxId(id),
            zoom,
            x: 0.0,
            y: 0.0,
            ancestors: ancestors.iter().copied().map(TaxId).collect(),
            leaf: None,
        }
    }

    #[test]
    fn sample_zoom_levels() {
        let index = sample_index();
        assert_eq!(index.zoom(TaxId(2157)), Some(6));
        assert_eq!(index.zoom(TaxId(0)), Some(4));
        assert_eq!(index.zoom(TaxId(1)), None);
    }

    #[test]
    fn zoom_never_decreases_towards_leaves() {
        let index = sample_index();
        for node in index.iter() {
            for &ancestor in node.ancestors {
                assert!(
                    index.zoom(ancestor).unwrap() <= node.zoom,
                    "ancestor {ancestor} of {} has a higher zoom",
                    node.id
                );
            }
        }
    }
}
