// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifemap Data: place caller data on the Lifemap tree and shape it into layer
//! rows.
//!
//! [`LifemapData`] wraps a table keyed by taxonomy id, usually the output of a
//! [`lifemap_aggregate::Aggregator`], and joins it with the tree:
//!
//! - [`LifemapData::points`]: one point per row, optionally leaves only or no
//!   leaves, with a lazy [`ZoomPolicy`](lifemap_aggregate::ZoomPolicy).
//! - [`LifemapData::lines`]: one segment per row, from the node to its parent.
//! - [`LifemapData::donuts`]: per-node level counts as compact JSON objects.
//!
//! [`LazyWindow`] decides which of those rows a viewer draws at a given extent
//! and zoom.
//!
//! # Example
//!
//! ```rust
//! use lifemap_data::{LeafFilter, LifemapData, PointsOptions};
//! use lifemap_tree::{LoadOptions, TreeIndex};
//! use serde_json::json;
//!
//! let index = TreeIndex::from_json_slice(br#"[
//!     {"taxid": 0, "zoom": 4, "x": 0.0, "y": 0.0, "ancestors": []},
//!     {"taxid": 2759, "zoom": 6, "x": 1.5, "y": 9.0, "ancestors": [0]}
//! ]"#, &LoadOptions::default()).unwrap();
//!
//! let data = LifemapData::new(&index, &json!({"taxid": [0, 2759]}), "taxid").unwrap();
//! let leaves = data
//!     .points(&PointsOptions::new().leaves(LeafFilter::Only))
//!     .unwrap();
//! assert_eq!(leaves.len(), 1);
//! assert_eq!((leaves[0].x, leaves[0].y), (1.5, 9.0));
//! ```

mod data;
mod error;
mod lazy;

pub use data::{
    DonutRow, LeafFilter, LifemapData, LineRow, LinesOptions, LocatedRow, PointRow,
    PointsOptions,
};
pub use error::DataError;
pub use lazy::{LAZY_ROW_THRESHOLD, LazyWindow, resolve_lazy};
