// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifemap Aggregate: propagate per-taxon observations up the Lifemap tree.
//!
//! Callers hold observations keyed by taxonomy id, usually at the leaves. To
//! show them at every zoom level, each observation is fanned out to all of its
//! ancestors ([`expand_ancestors`]) and the fan-out is grouped per node:
//!
//! - [`Aggregator::count`]: how many rows sit at or below each node.
//! - [`Aggregator::num`]: a [`Reduction`] of a numeric column over each subtree.
//! - [`Aggregator::freq`] and [`Aggregator::freq_long`]: per-level counts of a
//!   categorical column.
//! - [`Aggregator::propagate_zoom`]: the zoom level gating each node's display
//!   under a [`ZoomPolicy`].
//!
//! Inputs are any [`TableSource`]: a [`Table`], JSON in records or columns
//! orientation, or an Arrow [`RecordBatch`](arrow::record_batch::RecordBatch).
//! Outputs are [`Table`]s whose id column is always [`ID_COLUMN`], sorted by
//! id.
//!
//! Ids unknown to the tree are not errors. They are logged with
//! [`log::warn!`] and left out of the results.
//!
//! # Example
//!
//! ```rust
//! use lifemap_aggregate::{Aggregator, CountOptions};
//! use lifemap_tree::{LoadOptions, TreeIndex};
//! use serde_json::json;
//!
//! let index = TreeIndex::from_json_slice(br#"[
//!     {"taxid": 0, "zoom": 4, "x": 0.0, "y": 0.0, "ancestors": []},
//!     {"taxid": 2759, "zoom": 6, "x": 1.5, "y": 9.0, "ancestors": [0]},
//!     {"taxid": 33154, "zoom": 8, "x": 3.0, "y": 11.5, "ancestors": [2759, 0]},
//!     {"taxid": 33090, "zoom": 8, "x": 0.5, "y": 12.0, "ancestors": [2759, 0]}
//! ]"#, &LoadOptions::default()).unwrap();
//!
//! let data = json!({"taxid": [33154, 33154, 33090]});
//! let counts = Aggregator::new(&index)
//!     .count(&data, &CountOptions::default())
//!     .unwrap();
//! assert_eq!(
//!     serde_json::to_value(&counts).unwrap(),
//!     json!({"taxid": [0, 2759, 33090, 33154], "n": [3, 3, 1, 2]})
//! );
//! ```

mod aggregator;
mod count;
mod error;
mod expand;
mod freq;
mod numeric;
mod record_batch;
mod table;
mod zoom;

pub use aggregator::Aggregator;
pub use count::CountOptions;
pub use error::AggregateError;
pub use expand::expand_ancestors;
pub use freq::{COUNT_COLUMN, FreqOptions};
pub use numeric::{NumOptions, Reduction};
pub use table::{Column, ColumnKind, ID_COLUMN, Table, TableSource};
pub use zoom::{ZoomOptions, ZoomPolicy};
