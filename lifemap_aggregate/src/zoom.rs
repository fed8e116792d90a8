// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effective zoom levels for lazily displayed layers.

use core::fmt;
use core::str::FromStr;

use lifemap_tree::{TaxId, TreeIndex};
use serde::{Deserialize, Serialize};

use crate::error::AggregateError;
use crate::table::{Column, ID_COLUMN, Table};

/// Which zoom level gates the display of a node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoomPolicy {
    /// The node's own zoom.
    #[default]
    #[serde(rename = "self", alias = "own")]
    Own,
    /// The zoom of the node's parent, so the node shows up one level earlier.
    /// The root keeps its own zoom.
    #[serde(rename = "parent")]
    Parent,
}

impl ZoomPolicy {
    /// Effective zoom of `id`, or `None` if the node is not in `index`.
    ///
    /// Applying [`ZoomPolicy::Parent`] to the root is the same as
    /// [`ZoomPolicy::Own`].
    pub fn effective_zoom(self, index: &TreeIndex, id: TaxId) -> Option<u8> {
        match self {
            Self::Own => index.zoom(id),
            Self::Parent => match index.parent(id) {
                Some(parent) => index.zoom(parent),
                None => index.zoom(id),
            },
        }
    }
}

impl fmt::Display for ZoomPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Own => "self",
            Self::Parent => "parent",
        })
    }
}

impl FromStr for ZoomPolicy {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "self" | "own" => Ok(Self::Own),
            "parent" => Ok(Self::Parent),
            _ => Err(AggregateError::UnsupportedPolicy(s.to_owned())),
        }
    }
}

/// Options of [`Aggregator::propagate_zoom`](crate::Aggregator::propagate_zoom).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomOptions {
    /// Input column holding node ids.
    pub id_column: String,
    /// Zoom policy.
    pub policy: ZoomPolicy,
    /// Output column holding the effective zoom.
    pub result_column: String,
}

impl Default for ZoomOptions {
    fn default() -> Self {
        Self {
            id_column: ID_COLUMN.to_owned(),
            policy: ZoomPolicy::Own,
            result_column: "zoom".to_owned(),
        }
    }
}

impl ZoomOptions {
    /// Default options: ids in `taxid`, own zoom written to `zoom`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read node ids from `name`.
    pub fn id_column(mut self, name: impl Into<String>) -> Self {
        self.id_column = name.into();
        self
    }

    /// Use `policy`.
    pub fn policy(mut self, policy: ZoomPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Write zooms to `name`.
    pub fn result_column(mut self, name: impl Into<String>) -> Self {
        self.result_column = name.into();
        self
    }
}

pub(crate) fn propagate_zoom(
    index: &TreeIndex,
    data: &Table,
    options: &ZoomOptions,
) -> Result<Table, AggregateError> {
    if options.result_column == ID_COLUMN {
        return Err(AggregateError::ColumnCollision(options.result_column.clone()));
    }
    let input = data.ids(&options.id_column)?;

    let mut ids = Vec::with_capacity(input.len());
    let mut zooms = Vec::with_capacity(input.len());
    for &id in input {
        if let Some(zoom) = options.policy.effective_zoom(index, TaxId(id)) {
            ids.push(id);
            zooms.push(i64::from(zoom));
        }
    }
    if ids.len() < input.len() {
        let unknown = index.unknown_ids(input.iter().map(|&id| TaxId(id)));
        log::warn!(
            "no zoom for {} id(s) absent from the tree: {:?}",
            unknown.len(),
            unknown
        );
    }
    log::debug!("propagate_zoom({}): {} rows", options.policy, ids.len());

    Table::new()
        .with_column(ID_COLUMN, Column::Int(ids))?
        .with_column(options.result_column.clone(), Column::Int(zooms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Aggregator;
    use crate::tests::{pairs_int, sample_index};
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({"taxid": [2157, 48510, 55559, 1783263]})
    }

    #[test]
    fn own_zoom() {
        let index = sample_index();
        let out = Aggregator::new(&index)
            .propagate_zoom(&sample(), &ZoomOptions::default())
            .unwrap();
        assert_eq!(
            pairs_int(&out, "zoom"),
            vec![(2157, 6), (48510, 8), (55559, 18), (1783263, 13)]
        );
    }

    #[test]
    fn parent_zoom() {
        let index = sample_index();
        let out = Aggregator::new(&index)
            .propagate_zoom(&sample(), &ZoomOptions::new().policy(ZoomPolicy::Parent))
            .unwrap();
        assert_eq!(
            pairs_int(&out, "zoom"),
            vec![(2157, 4), (48510, 6), (55559, 8), (1783263, 6)]
        );
    }

    #[test]
    fn root_parent_zoom_is_its_own() {
        let index = sample_index();
        let root = index.root();
        assert_eq!(
            ZoomPolicy::Parent.effective_zoom(&index, root),
            ZoomPolicy::Own.effective_zoom(&index, root)
        );
        assert_eq!(ZoomPolicy::Parent.effective_zoom(&index, root), Some(4));
    }

    #[test]
    fn parent_zoom_never_exceeds_own_zoom() {
        let index = sample_index();
        for node in index.iter() {
            let own = ZoomPolicy::Own.effective_zoom(&index, node.id).unwrap();
            let parent = ZoomPolicy::Parent.effective_zoom(&index, node.id).unwrap();
            assert!(parent <= own, "{}", node.id);
        }
    }

    #[test]
    fn order_and_duplicates_are_kept_and_unknown_ids_dropped() {
        let index = sample_index();
        let data = json!({"tid": [55559, -5, 2157, 55559]});
        let options = ZoomOptions::new()
            .id_column("tid")
            .policy(ZoomPolicy::Parent)
            .result_column("lazy");
        let out = Aggregator::new(&index)
            .propagate_zoom(&data, &options)
            .unwrap();
        assert_eq!(out.names().collect::<Vec<_>>(), vec!["taxid", "lazy"]);
        assert_eq!(
            pairs_int(&out, "lazy"),
            vec![(55559, 8), (2157, 4), (55559, 8)]
        );
    }

    #[test]
    fn empty_inputs_give_empty_zooms() {
        let index = sample_index();
        let aggregator = Aggregator::new(&index);
        let options = ZoomOptions::new().policy(ZoomPolicy::Parent);
        let from_records = aggregator.propagate_zoom(&json!([]), &options).unwrap();
        let from_columns = aggregator
            .propagate_zoom(&json!({"taxid": []}), &options)
            .unwrap();
        assert_eq!(from_records, from_columns);
        assert_eq!(from_records.names().collect::<Vec<_>>(), vec!["taxid", "zoom"]);
        assert_eq!(from_records.height(), 0);
    }

    #[test]
    fn policies_parse_by_name() {
        assert_eq!("self".parse::<ZoomPolicy>().unwrap(), ZoomPolicy::Own);
        assert_eq!("own".parse::<ZoomPolicy>().unwrap(), ZoomPolicy::Own);
        assert_eq!("parent".parse::<ZoomPolicy>().unwrap(), ZoomPolicy::Parent);
        assert!(matches!(
            "grandparent".parse::<ZoomPolicy>(),
            Err(AggregateError::UnsupportedPolicy(_))
        ));
        let policy: ZoomPolicy = serde_json::from_value(json!("self")).unwrap();
        assert_eq!(policy, ZoomPolicy::Own);
        assert_eq!(policy.to_string(), "self");
    }
}
