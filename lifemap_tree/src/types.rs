// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the tree index: node identifiers, flags, and table rows.

use core::fmt;

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Stable identifier of a taxonomic node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxId(pub i64);

impl TaxId {
    /// The raw integer identifier.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for TaxId {
    #[inline]
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<TaxId> for i64 {
    #[inline]
    fn from(id: TaxId) -> Self {
        id.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

bitflags::bitflags! {
    /// Structural flags derived when the index is built.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// No other node has this node as its parent.
        const LEAF = 0b0000_0001;
        /// The node has no parent.
        const ROOT = 0b0000_0010;
    }
}

/// One row of the externally produced tree-layout table.
///
/// The original column names of the layout dataset (`pylifemap_zoom`,
/// `pylifemap_x`, ...) are accepted as aliases.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node identifier.
    pub taxid: TaxId,
    /// Zoom level at which the node first becomes visible.
    #[serde(alias = "pylifemap_zoom")]
    pub zoom: u8,
    /// Horizontal placement.
    #[serde(alias = "pylifemap_x", alias = "lon")]
    pub x: f64,
    /// Vertical placement.
    #[serde(alias = "pylifemap_y", alias = "lat")]
    pub y: f64,
    /// Strict ancestors, parent first and root last. Empty for the root.
    #[serde(default, alias = "pylifemap_ascend", alias = "ascend")]
    pub ancestors: Vec<TaxId>,
    /// Leaf flag as stored by the producer, checked against the derived one.
    #[serde(default, alias = "pylifemap_leaf", skip_serializing_if = "Option::is_none")]
    pub leaf: Option<bool>,
}

/// Borrowed view of one indexed node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TreeNode<'a> {
    /// Node identifier.
    pub id: TaxId,
    /// Zoom level at which the node first becomes visible.
    pub zoom: u8,
    /// Fixed visual placement.
    pub position: Point,
    /// Parent node, `None` only for the root.
    pub parent: Option<TaxId>,
    /// Strict ancestors, parent first and root last.
    pub ancestors: &'a [TaxId],
    /// Leaf/root flags.
    pub flags: NodeFlags,
}

impl TreeNode<'_> {
    /// Whether no other node descends from this one.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.flags.contains(NodeFlags::LEAF)
    }

    /// Whether this is the root of the tree.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.flags.contains(NodeFlags::ROOT)
    }

    /// Number of strict ancestors.
    #[inline]
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }
}
