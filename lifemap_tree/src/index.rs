// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The read-only tree index and its lookups.

use core::ops::Range;

use hashbrown::{HashMap, HashSet};
use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::types::{NodeFlags, NodeRecord, TaxId, TreeNode};

/// Options applied while building a [`TreeIndex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Reject tables whose stored `leaf` flags disagree with the parent relation.
    pub check_leaf_flags: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            check_leaf_flags: true,
        }
    }
}

impl LoadOptions {
    /// Default options (leaf flags are checked).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the leaf flag check.
    pub fn check_leaf_flags(mut self, check: bool) -> Self {
        self.check_leaf_flags = check;
        self
    }
}

#[derive(Clone, Debug)]
struct Slot {
    id: TaxId,
    zoom: u8,
    position: Point,
    /// Range into `TreeIndex::chains`.
    chain: Range<usize>,
    /// Range into `TreeIndex::children`.
    children: Range<usize>,
    flags: NodeFlags,
}

/// Immutable table of taxonomic nodes keyed by [`TaxId`].
///
/// Every node's full ancestor chain is stored once in a flattened buffer, so
/// expanding a node to its ancestors is a slice lookup, never a walk up the
/// tree.
///
/// ## Example
///
/// ```rust
/// use lifemap_tree::{LoadOptions, NodeRecord, TaxId, TreeIndex};
///
/// let rows = vec![
///     NodeRecord { taxid: TaxId(0), zoom: 4, x: 0.0, y: 0.0, ancestors: vec![], leaf: None },
///     NodeRecord { taxid: TaxId(2), zoom: 6, x: 1.0, y: 1.0, ancestors: vec![TaxId(0)], leaf: None },
/// ];
/// let index = TreeIndex::from_records(rows, &LoadOptions::default()).unwrap();
///
/// assert_eq!(index.root(), TaxId(0));
/// assert_eq!(index.parent(TaxId(2)), Some(TaxId(0)));
/// assert!(index.is_leaf(TaxId(2)).unwrap());
/// ```
pub struct TreeIndex {
    slots: Vec<Slot>,
    by_id: HashMap<TaxId, usize>,
    chains: Vec<TaxId>,
    children: Vec<TaxId>,
    root: usize,
}

impl core::fmt::Debug for TreeIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let leaves = self
            .slots
            .iter()
            .filter(|s| s.flags.contains(NodeFlags::LEAF))
            .count();
        f.debug_struct("TreeIndex")
            .field("nodes", &self.slots.len())
            .field("leaves", &leaves)
            .field("root", &self.root())
            .field("chain_entries", &self.chains.len())
            .finish_non_exhaustive()
    }
}

impl TreeIndex {
    /// Build an index from the rows of a tree-layout table.
    ///
    /// The rows must describe a single rooted tree: unique ids, exactly one
    /// node with an empty chain, every chain entry a known id, and every chain
    /// equal to its parent's chain prefixed by the parent. Parent ids and leaf
    /// flags are derived from the chains.
    pub fn from_records<I>(records: I, options: &LoadOptions) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = NodeRecord>,
    {
        let records: Vec<NodeRecord> = records.into_iter().collect();

        let mut by_id: HashMap<TaxId, usize> = HashMap::with_capacity(records.len());
        let mut root: Option<usize> = None;
        for (slot, record) in records.iter().enumerate() {
            if by_id.insert(record.taxid, slot).is_some() {
                return Err(TreeError::DuplicateId(record.taxid));
            }
            if record.ancestors.is_empty() {
                if let Some(first) = root {
                    return Err(TreeError::MultipleRoots {
                        first: records[first].taxid,
                        second: record.taxid,
                    });
                }
                root = Some(slot);
            }
        }
        let root = root.ok_or(TreeError::MissingRoot)?;

        let mut parents: HashSet<TaxId> = HashSet::new();
        for record in &records {
            for &ancestor in &record.ancestors {
                if !by_id.contains_key(&ancestor) {
                    return Err(TreeError::UnknownAncestor {
                        node: record.taxid,
                        ancestor,
                    });
                }
            }
            let Some((&parent, rest)) = record.ancestors.split_first() else {
                continue;
            };
            // Chains shrink by one per step up, so this also rules out cycles.
            if records[by_id[&parent]].ancestors != rest {
                return Err(TreeError::BrokenChain {
                    node: record.taxid,
                    parent,
                });
            }
            parents.insert(parent);
        }

        let mut child_lists: Vec<Vec<TaxId>> = vec![Vec::new(); records.len()];
        for record in &records {
            if let Some(parent) = record.ancestors.first() {
                child_lists[by_id[parent]].push(record.taxid);
            }
        }

        let total_chain: usize = records.iter().map(|r| r.ancestors.len()).sum();
        let mut chains = Vec::with_capacity(total_chain);
        let mut children = Vec::with_capacity(records.len().saturating_sub(1));
        let mut slots = Vec::with_capacity(records.len());
        for (slot, (record, kids)) in records.into_iter().zip(child_lists).enumerate() {
            let derived_leaf = !parents.contains(&record.taxid);
            if options.check_leaf_flags
                && let Some(flagged) = record.leaf
                && flagged != derived_leaf
            {
                return Err(TreeError::LeafMismatch {
                    node: record.taxid,
                    flagged,
                    derived: derived_leaf,
                });
            }
            let mut flags = NodeFlags::empty();
            flags.set(NodeFlags::LEAF, derived_leaf);
            flags.set(NodeFlags::ROOT, slot == root);

            let chain_start = chains.len();
            chains.extend_from_slice(&record.ancestors);
            let children_start = children.len();
            children.extend(kids);

            slots.push(Slot {
                id: record.taxid,
                zoom: record.zoom,
                position: Point::new(record.x, record.y),
                chain: chain_start..chains.len(),
                children: children_start..children.len(),
                flags,
            });
        }

        let index = Self {
            slots,
            by_id,
            chains,
            children,
            root,
        };
        log::debug!(
            "built tree index: {} nodes, {} chain entries, root {}",
            index.len(),
            index.chains.len(),
            index.root()
        );
        Ok(index)
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the index holds no nodes. Never true for a successfully built index.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The root node id.
    #[inline]
    pub fn root(&self) -> TaxId {
        self.slots[self.root].id
    }

    /// Whether `id` is a node of the tree.
    #[inline]
    pub fn contains(&self, id: TaxId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Look up one node by exact id.
    pub fn get(&self, id: TaxId) -> Option<TreeNode<'_>> {
        self.by_id.get(&id).map(|&slot| self.view(slot))
    }

    /// Zoom level of a node.
    pub fn zoom(&self, id: TaxId) -> Option<u8> {
        self.slot(id).map(|s| s.zoom)
    }

    /// Placement of a node.
    pub fn position(&self, id: TaxId) -> Option<Point> {
        self.slot(id).map(|s| s.position)
    }

    /// Parent of a node; `None` for the root and for unknown ids.
    pub fn parent(&self, id: TaxId) -> Option<TaxId> {
        self.ancestors(id).and_then(|chain| chain.first().copied())
    }

    /// Strict ancestors of a node, parent first and root last.
    pub fn ancestors(&self, id: TaxId) -> Option<&[TaxId]> {
        self.slot(id).map(|s| &self.chains[s.chain.clone()])
    }

    /// Direct children of a node, in table order.
    pub fn children(&self, id: TaxId) -> Option<&[TaxId]> {
        self.slot(id).map(|s| &self.children[s.children.clone()])
    }

    /// Whether a node is a leaf; `None` for unknown ids.
    pub fn is_leaf(&self, id: TaxId) -> Option<bool> {
        self.slot(id).map(|s| s.flags.contains(NodeFlags::LEAF))
    }

    /// Iterate over all nodes in table order.
    pub fn iter(&self) -> impl Iterator<Item = TreeNode<'_>> + '_ {
        (0..self.slots.len()).map(|slot| self.view(slot))
    }

    /// Look up an ordered set of ids, yielding only those present in the index.
    ///
    /// Unmatched ids produce no item, so callers can detect orphaned
    /// references by comparing lengths or with [`TreeIndex::unknown_ids`].
    pub fn lookup<'a, I>(&'a self, ids: I) -> impl Iterator<Item = TreeNode<'a>> + 'a
    where
        I: IntoIterator<Item = TaxId>,
        I::IntoIter: 'a,
    {
        ids.into_iter().filter_map(|id| self.get(id))
    }

    /// Ids absent from the index, deduplicated, in first-seen order.
    pub fn unknown_ids<I>(&self, ids: I) -> Vec<TaxId>
    where
        I: IntoIterator<Item = TaxId>,
    {
        let mut seen = HashSet::new();
        ids.into_iter()
            .filter(|id| !self.contains(*id) && seen.insert(*id))
            .collect()
    }

    fn slot(&self, id: TaxId) -> Option<&Slot> {
        self.by_id.get(&id).map(|&slot| &self.slots[slot])
    }

    fn view(&self, slot: usize) -> TreeNode<'_> {
        let s = &self.slots[slot];
        let ancestors = &self.chains[s.chain.clone()];
        TreeNode {
            id: s.id,
            zoom: s.zoom,
            position: s.position,
            parent: ancestors.first().copied(),
            ancestors,
            flags: s.flags,
        }
    }
}
