// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while building or loading a [`TreeIndex`](crate::TreeIndex).

use thiserror::Error;

use crate::types::TaxId;

/// A tree-layout table that does not describe a single rooted tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The same id appears on several rows.
    #[error("node {0} appears more than once in the tree table")]
    DuplicateId(TaxId),
    /// No row has an empty ancestor chain.
    #[error("the tree table has no root (a node with an empty ancestor chain)")]
    MissingRoot,
    /// More than one row has an empty ancestor chain.
    #[error("the tree table has several roots: {first} and {second}")]
    MultipleRoots {
        /// First root encountered.
        first: TaxId,
        /// Second root encountered.
        second: TaxId,
    },
    /// An ancestor chain names an id that has no row.
    #[error("node {node} lists unknown ancestor {ancestor}")]
    UnknownAncestor {
        /// Node whose chain is broken.
        node: TaxId,
        /// The missing ancestor.
        ancestor: TaxId,
    },
    /// A chain is not its parent's chain prefixed by the parent.
    #[error("ancestor chain of node {node} does not continue the chain of its parent {parent}")]
    BrokenChain {
        /// Node whose chain is inconsistent.
        node: TaxId,
        /// Its parent (first chain entry).
        parent: TaxId,
    },
    /// A stored leaf flag contradicts the tree structure.
    #[error("node {node} is flagged leaf={flagged} but has leaf={derived} in the tree")]
    LeafMismatch {
        /// Offending node.
        node: TaxId,
        /// Flag found in the table.
        flagged: bool,
        /// Flag derived from the parent relation.
        derived: bool,
    },
    /// The table could not be read.
    #[error("could not read the tree table")]
    Io(#[from] std::io::Error),
    /// The table could not be decoded.
    #[error("could not decode the tree table")]
    Json(#[from] serde_json::Error),
}
