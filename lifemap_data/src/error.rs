// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors of layer preparation.

use lifemap_aggregate::{AggregateError, ColumnKind};
use thiserror::Error;

/// Errors returned while preparing layer rows.
#[derive(Debug, Error)]
pub enum DataError {
    /// The input table is malformed or lacks a requested column.
    #[error(transparent)]
    Table(#[from] AggregateError),
    /// A column used as a size must be numeric.
    #[error("column `{column}` must be numeric, found {found} values")]
    NotNumeric {
        /// Offending column.
        column: String,
        /// What the column holds.
        found: ColumnKind,
    },
    /// Donuts need at least one count column.
    #[error("no count columns given for donuts")]
    NoCountColumns,
}
