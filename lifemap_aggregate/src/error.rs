// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Validation failures of aggregation calls.
//!
//! Every variant is raised before any aggregate is computed. Ids unknown to
//! the tree are not errors: they are logged and contribute nothing.

use thiserror::Error;

use crate::table::ColumnKind;

/// Errors returned by the aggregation entry points.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// The input is not a recognized tabular shape.
    #[error("data must be an array of records or an object of columns, found {found}")]
    InvalidShape {
        /// JSON kind that was found instead.
        found: &'static str,
    },
    /// A requested column is absent.
    #[error("column `{0}` not found in data")]
    MissingColumn(String),
    /// The aggregated column is the id column itself.
    #[error("can't aggregate on the id column `{0}`, make a renamed copy of it first")]
    SelfAggregation(String),
    /// Unknown reduction name.
    #[error("unsupported reduction `{given}`, expected one of: {expected}")]
    UnsupportedReduction {
        /// Name given by the caller.
        given: String,
        /// Comma-separated list of valid names.
        expected: String,
    },
    /// Unknown zoom policy name.
    #[error("unsupported zoom policy `{0}`, expected `self` or `parent`")]
    UnsupportedPolicy(String),
    /// A column holds the wrong kind of value.
    #[error("column `{column}` must hold {expected} values, found {found} values")]
    ColumnType {
        /// Offending column.
        column: String,
        /// What the operation needs.
        expected: &'static str,
        /// What the column holds.
        found: ColumnKind,
    },
    /// A column holds nulls or several kinds of values.
    #[error("column `{0}` holds nulls or mixed value kinds")]
    MixedValues(String),
    /// Columns of a table have different lengths.
    #[error("column `{column}` has {len} rows but the table has {height}")]
    RaggedColumns {
        /// Offending column.
        column: String,
        /// Its length.
        len: usize,
        /// Length of the columns before it.
        height: usize,
    },
    /// An Arrow column of a type with no [`ColumnKind`] counterpart.
    #[error("column `{column}` has unsupported Arrow type {data_type}")]
    UnsupportedArrowType {
        /// Offending column.
        column: String,
        /// The Arrow data type.
        data_type: String,
    },
    /// An output column would be written twice.
    #[error("output column `{0}` would be written twice")]
    ColumnCollision(String),
}
