// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node counts of input rows at or below each node.

use hashbrown::HashMap;
use lifemap_tree::{TaxId, TreeIndex};
use serde::{Deserialize, Serialize};

use crate::error::AggregateError;
use crate::expand::{expand_ancestors, known_rows};
use crate::table::{Column, ID_COLUMN, Table};

/// Options of [`Aggregator::count`](crate::Aggregator::count).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountOptions {
    /// Input column holding node ids.
    pub id_column: String,
    /// Output column holding the counts.
    pub result_column: String,
}

impl Default for CountOptions {
    fn default() -> Self {
        Self {
            id_column: ID_COLUMN.to_owned(),
            result_column: "n".to_owned(),
        }
    }
}

impl CountOptions {
    /// Default options: ids in `taxid`, counts in `n`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read node ids from `name`.
    pub fn id_column(mut self, name: impl Into<String>) -> Self {
        self.id_column = name.into();
        self
    }

    /// Write counts to `name`.
    pub fn result_column(mut self, name: impl Into<String>) -> Self {
        self.result_column = name.into();
        self
    }
}

pub(crate) fn aggregate_count(
    index: &TreeIndex,
    data: &Table,
    options: &CountOptions,
) -> Result<Table, AggregateError> {
    if options.result_column == ID_COLUMN {
        return Err(AggregateError::ColumnCollision(options.result_column.clone()));
    }
    let ids = data.ids(&options.id_column)?;
    let rows = known_rows(index, ids);

    let mut counts: HashMap<TaxId, i64> = HashMap::new();
    // Each input row counts once for its own node...
    for &row in &rows {
        *counts.entry(TaxId(ids[row])).or_default() += 1;
    }
    // ...and once for every strict ancestor.
    let mut expanded = 0_usize;
    for (ancestor, ()) in expand_ancestors(index, rows.iter().map(|&row| (TaxId(ids[row]), ()))) {
        *counts.entry(ancestor).or_default() += 1;
        expanded += 1;
    }

    let mut counts: Vec<(TaxId, i64)> = counts.into_iter().collect();
    counts.sort_unstable_by_key(|&(id, _)| id);
    log::debug!(
        "count: {} rows, {} expansion rows, {} nodes",
        rows.len(),
        expanded,
        counts.len()
    );

    let (ids, counts): (Vec<i64>, Vec<i64>) = counts.into_iter().map(|(id, n)| (id.0, n)).unzip();
    Table::new()
        .with_column(ID_COLUMN, Column::Int(ids))?
        .with_column(options.result_column.clone(), Column::Int(counts))
}
