// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The aggregation service.

use lifemap_tree::TreeIndex;

use crate::count::{CountOptions, aggregate_count};
use crate::error::AggregateError;
use crate::freq::{FreqOptions, aggregate_freq, aggregate_freq_long};
use crate::numeric::{NumOptions, aggregate_num};
use crate::table::{Table, TableSource};
use crate::zoom::{ZoomOptions, propagate_zoom};

/// Aggregation entry points over one borrowed [`TreeIndex`].
///
/// The index is never mutated, so an `Aggregator` is cheap to copy and can be
/// shared freely across threads.
#[derive(Copy, Clone, Debug)]
pub struct Aggregator<'a> {
    index: &'a TreeIndex,
}

impl<'a> Aggregator<'a> {
    /// Aggregate against `index`.
    pub fn new(index: &'a TreeIndex) -> Self {
        Self { index }
    }

    /// The underlying tree.
    pub fn index(&self) -> &'a TreeIndex {
        self.index
    }

    /// Number of input rows at or below each node.
    ///
    /// Output columns: `taxid` and [`CountOptions::result_column`], one row
    /// per node with at least one row below it.
    pub fn count<S>(&self, data: &S, options: &CountOptions) -> Result<Table, AggregateError>
    where
        S: TableSource + ?Sized,
    {
        let table = data.to_table()?;
        aggregate_count(self.index, &table, options)
    }

    /// Reduce `value_column` over each node's subtree.
    ///
    /// Leaf rows keep their exact value. Output columns: `taxid` and
    /// `value_column`.
    pub fn num<S>(
        &self,
        data: &S,
        value_column: &str,
        options: &NumOptions,
    ) -> Result<Table, AggregateError>
    where
        S: TableSource + ?Sized,
    {
        let table = data.to_table()?;
        aggregate_num(self.index, &table, value_column, options)
    }

    /// Count the levels of `category_column` over each node's subtree, one
    /// integer column per level.
    pub fn freq<S>(
        &self,
        data: &S,
        category_column: &str,
        options: &FreqOptions,
    ) -> Result<Table, AggregateError>
    where
        S: TableSource + ?Sized,
    {
        let table = data.to_table()?;
        aggregate_freq(self.index, &table, category_column, options)
    }

    /// Same counts as [`Aggregator::freq`] as a tall table of `taxid`, level
    /// and `count`, without zero counts.
    pub fn freq_long<S>(
        &self,
        data: &S,
        category_column: &str,
        options: &FreqOptions,
    ) -> Result<Table, AggregateError>
    where
        S: TableSource + ?Sized,
    {
        let table = data.to_table()?;
        aggregate_freq_long(self.index, &table, category_column, options)
    }

    /// Effective zoom of each input id under [`ZoomOptions::policy`], in
    /// input order.
    pub fn propagate_zoom<S>(
        &self,
        data: &S,
        options: &ZoomOptions,
    ) -> Result<Table, AggregateError>
    where
        S: TableSource + ?Sized,
    {
        let table = data.to_table()?;
        propagate_zoom(self.index, &table, options)
    }
}
