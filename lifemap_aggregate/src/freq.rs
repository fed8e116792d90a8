// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Categorical frequencies: how many rows of each level sit at or below each
//! node.
//!
//! Counting happens in two phases. First every row is tallied for its own node
//! and each strict ancestor, per level. The tally is then either pivoted into
//! one integer column per level ([`Aggregator::freq`](crate::Aggregator::freq))
//! or emitted as a tall table of non-zero counts
//! ([`Aggregator::freq_long`](crate::Aggregator::freq_long)).

use std::borrow::Cow;

use hashbrown::HashMap;
use lifemap_tree::{TaxId, TreeIndex};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::AggregateError;
use crate::expand::{expand_ancestors, known_rows};
use crate::table::{Column, ColumnKind, ID_COLUMN, Table};

/// Name of the count column of [`Aggregator::freq_long`](crate::Aggregator::freq_long).
pub const COUNT_COLUMN: &str = "count";

/// Options of [`Aggregator::freq`](crate::Aggregator::freq) and
/// [`Aggregator::freq_long`](crate::Aggregator::freq_long).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreqOptions {
    /// Input column holding node ids.
    pub id_column: String,
    /// Also emit one row per input row, counting 1 for its own level.
    ///
    /// These rows follow the aggregated ones and are not merged with them,
    /// so the output may repeat ids.
    pub keep_individuals: bool,
}

impl Default for FreqOptions {
    fn default() -> Self {
        Self {
            id_column: ID_COLUMN.to_owned(),
            keep_individuals: false,
        }
    }
}

impl FreqOptions {
    /// Default options: ids in `taxid`, aggregated rows only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read node ids from `name`.
    pub fn id_column(mut self, name: impl Into<String>) -> Self {
        self.id_column = name.into();
        self
    }

    /// Append the individual input rows after the aggregated ones.
    pub fn keep_individuals(mut self, keep: bool) -> Self {
        self.keep_individuals = keep;
        self
    }
}

type Counts = SmallVec<[i64; 8]>;

/// Per-node, per-level counts of one call.
struct Tally<'d> {
    category: &'d Column,
    /// Level labels in first-seen order.
    labels: Vec<Cow<'d, str>>,
    /// First input row of each level, used to recover its typed value.
    first_row: Vec<usize>,
    /// Known input rows with their level.
    rows: Vec<(usize, usize)>,
    ids: &'d [i64],
    /// Sorted by id.
    counts: Vec<(TaxId, Counts)>,
}

impl<'d> Tally<'d> {
    fn new(
        index: &TreeIndex,
        data: &'d Table,
        category_column: &str,
        options: &FreqOptions,
    ) -> Result<Self, AggregateError> {
        if category_column == options.id_column || category_column == ID_COLUMN {
            return Err(AggregateError::SelfAggregation(category_column.to_owned()));
        }
        let ids = data.ids(&options.id_column)?;
        let category = data.require_or_empty(category_column)?;
        if category.kind() == ColumnKind::Float {
            return Err(AggregateError::ColumnType {
                column: category_column.to_owned(),
                expected: "string, integer or boolean",
                found: ColumnKind::Float,
            });
        }

        let mut labels: Vec<Cow<'d, str>> = Vec::new();
        let mut first_row = Vec::new();
        let mut level_of: HashMap<Cow<'d, str>, usize> = HashMap::new();
        let rows: Vec<(usize, usize)> = known_rows(index, ids)
            .into_iter()
            .map(|row| {
                let label = category.label(row).unwrap_or_default();
                let level = *level_of.entry(label.clone()).or_insert_with(|| {
                    labels.push(label);
                    first_row.push(row);
                    labels.len() - 1
                });
                (row, level)
            })
            .collect();

        let width = labels.len();
        let mut counts: HashMap<TaxId, Counts> = HashMap::new();
        let direct = rows.iter().map(|&(row, level)| (TaxId(ids[row]), level));
        let expanded = expand_ancestors(
            index,
            rows.iter().map(|&(row, level)| (TaxId(ids[row]), level)),
        );
        for (id, level) in direct.chain(expanded) {
            counts
                .entry(id)
                .or_insert_with(|| SmallVec::from_elem(0, width))[level] += 1;
        }
        let mut counts: Vec<(TaxId, Counts)> = counts.into_iter().collect();
        counts.sort_unstable_by_key(|(id, _)| *id);
        log::debug!(
            "freq({category_column}): {} rows, {} levels, {} nodes",
            rows.len(),
            width,
            counts.len()
        );

        Ok(Self {
            category,
            labels,
            first_row,
            rows,
            ids,
            counts,
        })
    }
}

pub(crate) fn aggregate_freq(
    index: &TreeIndex,
    data: &Table,
    category_column: &str,
    options: &FreqOptions,
) -> Result<Table, AggregateError> {
    let tally = Tally::new(index, data, category_column, options)?;
    let individuals: &[(usize, usize)] = if options.keep_individuals {
        &tally.rows
    } else {
        &[]
    };

    let ids: Vec<i64> = tally
        .counts
        .iter()
        .map(|(id, _)| id.0)
        .chain(individuals.iter().map(|&(row, _)| tally.ids[row]))
        .collect();
    let mut table = Table::new().with_column(ID_COLUMN, Column::Int(ids))?;
    for (level, label) in tally.labels.iter().enumerate() {
        let column: Vec<i64> = tally
            .counts
            .iter()
            .map(|(_, counts)| counts[level])
            .chain(individuals.iter().map(|&(_, l)| i64::from(l == level)))
            .collect();
        table.push_column(label.as_ref(), Column::Int(column))?;
    }
    Ok(table)
}

pub(crate) fn aggregate_freq_long(
    index: &TreeIndex,
    data: &Table,
    category_column: &str,
    options: &FreqOptions,
) -> Result<Table, AggregateError> {
    let tally = Tally::new(index, data, category_column, options)?;

    let mut ids = Vec::new();
    let mut level_rows = Vec::new();
    let mut counts = Vec::new();
    for (id, per_level) in &tally.counts {
        for (level, &n) in per_level.iter().enumerate() {
            if n > 0 {
                ids.push(id.0);
                level_rows.push(tally.first_row[level]);
                counts.push(n);
            }
        }
    }
    if options.keep_individuals {
        for &(row, _) in &tally.rows {
            ids.push(tally.ids[row]);
            level_rows.push(row);
            counts.push(1);
        }
    }

    Table::new()
        .with_column(ID_COLUMN, Column::Int(ids))?
        .with_column(category_column, tally.category.take(&level_rows))?
        .with_column(COUNT_COLUMN, Column::Int(counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Aggregator;
    use crate::tests::sample_index;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "taxid": [33213, 33154, 33208, 33090, 33208, 2],
            "value": ["a", "a", "b", "b", "a", "c"]
        })
    }

    /// Rows of an all-integer table.
    fn rows(table: &Table) -> Vec<Vec<i64>> {
        (0..table.height())
            .map(|row| {
                table
                    .columns()
                    .map(|(_, column)| column.as_ints().unwrap()[row])
                    .collect()
            })
            .collect()
    }

    #[test]
    fn pivots_sample_observations() {
        let index = sample_index();
        let out = Aggregator::new(&index)
            .freq(&sample(), "value", &FreqOptions::default())
            .unwrap();
        assert_eq!(out.names().collect::<Vec<_>>(), vec!["taxid", "a", "b", "c"]);
        assert_eq!(
            rows(&out),
            vec![
                vec![0, 3, 2, 1],
                vec![2, 0, 0, 1],
                vec![2759, 3, 2, 0],
                vec![6072, 1, 0, 0],
                vec![33090, 0, 1, 0],
                vec![33154, 3, 1, 0],
                vec![33208, 2, 1, 0],
                vec![33213, 1, 0, 0],
            ]
        );
    }

    #[test]
    fn level_counts_add_up_to_the_node_count() {
        let index = sample_index();
        let aggregator = Aggregator::new(&index);
        let freq = aggregator
            .freq(&sample(), "value", &FreqOptions::default())
            .unwrap();
        let count = aggregator
            .count(&sample(), &crate::CountOptions::default())
            .unwrap();
        let totals: Vec<(i64, i64)> = rows(&freq)
            .into_iter()
            .map(|row| (row[0], row[1..].iter().sum()))
            .collect();
        assert_eq!(totals, crate::tests::pairs_int(&count, "n"));
    }

    #[test]
    fn individuals_follow_the_aggregated_rows() {
        let index = sample_index();
        let out = Aggregator::new(&index)
            .freq(&sample(), "value", &FreqOptions::new().keep_individuals(true))
            .unwrap();
        assert_eq!(out.height(), 8 + 6);
        assert_eq!(
            rows(&out)[8..],
            [
                vec![33213, 1, 0, 0],
                vec![33154, 1, 0, 0],
                vec![33208, 0, 1, 0],
                vec![33090, 0, 1, 0],
                vec![33208, 1, 0, 0],
                vec![2, 0, 0, 1],
            ]
        );
    }

    #[test]
    fn long_form_skips_zero_counts() {
        let index = sample_index();
        let out = Aggregator::new(&index)
            .freq_long(&sample(), "value", &FreqOptions::default())
            .unwrap();
        assert_eq!(
            out.names().collect::<Vec<_>>(),
            vec!["taxid", "value", "count"]
        );
        let records = out.to_records();
        assert_eq!(records.len(), 3 + 1 + 2 + 1 + 1 + 2 + 2 + 1);
        assert_eq!(
            serde_json::Value::Object(records[0].clone()),
            json!({"taxid": 0, "value": "a", "count": 3})
        );
        assert_eq!(
            serde_json::Value::Object(records[3].clone()),
            json!({"taxid": 2, "value": "c", "count": 1})
        );
        assert!(out.column("count").unwrap().as_ints().unwrap().iter().all(|&n| n > 0));
        assert_eq!(
            out.column("value").unwrap().as_strs().unwrap()[..4],
            ["a", "b", "c", "c"]
        );
    }

    #[test]
    fn empty_inputs_give_empty_results() {
        let index = sample_index();
        let aggregator = Aggregator::new(&index);
        let options = FreqOptions::default();
        let wide = aggregator.freq(&json!([]), "value", &options).unwrap();
        assert_eq!(wide.names().collect::<Vec<_>>(), vec!["taxid"]);
        assert_eq!(wide.height(), 0);
        let long = aggregator.freq_long(&json!([]), "value", &options).unwrap();
        assert_eq!(
            long.names().collect::<Vec<_>>(),
            vec!["taxid", "value", "count"]
        );
        assert_eq!(long.height(), 0);

        let columns = json!({"taxid": [], "value": []});
        assert_eq!(aggregator.freq(&columns, "value", &options).unwrap(), wide);
        assert_eq!(
            aggregator.freq_long(&columns, "value", &options).unwrap(),
            long
        );
    }

    #[test]
    fn integer_and_boolean_levels_are_named_by_their_text() {
        let index = sample_index();
        let aggregator = Aggregator::new(&index);
        let data = json!({"taxid": [33090, 2, 33090], "group": [7, 3, 7]});
        let out = aggregator
            .freq(&data, "group", &FreqOptions::default())
            .unwrap();
        assert_eq!(out.names().collect::<Vec<_>>(), vec!["taxid", "7", "3"]);
        assert_eq!(rows(&out)[0], vec![0, 2, 1]);

        let long = aggregator
            .freq_long(&data, "group", &FreqOptions::default())
            .unwrap();
        assert_eq!(long.column("group").unwrap().kind(), ColumnKind::Int);

        let data = json!({"taxid": [33090, 2], "flag": [true, false]});
        let out = aggregator
            .freq(&data, "flag", &FreqOptions::default())
            .unwrap();
        assert_eq!(out.names().collect::<Vec<_>>(), vec!["taxid", "true", "false"]);
    }

    #[test]
    fn unknown_ids_do_not_introduce_levels() {
        let index = sample_index();
        let data = json!({"taxid": [-12, 33090], "value": ["z", "b"]});
        let out = Aggregator::new(&index)
            .freq(&data, "value", &FreqOptions::default())
            .unwrap();
        assert_eq!(out.names().collect::<Vec<_>>(), vec!["taxid", "b"]);
        assert_eq!(rows(&out), vec![vec![0, 1], vec![2759, 1], vec![33090, 1]]);
    }

    #[test]
    fn validation_errors() {
        let index = sample_index();
        let aggregator = Aggregator::new(&index);
        let err = aggregator
            .freq(&sample(), "taxid", &FreqOptions::default())
            .unwrap_err();
        assert!(matches!(err, AggregateError::SelfAggregation(_)));

        let err = aggregator
            .freq(&sample(), "whatever", &FreqOptions::default())
            .unwrap_err();
        assert!(matches!(err, AggregateError::MissingColumn(_)));

        let data = json!({"taxid": [2], "value": [0.5]});
        let err = aggregator
            .freq(&data, "value", &FreqOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AggregateError::ColumnType {
                found: ColumnKind::Float,
                ..
            }
        ));

        let data = json!({"taxid": [2], "value": ["taxid"]});
        let err = aggregator
            .freq(&data, "value", &FreqOptions::default())
            .unwrap_err();
        assert!(matches!(err, AggregateError::ColumnCollision(ref c) if c == "taxid"));
    }
}
