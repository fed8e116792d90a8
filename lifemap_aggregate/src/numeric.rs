// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Numeric reductions of a value column over each node's subtree.

use core::fmt;
use core::str::FromStr;

use hashbrown::HashMap;
use lifemap_tree::{TaxId, TreeIndex};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::AggregateError;
use crate::expand::{expand_ancestors, known_rows};
use crate::table::{Column, ID_COLUMN, Table};

/// How the values below a node are combined.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    /// Sum of values.
    #[default]
    Sum,
    /// Arithmetic mean.
    Mean,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Middle value; mean of the two middle values for even counts.
    Median,
}

impl Reduction {
    /// Every supported reduction.
    pub const ALL: [Self; 5] = [Self::Sum, Self::Mean, Self::Min, Self::Max, Self::Median];

    /// Lowercase name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::Median => "median",
        }
    }

    /// Whether integer input stays integer.
    fn keeps_ints(self) -> bool {
        matches!(self, Self::Sum | Self::Min | Self::Max)
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Reduction {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| AggregateError::UnsupportedReduction {
                given: s.to_owned(),
                expected: Self::ALL.map(Self::name).join(", "),
            })
    }
}

/// Options of [`Aggregator::num`](crate::Aggregator::num).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumOptions {
    /// Input column holding node ids.
    pub id_column: String,
    /// How values are combined.
    pub reduction: Reduction,
}

impl Default for NumOptions {
    fn default() -> Self {
        Self {
            id_column: ID_COLUMN.to_owned(),
            reduction: Reduction::Sum,
        }
    }
}

impl NumOptions {
    /// Default options: ids in `taxid`, values summed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read node ids from `name`.
    pub fn id_column(mut self, name: impl Into<String>) -> Self {
        self.id_column = name.into();
        self
    }

    /// Combine values with `reduction`.
    pub fn reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }
}

#[derive(Copy, Clone)]
enum Values<'a> {
    Int(&'a [i64]),
    Float(&'a [f64]),
}

#[allow(
    clippy::cast_precision_loss,
    reason = "Integer observations are expected to fit in an f64 mantissa."
)]
fn int_to_float(v: i64) -> f64 {
    v as f64
}

#[derive(Debug, Default)]
struct Group {
    rows: SmallVec<[usize; 4]>,
    leaf: bool,
}

impl Group {
    fn floats(&self, value: impl Fn(usize) -> f64, reduction: Reduction) -> f64 {
        // A single observation of a leaf is reported exactly as given.
        if self.leaf && self.rows.len() == 1 {
            return value(self.rows[0]);
        }
        reduce_floats(self.rows.iter().map(|&row| value(row)).collect(), reduction)
    }

    fn ints(&self, values: &[i64], reduction: Reduction) -> i64 {
        let values = self.rows.iter().map(|&row| values[row]);
        match reduction {
            Reduction::Min => values.min().unwrap_or_default(),
            Reduction::Max => values.max().unwrap_or_default(),
            _ => values.fold(0, i64::saturating_add),
        }
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "Group sizes are far below 2^52."
)]
fn reduce_floats(mut values: SmallVec<[f64; 8]>, reduction: Reduction) -> f64 {
    match reduction {
        Reduction::Sum => values.iter().sum(),
        Reduction::Mean => values.iter().sum::<f64>() / values.len() as f64,
        Reduction::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        Reduction::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Reduction::Median => {
            values.sort_unstable_by(f64::total_cmp);
            let mid = values.len() / 2;
            if values.len() % 2 == 0 {
                (values[mid - 1] + values[mid]) / 2.0
            } else {
                values[mid]
            }
        }
    }
}

pub(crate) fn aggregate_num(
    index: &TreeIndex,
    data: &Table,
    value_column: &str,
    options: &NumOptions,
) -> Result<Table, AggregateError> {
    if value_column == options.id_column || value_column == ID_COLUMN {
        return Err(AggregateError::SelfAggregation(value_column.to_owned()));
    }
    let ids = data.ids(&options.id_column)?;
    let values = match data.require_or_empty(value_column)? {
        Column::Int(v) => Values::Int(v),
        Column::Float(v) => Values::Float(v),
        other => {
            return Err(AggregateError::ColumnType {
                column: value_column.to_owned(),
                expected: "numeric",
                found: other.kind(),
            });
        }
    };
    let rows = known_rows(index, ids);

    // Leaves are never ancestors, so their direct rows form groups of their own.
    let mut groups: HashMap<TaxId, Group> = HashMap::new();
    for &row in &rows {
        let id = TaxId(ids[row]);
        let group = groups.entry(id).or_default();
        group.leaf = index.is_leaf(id).unwrap_or(false);
        group.rows.push(row);
    }
    let mut expanded = 0_usize;
    for (ancestor, row) in expand_ancestors(index, rows.iter().map(|&row| (TaxId(ids[row]), row))) {
        groups.entry(ancestor).or_default().rows.push(row);
        expanded += 1;
    }

    let mut groups: Vec<(TaxId, Group)> = groups.into_iter().collect();
    groups.sort_unstable_by_key(|(id, _)| *id);
    log::debug!(
        "num({}): {} rows, {} expansion rows, {} nodes",
        options.reduction,
        rows.len(),
        expanded,
        groups.len()
    );

    let reduction = options.reduction;
    let column = match values {
        Values::Int(v) if reduction.keeps_ints() => {
            Column::Int(groups.iter().map(|(_, g)| g.ints(v, reduction)).collect())
        }
        Values::Int(v) => Column::Float(
            groups
                .iter()
                .map(|(_, g)| g.floats(|row| int_to_float(v[row]), reduction))
                .collect(),
        ),
        Values::Float(v) => Column::Float(
            groups
                .iter()
                .map(|(_, g)| g.floats(|row| v[row], reduction))
                .collect(),
        ),
    };
    let ids: Vec<i64> = groups.iter().map(|(id, _)| id.0).collect();
    Table::new()
        .with_column(ID_COLUMN, Column::Int(ids))?
        .with_column(value_column, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Aggregator;
    use crate::tests::{pairs_float, pairs_int, sample_index};
    use serde_json::json;

    const SAMPLE_IDS: [i64; 8] = [0, 2, 2759, 6072, 33090, 33154, 33208, 33213];

    fn sample() -> serde_json::Value {
        json!({
            "taxid": [33213, 33154, 33208, 33090, 33208, 2],
            "value": [1, 2, 3, 4, 5, 6]
        })
    }

    fn run(reduction: Reduction) -> Table {
        let index = sample_index();
        Aggregator::new(&index)
            .num(&sample(), "value", &NumOptions::new().reduction(reduction))
            .unwrap()
    }

    fn expect_floats(out: &Table, expected: [f64; 8]) {
        let got = pairs_float(out, "value");
        let want: Vec<(i64, f64)> = SAMPLE_IDS.into_iter().zip(expected).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn sum_keeps_integers() {
        let out = run(Reduction::Sum);
        let want: Vec<(i64, i64)> = SAMPLE_IDS
            .into_iter()
            .zip([21, 6, 15, 1, 4, 11, 9, 1])
            .collect();
        assert_eq!(pairs_int(&out, "value"), want);
    }

    #[test]
    fn mean() {
        expect_floats(&run(Reduction::Mean), [3.5, 6.0, 3.0, 1.0, 4.0, 2.75, 3.0, 1.0]);
    }

    #[test]
    fn min_and_max_keep_integers() {
        let min: Vec<i64> = pairs_int(&run(Reduction::Min), "value")
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(min, vec![1, 6, 1, 1, 4, 1, 1, 1]);
        let max: Vec<i64> = pairs_int(&run(Reduction::Max), "value")
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(max, vec![6, 6, 5, 1, 4, 5, 5, 1]);
    }

    #[test]
    fn median() {
        expect_floats(&run(Reduction::Median), [3.5, 6.0, 3.0, 1.0, 4.0, 2.5, 3.0, 1.0]);
    }

    #[test]
    fn leaf_values_pass_through_unchanged() {
        let index = sample_index();
        let data = json!({
            "taxid": [2944257, 55559, 33090],
            "value": [0.1, 0.7, 0.2]
        });
        for reduction in Reduction::ALL {
            let out = Aggregator::new(&index)
                .num(&data, "value", &NumOptions::new().reduction(reduction))
                .unwrap();
            let pairs = pairs_float(&out, "value");
            assert!(pairs.contains(&(2944257, 0.1)), "{reduction}");
            assert!(pairs.contains(&(55559, 0.7)), "{reduction}");
            assert_eq!(
                pairs.iter().filter(|(id, _)| *id == 2944257).count(),
                1,
                "leaf ids stay unique"
            );
        }
    }

    #[test]
    fn duplicated_leaf_rows_are_reduced_together() {
        let index = sample_index();
        let data = json!({"taxid": [48510, 48510], "value": [1.5, 2.5]});
        let out = Aggregator::new(&index)
            .num(&data, "value", &NumOptions::new().reduction(Reduction::Mean))
            .unwrap();
        assert_eq!(
            pairs_float(&out, "value"),
            vec![(0, 2.0), (2157, 2.0), (48510, 2.0)]
        );
    }

    #[test]
    fn aggregating_the_id_column_is_rejected() {
        let index = sample_index();
        let aggregator = Aggregator::new(&index);
        let err = aggregator
            .num(&sample(), "taxid", &NumOptions::default())
            .unwrap_err();
        assert!(matches!(err, AggregateError::SelfAggregation(_)));

        let data = json!({"tid": [2], "value": [1]});
        let err = aggregator
            .num(&data, "tid", &NumOptions::new().id_column("tid"))
            .unwrap_err();
        assert!(matches!(err, AggregateError::SelfAggregation(_)));
    }

    #[test]
    fn validation_errors() {
        let index = sample_index();
        let aggregator = Aggregator::new(&index);
        let err = aggregator
            .num(&json!("whatever"), "whatever", &NumOptions::default())
            .unwrap_err();
        assert!(matches!(err, AggregateError::InvalidShape { .. }));

        let err = aggregator
            .num(&sample(), "value", &NumOptions::new().id_column("whatever"))
            .unwrap_err();
        assert!(matches!(err, AggregateError::MissingColumn(_)));

        let err = aggregator
            .num(&sample(), "whatever", &NumOptions::default())
            .unwrap_err();
        assert!(matches!(err, AggregateError::MissingColumn(_)));

        let data = json!({"taxid": [2], "value": ["a"]});
        let err = aggregator
            .num(&data, "value", &NumOptions::default())
            .unwrap_err();
        assert!(matches!(err, AggregateError::ColumnType { .. }));
    }

    #[test]
    fn empty_inputs_give_empty_results() {
        let index = sample_index();
        let aggregator = Aggregator::new(&index);
        for reduction in Reduction::ALL {
            let options = NumOptions::new().reduction(reduction);
            let from_records = aggregator.num(&json!([]), "value", &options).unwrap();
            let from_columns = aggregator
                .num(&json!({"taxid": [], "value": []}), "value", &options)
                .unwrap();
            assert_eq!(from_records, from_columns, "{reduction}");
            assert_eq!(
                from_records.names().collect::<Vec<_>>(),
                vec!["taxid", "value"]
            );
            assert_eq!(from_records.height(), 0);
        }
        // Validation still applies to a blank table.
        let err = aggregator
            .num(&json!([]), "taxid", &NumOptions::default())
            .unwrap_err();
        assert!(matches!(err, AggregateError::SelfAggregation(_)));
    }

    #[test]
    fn reductions_parse_by_name() {
        for reduction in Reduction::ALL {
            assert_eq!(reduction.name().parse::<Reduction>().unwrap(), reduction);
        }
        let err = "whatever".parse::<Reduction>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported reduction `whatever`, expected one of: sum, mean, min, max, median"
        );
    }
}
