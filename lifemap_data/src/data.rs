// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree placement of caller rows and the layer rows built from it.

use kurbo::{Line, Point};
use lifemap_aggregate::{Column, ColumnKind, Table, TableSource, ZoomPolicy};
use lifemap_tree::{TaxId, TreeIndex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DataError;

/// Which rows of a points layer are kept, depending on their leaf flag.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafFilter {
    /// Keep every row.
    #[default]
    Show,
    /// Keep leaves only.
    Only,
    /// Drop leaves.
    Omit,
}

impl LeafFilter {
    fn keeps(self, leaf: bool) -> bool {
        match self {
            Self::Show => true,
            Self::Only => leaf,
            Self::Omit => !leaf,
        }
    }
}

/// Options of [`LifemapData::points`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsOptions {
    /// Leaf filtering.
    pub leaves: LeafFilter,
    /// Zoom reported for each point.
    pub zoom_policy: ZoomPolicy,
    /// Column copied to each point for its fill color.
    pub fill_column: Option<String>,
    /// Numeric column copied to each point for its radius.
    pub radius_column: Option<String>,
}

impl PointsOptions {
    /// Every row, own zoom, no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter rows by leaf flag.
    pub fn leaves(mut self, leaves: LeafFilter) -> Self {
        self.leaves = leaves;
        self
    }

    /// Report zooms under `policy`.
    pub fn zoom_policy(mut self, policy: ZoomPolicy) -> Self {
        self.zoom_policy = policy;
        self
    }

    /// Copy `name` into each point as its fill attribute.
    pub fn fill_column(mut self, name: impl Into<String>) -> Self {
        self.fill_column = Some(name.into());
        self
    }

    /// Copy the numeric column `name` into each point as its radius attribute.
    pub fn radius_column(mut self, name: impl Into<String>) -> Self {
        self.radius_column = Some(name.into());
        self
    }
}

/// Options of [`LifemapData::lines`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinesOptions {
    /// Zoom reported for each segment.
    pub zoom_policy: ZoomPolicy,
    /// Numeric column copied to each segment for its width.
    pub width_column: Option<String>,
    /// Column copied to each segment for its color.
    pub color_column: Option<String>,
}

impl LinesOptions {
    /// Own zoom, no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report zooms under `policy`.
    pub fn zoom_policy(mut self, policy: ZoomPolicy) -> Self {
        self.zoom_policy = policy;
        self
    }

    /// Copy the numeric column `name` into each segment as its width.
    pub fn width_column(mut self, name: impl Into<String>) -> Self {
        self.width_column = Some(name.into());
        self
    }

    /// Copy `name` into each segment as its color attribute.
    pub fn color_column(mut self, name: impl Into<String>) -> Self {
        self.color_column = Some(name.into());
        self
    }
}

/// One input row joined with its tree node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocatedRow {
    /// Position of the row in the input table.
    pub row: usize,
    /// Node id.
    pub id: TaxId,
    /// Node placement.
    pub position: Point,
    /// Node zoom level.
    pub zoom: u8,
    /// Parent node, `None` for the root.
    pub parent: Option<TaxId>,
    /// Whether the node is a leaf.
    pub leaf: bool,
}

/// A point layer row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PointRow {
    /// Node id.
    pub taxid: TaxId,
    /// Horizontal placement.
    pub x: f64,
    /// Vertical placement.
    pub y: f64,
    /// Effective zoom.
    pub zoom: u8,
    /// Requested attribute columns.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl PointRow {
    /// Placement as a point.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A line layer row: the edge from a node up to its parent.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineRow {
    /// Node id.
    pub taxid: TaxId,
    /// Node end.
    pub x0: f64,
    /// Node end.
    pub y0: f64,
    /// Parent end.
    pub x1: f64,
    /// Parent end.
    pub y1: f64,
    /// Effective zoom of the node.
    pub zoom: u8,
    /// Requested attribute columns.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl LineRow {
    /// The segment, from node to parent.
    pub fn segment(&self) -> Line {
        Line::new((self.x0, self.y0), (self.x1, self.y1))
    }
}

/// A donut layer row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DonutRow {
    /// Node id.
    pub taxid: TaxId,
    /// Horizontal placement.
    pub x: f64,
    /// Vertical placement.
    pub y: f64,
    /// Node zoom.
    pub zoom: u8,
    /// JSON object of level to non-zero count, e.g. `{"a":3,"b":2}`.
    pub counts: String,
}

/// Caller data keyed by taxonomy id, ready to be shaped into layer rows.
#[derive(Clone, Debug)]
pub struct LifemapData<'a> {
    index: &'a TreeIndex,
    table: Table,
    id_column: String,
    ids: Vec<i64>,
}

impl<'a> LifemapData<'a> {
    /// Wrap `data`, whose node ids are in `id_column`.
    ///
    /// Ids absent from the tree are reported with [`log::warn!`]; their rows
    /// are skipped by every layer.
    pub fn new<S>(
        index: &'a TreeIndex,
        data: &S,
        id_column: impl Into<String>,
    ) -> Result<Self, DataError>
    where
        S: TableSource + ?Sized,
    {
        let id_column = id_column.into();
        let table = data.to_table()?.into_owned();
        let ids = table.ints(&id_column)?.to_vec();
        let unknown = index.unknown_ids(ids.iter().map(|&id| TaxId(id)));
        if !unknown.is_empty() {
            log::warn!(
                "{} id(s) of column `{id_column}` are absent from the tree and won't be displayed: {:?}",
                unknown.len(),
                unknown
            );
        }
        Ok(Self {
            index,
            table,
            id_column,
            ids,
        })
    }

    /// The wrapped table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Name of the id column.
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Join every row with its tree node, in input order. Unknown ids are
    /// skipped.
    pub fn locate(&self) -> Vec<LocatedRow> {
        self.ids
            .iter()
            .enumerate()
            .filter_map(|(row, &id)| {
                let node = self.index.get(TaxId(id))?;
                Some(LocatedRow {
                    row,
                    id: node.id,
                    position: node.position,
                    zoom: node.zoom,
                    parent: node.parent,
                    leaf: node.is_leaf(),
                })
            })
            .collect()
    }

    /// One point per located row.
    pub fn points(&self, options: &PointsOptions) -> Result<Vec<PointRow>, DataError> {
        let attributes = self.attributes(&[
            (options.fill_column.as_deref(), false),
            (options.radius_column.as_deref(), true),
        ])?;
        let points: Vec<PointRow> = self
            .locate()
            .into_iter()
            .filter(|located| options.leaves.keeps(located.leaf))
            .map(|located| PointRow {
                taxid: located.id,
                x: located.position.x,
                y: located.position.y,
                zoom: self.zoom(&located, options.zoom_policy),
                attributes: row_attributes(&attributes, located.row),
            })
            .collect();
        log::debug!("points: {} of {} rows", points.len(), self.ids.len());
        Ok(points)
    }

    /// One segment per located row, from the node to its parent. The root has
    /// no segment.
    pub fn lines(&self, options: &LinesOptions) -> Result<Vec<LineRow>, DataError> {
        let attributes = self.attributes(&[
            (options.width_column.as_deref(), true),
            (options.color_column.as_deref(), false),
        ])?;
        let lines: Vec<LineRow> = self
            .locate()
            .into_iter()
            .filter_map(|located| {
                let parent = self.index.position(located.parent?)?;
                Some(LineRow {
                    taxid: located.id,
                    x0: located.position.x,
                    y0: located.position.y,
                    x1: parent.x,
                    y1: parent.y,
                    zoom: self.zoom(&located, options.zoom_policy),
                    attributes: row_attributes(&attributes, located.row),
                })
            })
            .collect();
        log::debug!("lines: {} of {} rows", lines.len(), self.ids.len());
        Ok(lines)
    }

    /// One donut per located row, built from integer `counts_columns` such as
    /// the level columns of a frequency aggregation.
    pub fn donuts(&self, counts_columns: &[&str]) -> Result<Vec<DonutRow>, DataError> {
        if counts_columns.is_empty() {
            return Err(DataError::NoCountColumns);
        }
        let columns = counts_columns
            .iter()
            .map(|&name| self.table.ints(name).map(|values| (name, values)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self
            .locate()
            .into_iter()
            .map(|located| {
                let counts: Map<String, Value> = columns
                    .iter()
                    .filter(|(_, values)| values[located.row] > 0)
                    .map(|&(name, values)| (name.to_owned(), Value::from(values[located.row])))
                    .collect();
                DonutRow {
                    taxid: located.id,
                    x: located.position.x,
                    y: located.position.y,
                    zoom: located.zoom,
                    counts: Value::Object(counts).to_string(),
                }
            })
            .collect())
    }

    fn zoom(&self, located: &LocatedRow, policy: ZoomPolicy) -> u8 {
        policy
            .effective_zoom(self.index, located.id)
            .unwrap_or(located.zoom)
    }

    /// Resolve the requested attribute columns, checking numeric ones.
    fn attributes<'t>(
        &'t self,
        requested: &[(Option<&'t str>, bool)],
    ) -> Result<Vec<(&'t str, &'t Column)>, DataError> {
        let mut out: Vec<(&str, &Column)> = Vec::with_capacity(requested.len());
        for &(name, numeric) in requested {
            let Some(name) = name else { continue };
            let column = self.table.require(name)?;
            if numeric && !matches!(column.kind(), ColumnKind::Int | ColumnKind::Float) {
                return Err(DataError::NotNumeric {
                    column: name.to_owned(),
                    found: column.kind(),
                });
            }
            if !out.iter().any(|(n, _)| *n == name) {
                out.push((name, column));
            }
        }
        Ok(out)
    }
}

fn row_attributes(attributes: &[(&str, &Column)], row: usize) -> Map<String, Value> {
    attributes
        .iter()
        .map(|&(name, column)| (name.to_owned(), column.json_value(row)))
        .collect()
}
