// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy display: only rows near the current view and zoom are drawn.

use kurbo::{Point, Rect};

use crate::data::{LineRow, PointRow};

/// Layers with more rows than this are lazy unless told otherwise.
pub const LAZY_ROW_THRESHOLD: usize = 10_000;

/// Share of the view width and height added on each side of the extent.
const EXTENT_PADDING: f64 = 0.05;

/// Whether a layer of `rows` rows is displayed lazily.
///
/// An explicit choice wins; otherwise large layers are lazy.
pub fn resolve_lazy(lazy: Option<bool>, rows: usize) -> bool {
    lazy.unwrap_or(rows > LAZY_ROW_THRESHOLD)
}

/// The part of the map whose rows are drawn at a given view.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LazyWindow {
    extent: Rect,
    max_zoom: Option<f64>,
}

impl LazyWindow {
    /// Window for the view `extent` at `current_zoom`.
    ///
    /// Rows whose zoom is above `current_zoom + lazy_zoom` are hidden. A
    /// non-positive `lazy_zoom` disables the zoom test.
    pub fn new(extent: Rect, current_zoom: f64, lazy_zoom: i32) -> Self {
        let extent = extent.abs();
        let (dx, dy) = (
            extent.width() * EXTENT_PADDING,
            extent.height() * EXTENT_PADDING,
        );
        Self {
            extent: Rect::new(
                extent.x0 - dx,
                extent.y0 - dy,
                extent.x1 + dx,
                extent.y1 + dy,
            ),
            max_zoom: (lazy_zoom > 0).then(|| current_zoom + f64::from(lazy_zoom)),
        }
    }

    /// The padded extent.
    pub fn extent(&self) -> Rect {
        self.extent
    }

    /// Whether rows at `zoom` may be drawn.
    pub fn zoom_passes(&self, zoom: u8) -> bool {
        self.max_zoom.is_none_or(|max| f64::from(zoom) <= max)
    }

    /// Whether `point` is inside the padded extent, borders included.
    pub fn covers(&self, point: Point) -> bool {
        let r = &self.extent;
        (r.x0..=r.x1).contains(&point.x) && (r.y0..=r.y1).contains(&point.y)
    }

    /// Whether a point row is drawn.
    pub fn shows_point(&self, row: &PointRow) -> bool {
        self.zoom_passes(row.zoom) && self.covers(row.position())
    }

    /// Whether a line row is drawn: either end must be in view.
    pub fn shows_line(&self, row: &LineRow) -> bool {
        let segment = row.segment();
        self.zoom_passes(row.zoom) && (self.covers(segment.p0) || self.covers(segment.p1))
    }

    /// The point rows drawn in this window.
    pub fn visible_points<'r>(
        &'r self,
        rows: &'r [PointRow],
    ) -> impl Iterator<Item = &'r PointRow> + 'r {
        rows.iter().filter(|row| self.shows_point(row))
    }

    /// The line rows drawn in this window.
    pub fn visible_lines<'r>(
        &'r self,
        rows: &'r [LineRow],
    ) -> impl Iterator<Item = &'r LineRow> + 'r {
        rows.iter().filter(|row| self.shows_line(row))
    }
}
