// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Count observations, turn the counts into point and donut rows, and keep
//! the points a lazy viewer would draw for one view.
//!
//! Run:
//! - `cargo run -p lifemap_demos --example lazy_points`

use std::error::Error;
use std::path::PathBuf;

use kurbo::Rect;
use lifemap_aggregate::{Aggregator, CountOptions, FreqOptions, ZoomPolicy};
use lifemap_data::{LazyWindow, LifemapData, PointsOptions, resolve_lazy};
use lifemap_tree::{LoadOptions, TreeIndex};
use serde_json::json;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../testdata/sample_tree.json");
    let index = TreeIndex::from_path(&path, &LoadOptions::default())?;
    let aggregator = Aggregator::new(&index);

    let data = json!({
        "taxid": [2944257, 55559, 48510, 1783263, 55559],
        "habitat": ["sea", "land", "sea", "land", "land"]
    });

    let counts = aggregator.count(&data, &CountOptions::default())?;
    let layer = LifemapData::new(&index, &counts, "taxid")?;
    let points = layer.points(
        &PointsOptions::new()
            .zoom_policy(ZoomPolicy::Parent)
            .radius_column("n"),
    )?;

    // Forced on: the sample is far below the default threshold.
    if resolve_lazy(Some(true), points.len()) {
        let window = LazyWindow::new(Rect::new(-5.0, -5.0, 5.0, 15.0), 4.0, 3);
        for point in window.visible_points(&points) {
            println!("{}", serde_json::to_string(point)?);
        }
    }

    let freq = aggregator.freq(&data, "habitat", &FreqOptions::default())?;
    let donuts = LifemapData::new(&index, &freq, "taxid")?.donuts(&["sea", "land"])?;
    for donut in &donuts {
        log::info!("{} at zoom {}: {}", donut.taxid, donut.zoom, donut.counts);
    }
    Ok(())
}
