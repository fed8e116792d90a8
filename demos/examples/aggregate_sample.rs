// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Aggregate a handful of observations over the sample tree.
//!
//! Each aggregator is run once and its output printed as column-oriented JSON.
//! Set `RUST_LOG=debug` to see the expansion sizes, and note the warning about
//! the id that is not in the tree.
//!
//! Run:
//! - `cargo run -p lifemap_demos --example aggregate_sample`
//! - `cargo run -p lifemap_demos --example aggregate_sample -- path/to/tree.json`

use std::error::Error;
use std::path::PathBuf;

use lifemap_aggregate::{
    Aggregator, CountOptions, FreqOptions, NumOptions, Reduction, ZoomOptions, ZoomPolicy,
};
use lifemap_tree::{LoadOptions, TreeIndex};
use serde_json::json;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args_os().nth(1).map_or_else(
        || PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../testdata/sample_tree.json"),
        PathBuf::from,
    );
    let index = TreeIndex::from_path(&path, &LoadOptions::default())?;
    let aggregator = Aggregator::new(&index);

    // -12 is not a taxonomy id: it is reported once and ignored.
    let data = json!({
        "taxid": [33213, 33154, 33208, 33090, 33208, 2, -12],
        "value": [1, 2, 3, 4, 5, 6, 7],
        "group": ["a", "a", "b", "b", "a", "c", "c"]
    });

    let counts = aggregator.count(&data, &CountOptions::default())?;
    println!("count: {}", serde_json::to_string(&counts)?);

    for reduction in Reduction::ALL {
        let out = aggregator.num(&data, "value", &NumOptions::new().reduction(reduction))?;
        println!("{reduction}: {}", serde_json::to_string(&out)?);
    }

    let freq = aggregator.freq(&data, "group", &FreqOptions::default())?;
    println!("freq: {}", serde_json::to_string(&freq)?);

    let ids = json!({"taxid": [2157, 48510, 55559, 1783263]});
    for policy in [ZoomPolicy::Own, ZoomPolicy::Parent] {
        let zooms = aggregator.propagate_zoom(&ids, &ZoomOptions::new().policy(policy))?;
        println!("zoom ({policy}): {}", serde_json::to_string(&zooms)?);
    }
    Ok(())
}
