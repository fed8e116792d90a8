// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loading a tree index from a JSON array of [`NodeRecord`]s.
//!
//! Fetching and refreshing the dataset is left to the host; these helpers
//! only turn bytes already on hand into an immutable [`TreeIndex`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::TreeError;
use crate::index::{LoadOptions, TreeIndex};
use crate::types::NodeRecord;

impl TreeIndex {
    /// Decode and build an index from a JSON array held in memory.
    pub fn from_json_slice(bytes: &[u8], options: &LoadOptions) -> Result<Self, TreeError> {
        let records: Vec<NodeRecord> = serde_json::from_slice(bytes)?;
        Self::from_records(records, options)
    }

    /// Decode and build an index from a reader yielding a JSON array.
    pub fn from_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Self, TreeError> {
        let records: Vec<NodeRecord> = serde_json::from_reader(reader)?;
        Self::from_records(records, options)
    }

    /// Decode and build an index from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self, TreeError> {
        let path = path.as_ref();
        log::info!("loading tree index from {}", path.display());
        let file = File::open(path)?;
        let index = Self::from_reader(BufReader::new(file), options)?;
        log::info!("loaded {} nodes", index.len());
        Ok(index)
    }
}
