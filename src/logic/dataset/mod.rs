//! Dataset Module - Flow corpora for training and evaluation
//!
//! Reads FlowRecords from JSONL files and partitions them chronologically.
//! The train partition is the reference partition every frozen artifact
//! (aggregates, schema, scaler) is fit on.

pub mod reader;
pub mod split;


use std::path::PathBuf;

pub use reader::{read_dir, read_jsonl, LoadReport};
pub use split::{ChronologicalSplit, SplitRatios};

/// Get the base directory for dataset files
pub fn get_dataset_dir() -> PathBuf {
    std::env::var("TRUSTCAST_DATASET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("trustcast")
                .join("dataset")
        })
}
