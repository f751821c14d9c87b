use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::logic::error::CoreResult;
use crate::logic::features::FlowRecord;

/// Records read from one or more JSONL files
#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<FlowRecord>,
    /// Lines that failed to parse (skipped)
    pub skipped: usize,
    pub files: usize,
}

impl LoadReport {
    fn absorb(&mut self, other: LoadReport) {
        self.records.extend(other.records);
        self.skipped += other.skipped;
        self.files += other.files;
    }
}

/// Read one JSONL file. Blank lines are ignored, malformed lines skipped.
pub fn read_jsonl(path: &Path) -> CoreResult<LoadReport> {
    let reader = BufReader::new(File::open(path)?);
    let mut report = LoadReport {
        files: 1,
        ..Default::default()
    };

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<FlowRecord>(line) {
            Ok(record) => report.records.push(record),
            Err(e) => {
                report.skipped += 1;
                log::warn!("{}:{}: skipping malformed record: {}", path.display(), line_no + 1, e);
            }
        }
    }

    log::debug!(
        "Read {} records from {} ({} skipped)",
        report.records.len(),
        path.display(),
        report.skipped
    );
    Ok(report)
}

/// Read every `.jsonl` file in a directory, in filename order
pub fn read_dir(dir: &Path) -> CoreResult<LoadReport> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|r| r.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "jsonl"))
        .collect();

    // Filenames carry the capture timestamp
    paths.sort();

    let mut report = LoadReport::default();
    for path in paths {
        report.absorb(read_jsonl(&path)?);
    }

    log::info!(
        "Loaded {} flow records from {} files in {}",
        report.records.len(),
        report.files,
        dir.display()
    );
    Ok(report)
}
