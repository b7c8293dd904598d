//! CSV output backend.
//!
//! Creates `metrics.csv` in the output directory with one row per
//! `(tick, model, metric)`.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;
use tracing::debug;

use crate::writer::OutputWriter;
use crate::{MetricRow, OutputResult};

pub const METRICS_FILE: &str = "metrics.csv";

/// Writes metric rows to a long-format CSV file.
pub struct CsvWriter {
    path:     PathBuf,
    metrics:  Writer<File>,
    rows:     u64,
    finished: bool,
}

impl CsvWriter {
    /// Create `metrics.csv` in `dir` and write the header row.  `dir` is
    /// created if missing.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(METRICS_FILE);
        let mut metrics = Writer::from_path(&path)?;
        metrics.write_record(["tick", "model", "metric", "value"])?;
        Ok(Self { path, metrics, rows: 0, finished: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written so far, header excluded.
    pub fn rows_written(&self) -> u64 {
        self.rows
    }
}

impl OutputWriter for CsvWriter {
    fn write_metrics(&mut self, rows: &[MetricRow]) -> OutputResult<()> {
        for row in rows {
            self.metrics.write_record(&[
                row.tick.to_string(),
                row.model.to_string(),
                row.metric.to_string(),
                row.value.to_string(),
            ])?;
        }
        self.rows += rows.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.metrics.flush()?;
        debug!(path = %self.path.display(), rows = self.rows, "metrics written");
        Ok(())
    }
}
