//! `epi-output` — report writers for the epidemic simulator.
//!
//! | Backend | Files created | Layout                       |
//! |---------|---------------|------------------------------|
//! | CSV     | `metrics.csv` | `tick,model,metric,value`    |
//!
//! Backends implement [`OutputWriter`] and are driven by
//! [`ReportObserver`], which implements `epi_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use epi_output::{CsvReportWriter, CsvWriter};
//!
//! let mut report = CsvReportWriter::new(CsvWriter::new(Path::new("./output"))?);
//! sim.run_observed(Some(24 * 60), &mut report)?;
//! if let Some(e) = report.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use crate::csv::{CsvWriter, METRICS_FILE};
pub use error::{OutputError, OutputResult};
pub use observer::{CsvReportWriter, ReportObserver};
pub use row::MetricRow;
pub use writer::OutputWriter;
