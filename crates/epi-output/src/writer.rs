//! The `OutputWriter` trait implemented by report backends.

use crate::{MetricRow, OutputResult};

/// A sink for metric rows.
///
/// Errors are returned to the caller; [`ReportObserver`][crate::ReportObserver]
/// stores them because observer callbacks cannot fail.
pub trait OutputWriter {
    /// Write a batch of rows.
    fn write_metrics(&mut self, rows: &[MetricRow]) -> OutputResult<()>;

    /// Flush the underlying file handles.  Safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
