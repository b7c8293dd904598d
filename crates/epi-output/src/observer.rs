//! `ReportObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use epi_core::{SimConfig, Tick};
use epi_sim::{SimObserver, TickReport};
use tracing::warn;

use crate::row::MetricRow;
use crate::writer::OutputWriter;
use crate::{CsvWriter, OutputError, OutputResult};

/// A [`ReportObserver`] writing `metrics.csv`.
pub type CsvReportWriter = ReportObserver<CsvWriter>;

/// A [`SimObserver`] that writes every tick report to an [`OutputWriter`].
///
/// Errors from the writer are stored because `SimObserver` methods have no
/// return value.  After the run, check with [`take_error`][Self::take_error].
/// After the first error no further rows are written.
pub struct ReportObserver<W: OutputWriter> {
    writer:     W,
    ticks:      u64,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> ReportObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, ticks: 0, last_error: None }
    }

    /// Take the stored write error, if any.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Ticks written since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Unwrap the inner writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            warn!(error = %e, "report output failed");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for ReportObserver<W> {
    fn on_run_start(&mut self, _config: &SimConfig) {
        self.ticks = 0;
    }

    fn on_tick(&mut self, report: &TickReport) {
        if self.last_error.is_some() {
            return;
        }
        let rows = MetricRow::from_report(report);
        let result = self.writer.write_metrics(&rows);
        self.store_err(result);
        self.ticks += 1;
    }

    fn on_run_end(&mut self, _last: Option<Tick>) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
