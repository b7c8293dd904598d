//! Simulation observer trait for progress reporting and data collection.

use epi_core::{SimConfig, Tick};

use crate::TickReport;

/// Callbacks invoked by [`Sim::run_observed`][crate::Sim::run_observed].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl SimObserver for ProgressPrinter {
///     fn on_tick(&mut self, report: &TickReport) {
///         if report.tick.0 % self.interval == 0 {
///             println!("{}: {} models reported", report.tick, report.outputs.len());
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called once before the first tick of a run.
    fn on_run_start(&mut self, _config: &SimConfig) {}

    /// Called after every completed tick with that tick's selected outputs.
    fn on_tick(&mut self, _report: &TickReport) {}

    /// Called once after the run ends, with the last completed tick.
    fn on_run_end(&mut self, _last: Option<Tick>) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
