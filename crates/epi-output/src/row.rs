//! Plain data row types written by output backends.

use epi_sim::TickReport;

/// One metric reported by one model at one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub tick:   u64,
    pub model:  &'static str,
    pub metric: &'static str,
    pub value:  f64,
}

impl MetricRow {
    /// Flatten a tick report into rows, in model then metric order.
    pub fn from_report(report: &TickReport) -> Vec<MetricRow> {
        report
            .outputs
            .iter()
            .flat_map(|output| {
                output.metrics.iter().map(move |&(metric, value)| MetricRow {
                    tick: report.tick.0,
                    model: output.model,
                    metric,
                    value,
                })
            })
            .collect()
    }
}
