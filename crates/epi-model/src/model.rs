//! The `Model` trait.

use std::any::Any;

use epi_population::Population;

use crate::{ModelResult, StepContext};

/// Named scalar outputs of one model step, e.g. `[("infected", 12.0)]`.
pub type Metrics = Vec<(&'static str, f64)>;

/// A step-able simulation component.
///
/// Models register the columns they produce on the population in their
/// constructor; `setup` is where they look up columns produced by *other*
/// models that they can use but do not require.
///
/// # Required methods
///
/// Only [`name`](Self::name) and [`step`](Self::step).
///
/// # Example
///
/// ```rust
/// use epi_model::{Metrics, Model, ModelResult, StepContext};
///
/// struct CountTicks(u64);
///
/// impl Model for CountTicks {
///     fn name(&self) -> &'static str { "count_ticks" }
///
///     fn step(&mut self, _ctx: &mut StepContext<'_>) -> ModelResult<Metrics> {
///         self.0 += 1;
///         Ok(vec![("ticks", self.0 as f64)])
///     }
/// }
/// ```
pub trait Model: Any + Send {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Called once before the first tick of every run.
    fn setup(&mut self, _population: &Population) -> ModelResult<()> {
        Ok(())
    }

    /// Advance this model by one tick.
    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Metrics>;

    /// End-of-run bookkeeping, called once at the last observed tick.
    fn finalize(&mut self, _ctx: &mut StepContext<'_>) -> ModelResult<()> {
        Ok(())
    }
}
