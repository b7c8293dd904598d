//! Optional dependencies on columns owned by other models.
//!
//! A model declares the optional columns it can make use of; `resolve`
//! looks each one up once (typically in [`Model::setup`]) and the model then
//! branches on a plain flag every tick instead of probing the population.
//!
//! [`Model::setup`]: crate::Model::setup

use epi_population::Population;
use tracing::debug;

/// Presence flags for a fixed set of optional column names.
#[derive(Clone, Debug, Default)]
pub struct Capabilities {
    resolved: Vec<(&'static str, bool)>,
}

impl Capabilities {
    /// Look up every name in `wanted` on `population`.
    pub fn resolve(model: &'static str, population: &Population, wanted: &[&'static str]) -> Self {
        let resolved: Vec<(&'static str, bool)> = wanted
            .iter()
            .map(|&name| (name, population.has_property(name)))
            .collect();
        debug!(model, ?resolved, "resolved optional columns");
        Self { resolved }
    }

    /// `true` if `name` was declared and present at resolution time.
    pub fn has(&self, name: &str) -> bool {
        self.resolved.iter().any(|&(n, present)| present && n == name)
    }

    /// Declared names that were absent.
    pub fn missing(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resolved.iter().filter(|(_, p)| !p).map(|&(n, _)| n)
    }
}
