//! Fluent builder for constructing a [`Sim`].

use std::ops::Range;

use epi_core::{SimConfig, time::SECS_PER_DAY};
use epi_model::Model;
use epi_population::Population;
use epi_world::World;

use crate::{PopulationId, Sim, SimError, SimResult};

/// Fluent builder for [`Sim`].
///
/// Models attach to the most recently added population, so a typical build
/// reads top to bottom in step order:
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config)
///     .population(population, Some(Box::new(world)))
///     .model(detector)
///     .model(pathogen)
///     .model(isolation)
///     .model(WorldMotion)
///     .build()?;
/// for report in sim.run(Some(24)) {
///     println!("{:?}", report?);
/// }
/// ```
pub struct SimBuilder {
    config:      SimConfig,
    populations: Vec<(Population, Option<Box<dyn World>>)>,
    models:      Vec<(usize, Box<dyn Model>)>,
    selection:   Option<Range<usize>>,
    orphans:     Vec<&'static str>,
}

impl SimBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            populations: Vec::new(),
            models:      Vec::new(),
            selection:   None,
            orphans:     Vec::new(),
        }
    }

    /// Add a population; subsequent models attach to it.
    pub fn population(mut self, population: Population, world: Option<Box<dyn World>>) -> Self {
        self.populations.push((population, world));
        self
    }

    /// Append a model attached to the most recent population.
    pub fn model<M: Model>(mut self, model: M) -> Self {
        match self.populations.len().checked_sub(1) {
            Some(p) => self.models.push((p, Box::new(model))),
            None => self.orphans.push(model.name()),
        }
        self
    }

    pub fn select_outputs(mut self, range: Range<usize>) -> Self {
        self.selection = Some(range);
        self
    }

    /// Validate the configuration and assemble the [`Sim`].
    pub fn build(self) -> SimResult<Sim> {
        if self.config.tick_duration_secs == 0 {
            return Err(SimError::Config("tick_duration_secs must be > 0".into()));
        }
        if self.config.start_secs_of_day as u64 >= SECS_PER_DAY {
            return Err(SimError::Config(format!(
                "start_secs_of_day {} must be below {SECS_PER_DAY}",
                self.config.start_secs_of_day
            )));
        }
        if !self.orphans.is_empty() {
            return Err(SimError::Config(format!(
                "models {:?} were added before any population",
                self.orphans
            )));
        }

        let mut sim = Sim::new(self.config);
        for (population, world) in self.populations {
            sim.add_population(population, world);
        }
        for (p, model) in self.models {
            sim.add_boxed_model(PopulationId(p), model)?;
        }
        if let Some(range) = self.selection {
            sim.select_outputs(range);
        }
        Ok(sim)
    }
}
