//! Mutable per-tick state lent to each model in turn.

use epi_core::{SimClock, SimRng, Tick, TickCache};
use epi_population::Population;
use epi_world::World;

use crate::{ModelError, ModelResult};

/// Everything a model may read or write during one step.
///
/// Built by the scheduler for each model call.  The borrows end when the
/// call returns, so a model cannot hold on to shared state between ticks.
pub struct StepContext<'a> {
    /// Current simulation tick.
    pub tick: Tick,

    /// Maps ticks to time of day.
    pub clock: &'a SimClock,

    /// The population this model is attached to.
    pub population: &'a mut Population,

    /// Per-tick memo table of the population.  Invalidate after moving agents.
    pub cache: &'a mut TickCache,

    /// Spatial collaborator, if one is attached to the population.
    pub world: Option<&'a mut (dyn World + 'static)>,

    /// Shared run RNG.
    pub rng: &'a mut SimRng,
}

impl<'a> StepContext<'a> {
    #[inline]
    pub fn new(
        tick:       Tick,
        clock:      &'a SimClock,
        population: &'a mut Population,
        cache:      &'a mut TickCache,
        world:      Option<&'a mut (dyn World + 'static)>,
        rng:        &'a mut SimRng,
    ) -> Self {
        Self { tick, clock, population, cache, world, rng }
    }

    /// The attached world, or a `MissingCollaborator` error naming `model`.
    pub fn require_world(&mut self, model: &'static str) -> ModelResult<&mut (dyn World + 'static)> {
        self.world
            .as_deref_mut()
            .ok_or(ModelError::MissingCollaborator { model, collaborator: "world" })
    }
}
