//! Daily commute: free agents spend working hours in the commons.

use epi_core::RegionId;
use epi_model::{Capabilities, Metrics, Model, ModelError, ModelResult, StepContext, channels};
use epi_population::Population;
use epi_world::{Destination, columns as world_columns};

const LEAVE_SECS:  u64 = 9 * 3_600;
const RETURN_SECS: u64 = 17 * 3_600;

pub struct Commute {
    commons: RegionId,
    caps:    Capabilities,
}

impl Commute {
    pub const NAME: &'static str = "commute";

    pub fn new(commons: RegionId) -> Self {
        Self { commons, caps: Capabilities::default() }
    }
}

impl Model for Commute {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn setup(&mut self, population: &Population) -> ModelResult<()> {
        self.caps = Capabilities::resolve(Self::NAME, population, &[channels::ISOLATED]);
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Metrics> {
        let destination = if ctx.clock.contains_time_of_day(ctx.tick, LEAVE_SECS) {
            Destination::Region(self.commons)
        } else if ctx.clock.contains_time_of_day(ctx.tick, RETURN_SECS) {
            Destination::Home
        } else {
            return Ok(vec![("moved", 0.0)]);
        };

        // Isolated agents stay in the ward; deceased ones have movement off.
        let mut mask = ctx.population.get::<bool>(world_columns::MOVEMENT_ENABLED)?.to_vec();
        if self.caps.has(channels::ISOLATED) {
            let isolated = ctx.population.get::<bool>(channels::ISOLATED)?;
            mask.iter_mut().zip(isolated).for_each(|(m, &iso)| *m &= !iso);
        }
        if destination == Destination::Home {
            let regions = ctx.population.get::<RegionId>(world_columns::REGION)?;
            mask.iter_mut().zip(regions).for_each(|(m, &r)| *m &= r == self.commons);
        }

        let world = ctx
            .world
            .as_deref_mut()
            .ok_or(ModelError::MissingCollaborator { model: Self::NAME, collaborator: "world" })?;
        let moved = world.move_particles(ctx.population, &mask, destination, ctx.rng)?;
        ctx.cache.invalidate();
        Ok(vec![("moved", moved as f64)])
    }
}
