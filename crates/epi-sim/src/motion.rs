//! `WorldMotion` — lets the attached world move agents once per tick.

use epi_model::{Metrics, Model, ModelError, ModelResult, StepContext};
use epi_world::columns as world_columns;

/// Advances the world's motion model and invalidates the tick cache.
///
/// Register it last so the next tick's detector sees the new positions.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldMotion;

impl WorldMotion {
    pub const NAME: &'static str = "motion";
}

impl Model for WorldMotion {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Metrics> {
        let world = ctx
            .world
            .as_deref_mut()
            .ok_or(ModelError::MissingCollaborator { model: Self::NAME, collaborator: "world" })?;
        world.step(ctx.population, ctx.rng)?;
        ctx.cache.invalidate();
        let moving = ctx
            .population
            .get::<bool>(world_columns::MOVEMENT_ENABLED)?
            .iter()
            .filter(|&&m| m)
            .count();
        Ok(vec![("moving", moving as f64)])
    }
}
