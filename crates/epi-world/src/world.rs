//! The `World` trait — what the epidemic core needs from geometry.

use epi_core::{AgentId, RegionId, SimRng};
use epi_population::Population;

use crate::{WorldResult, columns};

/// Where [`World::move_particles`] sends the selected agents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Every selected agent goes to the same region.
    Region(RegionId),
    /// Every selected agent goes to its own home region.
    Home,
}

/// Spatial collaborator.
///
/// Implementations own the `position`, `region`, `home` and
/// `movement_enabled` columns of the population they are attached to.
/// Relocation mutates positions: callers must invalidate the tick cache
/// afterwards.
pub trait World: Send + 'static {
    /// Number of regions; valid ids are `0..region_count()`.
    fn region_count(&self) -> usize;

    /// Region isolated agents are moved to.
    fn containment_region(&self) -> RegionId;

    /// Move every agent whose `mask` entry is `true` to `destination`,
    /// updating both its position and its region.  Returns how many agents
    /// moved.
    fn move_particles(
        &mut self,
        population:  &mut Population,
        mask:        &[bool],
        destination: Destination,
        rng:         &mut SimRng,
    ) -> WorldResult<usize>;

    /// Agents whose position does not lie inside their recorded region.
    fn check_positions(&self, population: &Population) -> WorldResult<Vec<AgentId>>;

    /// Advance motion by one tick.  Agents with `movement_enabled == false`
    /// must not move.
    fn step(&mut self, population: &mut Population, rng: &mut SimRng) -> WorldResult<()>;

    /// The agent's home region, as recorded in the `home` column.
    fn home_region(&self, population: &Population, agent: AgentId) -> WorldResult<RegionId> {
        Ok(population.get::<RegionId>(columns::HOME)?[agent.index()])
    }

    /// The region the agent currently occupies.
    fn region_of(&self, population: &Population, agent: AgentId) -> WorldResult<RegionId> {
        Ok(population.get::<RegionId>(columns::REGION)?[agent.index()])
    }
}
