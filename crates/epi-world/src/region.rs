//! `RegionWorld` — axis-aligned rectangular regions with a bounded random walk.
//!
//! Each agent lives inside exactly one rectangle at a time.  Homes, venues
//! and the containment ward are all just regions; the world does not care
//! what they represent.

use epi_core::{AgentId, Position, RegionId, SimRng};
use epi_population::Population;
use tracing::debug;

use crate::{Destination, World, WorldError, WorldResult, columns};

/// An axis-aligned rectangle `[min, max]`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    pub min: Position,
    pub max: Position,
}

impl Region {
    pub fn new(min: Position, max: Position) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, p: Position) -> bool {
        (self.min.x..=self.max.x).contains(&p.x) && (self.min.y..=self.max.y).contains(&p.y)
    }

    #[inline]
    pub fn clamp(&self, p: Position) -> Position {
        Position::new(p.x.clamp(self.min.x, self.max.x), p.y.clamp(self.min.y, self.max.y))
    }

    /// Uniform random point inside the rectangle.
    pub fn random_point(&self, rng: &mut SimRng) -> Position {
        Position::new(
            lerp(self.min.x, self.max.x, rng.random::<f64>()),
            lerp(self.min.y, self.max.y, rng.random::<f64>()),
        )
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Reference [`World`] implementation.
pub struct RegionWorld {
    regions:     Vec<Region>,
    containment: RegionId,
    /// Maximum displacement per axis per tick.
    step_size:   f64,
}

impl RegionWorld {
    /// Build a world.  Every region must be a non-inverted rectangle and
    /// `containment` must name one of them.
    pub fn new(regions: Vec<Region>, containment: RegionId, step_size: f64) -> WorldResult<Self> {
        if let Some((i, _)) = regions
            .iter()
            .enumerate()
            .find(|(_, r)| r.min.x > r.max.x || r.min.y > r.max.y)
        {
            return Err(WorldError::Config(format!("region {i} has min > max")));
        }
        if containment.index() >= regions.len() {
            return Err(WorldError::UnknownRegion(containment));
        }
        if !(step_size.is_finite() && step_size >= 0.0) {
            return Err(WorldError::Config(format!("step size {step_size} must be finite and >= 0")));
        }
        Ok(Self { regions, containment, step_size })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: RegionId) -> WorldResult<&Region> {
        self.regions.get(id.index()).ok_or(WorldError::UnknownRegion(id))
    }

    /// Install the world's columns on `population`, placing every agent at a
    /// random point of its home region.
    pub fn populate(
        &self,
        population: &mut Population,
        homes:      Vec<RegionId>,
        rng:        &mut SimRng,
    ) -> WorldResult<()> {
        let positions = homes
            .iter()
            .map(|&h| self.region(h).map(|r| r.random_point(rng)))
            .collect::<WorldResult<Vec<_>>>()?;
        let n = population.len();
        population.add_property(columns::REGION, homes.clone())?;
        population.add_property(columns::HOME, homes)?;
        population.add_property(columns::POSITION, positions)?;
        population.add_property(columns::MOVEMENT_ENABLED, vec![true; n])?;
        Ok(())
    }
}

impl World for RegionWorld {
    fn region_count(&self) -> usize {
        self.regions.len()
    }

    fn containment_region(&self) -> RegionId {
        self.containment
    }

    fn move_particles(
        &mut self,
        population:  &mut Population,
        mask:        &[bool],
        destination: Destination,
        rng:         &mut SimRng,
    ) -> WorldResult<usize> {
        if mask.len() != population.len() {
            return Err(WorldError::MaskLength { expected: population.len(), got: mask.len() });
        }

        // Resolve targets first so a bad region leaves the population untouched.
        let homes = population.get::<RegionId>(columns::HOME)?;
        let mut moves: Vec<(usize, RegionId, Position)> = Vec::new();
        for (i, _) in mask.iter().enumerate().filter(|(_, m)| **m) {
            let target = match destination {
                Destination::Region(r) => r,
                Destination::Home => homes[i],
            };
            let point = self.region(target)?.random_point(rng);
            moves.push((i, target, point));
        }

        let (regions, positions) =
            population.get_pair_mut::<RegionId, Position>(columns::REGION, columns::POSITION)?;
        for &(i, region, point) in &moves {
            regions[i] = region;
            positions[i] = point;
        }
        debug!(moved = moves.len(), ?destination, "relocated agents");
        Ok(moves.len())
    }

    fn check_positions(&self, population: &Population) -> WorldResult<Vec<AgentId>> {
        let regions = population.get::<RegionId>(columns::REGION)?;
        let positions = population.get::<Position>(columns::POSITION)?;
        Ok(regions
            .iter()
            .zip(positions)
            .enumerate()
            .filter(|(_, (r, p))| self.regions.get(r.index()).is_none_or(|rect| !rect.contains(**p)))
            .map(|(i, _)| AgentId(i as u32))
            .collect())
    }

    fn step(&mut self, population: &mut Population, rng: &mut SimRng) -> WorldResult<()> {
        if self.step_size == 0.0 {
            return Ok(());
        }
        let enabled = population.get::<bool>(columns::MOVEMENT_ENABLED)?.to_vec();
        let regions = population.get::<RegionId>(columns::REGION)?.to_vec();
        let positions = population.get_mut::<Position>(columns::POSITION)?;
        let s = self.step_size;
        for (i, pos) in positions.iter_mut().enumerate() {
            if !enabled[i] {
                continue;
            }
            let Some(rect) = self.regions.get(regions[i].index()) else {
                continue;
            };
            let moved = Position::new(pos.x + rng.gen_range(-s..=s), pos.y + rng.gen_range(-s..=s));
            *pos = rect.clamp(moved);
        }
        Ok(())
    }
}
