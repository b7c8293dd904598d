//! Cached proximity readers.
//!
//! Both readers memoize through the population's [`TickCache`], so the
//! detector and the pathogen share one computation per tick.  Anything that
//! moves agents must invalidate the cache before the next read.
//!
//! | Reader              | Cost                 | Used by [`Proximity`] |
//! |---------------------|----------------------|-----------------------|
//! | [`distance_matrix`] | O(N²) time and space | `Global`              |
//! | [`region_index`]    | O(N log N) build     | `Regional`            |

use std::collections::HashMap;
use std::sync::Arc;

use epi_core::{AgentId, CacheKey, Position, RegionId, TickCache};
use epi_population::{Population, PopulationResult};
use epi_world::columns;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

/// How neighbours are searched.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Proximity {
    /// Full pairwise distance matrix over the whole population.
    #[default]
    Global,
    /// Only agents currently sharing a region can be neighbours.
    Regional,
}

// ── Distance matrix ───────────────────────────────────────────────────────────

pub const DISTANCES: CacheKey = CacheKey("epi_contact::distance_matrix");

/// Dense symmetric N×N matrix of planar distances.
#[derive(Clone, Debug)]
pub struct DistanceMatrix {
    n:    usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    pub fn compute(positions: &[Position]) -> Self {
        let n = positions.len();
        let mut data = vec![0.0; n * n];
        if n > 0 {
            fill_rows(positions, &mut data);
        }
        Self { n, data }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn get(&self, a: AgentId, b: AgentId) -> f64 {
        self.data[a.index() * self.n + b.index()]
    }

    /// Distances from `a` to every agent.
    #[inline]
    pub fn row(&self, a: AgentId) -> &[f64] {
        let start = a.index() * self.n;
        &self.data[start..start + self.n]
    }
}

#[cfg(not(feature = "parallel"))]
fn fill_rows(positions: &[Position], data: &mut [f64]) {
    for (i, row) in data.chunks_mut(positions.len()).enumerate() {
        let p = positions[i];
        for (d, q) in row.iter_mut().zip(positions) {
            *d = p.distance(*q);
        }
    }
}

#[cfg(feature = "parallel")]
fn fill_rows(positions: &[Position], data: &mut [f64]) {
    use rayon::prelude::*;

    data.par_chunks_mut(positions.len()).enumerate().for_each(|(i, row)| {
        let p = positions[i];
        for (d, q) in row.iter_mut().zip(positions) {
            *d = p.distance(*q);
        }
    });
}

/// The pairwise distance matrix of the current positions, memoized per tick.
pub fn distance_matrix(
    population: &Population,
    cache:      &mut TickCache,
) -> PopulationResult<Arc<DistanceMatrix>> {
    cache.get_or_try_insert_with(DISTANCES, || {
        let positions = population.get::<Position>(columns::POSITION)?;
        Ok(DistanceMatrix::compute(positions))
    })
}

// ── Region index ──────────────────────────────────────────────────────────────

pub const REGION_INDEX: CacheKey = CacheKey("epi_contact::region_index");

/// Entry stored in a region's R-tree.
#[derive(Copy, Clone, Debug, PartialEq)]
struct AgentPoint {
    point: [f64; 2],
    agent: AgentId,
}

impl RTreeObject for AgentPoint {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for AgentPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// One R-tree per occupied region.
#[derive(Default)]
pub struct RegionIndex {
    trees: HashMap<RegionId, RTree<AgentPoint>>,
}

impl RegionIndex {
    pub fn build(positions: &[Position], regions: &[RegionId]) -> Self {
        let mut buckets: HashMap<RegionId, Vec<AgentPoint>> = HashMap::new();
        for (i, (p, r)) in positions.iter().zip(regions).enumerate() {
            buckets
                .entry(*r)
                .or_default()
                .push(AgentPoint { point: p.to_array(), agent: AgentId(i as u32) });
        }
        let trees = buckets
            .into_iter()
            .map(|(r, points)| (r, RTree::bulk_load(points)))
            .collect();
        Self { trees }
    }

    /// Agents of `region` within `radius` of `at` (inclusive).
    pub fn within(
        &self,
        region: RegionId,
        at:     Position,
        radius: f64,
    ) -> impl Iterator<Item = AgentId> + '_ {
        self.trees
            .get(&region)
            .into_iter()
            .flat_map(move |tree| tree.locate_within_distance(at.to_array(), radius * radius))
            .map(|entry| entry.agent)
    }

    /// Number of occupied regions.
    pub fn region_count(&self) -> usize {
        self.trees.len()
    }
}

/// Per-region R-trees of the current positions, memoized per tick.
pub fn region_index(
    population: &Population,
    cache:      &mut TickCache,
) -> PopulationResult<Arc<RegionIndex>> {
    cache.get_or_try_insert_with(REGION_INDEX, || {
        let positions = population.get::<Position>(columns::POSITION)?;
        let regions = population.get::<RegionId>(columns::REGION)?;
        Ok(RegionIndex::build(positions, regions))
    })
}

// ── Queries ───────────────────────────────────────────────────────────────────

/// For every agent, the agents within `radius` of it, excluding itself.
///
/// The result is symmetric: `b ∈ out[a]` iff `a ∈ out[b]`.  Each list is
/// sorted by id.
pub fn neighbours_within(
    population: &Population,
    cache:      &mut TickCache,
    radius:     f64,
    proximity:  Proximity,
) -> PopulationResult<Vec<Vec<AgentId>>> {
    let mut out = vec![Vec::new(); population.len()];
    match proximity {
        Proximity::Global => {
            let matrix = distance_matrix(population, cache)?;
            for (i, list) in out.iter_mut().enumerate() {
                let row = matrix.row(AgentId(i as u32));
                list.extend(
                    row.iter()
                        .enumerate()
                        .filter(|&(j, d)| j != i && *d <= radius)
                        .map(|(j, _)| AgentId(j as u32)),
                );
            }
        }
        Proximity::Regional => {
            let index = region_index(population, cache)?;
            let positions = population.get::<Position>(columns::POSITION)?;
            let regions = population.get::<RegionId>(columns::REGION)?;
            for (i, list) in out.iter_mut().enumerate() {
                let me = AgentId(i as u32);
                list.extend(index.within(regions[i], positions[i], radius).filter(|&a| a != me));
                list.sort_unstable();
            }
        }
    }
    Ok(out)
}

/// Unordered pairs `(a, b)` with `a < b` whose distance lies strictly inside
/// `(inner, outer)`.
pub fn pairs_in_annulus(
    population: &Population,
    cache:      &mut TickCache,
    inner:      f64,
    outer:      f64,
    proximity:  Proximity,
) -> PopulationResult<Vec<(AgentId, AgentId)>> {
    let mut pairs = Vec::new();
    if outer <= inner {
        return Ok(pairs);
    }
    match proximity {
        Proximity::Global => {
            let matrix = distance_matrix(population, cache)?;
            for i in 0..matrix.len() {
                let row = matrix.row(AgentId(i as u32));
                for (j, &d) in row.iter().enumerate().skip(i + 1) {
                    if d > inner && d < outer {
                        pairs.push((AgentId(i as u32), AgentId(j as u32)));
                    }
                }
            }
        }
        Proximity::Regional => {
            let index = region_index(population, cache)?;
            let positions = population.get::<Position>(columns::POSITION)?;
            let regions = population.get::<RegionId>(columns::REGION)?;
            for i in 0..population.len() {
                let me = AgentId(i as u32);
                let mut found: Vec<AgentId> = index
                    .within(regions[i], positions[i], outer)
                    .filter(|&b| b > me)
                    .filter(|&b| {
                        let d = positions[i].distance(positions[b.index()]);
                        d > inner && d < outer
                    })
                    .collect();
                found.sort_unstable();
                pairs.extend(found.into_iter().map(|b| (me, b)));
            }
        }
    }
    Ok(pairs)
}
