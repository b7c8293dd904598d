//! Synthetic town: a grid of homes, one shared commons and a ward.

use epi_core::{Position, RegionId, SimRng};
use epi_population::Population;
use epi_world::{Region, RegionWorld, WorldResult};

const HOME_SIDE:    f64 = 5.0;
const HOME_SPACING: f64 = 20.0;
const STEP_SIZE:    f64 = 0.5;

/// Region ids of the non-home areas.
#[derive(Copy, Clone, Debug)]
pub struct Landmarks {
    pub commons: RegionId,
    pub ward:    RegionId,
}

/// Build `homes` homes of `household_size` agents each.  Agents start at
/// home; agent `i` lives in home `i / household_size`.
pub fn build_town(
    homes:          usize,
    household_size: usize,
    rng:            &mut SimRng,
) -> WorldResult<(Population, RegionWorld, Landmarks)> {
    let n = homes * household_size;
    let cols = (homes as f64).sqrt().ceil().max(1.0) as usize;
    let rows = homes.div_ceil(cols);

    let mut regions: Vec<Region> = (0..homes)
        .map(|h| {
            let x = (h % cols) as f64 * HOME_SPACING;
            let y = (h / cols) as f64 * HOME_SPACING;
            Region::new(Position::new(x, y), Position::new(x + HOME_SIDE, y + HOME_SIDE))
        })
        .collect();

    // Commons below the home grid, sized for roughly one agent per 16 units².
    let top = rows as f64 * HOME_SPACING + HOME_SPACING;
    let side = ((n as f64).sqrt() * 4.0).max(HOME_SIDE);
    regions.push(Region::new(Position::new(0.0, top), Position::new(side, top + side)));
    let ward_x = side + HOME_SPACING * (cols as f64 + 1.0);
    regions.push(Region::new(Position::new(ward_x, top), Position::new(ward_x + side, top + side)));

    let landmarks = Landmarks { commons: RegionId(homes as u32), ward: RegionId(homes as u32 + 1) };
    let world = RegionWorld::new(regions, landmarks.ward, STEP_SIZE)?;
    let mut population = Population::new(n);
    let home_of: Vec<RegionId> = (0..n).map(|i| RegionId((i / household_size) as u32)).collect();
    world.populate(&mut population, home_of, rng)?;
    Ok((population, world, landmarks))
}
