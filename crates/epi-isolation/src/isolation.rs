//! `Isolation` — serves the isolation and leave request channels.
//!
//! # Tick order
//!
//! 1. Release deceased agents that are still flagged isolated.
//! 2. Isolate every agent with a pending isolation request, attributed to
//!    the requester recorded in the channel.
//! 3. Household cascade: every living, non-isolated agent sharing a home
//!    with a newly isolated agent is isolated under the household code.
//! 4. Quarantine expiry: agents isolated for `quarantine_ticks` without
//!    symptoms get a leave request.
//! 5. Release every isolated agent with a pending leave request.
//! 6. With `relocate` and a world attached, move the newly isolated to the
//!    containment region and the released back home, then invalidate the
//!    tick cache.
//!
//! Both request channels are reset at the end of the step; a request made
//! for an agent that is already in the requested state is dropped.

use epi_core::{AgentId, RegionId, RequesterId};
use epi_model::{Capabilities, Metrics, Model, ModelResult, StepContext, channels};
use epi_pathogen::{InfectionState, SymptomLevel, columns as pathogen_columns};
use epi_population::Population;
use epi_world::{Destination, columns as world_columns};
use tracing::{debug, trace};

use crate::{IsolationRecord, RequesterRegistry, columns};

/// Configuration of [`Isolation`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IsolationConfig {
    /// Cascade every isolation to the agent's household.
    pub household:        bool,
    /// Move isolated agents to the world's containment region and released
    /// agents back home.
    pub relocate:         bool,
    /// Release asymptomatic agents after this many ticks of isolation.
    pub quarantine_ticks: Option<u64>,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self { household: true, relocate: true, quarantine_ticks: None }
    }
}

/// Running totals since construction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IsolationTotals {
    pub direct:          u64,
    pub household:       u64,
    pub released:        u64,
    pub false_positives: u64,
}

pub struct Isolation {
    config:         IsolationConfig,
    registry:       RequesterRegistry,
    household_code: RequesterId,
    caps:           Capabilities,
    totals:         IsolationTotals,
}

impl Isolation {
    pub const NAME: &'static str = "isolation";
    pub const HOUSEHOLD: &'static str = "household";

    /// Register the `isolated` and `isolation` columns plus the request
    /// channels.  The household cascade takes the first requester code.
    pub fn new(config: IsolationConfig, population: &mut Population) -> ModelResult<Self> {
        let n = population.len();
        channels::register(population)?;
        population.add_property(channels::ISOLATED, vec![false; n])?;
        population.add_property(columns::ISOLATION, vec![IsolationRecord::default(); n])?;

        let mut registry = RequesterRegistry::new();
        let household_code = registry.register(Self::HOUSEHOLD);
        Ok(Self {
            config,
            registry,
            household_code,
            caps: Capabilities::default(),
            totals: IsolationTotals::default(),
        })
    }

    pub fn config(&self) -> &IsolationConfig {
        &self.config
    }

    pub fn registry(&self) -> &RequesterRegistry {
        &self.registry
    }

    /// Registry handed to requesting models at their construction.
    pub fn registry_mut(&mut self) -> &mut RequesterRegistry {
        &mut self.registry
    }

    pub fn household_code(&self) -> RequesterId {
        self.household_code
    }

    pub fn totals(&self) -> IsolationTotals {
        self.totals
    }
}

impl Model for Isolation {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn setup(&mut self, population: &Population) -> ModelResult<()> {
        self.caps = Capabilities::resolve(
            Self::NAME,
            population,
            &[pathogen_columns::STATE, pathogen_columns::SYMPTOM_LEVEL, world_columns::HOME],
        );
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Metrics> {
        let t = ctx.tick;
        let pop = &*ctx.population;
        let states = self
            .caps
            .has(pathogen_columns::STATE)
            .then(|| pop.get::<InfectionState>(pathogen_columns::STATE).map(<[_]>::to_vec))
            .transpose()?;
        let symptoms = self
            .caps
            .has(pathogen_columns::SYMPTOM_LEVEL)
            .then(|| pop.get::<SymptomLevel>(pathogen_columns::SYMPTOM_LEVEL).map(<[_]>::to_vec))
            .transpose()?;
        let homes = (self.config.household && self.caps.has(world_columns::HOME))
            .then(|| pop.get::<RegionId>(world_columns::HOME).map(<[_]>::to_vec))
            .transpose()?;
        let mut isolated = pop.get::<bool>(channels::ISOLATED)?.to_vec();
        let requested = pop.get::<bool>(channels::ISOLATION_REQUEST)?.to_vec();
        let requested_by = pop.get::<RequesterId>(channels::ISOLATION_REQUESTED_BY)?.to_vec();
        let mut leave = pop.get::<bool>(channels::LEAVE_REQUEST)?.to_vec();

        let state_of = |i: usize| states.as_ref().map(|s| s[i]);
        let deceased = |i: usize| state_of(i) == Some(InfectionState::Deceased);
        let false_positive = |i: usize| state_of(i).is_some_and(|s| !s.is_transmitting());

        let records = ctx.population.get_mut::<IsolationRecord>(columns::ISOLATION)?;

        // ── Release the deceased ──────────────────────────────────────────
        let mut buried = 0u64;
        for i in 0..isolated.len() {
            if isolated[i] && deceased(i) {
                isolated[i] = false;
                records[i].close(t);
                buried += 1;
            }
        }

        // ── Direct isolations ─────────────────────────────────────────────
        let mut newly: Vec<usize> = Vec::new();
        let mut false_positives = 0u64;
        for i in 0..isolated.len() {
            if requested[i] && !isolated[i] && !deceased(i) {
                isolated[i] = true;
                let fp = false_positive(i);
                records[i].open(requested_by[i], t, fp);
                false_positives += u64::from(fp);
                newly.push(i);
            }
        }
        let direct = newly.len();

        // ── Household cascade ─────────────────────────────────────────────
        if let Some(homes) = &homes {
            let mut affected: Vec<RegionId> = newly.iter().map(|&i| homes[i]).collect();
            affected.sort_unstable();
            affected.dedup();
            for i in 0..isolated.len() {
                if !isolated[i] && !deceased(i) && affected.binary_search(&homes[i]).is_ok() {
                    isolated[i] = true;
                    let fp = false_positive(i);
                    records[i].open(self.household_code, t, fp);
                    false_positives += u64::from(fp);
                    newly.push(i);
                    trace!(agent = i, home = %homes[i], "household isolation");
                }
            }
        }
        let household = newly.len() - direct;

        // ── Quarantine expiry ─────────────────────────────────────────────
        if let Some(q) = self.config.quarantine_ticks {
            for i in 0..isolated.len() {
                let symptomatic = symptoms.as_ref().is_some_and(|s| s[i].is_symptomatic());
                let served = records[i].current().is_some_and(|e| t.since(e.start) >= q);
                if isolated[i] && served && !symptomatic {
                    leave[i] = true;
                }
            }
        }

        // ── Leave ─────────────────────────────────────────────────────────
        let mut released: Vec<usize> = Vec::new();
        for i in 0..isolated.len() {
            if leave[i] && isolated[i] {
                isolated[i] = false;
                records[i].close(t);
                released.push(i);
            }
        }

        // ── Write back, reset channels ────────────────────────────────────
        ctx.population.get_mut::<bool>(channels::ISOLATED)?.copy_from_slice(&isolated);
        ctx.population.get_mut::<bool>(channels::ISOLATION_REQUEST)?.fill(false);
        ctx.population
            .get_mut::<RequesterId>(channels::ISOLATION_REQUESTED_BY)?
            .fill(RequesterId::INVALID);
        ctx.population.get_mut::<bool>(channels::LEAVE_REQUEST)?.fill(false);

        // ── Relocation ────────────────────────────────────────────────────
        if self.config.relocate {
            if let Some(world) = ctx.world.as_deref_mut() {
                let containment = world.containment_region();
                let regions = ctx.population.get::<RegionId>(world_columns::REGION)?;
                let homes = ctx.population.get::<RegionId>(world_columns::HOME)?;
                let n = regions.len();

                let mut to_ward = vec![false; n];
                newly
                    .iter()
                    .filter(|&&i| isolated[i] && regions[i] != containment)
                    .for_each(|&i| to_ward[i] = true);
                let mut to_home = vec![false; n];
                released
                    .iter()
                    .filter(|&&i| regions[i] != homes[i])
                    .for_each(|&i| to_home[i] = true);

                let mut moved = 0;
                if to_ward.contains(&true) {
                    moved += world.move_particles(
                        ctx.population,
                        &to_ward,
                        Destination::Region(containment),
                        ctx.rng,
                    )?;
                }
                if to_home.contains(&true) {
                    moved += world.move_particles(ctx.population, &to_home, Destination::Home, ctx.rng)?;
                }
                if moved > 0 {
                    ctx.cache.invalidate();
                }
            }
        }

        self.totals.direct += direct as u64;
        self.totals.household += household as u64;
        self.totals.released += released.len() as u64;
        self.totals.false_positives += false_positives;

        let currently = isolated.iter().filter(|&&x| x).count();
        debug!(tick = %t, direct, household, released = released.len(), buried, currently, "isolation step");
        Ok(vec![
            ("isolated", currently as f64),
            ("new_direct", direct as f64),
            ("new_household", household as f64),
            ("released", released.len() as f64),
            ("false_positives", self.totals.false_positives as f64),
        ])
    }
}

/// Agents currently isolated.
pub fn isolated_agents(population: &Population) -> ModelResult<Vec<AgentId>> {
    Ok(population
        .get::<bool>(channels::ISOLATED)?
        .iter()
        .enumerate()
        .filter(|&(_, &x)| x)
        .map(|(i, _)| AgentId(i as u32))
        .collect())
}
