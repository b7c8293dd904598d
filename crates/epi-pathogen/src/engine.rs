//! `Pathogen` — the per-agent infection state machine.
//!
//! # Tick order
//!
//! 1. **Progression.**  Agents whose planned change tick has come move one
//!    step along the state graph: Exposed agents become Infectious or
//!    Infected, infectious agents reach their pre-sampled outcome.
//! 2. **Transmission.**  Every susceptible agent with at least one
//!    transmitting neighbour gains one tick of exposure.  Once its exposure
//!    had already reached `exposure_time`, an infection is drawn.
//! 3. **Apply.**  New infections become Exposed; each of their transmitting
//!    neighbours is credited `1 / k` of a transmission.
//! 4. **Waves.**  A wave is open while any agent is Exposed, Infectious or
//!    Infected.
//!
//! Isolated agents (when an isolation model is present) neither transmit
//! nor accumulate exposure.  Deceased agents stop moving when the world's
//! movement mask is present.

use epi_contact::neighbours_within;
use epi_core::{AgentId, Sampler, SimRng, Tick, distribution::to_ticks};
use epi_model::{Capabilities, Metrics, Model, ModelError, ModelResult, StepContext, channels};
use epi_population::{Population, PopulationResult};
use epi_world::columns as world_columns;
use rand::distributions::WeightedIndex;
use tracing::{debug, info};

use crate::{InfectionState, Outcome, PathogenConfig, SymptomLevel, columns};

/// How many of the seeded agents are asymptomatic.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AsymptomaticShare {
    /// Fraction of the batch, in `[0, 1]`, rounded to the nearest agent.
    Fraction(f64),
    /// Absolute number of agents, at most the batch size.
    Count(usize),
}

/// The infection model.
pub struct Pathogen {
    config:           PathogenConfig,
    incubation:       Box<dyn Sampler>,
    duration:         Box<dyn Sampler>,
    symptom_index:    WeightedIndex<f64>,
    /// Planned length of the infectious period, sampled at infection.
    infection_length: Vec<u64>,
    outcome:          Vec<Outcome>,
    caps:             Capabilities,
    waves:            Vec<(Tick, Option<Tick>)>,
    total_infections: u64,
}

impl Pathogen {
    pub const NAME: &'static str = "pathogen";

    /// Validate `config` and register the infection columns, with every
    /// agent susceptible.
    pub fn new(config: PathogenConfig, population: &mut Population) -> ModelResult<Self> {
        config.validate()?;
        let incubation = config.incubation.build()?;
        let duration = config.infection_duration.build()?;
        let symptom_index = WeightedIndex::new(config.symptom_weights)
            .map_err(|e| ModelError::config(Self::NAME, format!("symptom_weights: {e}")))?;

        let n = population.len();
        population.add_property(columns::STATE, vec![InfectionState::Susceptible; n])?;
        population.add_property(columns::SYMPTOM_LEVEL, vec![SymptomLevel::NotSick; n])?;
        population.add_property(columns::TIME_OF_INFECTION, vec![None::<Tick>; n])?;
        population.add_property(columns::DURATION_INFECTION, vec![None::<Tick>; n])?;
        population.add_property(columns::PARTICLES_INFECTED, vec![0.0f64; n])?;
        population.add_property(columns::EXPOSURE, vec![0u64; n])?;

        Ok(Self {
            config,
            incubation: Box::new(incubation),
            duration: Box::new(duration),
            symptom_index,
            infection_length: vec![0; n],
            outcome: vec![Outcome::Recover; n],
            caps: Capabilities::default(),
            waves: Vec::new(),
            total_infections: 0,
        })
    }

    /// Replace the configured incubation and infection-duration
    /// distributions, e.g. with closures.
    pub fn with_samplers(
        mut self,
        incubation: impl Sampler + 'static,
        duration:   impl Sampler + 'static,
    ) -> Self {
        self.incubation = Box::new(incubation);
        self.duration = Box::new(duration);
        self
    }

    pub fn config(&self) -> &PathogenConfig {
        &self.config
    }

    /// Start and (once over) end tick of every wave so far.  A wave lasts
    /// while any agent is exposed or transmitting.
    pub fn waves(&self) -> &[(Tick, Option<Tick>)] {
        &self.waves
    }

    pub fn in_wave(&self) -> bool {
        self.waves.last().is_some_and(|(_, end)| end.is_none())
    }

    /// Infections caused by transmission since construction.
    pub fn total_infections(&self) -> u64 {
        self.total_infections
    }

    /// Planned outcome of `agent`'s current or last infection.
    pub fn outcome(&self, agent: AgentId) -> Outcome {
        self.outcome[agent.index()]
    }

    /// Make `ids` infectious immediately, skipping incubation.
    ///
    /// `share` decides how many of them are asymptomatic (`Infectious`); the
    /// rest are symptomatic (`Infected`).  Every id must be a distinct
    /// susceptible agent.  Invalid input fails before any agent is touched.
    pub fn seed_infections(
        &mut self,
        population: &mut Population,
        ids:        &[AgentId],
        share:      AsymptomaticShare,
        rng:        &mut SimRng,
    ) -> ModelResult<()> {
        let n = population.len();
        if let Some(bad) = ids.iter().find(|a| a.index() >= n) {
            return Err(ModelError::config(Self::NAME, format!("seed {bad} is outside a population of {n}")));
        }
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();
        if unique.len() != ids.len() {
            return Err(ModelError::config(Self::NAME, "seed ids contain duplicates"));
        }
        let asymptomatic = match share {
            AsymptomaticShare::Fraction(f) if (0.0..=1.0).contains(&f) => {
                (f * ids.len() as f64).round() as usize
            }
            AsymptomaticShare::Fraction(f) => {
                return Err(ModelError::config(
                    Self::NAME,
                    format!("asymptomatic fraction {f} must lie in [0, 1]"),
                ));
            }
            AsymptomaticShare::Count(c) if c <= ids.len() => c,
            AsymptomaticShare::Count(c) => {
                return Err(ModelError::config(
                    Self::NAME,
                    format!("asymptomatic count {c} exceeds the {} seeded agents", ids.len()),
                ));
            }
        };

        let mut frame = Frame::load(population)?;
        if let Some(a) = ids.iter().find(|a| frame.state[a.index()] != InfectionState::Susceptible) {
            return Err(ModelError::config(
                Self::NAME,
                format!("seed {a} is {}, not susceptible", frame.state[a.index()].as_str()),
            ));
        }

        let mut order = ids.to_vec();
        rng.shuffle(&mut order);
        let t = population.time();
        let death_rate = self.config.death_rate;
        for (k, a) in order.iter().enumerate() {
            self.infect(&mut frame, a.index(), t, k < asymptomatic, false, death_rate, rng)?;
        }
        frame.store(population)?;
        info!(seeded = ids.len(), asymptomatic, tick = %t, "seeded infections");
        Ok(())
    }

    /// Assign a fresh infection to agent `i`.
    #[allow(clippy::too_many_arguments)]
    fn infect(
        &mut self,
        frame:        &mut Frame,
        i:            usize,
        t:            Tick,
        asymptomatic: bool,
        incubate:     bool,
        death_rate:   f64,
        rng:          &mut SimRng,
    ) -> ModelResult<()> {
        let level = if asymptomatic {
            SymptomLevel::NoSymptoms
        } else {
            SymptomLevel::SYMPTOMATIC[rng.sample::<usize, _>(&self.symptom_index)]
        };
        self.infection_length[i] = to_ticks(self.duration.sample_one(rng)?);
        self.outcome[i] = if level.is_symptomatic() && rng.gen_bool(death_rate) {
            Outcome::Die
        } else {
            Outcome::Recover
        };

        frame.symptoms[i] = level;
        frame.infected_at[i] = Some(t);
        if incubate {
            frame.state[i] = InfectionState::Exposed;
            frame.change_at[i] = Some(t + to_ticks(self.incubation.sample_one(rng)?));
        } else {
            frame.state[i] = if asymptomatic { InfectionState::Infectious } else { InfectionState::Infected };
            frame.change_at[i] = Some(t + self.infection_length[i]);
        }
        Ok(())
    }

    /// Move agents whose planned change tick is due.  Returns the agents that
    /// died.
    fn progress(&self, frame: &mut Frame, t: Tick) -> Vec<usize> {
        let mut died = Vec::new();
        for i in 0..frame.state.len() {
            let Some(due) = frame.change_at[i] else {
                continue;
            };
            if t < due {
                continue;
            }
            match frame.state[i] {
                InfectionState::Exposed => {
                    frame.state[i] = if frame.symptoms[i].is_symptomatic() {
                        InfectionState::Infected
                    } else {
                        InfectionState::Infectious
                    };
                    frame.change_at[i] = Some(t + self.infection_length[i]);
                }
                InfectionState::Infectious | InfectionState::Infected => {
                    match self.outcome[i] {
                        Outcome::Die => {
                            frame.state[i] = InfectionState::Deceased;
                            died.push(i);
                        }
                        Outcome::Recover => {
                            frame.state[i] = InfectionState::Immune;
                            frame.symptoms[i] = SymptomLevel::NotSick;
                        }
                    }
                    frame.change_at[i] = None;
                }
                _ => frame.change_at[i] = None,
            }
        }
        died
    }

    /// `active` is whether any agent is exposed or transmitting at `t`.
    fn track_wave(&mut self, t: Tick, active: bool) {
        match (self.in_wave(), active) {
            (false, true) => {
                info!(tick = %t, wave = self.waves.len() + 1, "wave started");
                self.waves.push((t, None));
            }
            (true, false) => {
                if let Some((start, end)) = self.waves.last_mut() {
                    *end = Some(t);
                    info!(tick = %t, length = t.since(*start), "wave ended");
                }
            }
            _ => {}
        }
    }
}

impl Model for Pathogen {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn setup(&mut self, population: &Population) -> ModelResult<()> {
        self.caps = Capabilities::resolve(
            Self::NAME,
            population,
            &[channels::ISOLATED, world_columns::MOVEMENT_ENABLED],
        );
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Metrics> {
        let t = ctx.tick;
        let mut frame = Frame::load(ctx.population)?;
        let isolated = if self.caps.has(channels::ISOLATED) {
            Some(ctx.population.get::<bool>(channels::ISOLATED)?.to_vec())
        } else {
            None
        };
        let is_isolated = |i: usize| isolated.as_ref().is_some_and(|mask| mask[i]);

        // ── Progression ───────────────────────────────────────────────────
        let died = self.progress(&mut frame, t);

        // ── Transmission (read) ───────────────────────────────────────────
        let cfg = &self.config;
        let neighbours = neighbours_within(ctx.population, ctx.cache, cfg.radius, cfg.proximity)?;
        let severe = frame
            .state
            .iter()
            .zip(&frame.symptoms)
            .filter(|&(s, l)| *s == InfectionState::Infected && *l == SymptomLevel::Severe)
            .count();
        let over_capacity = cfg.icu_beds.is_some_and(|beds| severe > beds);
        let death_rate = if over_capacity { cfg.icu_death_rate } else { cfg.death_rate };

        let mut infections: Vec<(usize, Vec<AgentId>)> = Vec::new();
        for i in 0..frame.state.len() {
            if frame.state[i] != InfectionState::Susceptible || is_isolated(i) {
                continue;
            }
            let sources: Vec<AgentId> = neighbours[i]
                .iter()
                .copied()
                .filter(|a| frame.state[a.index()].is_transmitting() && !is_isolated(a.index()))
                .collect();
            if sources.is_empty() {
                continue;
            }
            let ready = frame.exposure[i] >= cfg.exposure_time;
            frame.exposure[i] += 1;
            if ready && ctx.rng.gen_bool(cfg.infection_probability) {
                infections.push((i, sources));
            }
        }

        // ── Transmission (apply) ──────────────────────────────────────────
        let asymptomatic_share = cfg.asymptomatic_share;
        for (i, sources) in &infections {
            let blame = 1.0 / sources.len() as f64;
            for s in sources {
                frame.particles[s.index()] += blame;
            }
            let asymptomatic = ctx.rng.gen_bool(asymptomatic_share);
            self.infect(&mut frame, *i, t, asymptomatic, true, death_rate, ctx.rng)?;
        }
        self.total_infections += infections.len() as u64;

        frame.store(ctx.population)?;
        if !died.is_empty() && self.caps.has(world_columns::MOVEMENT_ENABLED) {
            let movement = ctx.population.get_mut::<bool>(world_columns::MOVEMENT_ENABLED)?;
            died.iter().for_each(|&i| movement[i] = false);
        }

        // ── Waves ─────────────────────────────────────────────────────────
        self.track_wave(t, frame.state.iter().any(|s| s.is_active()));

        let mut metrics: Metrics = InfectionState::ALL
            .iter()
            .map(|&s| (s.as_str(), frame.state.iter().filter(|&&x| x == s).count() as f64))
            .collect();
        let r = crate::r(ctx.population)?;
        let r_current = crate::r_current(ctx.population)?;
        metrics.push(("new_infections", infections.len() as f64));
        metrics.push(("deaths", died.len() as f64));
        metrics.push(("r", r));
        metrics.push(("r_current", r_current));
        debug!(tick = %t, new = infections.len(), died = died.len(), severe, over_capacity, "pathogen step");
        Ok(metrics)
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// Working copy of the infection columns for one step.  Loaded at the start,
/// written back once at the end.
struct Frame {
    state:       Vec<InfectionState>,
    symptoms:    Vec<SymptomLevel>,
    infected_at: Vec<Option<Tick>>,
    change_at:   Vec<Option<Tick>>,
    particles:   Vec<f64>,
    exposure:    Vec<u64>,
}

impl Frame {
    fn load(population: &Population) -> PopulationResult<Self> {
        Ok(Self {
            state:       population.get::<InfectionState>(columns::STATE)?.to_vec(),
            symptoms:    population.get::<SymptomLevel>(columns::SYMPTOM_LEVEL)?.to_vec(),
            infected_at: population.get::<Option<Tick>>(columns::TIME_OF_INFECTION)?.to_vec(),
            change_at:   population.get::<Option<Tick>>(columns::DURATION_INFECTION)?.to_vec(),
            particles:   population.get::<f64>(columns::PARTICLES_INFECTED)?.to_vec(),
            exposure:    population.get::<u64>(columns::EXPOSURE)?.to_vec(),
        })
    }

    fn store(&self, population: &mut Population) -> PopulationResult<()> {
        population.get_mut::<InfectionState>(columns::STATE)?.copy_from_slice(&self.state);
        population.get_mut::<SymptomLevel>(columns::SYMPTOM_LEVEL)?.copy_from_slice(&self.symptoms);
        population.get_mut::<Option<Tick>>(columns::TIME_OF_INFECTION)?.copy_from_slice(&self.infected_at);
        population.get_mut::<Option<Tick>>(columns::DURATION_INFECTION)?.copy_from_slice(&self.change_at);
        population.get_mut::<f64>(columns::PARTICLES_INFECTED)?.copy_from_slice(&self.particles);
        population.get_mut::<u64>(columns::EXPOSURE)?.copy_from_slice(&self.exposure);
        Ok(())
    }
}
