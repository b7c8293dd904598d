//! `Testing` — request → turnaround → result.

use epi_core::{AgentId, RequesterId, SimClock, Tick, time::SECS_PER_DAY, time::SECS_PER_HOUR};
use epi_isolation::RequesterRegistry;
use epi_model::{Capabilities, Metrics, Model, ModelError, ModelResult, StepContext, channels};
use epi_pathogen::{InfectionState, SymptomLevel, columns as pathogen_columns};
use epi_population::{Population, PopulationResult};
use tracing::{debug, trace};

use crate::columns;

/// Decides the true result of a test for one agent.
pub type TestPredicate = Box<dyn Fn(&Population, AgentId) -> PopulationResult<bool> + Send + Sync>;

/// Positive iff the agent is infectious or infected.
pub fn infection_predicate() -> TestPredicate {
    Box::new(|population, agent| {
        let states = population.get::<InfectionState>(pathogen_columns::STATE)?;
        Ok(states[agent.index()].is_transmitting())
    })
}

/// Configuration of [`Testing`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TestingConfig {
    /// Opening time, seconds after midnight.
    pub opening_secs:        u64,
    /// Closing time, seconds after midnight.  Must be after opening.
    pub closing_secs:        u64,
    /// Minimum turnaround, in ticks.
    pub duration:            u64,
    /// Probability that a true positive is reported negative.
    pub false_negative_rate: f64,
    /// Probability that a true negative is reported positive.
    pub false_positive_rate: f64,
    /// Symptomatic agents without a recent result request a test.
    pub test_symptomatic:    bool,
    /// Positive results request isolation.
    pub isolate_positive:    bool,
    /// Negative results of isolated agents request leave.
    pub release_negative:    bool,
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            opening_secs:        8 * SECS_PER_HOUR,
            closing_secs:        18 * SECS_PER_HOUR,
            duration:            2,
            false_negative_rate: 0.0,
            false_positive_rate: 0.0,
            test_symptomatic:    false,
            isolate_positive:    true,
            release_negative:    false,
        }
    }
}

impl TestingConfig {
    pub fn validate(&self) -> ModelResult<()> {
        let name = Testing::NAME;
        if self.opening_secs >= self.closing_secs || self.closing_secs > SECS_PER_DAY {
            return Err(ModelError::config(
                name,
                format!(
                    "opening hours [{}, {}) must be a non-empty range within one day",
                    self.opening_secs, self.closing_secs
                ),
            ));
        }
        for (field, p) in [
            ("false_negative_rate", self.false_negative_rate),
            ("false_positive_rate", self.false_positive_rate),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ModelError::config(name, format!("{field} {p} must lie in [0, 1]")));
            }
        }
        Ok(())
    }

    /// `true` if a request can be accepted during `tick`.
    pub fn is_open(&self, clock: &SimClock, tick: Tick) -> bool {
        (self.opening_secs..self.closing_secs).contains(&clock.seconds_of_day(tick))
    }

    /// The last tick of today's window that starts before closing time,
    /// counted from `tick`.  Upper bound for a ready tick drawn at `tick`;
    /// `tick` itself when the window is already closed.
    pub fn last_open_tick(&self, clock: &SimClock, tick: Tick) -> Tick {
        let remaining = self.closing_secs.saturating_sub(clock.seconds_of_day(tick));
        let ticks = remaining.div_ceil(clock.tick_duration_secs as u64);
        tick + ticks.saturating_sub(1)
    }
}

/// The testing facility.
pub struct Testing {
    config:    TestingConfig,
    predicate: TestPredicate,
    code:      RequesterId,
    caps:      Capabilities,
    completed: u64,
    positives: u64,
}

impl Testing {
    pub const NAME: &'static str = "testing";

    /// Register the test columns and the request channels, and take a
    /// requester code from `registry`.
    pub fn new(
        config:     TestingConfig,
        population: &mut Population,
        registry:   &mut RequesterRegistry,
    ) -> ModelResult<Self> {
        config.validate()?;
        let n = population.len();
        channels::register(population)?;
        population.add_property(columns::TEST_IN_PROCESS, vec![false; n])?;
        population.add_property(columns::TEST_READY, vec![None::<Tick>; n])?;
        population.add_property(columns::TEST_RESULT, vec![false; n])?;
        population.add_property(columns::TEST_RESULTS_AVAILABLE, vec![false; n])?;
        population.add_property(columns::TEST_RESULT_TIME, vec![None::<Tick>; n])?;
        population.add_property(columns::NUM_TESTS, vec![0u32; n])?;
        Ok(Self {
            config,
            predicate: infection_predicate(),
            code: registry.register(Self::NAME),
            caps: Capabilities::default(),
            completed: 0,
            positives: 0,
        })
    }

    /// Replace the default infection predicate.
    pub fn with_predicate(mut self, predicate: TestPredicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn config(&self) -> &TestingConfig {
        &self.config
    }

    pub fn requester_code(&self) -> RequesterId {
        self.code
    }

    /// Tests completed since construction.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn positives(&self) -> u64 {
        self.positives
    }
}

impl Model for Testing {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn setup(&mut self, population: &Population) -> ModelResult<()> {
        self.caps = Capabilities::resolve(
            Self::NAME,
            population,
            &[pathogen_columns::SYMPTOM_LEVEL, channels::ISOLATED],
        );
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Metrics> {
        let t = ctx.tick;
        let n = ctx.population.len();
        let mut in_process = ctx.population.get::<bool>(columns::TEST_IN_PROCESS)?.to_vec();
        let mut ready = ctx.population.get::<Option<Tick>>(columns::TEST_READY)?.to_vec();
        let mut result = ctx.population.get::<bool>(columns::TEST_RESULT)?.to_vec();
        let mut available = ctx.population.get::<bool>(columns::TEST_RESULTS_AVAILABLE)?.to_vec();
        let mut result_time = ctx.population.get::<Option<Tick>>(columns::TEST_RESULT_TIME)?.to_vec();
        let mut num_tests = ctx.population.get::<u32>(columns::NUM_TESTS)?.to_vec();
        let mut requested = ctx.population.get::<bool>(channels::TEST_REQUESTED)?.to_vec();

        // ── Symptom-driven requests ───────────────────────────────────────
        if self.config.test_symptomatic && self.caps.has(pathogen_columns::SYMPTOM_LEVEL) {
            let symptoms = ctx.population.get::<SymptomLevel>(pathogen_columns::SYMPTOM_LEVEL)?;
            let day = ctx.clock.ticks_per_day();
            for i in 0..n {
                let recent = available[i]
                    && (result[i] || result_time[i].is_some_and(|rt| t.since(rt) < day));
                if symptoms[i].is_symptomatic() && !in_process[i] && !recent {
                    requested[i] = true;
                }
            }
        }

        // ── Completion ────────────────────────────────────────────────────
        let mut positives: Vec<AgentId> = Vec::new();
        let mut negatives: Vec<AgentId> = Vec::new();
        for i in 0..n {
            if !in_process[i] || ready[i].is_none_or(|r| t <= r) {
                continue;
            }
            let agent = AgentId(i as u32);
            let truth = (self.predicate)(ctx.population, agent)?;
            let reported = if truth {
                !ctx.rng.gen_bool(self.config.false_negative_rate)
            } else {
                ctx.rng.gen_bool(self.config.false_positive_rate)
            };
            if reported != truth {
                trace!(agent = i, truth, reported, "erroneous test result");
            }
            result[i] = reported;
            available[i] = true;
            in_process[i] = false;
            ready[i] = None;
            result_time[i] = Some(t);
            num_tests[i] += 1;
            if reported { positives.push(agent) } else { negatives.push(agent) }
        }

        // ── Accept requests ───────────────────────────────────────────────
        let mut accepted = 0usize;
        if self.config.is_open(ctx.clock, t) {
            let earliest = t + self.config.duration;
            let latest = self.config.last_open_tick(ctx.clock, t).max(earliest);
            for i in 0..n {
                if !requested[i] {
                    continue;
                }
                requested[i] = false;
                if in_process[i] {
                    continue;
                }
                in_process[i] = true;
                available[i] = false;
                ready[i] = Some(Tick(ctx.rng.gen_range(earliest.0..=latest.0)));
                accepted += 1;
            }
        }
        let pending = requested.iter().filter(|&&r| r).count();

        // ── Write back ────────────────────────────────────────────────────
        let pop = &mut *ctx.population;
        pop.get_mut::<bool>(columns::TEST_IN_PROCESS)?.copy_from_slice(&in_process);
        pop.get_mut::<Option<Tick>>(columns::TEST_READY)?.copy_from_slice(&ready);
        pop.get_mut::<bool>(columns::TEST_RESULT)?.copy_from_slice(&result);
        pop.get_mut::<bool>(columns::TEST_RESULTS_AVAILABLE)?.copy_from_slice(&available);
        pop.get_mut::<Option<Tick>>(columns::TEST_RESULT_TIME)?.copy_from_slice(&result_time);
        pop.get_mut::<u32>(columns::NUM_TESTS)?.copy_from_slice(&num_tests);
        pop.get_mut::<bool>(channels::TEST_REQUESTED)?.copy_from_slice(&requested);

        // ── Result policies ───────────────────────────────────────────────
        if self.config.isolate_positive && !positives.is_empty() {
            channels::request_isolation(pop, &positives, self.code)?;
        }
        if self.config.release_negative && self.caps.has(channels::ISOLATED) {
            let isolated = pop.get::<bool>(channels::ISOLATED)?;
            let release: Vec<AgentId> = negatives.iter().copied().filter(|a| isolated[a.index()]).collect();
            channels::request_leave(pop, &release)?;
        }

        self.completed += (positives.len() + negatives.len()) as u64;
        self.positives += positives.len() as u64;
        let in_flight = in_process.iter().filter(|&&x| x).count();
        debug!(tick = %t, accepted, positives = positives.len(), negatives = negatives.len(), in_flight, pending, "testing step");
        Ok(vec![
            ("accepted", accepted as f64),
            ("positives", positives.len() as f64),
            ("negatives", negatives.len() as f64),
            ("in_process", in_flight as f64),
            ("pending", pending as f64),
        ])
    }
}

/// Agents whose result became available in `(since, now]` and is positive.
pub fn new_positives(population: &Population, since: Option<Tick>, now: Tick) -> PopulationResult<Vec<AgentId>> {
    let result = population.get::<bool>(columns::TEST_RESULT)?;
    let available = population.get::<bool>(columns::TEST_RESULTS_AVAILABLE)?;
    let result_time = population.get::<Option<Tick>>(columns::TEST_RESULT_TIME)?;
    Ok((0..population.len())
        .filter(|&i| result[i] && available[i])
        .filter(|&i| result_time[i].is_some_and(|rt| rt <= now && since.is_none_or(|s| rt > s)))
        .map(|i| AgentId(i as u32))
        .collect())
}
