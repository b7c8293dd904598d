//! The `Sim` scheduler and its lazy run iterator.

use std::any::Any;
use std::fmt;
use std::ops::Range;

use epi_core::{SimClock, SimConfig, SimRng, Tick, TickCache};
use epi_model::{Metrics, Model, StepContext};
use epi_population::Population;
use epi_world::World;
use tracing::{debug, info};

use crate::{SimError, SimObserver, SimResult};

// ── Populations ───────────────────────────────────────────────────────────────

/// Handle of a population registered with a [`Sim`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PopulationId(pub usize);

impl fmt::Display for PopulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "population #{}", self.0)
    }
}

/// A population together with the state the scheduler keeps for it.
pub struct PopulationSlot {
    pub population: Population,
    pub cache:      TickCache,
    pub world:      Option<Box<dyn World>>,
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// Metrics returned by one model in one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelOutput {
    pub model:   &'static str,
    pub metrics: Metrics,
}

/// Everything the selected models reported for one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub tick:    Tick,
    pub outputs: Vec<ModelOutput>,
}

impl TickReport {
    /// Value of `metric` reported by `model`, if any.
    pub fn metric(&self, model: &str, metric: &str) -> Option<f64> {
        self.outputs
            .iter()
            .filter(|o| o.model == model)
            .flat_map(|o| o.metrics.iter())
            .find(|(name, _)| *name == metric)
            .map(|&(_, v)| v)
    }
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The scheduler.
///
/// Holds the populations and an ordered list of models, each attached to one
/// population.  Every tick it moves each population and its cache to the new
/// tick and calls every model's `step` in registration order.
///
/// Create via [`SimBuilder`][crate::SimBuilder] or [`Sim::new`].
pub struct Sim {
    config:      SimConfig,
    clock:       SimClock,
    rng:         SimRng,
    populations: Vec<PopulationSlot>,
    models:      Vec<(PopulationId, Box<dyn Model>)>,
    selection:   Option<Range<usize>>,
    last_tick:   Option<Tick>,
}

impl Sim {
    pub fn new(config: SimConfig) -> Self {
        Self {
            clock:       config.make_clock(),
            rng:         SimRng::new(config.seed),
            config,
            populations: Vec::new(),
            models:      Vec::new(),
            selection:   None,
            last_tick:   None,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Register a population, optionally with the world that moves it.
    pub fn add_population(&mut self, population: Population, world: Option<Box<dyn World>>) -> PopulationId {
        self.populations.push(PopulationSlot { population, cache: TickCache::new(), world });
        PopulationId(self.populations.len() - 1)
    }

    /// Append `model` to the step order, attached to `population`.
    pub fn add_model<M: Model>(&mut self, population: PopulationId, model: M) -> SimResult<()> {
        self.add_boxed_model(population, Box::new(model))
    }

    pub fn add_boxed_model(&mut self, population: PopulationId, model: Box<dyn Model>) -> SimResult<()> {
        if population.0 >= self.populations.len() {
            return Err(SimError::UnknownPopulation(population));
        }
        self.models.push((population, model));
        Ok(())
    }

    pub fn population(&self, id: PopulationId) -> Option<&Population> {
        self.populations.get(id.0).map(|s| &s.population)
    }

    pub fn population_mut(&mut self, id: PopulationId) -> Option<&mut Population> {
        self.populations.get_mut(id.0).map(|s| &mut s.population)
    }

    pub fn slot(&self, id: PopulationId) -> Option<&PopulationSlot> {
        self.populations.get(id.0)
    }

    /// Model names in step order.
    pub fn model_names(&self) -> Vec<&'static str> {
        self.models.iter().map(|(_, m)| m.name()).collect()
    }

    /// The first registered model of type `T`.
    pub fn model<T: Model>(&self) -> Option<&T> {
        self.models.iter().find_map(|(_, m)| {
            let any: &dyn Any = &**m;
            any.downcast_ref::<T>()
        })
    }

    pub fn model_mut<T: Model>(&mut self) -> Option<&mut T> {
        self.models.iter_mut().find_map(|(_, m)| {
            let any: &mut dyn Any = &mut **m;
            any.downcast_mut::<T>()
        })
    }

    /// Restrict reports to the models at `range` in step order.  Out-of-range
    /// bounds are clamped.
    pub fn select_outputs(&mut self, range: Range<usize>) {
        self.selection = Some(range);
    }

    /// Report every model again.
    pub fn select_all_outputs(&mut self) {
        self.selection = None;
    }

    /// The last tick completed by the most recent run.
    pub fn last_tick(&self) -> Option<Tick> {
        self.last_tick
    }

    /// Start a run of `steps` ticks, or of `config.total_ticks` when `None`.
    /// With neither set the run is unbounded.
    ///
    /// The returned iterator is lazy: nothing happens until it is polled.
    /// The tick counter starts from 0 on every call, and each model's
    /// `setup` runs once before the first tick.  A failed tick is yielded as
    /// an error and ends the iteration.
    pub fn run(&mut self, steps: Option<u64>) -> Run<'_> {
        let remaining = steps.or(self.config.total_ticks);
        Run { sim: self, remaining, started: false, done: false }
    }

    /// Drive a full run, passing every report to `observer`.  Returns the
    /// number of ticks completed.
    pub fn run_observed<O: SimObserver>(&mut self, steps: Option<u64>, observer: &mut O) -> SimResult<u64> {
        observer.on_run_start(&self.config);
        let mut completed = 0;
        let mut run = self.run(steps);
        let outcome = loop {
            match run.next() {
                None => break Ok(completed),
                Some(Ok(report)) => {
                    observer.on_tick(&report);
                    completed += 1;
                }
                Some(Err(e)) => break Err(e),
            }
        };
        observer.on_run_end(self.last_tick);
        outcome
    }

    /// Call every model's `finalize` at the last completed tick.
    pub fn finalize(&mut self) -> SimResult<()> {
        let tick = self.last_tick.unwrap_or(Tick::ZERO);
        for (pid, model) in &mut self.models {
            let slot = &mut self.populations[pid.0];
            let mut ctx = StepContext::new(
                tick,
                &self.clock,
                &mut slot.population,
                &mut slot.cache,
                slot.world.as_deref_mut(),
                &mut self.rng,
            );
            let name = model.name();
            model
                .finalize(&mut ctx)
                .map_err(|source| SimError::Model { model: name, tick, source })?;
        }
        info!(tick = %tick, models = self.models.len(), "simulation finalized");
        Ok(())
    }

    // ── Tick processing ───────────────────────────────────────────────────

    fn start(&mut self) -> SimResult<()> {
        self.clock.reset();
        self.last_tick = None;
        for slot in &mut self.populations {
            slot.cache.invalidate();
        }
        for (pid, model) in &mut self.models {
            let name = model.name();
            model
                .setup(&self.populations[pid.0].population)
                .map_err(|source| SimError::Model { model: name, tick: Tick::ZERO, source })?;
        }
        info!(
            populations = self.populations.len(),
            models = ?self.model_names(),
            seed = self.config.seed,
            "simulation run started"
        );
        Ok(())
    }

    fn step_tick(&mut self, tick: Tick) -> SimResult<TickReport> {
        for slot in &mut self.populations {
            slot.population.set_time(tick);
            slot.cache.set_time(tick);
        }

        let mut outputs = Vec::with_capacity(self.models.len());
        for (pid, model) in &mut self.models {
            let slot = &mut self.populations[pid.0];
            let mut ctx = StepContext::new(
                tick,
                &self.clock,
                &mut slot.population,
                &mut slot.cache,
                slot.world.as_deref_mut(),
                &mut self.rng,
            );
            let name = model.name();
            let metrics = model
                .step(&mut ctx)
                .map_err(|source| SimError::Model { model: name, tick, source })?;
            outputs.push(ModelOutput { model: name, metrics });
        }

        if let Some(range) = &self.selection {
            let end = range.end.min(outputs.len());
            let start = range.start.min(end);
            outputs = outputs.drain(start..end).collect();
        }
        debug!(tick = %tick, outputs = outputs.len(), "tick complete");
        Ok(TickReport { tick, outputs })
    }
}

// ── Run ───────────────────────────────────────────────────────────────────────

/// Lazy per-tick iterator returned by [`Sim::run`].
pub struct Run<'a> {
    sim:       &'a mut Sim,
    remaining: Option<u64>,
    started:   bool,
    done:      bool,
}

impl Run<'_> {
    /// The scheduler being driven, for inspection between ticks.
    pub fn sim(&self) -> &Sim {
        self.sim
    }
}

impl Iterator for Run<'_> {
    type Item = SimResult<TickReport>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.remaining == Some(0) {
            return None;
        }
        if !self.started {
            self.started = true;
            if let Err(e) = self.sim.start() {
                self.done = true;
                return Some(Err(e));
            }
        }

        let tick = self.sim.clock.current_tick;
        match self.sim.step_tick(tick) {
            Ok(report) => {
                self.sim.last_tick = Some(tick);
                self.sim.clock.advance();
                if let Some(n) = self.remaining.as_mut() {
                    *n -= 1;
                }
                Some(Ok(report))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Run<'_> {}
