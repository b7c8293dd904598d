//! `ManualTracing` — interview-based contact tracing.
//!
//! # Tick order
//!
//! 1. Every observed contact (`contacts_now`) adds one tick to the pair's
//!    cumulative duration and refreshes its last-seen tick.  Pairs unseen
//!    for more than `track_time` are zeroed; the key stays.
//! 2. Once a day, at `processing_secs`, every agent with a positive result
//!    that became available since the previous cycle names partners.  Each
//!    partner is recalled with [`recall_probability`].  Recalled partners
//!    that are not already pending (backlog or queue) or isolated go to the
//!    backlog, and up to `queue_capacity` of the backlog move into the
//!    active queue.  Agents reached in an earlier cycle can be named again.
//! 3. Queue entries that waited `processing_delay` ticks are attempted.  An
//!    attempt reaches the agent with probability `reach_probability`
//!    (default [`REACH_PROBABILITY`]); a miss re-stamps the entry so it waits
//!    the full delay again, and the second miss abandons it.  A reached
//!    agent drops out with probability `dropout`; otherwise isolation (and
//!    optionally a test) is requested.

use std::collections::VecDeque;

use epi_core::{AgentId, RegionId, RequesterId, SimRng, Tick, time::SECS_PER_HOUR};
use epi_contact::columns as contact_columns;
use epi_isolation::RequesterRegistry;
use epi_model::{Capabilities, Metrics, Model, ModelError, ModelResult, StepContext, channels};
use epi_population::Population;
use epi_testing::new_positives;
use epi_world::columns as world_columns;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

/// Default probability that one attempt reaches the contact.
pub const REACH_PROBABILITY: f64 = 0.8;
/// Attempts before a contact is abandoned.
pub const MAX_ATTEMPTS: u32 = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContactType {
    /// Both agents share a home.
    Household,
    Other,
}

/// Chance that a contact is remembered.
///
/// `factor · clamp((duration / track_time) · 2 · (1 − since_seen / track_time))`.
pub fn recall_probability(duration: u64, since_seen: u64, track_time: u64, factor: f64) -> f64 {
    let track = track_time as f64;
    let length = duration as f64 / track;
    let freshness = 1.0 - since_seen as f64 / track;
    factor * (length * 2.0 * freshness).clamp(0.0, 1.0)
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ManualTracingConfig {
    /// Memory horizon in ticks.
    pub track_time:         u64,
    /// Time of day of the daily processing cycle, seconds after midnight.
    pub processing_secs:    u64,
    /// Ticks a queued contact waits before it is called.
    pub processing_delay:   u64,
    /// Contacts moved from backlog to queue per cycle.  `None` is unlimited.
    pub queue_capacity:     Option<usize>,
    /// Probability that one call attempt reaches the contact.
    pub reach_probability:  f64,
    /// Probability that a reached contact refuses to cooperate.
    pub dropout:            f64,
    pub household_recall:   f64,
    pub other_recall:       f64,
    /// Also request a test for every cooperating contact.
    pub request_test:       bool,
}

impl Default for ManualTracingConfig {
    fn default() -> Self {
        Self {
            track_time:         14 * 24,
            processing_secs:    16 * SECS_PER_HOUR,
            processing_delay:   4,
            queue_capacity:     None,
            reach_probability:  REACH_PROBABILITY,
            dropout:            0.0,
            household_recall:   1.0,
            other_recall:       0.5,
            request_test:       false,
        }
    }
}

impl ManualTracingConfig {
    pub fn validate(&self) -> ModelResult<()> {
        let name = ManualTracing::NAME;
        if self.track_time == 0 {
            return Err(ModelError::config(name, "track_time must be > 0"));
        }
        for (field, p) in [
            ("reach_probability", self.reach_probability),
            ("dropout", self.dropout),
            ("household_recall", self.household_recall),
            ("other_recall", self.other_recall),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ModelError::config(name, format!("{field} {p} must lie in [0, 1]")));
            }
        }
        Ok(())
    }

    fn recall_factor(&self, kind: ContactType) -> f64 {
        match kind {
            ContactType::Household => self.household_recall,
            ContactType::Other => self.other_recall,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PairRecord {
    pub duration:  u64,
    pub last_seen: Tick,
}

#[derive(Copy, Clone, Debug)]
struct QueueEntry {
    agent:    AgentId,
    stamped:  Tick,
    attempts: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TracingTotals {
    pub named:     u64,
    pub reached:   u64,
    pub dropouts:  u64,
    pub abandoned: u64,
}

pub struct ManualTracing {
    config:         ManualTracingConfig,
    code:           RequesterId,
    caps:           Capabilities,
    pairs:          FxHashMap<(AgentId, AgentId), PairRecord>,
    backlog:        VecDeque<AgentId>,
    queue:          Vec<QueueEntry>,
    /// Agents in the backlog or the queue.
    pending:        FxHashSet<AgentId>,
    contacted:      FxHashSet<AgentId>,
    last_processed: Option<Tick>,
    totals:         TracingTotals,
}

impl ManualTracing {
    pub const NAME: &'static str = "manual_tracing";

    pub fn new(
        config:     ManualTracingConfig,
        population: &mut Population,
        registry:   &mut RequesterRegistry,
    ) -> ModelResult<Self> {
        config.validate()?;
        channels::register(population)?;
        Ok(Self {
            config,
            code: registry.register(Self::NAME),
            caps: Capabilities::default(),
            pairs: FxHashMap::default(),
            backlog: VecDeque::new(),
            queue: Vec::new(),
            pending: FxHashSet::default(),
            contacted: FxHashSet::default(),
            last_processed: None,
            totals: TracingTotals::default(),
        })
    }

    pub fn config(&self) -> &ManualTracingConfig {
        &self.config
    }

    pub fn requester_code(&self) -> RequesterId {
        self.code
    }

    pub fn totals(&self) -> TracingTotals {
        self.totals
    }

    /// Accumulated record of the unordered pair `{a, b}`.
    pub fn pair(&self, a: AgentId, b: AgentId) -> Option<PairRecord> {
        self.pairs.get(&ordered(a, b)).copied()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Agents waiting in the backlog or the queue.
    pub fn is_pending(&self, agent: AgentId) -> bool {
        self.pending.contains(&agent)
    }

    /// Agents reached by a tracer at least once.
    pub fn is_contacted(&self, agent: AgentId) -> bool {
        self.contacted.contains(&agent)
    }

    fn observe(&mut self, contacts_now: &[Vec<AgentId>], t: Tick) {
        for (i, peers) in contacts_now.iter().enumerate() {
            let a = AgentId(i as u32);
            for &b in peers.iter().filter(|&&b| b > a) {
                let record = self
                    .pairs
                    .entry((a, b))
                    .or_insert(PairRecord { duration: 0, last_seen: t });
                record.duration += 1;
                record.last_seen = t;
            }
        }
        let horizon = self.config.track_time;
        self.pairs
            .values_mut()
            .filter(|r| t.since(r.last_seen) > horizon)
            .for_each(|r| r.duration = 0);
    }

    /// Recalled partners of `index`, sorted.
    fn recall(
        &self,
        index:  AgentId,
        homes:  Option<&[RegionId]>,
        t:      Tick,
        rng:    &mut SimRng,
    ) -> Vec<AgentId> {
        let mut partners: Vec<(AgentId, PairRecord)> = self
            .pairs
            .iter()
            .filter(|(_, r)| r.duration > 0)
            .filter_map(|(&(a, b), &r)| match (a == index, b == index) {
                (true, _) => Some((b, r)),
                (_, true) => Some((a, r)),
                _ => None,
            })
            .collect();
        partners.sort_unstable_by_key(|&(p, _)| p);

        partners
            .into_iter()
            .filter(|&(partner, record)| {
                let kind = match homes {
                    Some(h) if h[index.index()] == h[partner.index()] => ContactType::Household,
                    _ => ContactType::Other,
                };
                let p = recall_probability(
                    record.duration,
                    t.since(record.last_seen),
                    self.config.track_time,
                    self.config.recall_factor(kind),
                );
                rng.gen_bool(p)
            })
            .map(|(partner, _)| partner)
            .collect()
    }
}

fn ordered(a: AgentId, b: AgentId) -> (AgentId, AgentId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl Model for ManualTracing {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn setup(&mut self, population: &Population) -> ModelResult<()> {
        self.caps = Capabilities::resolve(Self::NAME, population, &[world_columns::HOME, channels::ISOLATED]);
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Metrics> {
        let t = ctx.tick;

        // ── Observation ───────────────────────────────────────────────────
        let contacts_now = ctx.population.get::<Vec<AgentId>>(contact_columns::CONTACTS_NOW)?;
        self.observe(contacts_now, t);

        // ── Daily cycle ───────────────────────────────────────────────────
        let mut named = 0usize;
        if ctx.clock.contains_time_of_day(t, self.config.processing_secs) {
            let positives = new_positives(ctx.population, self.last_processed, t)?;
            self.last_processed = Some(t);

            let homes = self
                .caps
                .has(world_columns::HOME)
                .then(|| ctx.population.get::<RegionId>(world_columns::HOME))
                .transpose()?;
            let isolated = self
                .caps
                .has(channels::ISOLATED)
                .then(|| ctx.population.get::<bool>(channels::ISOLATED))
                .transpose()?;

            for &index in &positives {
                for partner in self.recall(index, homes, t, ctx.rng) {
                    let busy = self.pending.contains(&partner)
                        || isolated.is_some_and(|iso| iso[partner.index()]);
                    if !busy {
                        self.pending.insert(partner);
                        self.backlog.push_back(partner);
                        named += 1;
                    }
                }
            }

            let take = self.config.queue_capacity.unwrap_or(usize::MAX).min(self.backlog.len());
            self.queue
                .extend(self.backlog.drain(..take).map(|agent| QueueEntry { agent, stamped: t, attempts: 0 }));
            debug!(tick = %t, positives = positives.len(), named, backlog = self.backlog.len(), queue = self.queue.len(), "tracing cycle");
        }

        // ── Calls ─────────────────────────────────────────────────────────
        let mut cooperating: Vec<AgentId> = Vec::new();
        let mut reached = 0usize;
        let mut abandoned = 0usize;
        let mut dropouts = 0usize;
        let delay = self.config.processing_delay;
        let mut waiting = Vec::with_capacity(self.queue.len());
        for mut entry in self.queue.drain(..) {
            if t.since(entry.stamped) < delay {
                waiting.push(entry);
                continue;
            }
            if !ctx.rng.gen_bool(self.config.reach_probability) {
                entry.attempts += 1;
                if entry.attempts >= MAX_ATTEMPTS {
                    trace!(agent = %entry.agent, "contact abandoned after failed attempts");
                    self.pending.remove(&entry.agent);
                    abandoned += 1;
                } else {
                    entry.stamped = t;
                    waiting.push(entry);
                }
                continue;
            }
            reached += 1;
            self.pending.remove(&entry.agent);
            self.contacted.insert(entry.agent);
            if ctx.rng.gen_bool(self.config.dropout) {
                trace!(agent = %entry.agent, "contact refused to cooperate");
                dropouts += 1;
            } else {
                cooperating.push(entry.agent);
            }
        }
        self.queue = waiting;

        if !cooperating.is_empty() {
            channels::request_isolation(ctx.population, &cooperating, self.code)?;
            if self.config.request_test {
                channels::request_test(ctx.population, &cooperating)?;
            }
        }

        self.totals.named += named as u64;
        self.totals.reached += reached as u64;
        self.totals.dropouts += dropouts as u64;
        self.totals.abandoned += abandoned as u64;
        Ok(vec![
            ("named", named as f64),
            ("reached", reached as f64),
            ("abandoned", abandoned as f64),
            ("backlog", self.backlog.len() as f64),
            ("queue", self.queue.len() as f64),
        ])
    }
}
