//! `AppTracing` — notifies ledger peers of newly positive agents.

use epi_contact::{ContactList, columns as contact_columns};
use epi_core::{AgentId, RequesterId, Tick};
use epi_isolation::RequesterRegistry;
use epi_model::{Metrics, Model, ModelResult, StepContext, channels};
use epi_population::Population;
use epi_testing::new_positives;
use tracing::debug;

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AppTracingConfig {
    /// Shortest encounter run, in ticks, that triggers a notification.
    pub min_duration: u64,
    /// Peers last seen longer ago than this are not notified.
    pub track_time:   u64,
    /// Also request a test for every notified peer.
    pub request_test: bool,
}

impl Default for AppTracingConfig {
    fn default() -> Self {
        Self { min_duration: 1, track_time: 14 * 24, request_test: false }
    }
}

pub struct AppTracing {
    config:       AppTracingConfig,
    code:         RequesterId,
    last_checked: Option<Tick>,
    notified:     u64,
}

impl AppTracing {
    pub const NAME: &'static str = "app_tracing";

    pub fn new(
        config:     AppTracingConfig,
        population: &mut Population,
        registry:   &mut RequesterRegistry,
    ) -> ModelResult<Self> {
        channels::register(population)?;
        Ok(Self { config, code: registry.register(Self::NAME), last_checked: None, notified: 0 })
    }

    pub fn requester_code(&self) -> RequesterId {
        self.code
    }

    /// Notifications sent since construction.
    pub fn notified(&self) -> u64 {
        self.notified
    }

    /// Peers of `list` that qualify for a notification at `now`, sorted.
    pub fn qualifying_peers(&self, list: &ContactList, now: Tick) -> Vec<AgentId> {
        let mut peers: Vec<AgentId> = list
            .iter()
            .filter(|(_, c)| c.longest() >= self.config.min_duration)
            .filter(|(_, c)| c.last_seen().is_some_and(|seen| now.since(seen) <= self.config.track_time))
            .map(|(peer, _)| peer)
            .collect();
        peers.sort_unstable();
        peers
    }
}

impl Model for AppTracing {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Metrics> {
        let t = ctx.tick;
        let positives = new_positives(ctx.population, self.last_checked, t)?;
        self.last_checked = Some(t);

        let ledgers = ctx.population.get::<ContactList>(contact_columns::CONTACTS)?;
        let mut targets: Vec<AgentId> = positives
            .iter()
            .map(|p| &ledgers[p.index()])
            .filter(|list| list.is_enabled())
            .flat_map(|list| self.qualifying_peers(list, t))
            .collect();
        targets.sort_unstable();
        targets.dedup();

        let fresh = channels::request_isolation(ctx.population, &targets, self.code)?;
        if self.config.request_test {
            channels::request_test(ctx.population, &targets)?;
        }
        self.notified += targets.len() as u64;
        if !targets.is_empty() {
            debug!(tick = %t, positives = positives.len(), notified = targets.len(), fresh, "app notifications");
        }
        Ok(vec![("notified", targets.len() as f64), ("new_requests", fresh as f64)])
    }
}
