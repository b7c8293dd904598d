//! `ContactDetector` — proximity contacts with app-style observation noise.

use epi_core::{AgentId, SimRng};
use epi_model::{Metrics, Model, ModelError, ModelResult, StepContext};
use epi_population::Population;
use tracing::{debug, info};

use crate::{ContactList, Proximity, columns, neighbours_within, pairs_in_annulus};

/// Configuration of a [`ContactDetector`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectorConfig {
    /// Contact radius in world units (inclusive).
    pub radius:          f64,
    pub proximity:       Proximity,
    /// Probability that a pair in the false-positive annulus is reported.
    pub false_positives: f64,
    /// Annulus width: pairs in `(radius, radius·(1 + fp_radius²))`.
    pub fp_radius:       f64,
    /// Probability that a detected peer is missed, per subject.
    pub false_negatives: f64,
    /// Fraction of agents whose ledger is enabled.
    pub coverage:        f64,
    /// Minimum run length kept in the ledgers, in ticks.
    pub duration:        Option<u64>,
    /// Overwrite the oldest run instead of growing the run list.
    pub use_last:        bool,
    /// Ledger retention horizon in ticks.
    pub track_time:      Option<u64>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            radius:          2.0,
            proximity:       Proximity::Global,
            false_positives: 0.0,
            fp_radius:       0.0,
            false_negatives: 0.0,
            coverage:        1.0,
            duration:        None,
            use_last:        false,
            track_time:      None,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> ModelResult<()> {
        let name = ContactDetector::NAME;
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ModelError::config(name, format!("radius {} must be finite and > 0", self.radius)));
        }
        if !(self.fp_radius.is_finite() && self.fp_radius >= 0.0) {
            return Err(ModelError::config(name, format!("fp_radius {} must be finite and >= 0", self.fp_radius)));
        }
        for (field, p) in [
            ("false_positives", self.false_positives),
            ("false_negatives", self.false_negatives),
            ("coverage", self.coverage),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ModelError::config(name, format!("{field} {p} must lie in [0, 1]")));
            }
        }
        Ok(())
    }
}

/// Detects contacts every tick and feeds the per-agent ledgers.
///
/// Owns two columns:
///
/// - [`columns::CONTACTS_NOW`]: this tick's exact neighbour lists.  Read by
///   the pathogen and by manual tracing, which model physical proximity.
/// - [`columns::CONTACTS`]: the noisy [`ContactList`] ledgers, as recorded
///   by a tracing app on the covered agents.
pub struct ContactDetector {
    config: DetectorConfig,
}

impl ContactDetector {
    pub const NAME: &'static str = "contact_detector";

    /// Validate `config`, pick the covered agents and register both columns.
    pub fn new(config: DetectorConfig, population: &mut Population, rng: &mut SimRng) -> ModelResult<Self> {
        config.validate()?;
        let n = population.len();
        let covered = (config.coverage * n as f64).round() as usize;
        let mut enabled = vec![false; n];
        for i in rng.sample_indices(n, covered) {
            enabled[i] = true;
        }
        let ledgers: Vec<ContactList> = enabled
            .iter()
            .map(|&on| ContactList::new(on, config.track_time))
            .collect();
        population.add_property(columns::CONTACTS, ledgers)?;
        population.add_property(columns::CONTACTS_NOW, vec![Vec::<AgentId>::new(); n])?;
        debug!(agents = n, covered, "contact detector registered");
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

impl Model for ContactDetector {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Metrics> {
        let cfg = &self.config;
        let truth = neighbours_within(ctx.population, ctx.cache, cfg.radius, cfg.proximity)?;
        let mut observed = truth.clone();

        if cfg.false_positives > 0.0 && cfg.fp_radius > 0.0 {
            let outer = cfg.radius * (1.0 + cfg.fp_radius * cfg.fp_radius);
            for (a, b) in pairs_in_annulus(ctx.population, ctx.cache, cfg.radius, outer, cfg.proximity)? {
                if ctx.rng.gen_bool(cfg.false_positives) {
                    observed[a.index()].push(b);
                    observed[b.index()].push(a);
                }
            }
        }
        if cfg.false_negatives > 0.0 {
            for list in &mut observed {
                list.retain(|_| !ctx.rng.gen_bool(cfg.false_negatives));
            }
        }
        if cfg.proximity == Proximity::Regional {
            mirror(&mut observed);
        }

        let true_edges = truth.iter().map(Vec::len).sum::<usize>() / 2;
        let observed_links = observed.iter().map(Vec::len).sum::<usize>();

        let now = ctx.population.get_mut::<Vec<AgentId>>(columns::CONTACTS_NOW)?;
        for (slot, list) in now.iter_mut().zip(truth) {
            *slot = list;
        }

        let ledgers = ctx.population.get_mut::<ContactList>(columns::CONTACTS)?;
        for (ledger, ids) in ledgers.iter_mut().zip(&observed) {
            ledger.update(ids, ctx.tick, cfg.duration, cfg.use_last);
        }
        let ledger_entries = ledgers.iter().map(ContactList::len).sum::<usize>();

        debug!(tick = %ctx.tick, true_edges, observed_links, ledger_entries, "contacts detected");
        Ok(vec![
            ("contacts", true_edges as f64),
            ("observed", observed_links as f64),
            ("ledger_entries", ledger_entries as f64),
        ])
    }

    fn finalize(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<()> {
        let Some(duration) = self.config.duration else {
            return Ok(());
        };
        let ledgers = ctx.population.get_mut::<ContactList>(columns::CONTACTS)?;
        let before = ledgers.iter().map(ContactList::len).sum::<usize>();
        ledgers.iter_mut().for_each(|l| l.enforce_duration(duration));
        let after = ledgers.iter().map(ContactList::len).sum::<usize>();
        info!(duration, dropped = before - after, "enforced minimum contact duration");
        Ok(())
    }
}

/// Make every directed observation symmetric: `b ∈ lists[a]` implies
/// `a ∈ lists[b]`.
pub(crate) fn mirror(lists: &mut [Vec<AgentId>]) {
    let edges: Vec<(AgentId, AgentId)> = lists
        .iter()
        .enumerate()
        .flat_map(|(a, peers)| peers.iter().map(move |&b| (AgentId(a as u32), b)))
        .collect();
    for (a, b) in edges {
        lists[b.index()].push(a);
    }
    for peers in lists.iter_mut() {
        peers.sort_unstable();
        peers.dedup();
    }
}
