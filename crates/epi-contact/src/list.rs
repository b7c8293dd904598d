//! `ContactList` — one agent's ledger of peers.

use epi_core::{AgentId, Tick};
use rustc_hash::FxHashMap;

use crate::Contact;

/// Per-agent mapping from peer to [`Contact`].
///
/// A disabled list (the agent does not carry the tracing app) ignores every
/// update, so it stays empty for the whole run.
#[derive(Clone, Debug, Default)]
pub struct ContactList {
    contacts:   FxHashMap<AgentId, Contact>,
    enabled:    bool,
    /// Retention horizon in ticks; peers not seen within it are dropped.
    track_time: Option<u64>,
}

impl ContactList {
    pub fn new(enabled: bool, track_time: Option<u64>) -> Self {
        Self { contacts: FxHashMap::default(), enabled, track_time }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn track_time(&self) -> Option<u64> {
        self.track_time
    }

    /// Record a touch at `t` with every peer in `ids`.
    ///
    /// With `duration` set, each touched peer's runs shorter than it are
    /// dropped, keeping the in-progress one.  Afterwards peers outside the
    /// retention horizon are pruned.
    pub fn update(&mut self, ids: &[AgentId], t: Tick, duration: Option<u64>, use_last: bool) {
        if !self.enabled {
            return;
        }
        for &id in ids {
            let contact = self.contacts.entry(id).or_default();
            contact.add_encounter(t, use_last);
            if let Some(d) = duration {
                contact.select(d, true);
            }
        }
        if let Some(horizon) = self.track_time {
            self.prune(t, horizon);
        }
    }

    /// Drop peers whose last touch is more than `horizon` ticks before `now`.
    pub fn prune(&mut self, now: Tick, horizon: u64) {
        self.contacts
            .retain(|_, c| c.last_seen().is_some_and(|seen| now.since(seen) <= horizon));
    }

    /// Drop peers whose longest run never reached `duration`.
    pub fn enforce_duration(&mut self, duration: u64) {
        self.contacts.retain(|_, c| !c.is_empty() && c.longest() >= duration);
    }

    pub fn get(&self, peer: AgentId) -> Option<&Contact> {
        self.contacts.get(&peer)
    }

    pub fn contains(&self, peer: AgentId) -> bool {
        self.contacts.contains_key(&peer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &Contact)> {
        self.contacts.iter().map(|(&id, c)| (id, c))
    }

    /// Every recorded peer, ascending.
    pub fn peers(&self) -> Vec<AgentId> {
        let mut peers: Vec<AgentId> = self.contacts.keys().copied().collect();
        peers.sort_unstable();
        peers
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
