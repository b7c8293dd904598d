//! Per-agent isolation bookkeeping.

use epi_core::{RequesterId, Tick};

/// One isolation episode.  `end` is `None` while the episode is open.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IsolationEntry {
    pub requester: RequesterId,
    pub start:     Tick,
    pub end:       Option<Tick>,
}

/// Isolation history of one agent.  The current flag lives in the
/// `isolated` channel column; this record is append-only.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IsolationRecord {
    /// Requester of the current or last isolation.
    pub isolated_by:       RequesterId,
    /// Start of the current or last isolation.
    pub isolation_time:    Option<Tick>,
    /// Ticks spent in completed isolations.
    pub time_in_isolation: u64,
    pub num_isolations:    u32,
    /// Isolations that began while the agent was not infectious.
    pub false_positives:   u32,
    pub history:           Vec<IsolationEntry>,
}

impl IsolationRecord {
    pub(crate) fn open(&mut self, requester: RequesterId, now: Tick, false_positive: bool) {
        self.isolated_by = requester;
        self.isolation_time = Some(now);
        self.num_isolations += 1;
        self.false_positives += u32::from(false_positive);
        self.history.push(IsolationEntry { requester, start: now, end: None });
    }

    pub(crate) fn close(&mut self, now: Tick) {
        if let Some(entry) = self.history.last_mut().filter(|e| e.end.is_none()) {
            entry.end = Some(now);
            self.time_in_isolation += now.since(entry.start);
        }
    }

    /// The open episode, if any.
    pub fn current(&self) -> Option<&IsolationEntry> {
        self.history.last().filter(|e| e.end.is_none())
    }

    /// Completed isolation time plus the running episode up to `now`.
    pub fn total_time(&self, now: Tick) -> u64 {
        self.time_in_isolation + self.current().map_or(0, |e| now.since(e.start))
    }
}
