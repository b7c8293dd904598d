//! `Contact` — the encounter history of one agent with one peer.
//!
//! Encounters are stored as closed `[start, end]` tick intervals.  The
//! length of a run is `end - start`, so a single touch has length 0 and
//! touches at 0, 1, 2, 3 form a run of length 3.

use epi_core::Tick;

/// Encounter runs with a single peer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Contact {
    /// Closed intervals in ascending time order.
    intervals: Vec<(Tick, Tick)>,
    /// Start of the most recent run.
    latest:    Option<Tick>,
    /// Length of the most recent (possibly still running) run.
    current:   u64,
    /// Longest run seen.
    longest:   u64,
}

impl Contact {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a touch at `t`.
    ///
    /// A touch within one tick of the trailing interval's end extends it.
    /// Otherwise a new interval is started; with `use_last` the oldest
    /// interval is dropped to make room, bounding memory for peers that are
    /// met only occasionally.
    pub fn add_encounter(&mut self, t: Tick, use_last: bool) {
        if let Some((start, end)) = self.intervals.last_mut() {
            if t.0 <= end.0 + 1 {
                if t > *end {
                    *end = t;
                }
                self.current = *end - *start;
                self.longest = self.longest.max(self.current);
                self.latest = Some(*start);
                return;
            }
        }

        if use_last && !self.intervals.is_empty() {
            self.intervals.remove(0);
        }
        self.intervals.push((t, t));
        self.current = 0;
        self.latest = Some(t);
    }

    /// Drop every interval shorter than `duration`, except the most recent
    /// one when `keep_last` is set.  If nothing survives, the contact is
    /// reset to "no contact".
    pub fn select(&mut self, duration: u64, keep_last: bool) {
        let last = self.intervals.len().checked_sub(1);
        let mut i = 0;
        self.intervals.retain(|&(s, e)| {
            let keep = e - s >= duration || (keep_last && Some(i) == last);
            i += 1;
            keep
        });

        match self.intervals.last() {
            None => {
                self.latest = None;
                self.current = 0;
                self.longest = 0;
            }
            Some(&(s, e)) => {
                self.latest = Some(s);
                self.current = e - s;
                self.longest = self.intervals.iter().map(|&(s, e)| e - s).max().unwrap_or(0);
            }
        }
    }

    pub fn intervals(&self) -> &[(Tick, Tick)] {
        &self.intervals
    }

    /// Start of the most recent run, `None` if there is no contact.
    pub fn latest(&self) -> Option<Tick> {
        self.latest
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn longest(&self) -> u64 {
        self.longest
    }

    /// End of the most recent run.
    pub fn last_seen(&self) -> Option<Tick> {
        self.intervals.last().map(|&(_, e)| e)
    }

    /// Sum of all stored run lengths.
    pub fn total_duration(&self) -> u64 {
        self.intervals.iter().map(|&(s, e)| e - s).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}
