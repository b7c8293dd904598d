//! `Population` — N agents, any number of named columns.

use epi_core::{AgentId, Tick};

use crate::{ColumnMap, PopulationError, PopulationResult};

/// Structure-of-Arrays storage for all agent state.
///
/// Every column has exactly `count` elements; the `AgentId` value is the
/// index into all of them:
///
/// ```rust
/// use epi_population::Population;
///
/// let mut pop = Population::new(3);
/// pop.add_property("age", vec![31u8, 45, 8]).unwrap();
/// pop.get_mut::<u8>("age").unwrap()[2] += 1;
/// assert_eq!(pop.get::<u8>("age").unwrap(), &[31, 45, 9]);
/// ```
pub struct Population {
    /// Number of agents.  Equals the length of every column.
    count: usize,

    /// Tick most recently propagated by the scheduler.
    time: Tick,

    columns: ColumnMap,
}

impl Population {
    /// An empty table for `count` agents.
    pub fn new(count: usize) -> Self {
        Self {
            count,
            time: Tick::ZERO,
            columns: ColumnMap::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterator over all `AgentId`s in ascending index order.
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + use<> {
        (0..self.count as u32).map(AgentId)
    }

    // ── Time ──────────────────────────────────────────────────────────────

    #[inline]
    pub fn time(&self) -> Tick {
        self.time
    }

    /// Called by the scheduler before any model steps.
    pub fn set_time(&mut self, now: Tick) {
        self.time = now;
    }

    // ── Column registration ───────────────────────────────────────────────

    /// Install a new shared column.  `initial` must hold exactly one value
    /// per agent; the name must not already exist.
    pub fn add_property<T: Send + Sync + 'static>(
        &mut self,
        name: &str,
        initial: Vec<T>,
    ) -> PopulationResult<()> {
        if initial.len() != self.count {
            return Err(PopulationError::LengthMismatch {
                name:     name.to_owned(),
                expected: self.count,
                got:      initial.len(),
            });
        }
        self.columns.insert(name, initial)
    }

    /// Install `name` filled with `value` unless it already exists.
    ///
    /// Used for channels written by several models (request flags): the
    /// first model to be constructed creates the column, the others share
    /// it.  An existing column of another element type is an error.
    pub fn ensure_property<T: Clone + Send + Sync + 'static>(
        &mut self,
        name: &str,
        value: T,
    ) -> PopulationResult<()> {
        if self.columns.contains(name) {
            // Surfaces TypeMismatch for a clashing element type.
            self.columns.get::<T>(name)?;
            return Ok(());
        }
        self.columns.insert(name, vec![value; self.count])
    }

    // ── Column access ─────────────────────────────────────────────────────

    /// `true` if a column called `name` exists (of any type).
    pub fn has_property(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// `true` if `name` exists with element type `T`.
    pub fn has_typed_property<T: Send + Sync + 'static>(&self, name: &str) -> bool {
        self.columns.contains_typed::<T>(name)
    }

    /// Read-only view of column `name`.
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> PopulationResult<&[T]> {
        self.columns.get::<T>(name)
    }

    /// Mutable view of column `name`.  The slice cannot be resized.
    pub fn get_mut<T: Send + Sync + 'static>(&mut self, name: &str) -> PopulationResult<&mut [T]> {
        self.columns.get_mut::<T>(name)
    }

    /// Mutable views of two distinct columns.
    pub fn get_pair_mut<A, B>(&mut self, a: &str, b: &str) -> PopulationResult<(&mut [A], &mut [B])>
    where
        A: Send + Sync + 'static,
        B: Send + Sync + 'static,
    {
        self.columns.get_pair_mut::<A, B>(a, b)
    }

    /// Names of every registered column, sorted.
    pub fn properties(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.columns.names().collect();
        names.sort_unstable();
        names
    }
}
