//! Type-erased, name-keyed column storage.
//!
//! # Design
//!
//! Each column is a `Vec<T>` behind a `Box<dyn Column>` in a
//! `HashMap<String, …>`.  The element type is checked on every typed access:
//! asking for `state` as `bool` when it was registered as `InfectionState`
//! is a [`PopulationError::TypeMismatch`], never a silent reinterpretation.

use std::any::{Any, type_name};
use std::collections::HashMap;

use crate::{PopulationError, PopulationResult};

// ── Trait object ──────────────────────────────────────────────────────────────

/// Type-erased interface for a per-agent `Vec<T>`.
///
/// Sealed so that external implementations cannot break the length
/// invariant.
pub trait Column: Send + Sync + 'static + sealed::Sealed {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rust type name of the elements, for diagnostics.
    fn element_type(&self) -> &'static str;

    #[doc(hidden)]
    fn as_any(&self) -> &dyn Any;

    #[doc(hidden)]
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

mod sealed {
    pub trait Sealed {}
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// A `Vec<T>` wrapped so it can be stored as `Box<dyn Column>`.
pub struct TypedColumn<T: Send + Sync + 'static>(pub(crate) Vec<T>);

impl<T: Send + Sync + 'static> sealed::Sealed for TypedColumn<T> {}

impl<T: Send + Sync + 'static> Column for TypedColumn<T> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn element_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ── ColumnMap ─────────────────────────────────────────────────────────────────

/// Registry of named columns.  Length checks are the caller's job
/// ([`Population`](crate::Population) enforces them).
#[derive(Default)]
pub struct ColumnMap {
    map: HashMap<String, Box<dyn Column>>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `values` under `name`.  Fails if the name is taken.
    pub fn insert<T: Send + Sync + 'static>(
        &mut self,
        name: &str,
        values: Vec<T>,
    ) -> PopulationResult<()> {
        if self.map.contains_key(name) {
            return Err(PopulationError::DuplicateColumn(name.to_owned()));
        }
        self.map.insert(name.to_owned(), Box::new(TypedColumn(values)));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// `true` if `name` exists and holds elements of type `T`.
    pub fn contains_typed<T: Send + Sync + 'static>(&self, name: &str) -> bool {
        self.map
            .get(name)
            .is_some_and(|c| c.as_any().is::<TypedColumn<T>>())
    }

    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> PopulationResult<&[T]> {
        let column = self
            .map
            .get(name)
            .ok_or_else(|| PopulationError::MissingColumn(name.to_owned()))?;
        let stored = column.element_type();
        column
            .as_any()
            .downcast_ref::<TypedColumn<T>>()
            .map(|c| c.0.as_slice())
            .ok_or_else(|| mismatch::<T>(name, stored))
    }

    pub fn get_mut<T: Send + Sync + 'static>(&mut self, name: &str) -> PopulationResult<&mut [T]> {
        let column = self
            .map
            .get_mut(name)
            .ok_or_else(|| PopulationError::MissingColumn(name.to_owned()))?;
        downcast_mut::<T>(name, column.as_mut())
    }

    /// Mutable access to two distinct columns at once.
    pub fn get_pair_mut<A, B>(&mut self, a: &str, b: &str) -> PopulationResult<(&mut [A], &mut [B])>
    where
        A: Send + Sync + 'static,
        B: Send + Sync + 'static,
    {
        if a == b {
            return Err(PopulationError::AliasedBorrow(a.to_owned()));
        }
        match self.map.get_disjoint_mut([a, b]) {
            [Some(ca), Some(cb)] => {
                let ca = downcast_mut::<A>(a, ca.as_mut())?;
                let cb = downcast_mut::<B>(b, cb.as_mut())?;
                Ok((ca, cb))
            }
            [None, _] => Err(PopulationError::MissingColumn(a.to_owned())),
            [_, None] => Err(PopulationError::MissingColumn(b.to_owned())),
        }
    }

    /// Registered names, in arbitrary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn downcast_mut<'a, T: Send + Sync + 'static>(
    name: &str,
    column: &'a mut dyn Column,
) -> PopulationResult<&'a mut [T]> {
    let stored = column.element_type();
    column
        .as_any_mut()
        .downcast_mut::<TypedColumn<T>>()
        .map(|c| c.0.as_mut_slice())
        .ok_or_else(|| mismatch::<T>(name, stored))
}

fn mismatch<T>(name: &str, stored: &'static str) -> PopulationError {
    PopulationError::TypeMismatch {
        name:      name.to_owned(),
        stored,
        requested: type_name::<T>(),
    }
}
