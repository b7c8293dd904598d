//! `epi-population` — the shared per-agent column store.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`column`]     | `Column` trait, `TypedColumn<T>`, `ColumnMap`              |
//! | [`population`] | `Population`: N agents × named columns                     |
//! | [`error`]      | `PopulationError`, `PopulationResult<T>`                   |
//!
//! # Sharing model
//!
//! Every model that produces per-agent state installs it as a named column
//! (`add_property`).  Exactly one column exists per name and every reader and
//! writer goes through the registry, so a write by one model is immediately
//! visible to every model stepped after it in the same tick.
//!
//! Columns are allocated once with length N.  Mutable access hands out
//! `&mut [T]`, never the backing `Vec`, so no caller can resize a column.

pub mod column;
pub mod error;
pub mod population;

#[cfg(test)]
mod tests;

pub use column::{Column, ColumnMap, TypedColumn};
pub use error::{PopulationError, PopulationResult};
pub use population::Population;
