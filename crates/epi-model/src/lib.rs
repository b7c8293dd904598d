//! `epi-model` — the extension point every simulation component implements.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                  |
//! |------------------|-----------------------------------------------------------|
//! | [`model`]        | `Model` trait, `Metrics`                                  |
//! | [`context`]      | `StepContext<'a>`: everything a model may touch in a tick |
//! | [`capabilities`] | `Capabilities`: optional columns resolved once at setup   |
//! | [`channels`]     | isolation, leave and test request columns                 |
//! | [`error`]        | `ModelError`, `ModelResult<T>`                            |
//!
//! # Step contract
//!
//! The scheduler calls `step` on every model once per tick, in registration
//! order.  A model observes whatever earlier models wrote in the same tick,
//! so registration order is part of the simulation's semantics: contact
//! detection before the pathogen, the pathogen before testing, tracing and
//! isolation.

pub mod capabilities;
pub mod channels;
pub mod context;
pub mod error;
pub mod model;

#[cfg(test)]
mod tests;

pub use capabilities::Capabilities;
pub use context::StepContext;
pub use error::{ModelError, ModelResult};
pub use model::{Metrics, Model};
