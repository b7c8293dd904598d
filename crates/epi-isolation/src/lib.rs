//! `epi-isolation` — who is isolated, on whose request, and since when.
//!
//! # Crate layout
//!
//! | Module        | Contents                                             |
//! |---------------|------------------------------------------------------|
//! | [`registry`]  | `RequesterRegistry`: requester names → codes         |
//! | [`record`]    | `IsolationRecord`, `IsolationEntry`                  |
//! | [`isolation`] | `Isolation` model, `IsolationConfig`                 |
//!
//! Requests arrive through the channels in `epi_model::channels`; any model
//! can write them, only [`Isolation`] serves them.

pub mod isolation;
pub mod record;
pub mod registry;


pub use isolation::{Isolation, IsolationConfig, IsolationTotals, isolated_agents};
pub use record::{IsolationEntry, IsolationRecord};
pub use registry::RequesterRegistry;

/// Names of the columns owned by the isolation model.
pub mod columns {
    /// `IsolationRecord`
    pub const ISOLATION: &str = "isolation";
}
