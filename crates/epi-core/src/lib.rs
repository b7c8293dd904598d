//! `epi-core` — foundational types for the epi agent-based epidemic simulator.
//!
//! This crate is a dependency of every other `epi-*` crate.  It has no
//! `epi-*` dependencies and only a handful of external ones (`rand`,
//! `rand_distr`, `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module           | Contents                                              |
//! |------------------|-------------------------------------------------------|
//! | [`ids`]          | `AgentId`, `RegionId`, `RequesterId`                  |
//! | [`geo`]          | `Position`, planar distance                           |
//! | [`time`]         | `Tick`, `SimClock`, `SimConfig`                       |
//! | [`rng`]          | `SimRng`                                              |
//! | [`distribution`] | `Sampler` trait, `DurationDistribution`               |
//! | [`cache`]        | `TickCache`: per-tick memo table                      |
//! | [`error`]        | `EpiError`, `EpiResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to config and value types.  |

pub mod cache;
pub mod distribution;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use cache::{CacheKey, TickCache};
pub use distribution::{DurationDistribution, DurationSampler, Sampler};
pub use error::{EpiError, EpiResult};
pub use geo::Position;
pub use ids::{AgentId, RegionId, RequesterId};
pub use rng::SimRng;
pub use time::{SimClock, SimConfig, Tick};
