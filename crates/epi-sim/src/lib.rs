//! `epi-sim` — the scheduler of the epidemic simulator.
//!
//! # Tick loop
//!
//! ```text
//! run(steps):
//!   reset tick to 0, invalidate caches, call setup on every model
//!   for tick in 0..steps (unbounded without a budget):
//!     ① set the tick on every population and its cache
//!     ② call step on every model in registration order
//!     ③ yield TickReport with the selected model outputs
//! ```
//!
//! A typical step order is detector → pathogen → testing → tracing →
//! isolation → [`WorldMotion`].  Models read what earlier models wrote in the
//! same tick.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use epi_sim::{NoopObserver, SimBuilder, WorldMotion};
//!
//! let mut sim = SimBuilder::new(config)
//!     .population(population, Some(Box::new(world)))
//!     .model(detector)
//!     .model(pathogen)
//!     .model(WorldMotion)
//!     .build()?;
//! sim.run_observed(Some(24 * 30), &mut NoopObserver)?;
//! sim.finalize()?;
//! ```

pub mod builder;
pub mod error;
pub mod motion;
pub mod observer;
pub mod sim;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use motion::WorldMotion;
pub use observer::{NoopObserver, SimObserver};
pub use sim::{ModelOutput, PopulationId, PopulationSlot, Run, Sim, TickReport};
