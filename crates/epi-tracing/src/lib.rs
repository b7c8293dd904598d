//! `epi-tracing` — finding the contacts of positive agents.
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`manual`] | `ManualTracing`: recall, backlog, call queue, dropout       |
//! | [`app`]    | `AppTracing`: notifications from the detector's ledger      |
//!
//! Both tracers pick up positive results published by the testing model
//! and ask for isolation through `epi_model::channels` under their own
//! requester code.

pub mod app;
pub mod manual;

#[cfg(test)]
mod tests;

pub use app::{AppTracing, AppTracingConfig};
pub use manual::{
    ContactType, MAX_ATTEMPTS, ManualTracing, ManualTracingConfig, PairRecord, REACH_PROBABILITY,
    TracingTotals, recall_probability,
};
