//! `epi-pathogen` — the epidemic state machine.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`state`]  | `InfectionState`, `SymptomLevel`, `Outcome`                |
//! | [`config`] | `PathogenConfig`                                           |
//! | [`engine`] | `Pathogen` model, `AsymptomaticShare`, seeding             |
//!
//! [`r`] and [`r_current`] read the transmission counters straight from
//! the population, so any model or observer can report them.

pub mod config;
pub mod engine;
pub mod state;

#[cfg(test)]
mod tests;

pub use config::PathogenConfig;
pub use engine::{AsymptomaticShare, Pathogen};
pub use state::{InfectionState, Outcome, SymptomLevel};

use epi_population::{Population, PopulationResult};

/// Names of the columns owned by the pathogen.
pub mod columns {
    /// `InfectionState`
    pub const STATE: &str = "state";
    /// `SymptomLevel`
    pub const SYMPTOM_LEVEL: &str = "symptom_level";
    /// `Option<Tick>`: start of the current or last infection.
    pub const TIME_OF_INFECTION: &str = "time_of_infection";
    /// `Option<Tick>`: planned next state change.
    pub const DURATION_INFECTION: &str = "duration_infection";
    /// `f64`: transmissions credited to the agent.
    pub const PARTICLES_INFECTED: &str = "particles_infected";
    /// `u64`: cumulative ticks spent near a transmitter while susceptible.
    pub const EXPOSURE: &str = "exposure";
}

/// Mean transmissions per agent that transmitted at least once.
pub fn r(population: &Population) -> PopulationResult<f64> {
    let particles = population.get::<f64>(columns::PARTICLES_INFECTED)?;
    Ok(mean_positive(particles.iter().copied()))
}

/// Like [`r`], restricted to agents that are transmitting right now.
pub fn r_current(population: &Population) -> PopulationResult<f64> {
    let particles = population.get::<f64>(columns::PARTICLES_INFECTED)?;
    let states = population.get::<InfectionState>(columns::STATE)?;
    Ok(mean_positive(
        particles
            .iter()
            .zip(states)
            .filter(|(_, s)| s.is_transmitting())
            .map(|(p, _)| *p),
    ))
}

fn mean_positive(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|p| *p > 0.0)
        .fold((0.0, 0usize), |(sum, count), p| (sum + p, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
