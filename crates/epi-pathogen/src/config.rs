//! `PathogenConfig` — disease parameters.

use epi_contact::Proximity;
use epi_core::DurationDistribution;
use epi_model::{ModelError, ModelResult};

use crate::Pathogen;

/// Parameters of a [`Pathogen`].  All durations are in ticks.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PathogenConfig {
    /// Transmission radius (inclusive).
    pub radius:                f64,
    pub proximity:             Proximity,
    /// Cumulative ticks of exposure before an infection can be drawn.
    pub exposure_time:         u64,
    /// Probability of infection per tick once `exposure_time` is reached.
    pub infection_probability: f64,
    /// Probability that a new infection is asymptomatic.
    pub asymptomatic_share:    f64,
    /// Relative weights of Mild, Strong and Severe among symptomatic cases.
    pub symptom_weights:       [f64; 3],
    /// Exposed → infectious delay.
    pub incubation:            DurationDistribution,
    /// Infectious → outcome delay.
    pub infection_duration:    DurationDistribution,
    /// Probability that a symptomatic case dies.
    pub death_rate:            f64,
    /// Severe cases that can be treated at once.  `None` means unlimited.
    pub icu_beds:              Option<usize>,
    /// Death rate applied while severe occupancy exceeds `icu_beds`.
    pub icu_death_rate:        f64,
}

impl Default for PathogenConfig {
    fn default() -> Self {
        Self {
            radius:                2.0,
            proximity:             Proximity::Global,
            exposure_time:         2,
            infection_probability: 0.5,
            asymptomatic_share:    0.3,
            symptom_weights:       [0.6, 0.3, 0.1],
            incubation:            DurationDistribution::Normal { mean: 120.0, std_dev: 24.0 },
            infection_duration:    DurationDistribution::Normal { mean: 336.0, std_dev: 48.0 },
            death_rate:            0.02,
            icu_beds:              None,
            icu_death_rate:        0.1,
        }
    }
}

impl PathogenConfig {
    pub fn validate(&self) -> ModelResult<()> {
        let name = Pathogen::NAME;
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ModelError::config(name, format!("radius {} must be finite and > 0", self.radius)));
        }
        for (field, p) in [
            ("infection_probability", self.infection_probability),
            ("asymptomatic_share", self.asymptomatic_share),
            ("death_rate", self.death_rate),
            ("icu_death_rate", self.icu_death_rate),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ModelError::config(name, format!("{field} {p} must lie in [0, 1]")));
            }
        }
        if self.symptom_weights.iter().any(|w| !(w.is_finite() && *w >= 0.0))
            || self.symptom_weights.iter().sum::<f64>() <= 0.0
        {
            return Err(ModelError::config(
                name,
                format!("symptom_weights {:?} must be non-negative with a positive sum", self.symptom_weights),
            ));
        }
        Ok(())
    }
}
