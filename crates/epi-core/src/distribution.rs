//! Pluggable duration distributions.
//!
//! Models never hard-code a statistical distribution: they hold a
//! [`Sampler`] and ask it for `n` draws at a time.  Draws are in simulated
//! ticks (fractional); [`to_ticks`] rounds them for scheduling.
//!
//! [`DurationDistribution`] is the serializable description used in config
//! files.  It is validated once by [`DurationDistribution::build`], which
//! yields a [`DurationSampler`] that can no longer fail.

use rand::distributions::Uniform;
use rand_distr::{LogNormal, Normal};

use crate::{EpiError, EpiResult, SimRng};

/// Anything that can produce `n` draws from a distribution.
///
/// Implemented by [`DurationSampler`] and by any closure
/// `Fn(usize, &mut SimRng) -> Vec<f64>`.
pub trait Sampler: Send + Sync {
    fn sample(&self, n: usize, rng: &mut SimRng) -> Vec<f64>;

    /// A single draw.  A sampler that returns no value is an error.
    fn sample_one(&self, rng: &mut SimRng) -> EpiResult<f64> {
        self.sample(1, rng)
            .first()
            .copied()
            .ok_or_else(|| EpiError::Distribution("sampler returned no draw".into()))
    }
}

impl<F> Sampler for F
where
    F: Fn(usize, &mut SimRng) -> Vec<f64> + Send + Sync,
{
    fn sample(&self, n: usize, rng: &mut SimRng) -> Vec<f64> {
        self(n, rng)
    }
}

/// Round a fractional tick draw to a whole, non-negative tick count.
/// Draws beyond `u64::MAX` saturate.
#[inline]
pub fn to_ticks(draw: f64) -> u64 {
    if draw.is_finite() && draw > 0.0 {
        draw.round() as u64
    } else {
        0
    }
}

// ── DurationDistribution ──────────────────────────────────────────────────────

/// Declarative description of a duration distribution, in ticks.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum DurationDistribution {
    Constant { value: f64 },
    Normal { mean: f64, std_dev: f64 },
    Uniform { low: f64, high: f64 },
    LogNormal { mu: f64, sigma: f64 },
}

impl DurationDistribution {
    /// Validate the parameters and construct the sampler.
    pub fn build(&self) -> EpiResult<DurationSampler> {
        match *self {
            DurationDistribution::Constant { value } => {
                if !value.is_finite() {
                    return Err(EpiError::Distribution(format!("constant {value} is not finite")));
                }
                Ok(DurationSampler::Constant(value))
            }
            DurationDistribution::Normal { mean, std_dev } => Normal::new(mean, std_dev)
                .map(DurationSampler::Normal)
                .map_err(|e| EpiError::Distribution(format!("normal({mean}, {std_dev}): {e}"))),
            DurationDistribution::Uniform { low, high } => {
                if !(low.is_finite() && high.is_finite() && low <= high) {
                    return Err(EpiError::Distribution(format!(
                        "uniform bounds [{low}, {high}] are not an ordered finite range"
                    )));
                }
                Ok(DurationSampler::Uniform(Uniform::new_inclusive(low, high)))
            }
            DurationDistribution::LogNormal { mu, sigma } => LogNormal::new(mu, sigma)
                .map(DurationSampler::LogNormal)
                .map_err(|e| EpiError::Distribution(format!("lognormal({mu}, {sigma}): {e}"))),
        }
    }
}

// ── DurationSampler ───────────────────────────────────────────────────────────

/// A validated, ready-to-draw distribution.
#[derive(Clone, Debug)]
pub enum DurationSampler {
    Constant(f64),
    Normal(Normal<f64>),
    Uniform(Uniform<f64>),
    LogNormal(LogNormal<f64>),
}

impl Sampler for DurationSampler {
    fn sample(&self, n: usize, rng: &mut SimRng) -> Vec<f64> {
        match self {
            DurationSampler::Constant(v) => vec![*v; n],
            DurationSampler::Normal(d) => (0..n).map(|_| rng.sample(d)).collect(),
            DurationSampler::Uniform(d) => (0..n).map(|_| rng.sample(d)).collect(),
            DurationSampler::LogNormal(d) => (0..n).map(|_| rng.sample(d)).collect(),
        }
    }
}
