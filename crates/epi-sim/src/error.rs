use epi_core::Tick;
use epi_model::ModelError;
use thiserror::Error;

use crate::PopulationId;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("{0} is not registered with the scheduler")]
    UnknownPopulation(PopulationId),

    #[error("model `{model}` failed at {tick}: {source}")]
    Model {
        model:  &'static str,
        tick:   Tick,
        #[source]
        source: ModelError,
    },
}

pub type SimResult<T> = Result<T, SimError>;
