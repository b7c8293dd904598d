use epi_core::RegionId;
use epi_population::PopulationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("region {0} does not exist")]
    UnknownRegion(RegionId),

    #[error("movement mask has length {got}, population has {expected} agents")]
    MaskLength { expected: usize, got: usize },

    #[error("world configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Population(#[from] PopulationError),
}

pub type WorldResult<T> = Result<T, WorldError>;
