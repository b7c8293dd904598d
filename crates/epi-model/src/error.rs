use epi_core::EpiError;
use epi_population::PopulationError;
use epi_world::WorldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{model}: configuration error: {reason}")]
    Config { model: &'static str, reason: String },

    #[error("{model}: requires a {collaborator} but none is attached")]
    MissingCollaborator {
        model:        &'static str,
        collaborator: &'static str,
    },

    #[error(transparent)]
    Population(#[from] PopulationError),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Core(#[from] EpiError),
}

impl ModelError {
    pub fn config(model: &'static str, reason: impl Into<String>) -> Self {
        ModelError::Config { model, reason: reason.into() }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
