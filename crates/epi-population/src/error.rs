use thiserror::Error;

/// Errors produced by the column store.  All of them indicate a programming
/// error in how models were wired together; none is retryable.
#[derive(Debug, Error, PartialEq)]
pub enum PopulationError {
    #[error("population has no column named `{0}`")]
    MissingColumn(String),

    #[error("column `{name}` holds `{stored}`, not `{requested}`")]
    TypeMismatch {
        name:      String,
        stored:    &'static str,
        requested: &'static str,
    },

    #[error("column `{name}` has length {got}, population has {expected} agents")]
    LengthMismatch {
        name:     String,
        expected: usize,
        got:      usize,
    },

    #[error("column `{0}` is already registered")]
    DuplicateColumn(String),

    #[error("cannot borrow column `{0}` mutably twice")]
    AliasedBorrow(String),
}

pub type PopulationResult<T> = Result<T, PopulationError>;
