use thiserror::Error;

/// Reasons a mutation could not be applied locally
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("Workshop not found: {0}")]
    NotFound(String),

    #[error("A workshop with id {0} already exists")]
    DuplicateId(String),
}
