//! Shared error types for the services crate.

use thiserror::Error;

use recall_core::model::SetNameError;
use storage::repository::StorageError;

/// Errors emitted by `GeneratorService`.
///
/// A malformed-but-successful endpoint response is not an error: it
/// normalizes to an empty card list instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerateError {
    #[error("source text cannot be empty")]
    EmptyText,
    #[error("generation endpoint is not configured")]
    Disabled,
    #[error("generation request failed with status {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `SetSaveService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SaveError {
    #[error(transparent)]
    Name(#[from] SetNameError),
    #[error("no authenticated user")]
    Unauthenticated,
    #[error(transparent)]
    Storage(#[from] StorageError),
}
