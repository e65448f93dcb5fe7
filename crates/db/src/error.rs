use kioskwatch_core::error::CoreError;

/// Failure of a repository operation that can end in a domain outcome as
/// well as a database fault.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}
