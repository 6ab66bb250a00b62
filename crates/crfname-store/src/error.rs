use crfname_core::CrfNameError;
use thiserror::Error;

/// Errors raised by the datastore.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No row in the model table carries this name.
    #[error("no stored model named '{0}'")]
    ModelNotFound(String),

    /// The model table has no row flagged active.
    #[error("no active model in the store")]
    NoActiveModel,

    #[error(transparent)]
    Core(#[from] CrfNameError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
