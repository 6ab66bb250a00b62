use thiserror::Error;

/// Errors that can occur during crfname core operations.
#[derive(Debug, Error)]
pub enum CrfNameError {
    /// Tokenization produced no tokens to label.
    #[error("input is empty or whitespace-only")]
    EmptyInput,

    /// The labeled training markup is structurally broken.
    #[error("corpus format error at line {line}: {message}")]
    CorpusFormat {
        /// 1-based line of the offending markup.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// No model exists under the requested name or path.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// A decode was attempted without a loaded model.
    #[error("model is not loaded: {0}")]
    ModelNotLoaded(String),

    /// The model blob could not be opened by the backend.
    #[error("failed to load model: {0}")]
    ModelLoadFailed(String),

    /// Memory for a model or instance could not be reserved.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// The tagger failed or returned an unusable label sequence.
    #[error("prediction error: {0}")]
    Prediction(String),

    /// The trainer collaborator failed.
    #[error("training error: {0}")]
    Training(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),
}

/// Coarse error classes used when reporting failures to a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Input,
    Model,
    Prediction,
    Resource,
    Training,
}

impl CrfNameError {
    /// Classifies the error for callers that only care about the failure class.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyInput | Self::CorpusFormat { .. } | Self::InvalidConfig(_) => {
                ErrorCategory::Input
            }
            Self::ModelNotFound(_) | Self::ModelNotLoaded(_) | Self::ModelLoadFailed(_) => {
                ErrorCategory::Model
            }
            Self::Prediction(_) => ErrorCategory::Prediction,
            Self::OutOfMemory(_) | Self::Io(_) => ErrorCategory::Resource,
            Self::Training(_) => ErrorCategory::Training,
            Self::Json(_) | Self::RegexError(_) => ErrorCategory::Input,
        }
    }
}

/// Result type alias for crfname operations.
pub type Result<T> = std::result::Result<T, CrfNameError>;
