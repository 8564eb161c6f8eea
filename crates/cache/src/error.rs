/// Crate-wide result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed cache errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The cache backend is unreachable or refused the operation.
    #[error("cache backend unavailable: {message}")]
    Unavailable { message: String },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }
}
