/// Crate-wide result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed document-store errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A document id was inserted twice into the same collection.
    #[error("duplicate document id: {id}")]
    DuplicateId { id: String },

    /// An update referenced a document that does not exist.
    #[error("unknown document: {id}")]
    UnknownDocument { id: String },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    #[must_use]
    pub fn unknown_document(id: impl Into<String>) -> Self {
        Self::UnknownDocument { id: id.into() }
    }
}
