/// Crate-wide result type for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed transport errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The platform connection is not established or was lost.
    #[error("transport unavailable: {message}")]
    Unavailable { message: String },

    /// An edit/delete/react referenced a message the platform does not know.
    #[error("unknown message: {channel_id}.{message_id}")]
    UnknownMessage {
        channel_id: String,
        message_id: String,
    },
}

impl Error {
    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unknown_message(channel_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self::UnknownMessage {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        }
    }
}
