//! Pipeline error taxonomy.
//!
//! Three kinds of failure flow through an invocation:
//! - [`MiddlewareError`] — expected, recoverable control-flow signals raised
//!   by middleware. Recorded on the response (first one wins) without
//!   aborting sibling middleware.
//! - Domain validation errors — raised by command logic; the message is
//!   shown to the user verbatim.
//! - Unexpected errors — everything else. Assigned a short correlation code,
//!   logged in full, and reported to the user only as a generic message
//!   embedding the code.

use rand::{Rng, distr::Alphanumeric};

/// Recoverable control-flow signal raised by a middleware.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MiddlewareError {
    /// The invocation was rate-limited.
    #[error("throttled")]
    Throttle {
        /// Whether the user receives a one-time notice.
        show_user: bool,
    },

    /// Parameter binding failed validation.
    #[error("{message}")]
    Parameter { message: String },

    /// The user may not run this command.
    #[error("permission denied for {permission_id}")]
    Permission { permission_id: String },
}

impl MiddlewareError {
    #[must_use]
    pub fn throttle(show_user: bool) -> Self {
        Self::Throttle { show_user }
    }

    #[must_use]
    pub fn parameter(message: impl Into<String>) -> Self {
        Self::Parameter {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn permission(permission_id: impl Into<String>) -> Self {
        Self::Permission {
            permission_id: permission_id.into(),
        }
    }

    /// Whether the end user should see a message for this error.
    #[must_use]
    pub fn show_user(&self) -> bool {
        match self {
            Self::Throttle { show_user } => *show_user,
            Self::Parameter { .. } => true,
            Self::Permission { .. } => false,
        }
    }

    /// The user-facing text, when [`show_user`](Self::show_user) is true.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Throttle { .. } => {
                "You are sending commands too quickly. Please slow down.".into()
            },
            Self::Parameter { message } => message.clone(),
            Self::Permission { .. } => "You are not allowed to run this command.".into(),
        }
    }
}

/// Error captured on a [`Response`](crate::invocation::Response).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Middleware(#[from] MiddlewareError),

    /// Business-rule violation raised by command logic. Shown verbatim.
    #[error("{0}")]
    Validation(String),

    /// Anything else. The full detail is logged; the user sees only the code.
    #[error("unexpected error [{code}]")]
    Unexpected {
        code: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    /// Wrap an unexpected error with a fresh correlation code.
    #[must_use]
    pub fn unexpected(source: anyhow::Error) -> Self {
        Self::Unexpected {
            code: correlation_code(),
            source,
        }
    }

    /// The message delivered to the user, or `None` when the error is
    /// deliberately silent.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Middleware(err) => err.show_user().then(|| err.user_message()),
            Self::Validation(message) => Some(message.clone()),
            Self::Unexpected { code, .. } => {
                Some(format!("Something went wrong. Error code: {code}"))
            },
        }
    }
}

/// Outcome of a single middleware hook.
pub type HookResult = Result<(), HookError>;

/// Failure raised by a middleware hook.
///
/// A [`Middleware`](HookError::Middleware) variant is recorded and the phase
/// continues; a [`Fatal`](HookError::Fatal) variant aborts the phase and
/// propagates to the top-level invocation handler.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error(transparent)]
    Middleware(#[from] MiddlewareError),

    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

/// Short random code correlating a user-facing generic message with the
/// logged detail.
#[must_use]
pub fn correlation_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}
