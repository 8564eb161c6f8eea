//! The command abstraction: routes, extra middleware, and domain logic.

use std::sync::Arc;

use {async_trait::async_trait, herald_config::HeraldConfig};

use crate::{
    invocation::{Request, Response},
    middleware::Middleware,
    route::Route,
};

pub type CommandResult = Result<(), CommandError>;

/// Failure raised by command domain logic.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Business-rule violation; the message is shown to the user verbatim.
    #[error("{0}")]
    Validation(String),

    /// Anything else; surfaced as a generic message with a correlation code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CommandError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// A registered command: one or more routes, optional extra middleware, and
/// the domain logic that produces a reply.
#[async_trait]
pub trait Command: Send + Sync {
    /// Module the command belongs to; first half of the permission id.
    fn module_id(&self) -> &str;

    /// Command id; second half of the permission id.
    fn id(&self) -> &str;

    /// Invocation templates, constructed once at registration.
    fn routes(&self) -> &[Route];

    /// Middleware added on top of the dispatcher defaults. An instance with
    /// an id already in the default stack replaces it. The config is passed
    /// so opt-in middleware can seed its options from the matching section.
    fn middleware(&self, _config: &HeraldConfig) -> Vec<Arc<dyn Middleware>> {
        Vec::new()
    }

    fn enabled(&self) -> bool {
        true
    }

    /// Domain logic. Runs only when no middleware short-circuited or
    /// recorded an error during the `on_command` phase.
    async fn execute(&self, request: &Request, response: &mut Response) -> CommandResult;
}
