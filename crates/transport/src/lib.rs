//! Chat transport collaborator interface.
//!
//! The dispatcher only ever talks to the platform through [`ChatTransport`]
//! and consumes inbound traffic as a stream of [`TransportEvent`]s. The
//! concrete platform adapter (and its connection handling) lives behind
//! this boundary; [`LoopbackTransport`] is the in-memory implementation
//! used by tests and the demo binary.

pub mod error;
pub mod loopback;

pub use {
    error::{Error, Result},
    loopback::LoopbackTransport,
};

use std::time::Duration;

use {
    async_trait::async_trait,
    herald_common::types::{ChatMessage, Reply, UserRef},
    serde::{Deserialize, Serialize},
};

/// Inbound traffic from the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportEvent {
    Message(ChatMessage),
    ReactionAdded(ReactionEvent),
    ReactionRemoved(ReactionEvent),
}

/// A reaction placed on or removed from a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub channel_id: String,
    pub message_id: String,
    pub symbol: String,
    /// Who reacted.
    pub user: UserRef,
    /// Author of the message that was reacted to.
    pub message_author_id: String,
}

/// Handle to a message the bot delivered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostedMessage {
    pub id: String,
    pub channel_id: String,
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// The bot's own user id, used to ignore self-authored traffic.
    fn bot_user_id(&self) -> &str;

    /// Post a reply to a channel.
    async fn send(&self, channel_id: &str, reply: &Reply) -> Result<PostedMessage>;

    /// Replace the content of an already-posted message.
    async fn edit(&self, channel_id: &str, message_id: &str, reply: &Reply) -> Result<()>;

    /// Delete a message immediately.
    async fn delete(&self, channel_id: &str, message_id: &str) -> Result<()>;

    /// Attach a reaction symbol to a message.
    async fn react(&self, channel_id: &str, message_id: &str, symbol: &str) -> Result<()>;

    /// Delete a message after a delay.
    async fn schedule_delete(
        &self,
        channel_id: &str,
        message_id: &str,
        after: Duration,
    ) -> Result<()>;
}
