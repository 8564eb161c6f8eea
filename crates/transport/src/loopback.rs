//! In-memory transport for tests and the demo binary.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use {
    async_trait::async_trait,
    herald_common::types::Reply,
    tokio::sync::{Mutex, mpsc},
    tracing::debug,
};

use crate::{ChatTransport, Error, PostedMessage, Result, TransportEvent};

/// A delete that was requested with a delay. The loopback transport records
/// these instead of sleeping so tests stay deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledDelete {
    pub channel_id: String,
    pub message_id: String,
    pub after: Duration,
}

/// [`ChatTransport`] that keeps everything in process memory and exposes
/// what the bot did for assertions.
pub struct LoopbackTransport {
    bot_user_id: String,
    next_id: AtomicU64,
    events: mpsc::UnboundedSender<TransportEvent>,
    messages: Mutex<HashMap<String, Reply>>,
    sent: Mutex<Vec<(PostedMessage, Reply)>>,
    reactions: Mutex<Vec<(String, String)>>,
    deletions: Mutex<Vec<String>>,
    scheduled: Mutex<Vec<ScheduledDelete>>,
}

impl LoopbackTransport {
    /// Build a transport plus the receiving end of its inbound event stream.
    #[must_use]
    pub fn channel(
        bot_user_id: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                bot_user_id: bot_user_id.into(),
                next_id: AtomicU64::new(1),
                events: tx,
                messages: Mutex::new(HashMap::new()),
                sent: Mutex::new(Vec::new()),
                reactions: Mutex::new(Vec::new()),
                deletions: Mutex::new(Vec::new()),
                scheduled: Mutex::new(Vec::new()),
            },
            rx,
        )
    }

    /// Feed an inbound event, as the platform connection would.
    pub fn inject(&self, event: TransportEvent) {
        // the receiver being gone just means the bot is shutting down
        let _ = self.events.send(event);
    }

    fn key(channel_id: &str, message_id: &str) -> String {
        format!("{channel_id}.{message_id}")
    }

    /// Current content of a delivered message, if it still exists.
    pub async fn message(&self, channel_id: &str, message_id: &str) -> Option<Reply> {
        let messages = self.messages.lock().await;
        messages.get(&Self::key(channel_id, message_id)).cloned()
    }

    /// Every message the bot sent, in order, with its content at send time.
    pub async fn sent(&self) -> Vec<(PostedMessage, Reply)> {
        self.sent.lock().await.clone()
    }

    /// Reactions the bot attached, in order, as `(message key, symbol)`.
    pub async fn reactions(&self) -> Vec<(String, String)> {
        self.reactions.lock().await.clone()
    }

    /// Message keys the bot deleted, in order.
    pub async fn deletions(&self) -> Vec<String> {
        self.deletions.lock().await.clone()
    }

    /// Deletes requested with a delay, in order.
    pub async fn scheduled_deletes(&self) -> Vec<ScheduledDelete> {
        self.scheduled.lock().await.clone()
    }
}

#[async_trait]
impl ChatTransport for LoopbackTransport {
    fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    async fn send(&self, channel_id: &str, reply: &Reply) -> Result<PostedMessage> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let posted = PostedMessage {
            id: id.clone(),
            channel_id: channel_id.to_string(),
        };
        self.messages
            .lock()
            .await
            .insert(Self::key(channel_id, &id), reply.clone());
        self.sent.lock().await.push((posted.clone(), reply.clone()));
        debug!(channel_id, message_id = %id, "loopback send");
        Ok(posted)
    }

    async fn edit(&self, channel_id: &str, message_id: &str, reply: &Reply) -> Result<()> {
        let mut messages = self.messages.lock().await;
        match messages.get_mut(&Self::key(channel_id, message_id)) {
            Some(existing) => {
                *existing = reply.clone();
                Ok(())
            },
            None => Err(Error::unknown_message(channel_id, message_id)),
        }
    }

    async fn delete(&self, channel_id: &str, message_id: &str) -> Result<()> {
        let key = Self::key(channel_id, message_id);
        self.messages.lock().await.remove(&key);
        self.deletions.lock().await.push(key);
        Ok(())
    }

    async fn react(&self, channel_id: &str, message_id: &str, symbol: &str) -> Result<()> {
        self.reactions
            .lock()
            .await
            .push((Self::key(channel_id, message_id), symbol.to_string()));
        Ok(())
    }

    async fn schedule_delete(
        &self,
        channel_id: &str,
        message_id: &str,
        after: Duration,
    ) -> Result<()> {
        self.scheduled.lock().await.push(ScheduledDelete {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            after,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, herald_common::types::Reply};

    #[tokio::test]
    async fn send_then_edit_replaces_content() {
        let (transport, _rx) = LoopbackTransport::channel("bot");
        let posted = transport.send("ch", &Reply::text("one")).await.unwrap();
        transport
            .edit("ch", &posted.id, &Reply::text("two"))
            .await
            .unwrap();
        let current = transport.message("ch", &posted.id).await;
        assert_eq!(current.map(|r| r.text), Some("two".to_string()));
    }

    #[tokio::test]
    async fn edit_of_unknown_message_errors() {
        let (transport, _rx) = LoopbackTransport::channel("bot");
        let err = transport
            .edit("ch", "404", &Reply::text("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownMessage { .. }));
    }

    #[tokio::test]
    async fn delete_is_recorded() {
        let (transport, _rx) = LoopbackTransport::channel("bot");
        let posted = transport.send("ch", &Reply::text("gone")).await.unwrap();
        transport.delete("ch", &posted.id).await.unwrap();
        assert!(transport.message("ch", &posted.id).await.is_none());
        assert_eq!(transport.deletions().await, vec![format!("ch.{}", posted.id)]);
    }
}
