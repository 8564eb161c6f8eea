//! Throttling middleware.
//!
//! Per throttle key, the cache holds a tiny state machine:
//! absent → allow and write `1`; `1` → deny, delete the originating message,
//! write `2` (the only transition that resets the TTL clock), notify once;
//! `2` → deny and delete silently. Entries expire via TTL, restarting the
//! cycle.
//!
//! The cache contract has no compare-and-set, so two near-simultaneous
//! identical commands can both observe the absent state before either
//! writes `1` and both execute. This window is documented behavior, not a
//! guarantee (see DESIGN.md).

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    herald_cache::CacheStore,
    herald_config::{ThrottleConfig, ThrottleScope},
    herald_transport::{ChatTransport, PostedMessage},
    serde_json::json,
    tracing::{debug, warn},
};

use crate::{
    error::{HookError, HookResult, MiddlewareError, PipelineError},
    invocation::{Request, Response},
    middleware::{Middleware, order},
};

const TABLE: &str = "throttle";

const STATE_WARNED_PENDING: u64 = 1;
const STATE_WARNED_SENT: u64 = 2;

pub struct ThrottleMiddleware {
    cache: Arc<dyn CacheStore>,
    transport: Arc<dyn ChatTransport>,
    config: ThrottleConfig,
}

impl ThrottleMiddleware {
    #[must_use]
    pub fn new(
        cache: Arc<dyn CacheStore>,
        transport: Arc<dyn ChatTransport>,
        config: ThrottleConfig,
    ) -> Self {
        Self {
            cache,
            transport,
            config,
        }
    }

    fn key(&self, request: &Request) -> String {
        match self.config.scope {
            ThrottleScope::User => format!("user-{}", request.message.author.id),
            ThrottleScope::Command => format!("command-{}", request.command_id),
        }
    }

    fn ttl(&self) -> Option<Duration> {
        Some(Duration::from_secs(self.config.ttl_secs))
    }

    /// Delete the originating message of a denied invocation.
    async fn drop_request_message(&self, request: &Request) {
        let message = &request.message;
        if let Err(e) = self.transport.delete(&message.channel.id, &message.id).await {
            warn!(
                channel = %message.channel.id,
                message = %message.id,
                error = %e,
                "failed to delete throttled request message"
            );
        }
    }
}

#[async_trait]
impl Middleware for ThrottleMiddleware {
    fn id(&self) -> &str {
        "throttle"
    }

    fn order(&self) -> i32 {
        order::THROTTLE
    }

    async fn on_command(&self, request: &Request, _response: &mut Response) -> HookResult {
        let key = self.key(request);
        // get-then-set: see module docs for the double-execution window
        let state = self
            .cache
            .get(TABLE, &key)
            .await
            .map_err(|e| HookError::Fatal(e.into()))?
            .and_then(|value| value.as_u64());

        match state {
            None => {
                self.cache
                    .set(TABLE, &key, self.ttl(), json!(STATE_WARNED_PENDING))
                    .await
                    .map_err(|e| HookError::Fatal(e.into()))?;
                Ok(())
            },
            Some(STATE_WARNED_PENDING) => {
                debug!(key, "throttled, sending one-time notice");
                self.drop_request_message(request).await;
                self.cache
                    .set(TABLE, &key, self.ttl(), json!(STATE_WARNED_SENT))
                    .await
                    .map_err(|e| HookError::Fatal(e.into()))?;
                Err(MiddlewareError::throttle(true).into())
            },
            Some(_) => {
                debug!(key, "throttled, notice already sent");
                self.drop_request_message(request).await;
                Err(MiddlewareError::throttle(false).into())
            },
        }
    }

    async fn on_reply_posted(
        &self,
        _request: &Request,
        response: &mut Response,
        posted: &PostedMessage,
    ) -> HookResult {
        // the one-time throttle notice cleans itself up
        if matches!(
            response.error,
            Some(PipelineError::Middleware(MiddlewareError::Throttle { .. }))
        ) {
            self.transport
                .schedule_delete(
                    &posted.channel_id,
                    &posted.id,
                    Duration::from_secs(self.config.notice_delete_secs),
                )
                .await
                .map_err(|e| HookError::Fatal(e.into()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        herald_cache::MemoryCache,
        herald_common::types::{ChannelRef, ChatMessage, MessageScope, Reply, UserRef},
        herald_transport::LoopbackTransport,
        std::collections::HashMap,
    };

    fn request(author_id: &str) -> Request {
        Request::new(
            ChatMessage {
                id: "msg-1".into(),
                channel: ChannelRef::new("c", "general"),
                author: UserRef::new(author_id, "user"),
                text: "!roll 2d6".into(),
                scope: MessageScope::default(),
            },
            "dice.roll",
            "roll :expr",
            Vec::new(),
            HashMap::new(),
        )
    }

    fn middleware(scope: ThrottleScope) -> (ThrottleMiddleware, Arc<LoopbackTransport>) {
        let (transport, _rx) = LoopbackTransport::channel("bot");
        let transport = Arc::new(transport);
        let mw = ThrottleMiddleware::new(
            Arc::new(MemoryCache::new()),
            Arc::clone(&transport) as Arc<dyn ChatTransport>,
            ThrottleConfig {
                scope,
                ttl_secs: 60,
                notice_delete_secs: 5,
            },
        );
        (mw, transport)
    }

    fn throttle_flag(result: HookResult) -> Option<bool> {
        match result {
            Ok(()) => None,
            Err(HookError::Middleware(MiddlewareError::Throttle { show_user })) => Some(show_user),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn free_warned_sent_cycle() {
        let (mw, _transport) = middleware(ThrottleScope::User);
        let mut response = Response::new(ChannelRef::new("c", "general"));

        // first call allowed
        assert_eq!(
            throttle_flag(mw.on_command(&request("u"), &mut response).await),
            None
        );
        // second call denied with a visible notice
        assert_eq!(
            throttle_flag(mw.on_command(&request("u"), &mut response).await),
            Some(true)
        );
        // third and later calls denied silently
        assert_eq!(
            throttle_flag(mw.on_command(&request("u"), &mut response).await),
            Some(false)
        );
        assert_eq!(
            throttle_flag(mw.on_command(&request("u"), &mut response).await),
            Some(false)
        );
    }

    #[tokio::test]
    async fn expired_entry_restarts_the_cycle() {
        let (transport, _rx) = LoopbackTransport::channel("bot");
        let cache = Arc::new(MemoryCache::new());
        let mw = ThrottleMiddleware::new(
            Arc::clone(&cache) as Arc<dyn CacheStore>,
            Arc::new(transport),
            ThrottleConfig {
                scope: ThrottleScope::User,
                ttl_secs: 60,
                notice_delete_secs: 5,
            },
        );
        let mut response = Response::new(ChannelRef::new("c", "general"));

        mw.on_command(&request("u"), &mut response).await.unwrap();
        assert_eq!(
            throttle_flag(mw.on_command(&request("u"), &mut response).await),
            Some(true)
        );

        // simulate TTL expiry
        cache.remove(TABLE, "user-u").await.unwrap();
        assert_eq!(
            throttle_flag(mw.on_command(&request("u"), &mut response).await),
            None
        );
    }

    #[tokio::test]
    async fn per_user_scope_isolates_users() {
        let (mw, _transport) = middleware(ThrottleScope::User);
        let mut response = Response::new(ChannelRef::new("c", "general"));
        assert!(mw.on_command(&request("a"), &mut response).await.is_ok());
        assert!(mw.on_command(&request("b"), &mut response).await.is_ok());
    }

    #[tokio::test]
    async fn per_command_scope_shares_bucket() {
        let (mw, _transport) = middleware(ThrottleScope::Command);
        let mut response = Response::new(ChannelRef::new("c", "general"));
        assert!(mw.on_command(&request("a"), &mut response).await.is_ok());
        assert!(mw.on_command(&request("b"), &mut response).await.is_err());
    }

    #[tokio::test]
    async fn denied_request_message_is_deleted() {
        let (mw, transport) = middleware(ThrottleScope::User);
        let mut response = Response::new(ChannelRef::new("c", "general"));
        let _ = mw.on_command(&request("u"), &mut response).await;
        let _ = mw.on_command(&request("u"), &mut response).await;
        assert_eq!(transport.deletions().await, vec!["c.msg-1".to_string()]);
    }

    #[tokio::test]
    async fn throttle_notice_schedules_its_own_deletion() {
        let (mw, transport) = middleware(ThrottleScope::User);
        let mut response = Response::new(ChannelRef::new("c", "general"));
        response.record_error(MiddlewareError::throttle(true).into());
        let posted = transport.send("c", &Reply::text("notice")).await.unwrap();
        mw.on_reply_posted(&request("u"), &mut response, &posted)
            .await
            .unwrap();
        let scheduled = transport.scheduled_deletes().await;
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].after, Duration::from_secs(5));
    }
}
