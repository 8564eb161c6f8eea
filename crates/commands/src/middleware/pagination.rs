//! Pagination bookkeeping middleware. Installs the process-wide reaction
//! listener on the first paginated reply and registers the posted message
//! with it.

use std::sync::Arc;

use {
    async_trait::async_trait,
    herald_cache::CacheStore,
    herald_transport::{ChatTransport, PostedMessage},
};

use crate::{
    error::{HookError, HookResult},
    invocation::{Request, Response},
    middleware::{Middleware, order},
    pagination::PaginatorHandle,
};

pub struct PaginationMiddleware {
    handle: PaginatorHandle,
    cache: Arc<dyn CacheStore>,
    transport: Arc<dyn ChatTransport>,
}

impl PaginationMiddleware {
    #[must_use]
    pub fn new(
        handle: PaginatorHandle,
        cache: Arc<dyn CacheStore>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            handle,
            cache,
            transport,
        }
    }
}

#[async_trait]
impl Middleware for PaginationMiddleware {
    fn id(&self) -> &str {
        "pagination"
    }

    fn order(&self) -> i32 {
        order::PAGINATION
    }

    async fn on_reply_posted(
        &self,
        request: &Request,
        response: &mut Response,
        posted: &PostedMessage,
    ) -> HookResult {
        let Some(reply) = &response.reply else {
            return Ok(());
        };
        if !reply.is_paginated() || response.error.is_some() {
            return Ok(());
        }
        let paginator = self.handle.install(&self.cache, &self.transport);
        paginator
            .track(posted, reply, &request.message.author.id)
            .await
            .map_err(HookError::Fatal)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        herald_cache::MemoryCache,
        herald_common::types::{ChannelRef, ChatMessage, MessageScope, Page, Reply, UserRef},
        herald_transport::LoopbackTransport,
        std::collections::HashMap,
    };

    fn request() -> Request {
        Request::new(
            ChatMessage {
                id: "1".into(),
                channel: ChannelRef::new("c", "general"),
                author: UserRef::new("author", "ada"),
                text: "!events list".into(),
                scope: MessageScope::default(),
            },
            "events.list",
            "events list",
            Vec::new(),
            HashMap::new(),
        )
    }

    #[tokio::test]
    async fn paginated_reply_installs_listener_and_tracks() {
        let (transport, _rx) = LoopbackTransport::channel("bot");
        let transport = Arc::new(transport);
        let handle = PaginatorHandle::new();
        let mw = PaginationMiddleware::new(
            handle.clone(),
            Arc::new(MemoryCache::new()),
            Arc::clone(&transport) as Arc<dyn ChatTransport>,
        );

        let reply = Reply::paginated(vec![
            Page {
                text: "a".into(),
                ..Page::default()
            },
            Page {
                text: "b".into(),
                ..Page::default()
            },
        ]);
        let posted = transport.send("c", &reply).await.unwrap();
        let mut response = Response::new(ChannelRef::new("c", "general"));
        response.reply = Some(reply);

        assert!(handle.installed().is_none());
        mw.on_reply_posted(&request(), &mut response, &posted)
            .await
            .unwrap();
        assert!(handle.installed().is_some());
        assert_eq!(transport.reactions().await.len(), 4);
    }

    #[tokio::test]
    async fn plain_reply_does_not_install_listener() {
        let (transport, _rx) = LoopbackTransport::channel("bot");
        let transport = Arc::new(transport);
        let handle = PaginatorHandle::new();
        let mw = PaginationMiddleware::new(
            handle.clone(),
            Arc::new(MemoryCache::new()),
            Arc::clone(&transport) as Arc<dyn ChatTransport>,
        );
        let posted = transport.send("c", &Reply::text("plain")).await.unwrap();
        let mut response = Response::new(ChannelRef::new("c", "general"));
        response.set_reply("plain");
        mw.on_reply_posted(&request(), &mut response, &posted)
            .await
            .unwrap();
        assert!(handle.installed().is_none());
        assert!(transport.reactions().await.is_empty());
    }
}
