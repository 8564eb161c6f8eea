//! The middleware pipeline.
//!
//! Every middleware exposes three lifecycle hooks, each optional and each
//! run strictly sequentially within a phase:
//! - `on_command` — before domain logic; may short-circuit by assigning
//!   `response.reply`, or reject by returning a
//!   [`MiddlewareError`](crate::error::MiddlewareError).
//! - `on_reply_constructed` — after domain logic produced a reply (or an
//!   error was captured); decorates the outgoing reply.
//! - `on_reply_posted` — after delivery; side effects tied to the concrete
//!   posted message.
//!
//! A `MiddlewareError` is recorded on the response (first one wins) and the
//! phase continues; any other error aborts the phase and propagates.
//!
//! Per-instance options are an options struct merged over defaults with
//! struct-update syntax, e.g.
//! `AutoRemoveOptions { remove_request: true, ..AutoRemoveOptions::default() }`.

pub mod auto_remove;
pub mod cache_result;
pub mod mentions;
pub mod pagination;
pub mod param_count;
pub mod permissions;
pub mod throttle;

use std::sync::Arc;

use {async_trait::async_trait, herald_transport::PostedMessage, tracing::debug};

use crate::{
    error::{HookError, HookResult},
    invocation::{Request, Response},
};

/// Default execution orders for the built-in middleware; lower runs earlier.
pub mod order {
    pub const PERMISSIONS: i32 = -1000;
    pub const PARAM_COUNT: i32 = 0;
    pub const THROTTLE: i32 = 0;
    pub const PAGINATION: i32 = 0;
    pub const CACHE_RESULT: i32 = 990;
    pub const MENTIONS: i32 = 995;
    pub const AUTO_REMOVE: i32 = 1000;
}

/// An ordered pipeline stage. Stateless across invocations except for its
/// own configuration.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Stable identifier; registering the same id twice replaces the
    /// existing instance.
    fn id(&self) -> &str;

    /// Execution-order weight; lower runs earlier.
    fn order(&self) -> i32;

    async fn on_command(&self, _request: &Request, _response: &mut Response) -> HookResult {
        Ok(())
    }

    async fn on_reply_constructed(
        &self,
        _request: &Request,
        _response: &mut Response,
    ) -> HookResult {
        Ok(())
    }

    async fn on_reply_posted(
        &self,
        _request: &Request,
        _response: &mut Response,
        _posted: &PostedMessage,
    ) -> HookResult {
        Ok(())
    }
}

/// A command's middleware list, kept sorted ascending by order.
#[derive(Default)]
pub struct MiddlewareStack {
    entries: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a middleware, replacing any existing instance with the same
    /// id, then restore the order sort.
    pub fn insert(&mut self, middleware: Arc<dyn Middleware>) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.id() == middleware.id())
        {
            Some(existing) => *existing = middleware,
            None => self.entries.push(middleware),
        }
        self.entries.sort_by_key(|m| m.order());
    }

    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|m| m.id()).collect()
    }

    /// Run the `on_command` phase.
    pub async fn run_on_command(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> anyhow::Result<()> {
        for middleware in &self.entries {
            match middleware.on_command(request, response).await {
                Ok(()) => {},
                Err(HookError::Middleware(err)) => {
                    debug!(middleware = middleware.id(), error = %err, "middleware rejected command");
                    response.record_error(err.into());
                },
                Err(HookError::Fatal(err)) => return Err(err),
            }
        }
        Ok(())
    }

    /// Run the `on_reply_constructed` phase.
    pub async fn run_on_reply_constructed(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> anyhow::Result<()> {
        for middleware in &self.entries {
            match middleware.on_reply_constructed(request, response).await {
                Ok(()) => {},
                Err(HookError::Middleware(err)) => response.record_error(err.into()),
                Err(HookError::Fatal(err)) => return Err(err),
            }
        }
        Ok(())
    }

    /// Run the `on_reply_posted` phase.
    pub async fn run_on_reply_posted(
        &self,
        request: &Request,
        response: &mut Response,
        posted: &PostedMessage,
    ) -> anyhow::Result<()> {
        for middleware in &self.entries {
            match middleware.on_reply_posted(request, response, posted).await {
                Ok(()) => {},
                Err(HookError::Middleware(err)) => response.record_error(err.into()),
                Err(HookError::Fatal(err)) => return Err(err),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::error::MiddlewareError,
        herald_common::types::{ChannelRef, ChatMessage, MessageScope, UserRef},
        std::{
            collections::HashMap,
            sync::atomic::{AtomicUsize, Ordering},
        },
    };

    fn request() -> Request {
        Request::new(
            ChatMessage {
                id: "1".into(),
                channel: ChannelRef::new("c", "general"),
                author: UserRef::new("u", "ada"),
                text: "!x".into(),
                scope: MessageScope::default(),
            },
            "test.x",
            "x",
            Vec::new(),
            HashMap::new(),
        )
    }

    struct Recorder {
        id: &'static str,
        order: i32,
        calls: Arc<AtomicUsize>,
        fail: Option<MiddlewareError>,
        fatal: bool,
    }

    #[async_trait]
    impl Middleware for Recorder {
        fn id(&self) -> &str {
            self.id
        }

        fn order(&self) -> i32 {
            self.order
        }

        async fn on_command(&self, _req: &Request, _res: &mut Response) -> HookResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fatal {
                return Err(HookError::Fatal(anyhow::anyhow!("fatal")));
            }
            match &self.fail {
                Some(err) => Err(err.clone().into()),
                None => Ok(()),
            }
        }
    }

    fn recorder(id: &'static str, order: i32) -> (Arc<Recorder>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(Recorder {
                id,
                order,
                calls: Arc::clone(&calls),
                fail: None,
                fatal: false,
            }),
            calls,
        )
    }

    #[test]
    fn stack_sorts_by_order() {
        let mut stack = MiddlewareStack::new();
        let (late, _) = recorder("late", 1000);
        let (early, _) = recorder("early", -1000);
        let (mid, _) = recorder("mid", 0);
        stack.insert(late);
        stack.insert(early);
        stack.insert(mid);
        assert_eq!(stack.ids(), ["early", "mid", "late"]);
    }

    #[test]
    fn duplicate_id_replaces_instance() {
        let mut stack = MiddlewareStack::new();
        let (first, _) = recorder("dup", 0);
        let (second, _) = recorder("dup", 5);
        stack.insert(first);
        stack.insert(second);
        assert_eq!(stack.ids(), ["dup"]);
    }

    #[tokio::test]
    async fn middleware_error_does_not_stop_phase() {
        let mut stack = MiddlewareStack::new();
        let calls = Arc::new(AtomicUsize::new(0));
        stack.insert(Arc::new(Recorder {
            id: "reject",
            order: 0,
            calls: Arc::clone(&calls),
            fail: Some(MiddlewareError::throttle(true)),
            fatal: false,
        }));
        let (after, after_calls) = recorder("after", 1);
        stack.insert(after);

        let mut response = Response::new(ChannelRef::new("c", "general"));
        stack
            .run_on_command(&request(), &mut response)
            .await
            .expect("phase completes");
        assert_eq!(after_calls.load(Ordering::SeqCst), 1);
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn first_middleware_error_wins() {
        let mut stack = MiddlewareStack::new();
        for (id, order, err) in [
            ("a", 0, MiddlewareError::throttle(true)),
            ("b", 1, MiddlewareError::parameter("late")),
        ] {
            stack.insert(Arc::new(Recorder {
                id,
                order,
                calls: Arc::new(AtomicUsize::new(0)),
                fail: Some(err),
                fatal: false,
            }));
        }
        let mut response = Response::new(ChannelRef::new("c", "general"));
        stack
            .run_on_command(&request(), &mut response)
            .await
            .expect("phase completes");
        assert!(matches!(
            response.error,
            Some(crate::error::PipelineError::Middleware(
                MiddlewareError::Throttle { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn fatal_error_aborts_phase() {
        let mut stack = MiddlewareStack::new();
        stack.insert(Arc::new(Recorder {
            id: "boom",
            order: 0,
            calls: Arc::new(AtomicUsize::new(0)),
            fail: None,
            fatal: true,
        }));
        let (after, after_calls) = recorder("after", 1);
        stack.insert(after);

        let mut response = Response::new(ChannelRef::new("c", "general"));
        let result = stack.run_on_command(&request(), &mut response).await;
        assert!(result.is_err());
        assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    }
}
