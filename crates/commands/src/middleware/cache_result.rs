//! Result-caching middleware.
//!
//! Caches plain-text replies keyed by the normalized invocation text, so
//! repeated identical invocations short-circuit before domain logic runs.
//! Rich replies (attachments, pagination) are never cached.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    herald_cache::CacheStore,
    herald_common::types::Reply,
    herald_config::ResultCacheConfig,
    serde_json::json,
    tracing::debug,
};

use crate::{
    error::{HookError, HookResult},
    invocation::{Request, Response},
    middleware::{Middleware, order},
};

const TABLE: &str = "command-cache";

/// Per-instance options.
#[derive(Debug, Clone, Copy)]
pub struct CacheResultOptions {
    pub ttl: Duration,
}

impl Default for CacheResultOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
        }
    }
}

impl From<&ResultCacheConfig> for CacheResultOptions {
    fn from(config: &ResultCacheConfig) -> Self {
        Self {
            ttl: Duration::from_secs(config.ttl_secs),
        }
    }
}

pub struct CacheResultMiddleware {
    cache: Arc<dyn CacheStore>,
    options: CacheResultOptions,
}

impl CacheResultMiddleware {
    #[must_use]
    pub fn new(cache: Arc<dyn CacheStore>, options: CacheResultOptions) -> Self {
        Self { cache, options }
    }

    fn key(request: &Request) -> String {
        format!(
            "{}:{}",
            request.command_id,
            request.message.text.trim().to_lowercase()
        )
    }
}

#[async_trait]
impl Middleware for CacheResultMiddleware {
    fn id(&self) -> &str {
        "cache-result"
    }

    fn order(&self) -> i32 {
        order::CACHE_RESULT
    }

    async fn on_command(&self, request: &Request, response: &mut Response) -> HookResult {
        let key = Self::key(request);
        let hit = self
            .cache
            .get(TABLE, &key)
            .await
            .map_err(|e| HookError::Fatal(e.into()))?;
        if let Some(text) = hit.as_ref().and_then(|v| v.as_str()) {
            debug!(key, "serving cached reply");
            response.reply = Some(Reply::text(text));
        }
        Ok(())
    }

    async fn on_reply_constructed(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> HookResult {
        if response.error.is_some() {
            return Ok(());
        }
        let Some(reply) = &response.reply else {
            return Ok(());
        };
        if reply.attachment.is_some() || reply.is_paginated() {
            return Ok(());
        }
        self.cache
            .set(
                TABLE,
                &Self::key(request),
                Some(self.options.ttl),
                json!(reply.text),
            )
            .await
            .map_err(|e| HookError::Fatal(e.into()))?;
        Ok(())
    }
}
