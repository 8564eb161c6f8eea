//! Auto-removal middleware. Schedules deletion of the originating request
//! message and/or the posted reply once delivery has happened.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    herald_config::AutoRemoveConfig,
    herald_transport::{ChatTransport, PostedMessage},
};

use crate::{
    error::{HookError, HookResult},
    invocation::{Request, Response},
    middleware::{Middleware, order},
};

/// Per-instance options.
#[derive(Debug, Clone, Copy)]
pub struct AutoRemoveOptions {
    pub remove_request: bool,
    pub remove_reply: bool,
    pub request_delay: Duration,
    pub reply_delay: Duration,
}

impl Default for AutoRemoveOptions {
    fn default() -> Self {
        Self {
            remove_request: false,
            remove_reply: true,
            request_delay: Duration::ZERO,
            reply_delay: Duration::from_secs(30),
        }
    }
}

/// Delays come from the `[auto_remove]` config section; what gets removed
/// stays a per-command choice.
impl From<&AutoRemoveConfig> for AutoRemoveOptions {
    fn from(config: &AutoRemoveConfig) -> Self {
        Self {
            request_delay: Duration::from_secs(config.request_delay_secs),
            reply_delay: Duration::from_secs(config.reply_delay_secs),
            ..Self::default()
        }
    }
}

pub struct AutoRemoveMiddleware {
    transport: Arc<dyn ChatTransport>,
    options: AutoRemoveOptions,
}

impl AutoRemoveMiddleware {
    #[must_use]
    pub fn new(transport: Arc<dyn ChatTransport>, options: AutoRemoveOptions) -> Self {
        Self { transport, options }
    }
}

#[async_trait]
impl Middleware for AutoRemoveMiddleware {
    fn id(&self) -> &str {
        "auto-remove"
    }

    fn order(&self) -> i32 {
        order::AUTO_REMOVE
    }

    async fn on_reply_posted(
        &self,
        request: &Request,
        _response: &mut Response,
        posted: &PostedMessage,
    ) -> HookResult {
        if self.options.remove_request {
            self.transport
                .schedule_delete(
                    &request.message.channel.id,
                    &request.message.id,
                    self.options.request_delay,
                )
                .await
                .map_err(|e| HookError::Fatal(e.into()))?;
        }
        if self.options.remove_reply {
            self.transport
                .schedule_delete(&posted.channel_id, &posted.id, self.options.reply_delay)
                .await
                .map_err(|e| HookError::Fatal(e.into()))?;
        }
        Ok(())
    }
}
