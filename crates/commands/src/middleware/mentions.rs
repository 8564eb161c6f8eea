//! Mention-decoration middleware. Prepends `<@id>` mentions for the
//! response's target users to the outgoing text.

use async_trait::async_trait;

use crate::{
    error::HookResult,
    invocation::{Request, Response},
    middleware::{Middleware, order},
};

#[derive(Default)]
pub struct MentionsMiddleware;

impl MentionsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for MentionsMiddleware {
    fn id(&self) -> &str {
        "mentions"
    }

    fn order(&self) -> i32 {
        order::MENTIONS
    }

    async fn on_reply_constructed(
        &self,
        _request: &Request,
        response: &mut Response,
    ) -> HookResult {
        if response.target_mentions.is_empty() {
            return Ok(());
        }
        let Some(reply) = response.reply.as_mut() else {
            return Ok(());
        };
        let mentions = response
            .target_mentions
            .iter()
            .map(herald_common::types::UserRef::mention)
            .collect::<Vec<_>>()
            .join(" ");
        reply.text = format!("{mentions} {}", reply.text);
        Ok(())
    }
}
