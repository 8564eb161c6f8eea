//! Per-invocation state: the [`Request`] binding a message to its matched
//! route, and the [`Response`] accumulator threaded through the middleware
//! pipeline.

use std::collections::HashMap;

use {
    chrono::{DateTime, Utc},
    herald_common::types::{ChannelRef, ChatMessage, Reply, UserRef},
};

use crate::{
    error::PipelineError,
    param::{ParamValue, Parameter},
};

/// One inbound message bound to the route it matched and the parsed
/// parameter values. Created once per matched message, discarded after the
/// `on_reply_posted` phase.
#[derive(Debug, Clone)]
pub struct Request {
    pub message: ChatMessage,
    /// Permission id of the matched command, `"<module>.<command>"`.
    pub command_id: String,
    route_template: String,
    parameters: Vec<Parameter>,
    values: HashMap<String, ParamValue>,
}

impl Request {
    #[must_use]
    pub fn new(
        message: ChatMessage,
        command_id: impl Into<String>,
        route_template: impl Into<String>,
        parameters: Vec<Parameter>,
        values: HashMap<String, ParamValue>,
    ) -> Self {
        Self {
            message,
            command_id: command_id.into(),
            route_template: route_template.into(),
            parameters,
            values,
        }
    }

    #[must_use]
    pub fn route_template(&self) -> &str {
        &self.route_template
    }

    /// The matched route's declared parameters, in template order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// The bound value for a parameter id. Declared but unsupplied
    /// parameters are present as [`ParamValue::Missing`].
    #[must_use]
    pub fn value(&self, id: &str) -> Option<&ParamValue> {
        self.values.get(id)
    }

    #[must_use]
    pub fn text(&self, id: &str) -> Option<&str> {
        self.values.get(id).and_then(ParamValue::as_text)
    }

    #[must_use]
    pub fn date(&self, id: &str) -> Option<DateTime<Utc>> {
        self.values.get(id).and_then(ParamValue::as_date)
    }
}

/// Mutable accumulator threaded by reference through the pipeline. Exactly
/// one per invocation; never shared or reused across invocations.
#[derive(Debug)]
pub struct Response {
    /// Channel the reply is delivered to.
    pub target_channel: ChannelRef,
    /// Users the mention-decoration middleware prepends to the reply text.
    pub target_mentions: Vec<UserRef>,
    pub reply: Option<Reply>,
    /// First error captured during the invocation, if any.
    pub error: Option<PipelineError>,
}

impl Response {
    #[must_use]
    pub fn new(target_channel: ChannelRef) -> Self {
        Self {
            target_channel,
            target_mentions: Vec::new(),
            reply: None,
            error: None,
        }
    }

    /// Record an error. The first recorded error wins; later ones are
    /// dropped.
    pub fn record_error(&mut self, error: PipelineError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn set_reply(&mut self, reply: impl Into<Reply>) {
        self.reply = Some(reply.into());
    }
}
