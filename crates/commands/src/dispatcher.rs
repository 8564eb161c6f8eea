//! The dispatcher: an explicit registry of commands plus the per-message
//! invocation driver.
//!
//! Route selection across all enabled commands is longest-match-wins; a tie
//! for the longest match means the invocation is ambiguous and the message
//! is silently dropped — no command executes and no error surfaces. This is
//! a deliberate disambiguation policy.

use std::sync::Arc;

use {
    chrono::Utc,
    herald_cache::CacheStore,
    herald_common::types::ChatMessage,
    herald_config::HeraldConfig,
    herald_transport::{ChatTransport, TransportEvent},
    tokio::sync::mpsc,
    tracing::{debug, error, info},
};

use crate::{
    command::{Command, CommandError},
    error::PipelineError,
    invocation::{Request, Response},
    middleware::{
        MiddlewareStack,
        mentions::MentionsMiddleware,
        pagination::PaginationMiddleware,
        param_count::ParamCountMiddleware,
        permissions::PermissionMiddleware,
        throttle::ThrottleMiddleware,
    },
    pagination::PaginatorHandle,
    param,
    permissions::PermissionEvaluator,
    route::{Route, RouteMatch},
};

struct RegisteredCommand {
    command: Arc<dyn Command>,
    permission_id: String,
    middleware: MiddlewareStack,
}

/// Owns the command registry and drives one invocation per matched inbound
/// message. Constructed once at startup; commands register before the event
/// loop starts.
pub struct Dispatcher {
    prefix: String,
    config: HeraldConfig,
    transport: Arc<dyn ChatTransport>,
    cache: Arc<dyn CacheStore>,
    evaluator: Arc<PermissionEvaluator>,
    paginator: PaginatorHandle,
    commands: Vec<RegisteredCommand>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        config: HeraldConfig,
        transport: Arc<dyn ChatTransport>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let evaluator = Arc::new(PermissionEvaluator::new(config.permission_groups.clone()));
        Self {
            prefix: config.bot.prefix.clone(),
            config,
            transport,
            cache,
            evaluator,
            paginator: PaginatorHandle::new(),
            commands: Vec::new(),
        }
    }

    /// Register a command, composing the default middleware stack with the
    /// command's own additions (same-id additions replace defaults).
    pub fn register(&mut self, command: Arc<dyn Command>) {
        let permission_id = format!("{}.{}", command.module_id(), command.id());

        let mut stack = MiddlewareStack::new();
        stack.insert(Arc::new(PermissionMiddleware::new(Arc::clone(
            &self.evaluator,
        ))));
        stack.insert(Arc::new(ParamCountMiddleware::new()));
        stack.insert(Arc::new(ThrottleMiddleware::new(
            Arc::clone(&self.cache),
            Arc::clone(&self.transport),
            self.config.throttle.clone(),
        )));
        stack.insert(Arc::new(PaginationMiddleware::new(
            self.paginator.clone(),
            Arc::clone(&self.cache),
            Arc::clone(&self.transport),
        )));
        stack.insert(Arc::new(MentionsMiddleware::new()));
        for middleware in command.middleware(&self.config) {
            stack.insert(middleware);
        }

        info!(
            command = %permission_id,
            middleware = ?stack.ids(),
            "registered command"
        );
        self.commands.push(RegisteredCommand {
            command,
            permission_id,
            middleware: stack,
        });
    }

    /// Consume transport events until the stream closes.
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<TransportEvent>) {
        info!(commands = self.commands.len(), "dispatcher listening");
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        info!("transport event stream closed, dispatcher stopping");
    }

    /// Handle one transport event.
    pub async fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Message(message) => self.handle_message(message).await,
            TransportEvent::ReactionAdded(reaction) | TransportEvent::ReactionRemoved(reaction) => {
                // the listener exists only once a paginated reply was posted
                if let Some(paginator) = self.paginator.installed()
                    && let Err(e) = paginator.handle_reaction(&reaction).await
                {
                    error!(error = ?e, "pagination reaction handling failed");
                }
            },
        }
    }

    /// Drive one inbound chat message through match → pipeline → delivery.
    pub async fn handle_message(&self, message: ChatMessage) {
        // never react to our own (or any bot's) messages
        if message.author.is_bot || message.author.id == self.transport.bot_user_id() {
            return;
        }
        let Some(text) = message.text.strip_prefix(&self.prefix) else {
            return;
        };
        let text = text.trim();

        let Some((registered, route, matched)) = self.match_route(text) else {
            return;
        };
        debug!(
            command = %registered.permission_id,
            route = route.template(),
            "matched invocation"
        );

        let values = param::bind(route.parameters(), matched.rest, &message.scope, Utc::now());
        let request = Request::new(
            message.clone(),
            registered.permission_id.clone(),
            route.template(),
            route.parameters().to_vec(),
            values,
        );
        let mut response = Response::new(message.channel.clone());

        if let Err(e) = registered
            .middleware
            .run_on_command(&request, &mut response)
            .await
        {
            record_unexpected(&mut response, e);
        }

        // domain logic runs only when nothing short-circuited or errored
        if response.error.is_none() && response.reply.is_none() {
            match registered.command.execute(&request, &mut response).await {
                Ok(()) => {},
                Err(CommandError::Validation(message)) => {
                    response.record_error(PipelineError::Validation(message));
                },
                Err(CommandError::Other(e)) => record_unexpected(&mut response, e),
            }
        }

        // an error still produces a reply, just not the domain one
        apply_error_reply(&mut response);

        if let Err(e) = registered
            .middleware
            .run_on_reply_constructed(&request, &mut response)
            .await
        {
            record_unexpected(&mut response, e);
            apply_error_reply(&mut response);
        }

        let Some(reply) = response.reply.clone() else {
            debug!(command = %registered.permission_id, "invocation produced no reply");
            return;
        };
        let posted = match self.transport.send(&response.target_channel.id, &reply).await {
            Ok(posted) => posted,
            Err(e) => {
                error!(
                    command = %registered.permission_id,
                    channel = %response.target_channel.id,
                    error = %e,
                    "reply delivery failed"
                );
                return;
            },
        };

        if let Err(e) = registered
            .middleware
            .run_on_reply_posted(&request, &mut response, &posted)
            .await
        {
            error!(
                command = %registered.permission_id,
                error = ?e,
                "middleware failed after delivery"
            );
        }
    }

    /// Match the prefix-stripped text against every enabled command's
    /// routes. Longest match wins; ties abort the invocation.
    fn match_route<'a>(
        &'a self,
        text: &'a str,
    ) -> Option<(&'a RegisteredCommand, &'a Route, RouteMatch<'a>)> {
        let mut matches = Vec::new();
        for registered in &self.commands {
            if !registered.command.enabled() {
                continue;
            }
            for route in registered.command.routes() {
                if let Some(matched) = route.match_invocation(text) {
                    matches.push((registered, route, matched));
                }
            }
        }

        let best = matches
            .iter()
            .map(|(_, _, matched)| matched.matched_len)
            .max()?;
        let mut winners = matches
            .into_iter()
            .filter(|(_, _, matched)| matched.matched_len == best);
        let winner = winners.next()?;
        if winners.next().is_some() {
            debug!(text, "ambiguous invocation, dropping message");
            return None;
        }
        Some(winner)
    }
}

/// Map a captured error to a user-facing reply when none is set yet.
fn apply_error_reply(response: &mut Response) {
    if response.reply.is_some() {
        return;
    }
    if let Some(error) = &response.error
        && let Some(message) = error.user_message()
    {
        response.set_reply(message);
    }
}

fn record_unexpected(response: &mut Response, source: anyhow::Error) {
    let wrapped = PipelineError::unexpected(source);
    if let PipelineError::Unexpected { code, source } = &wrapped {
        error!(code = %code, error = ?source, "unexpected error during invocation");
    }
    response.record_error(wrapped);
}
