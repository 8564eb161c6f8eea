//! Command dispatch core: route matching, typed parameter binding, the
//! middleware pipeline, permission evaluation, throttling, and reaction
//! pagination.
//!
//! An inbound [`ChatMessage`](herald_common::types::ChatMessage) flows
//! through: dispatcher route match → [`Request`] built → [`Response`]
//! created → middleware `on_command` phase → domain logic (unless
//! short-circuited) → middleware `on_reply_constructed` phase → delivery →
//! middleware `on_reply_posted` phase.

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod invocation;
pub mod middleware;
pub mod pagination;
pub mod param;
pub mod permissions;
pub mod route;

pub use {
    command::{Command, CommandError, CommandResult},
    dispatcher::Dispatcher,
    error::{HookError, HookResult, MiddlewareError, PipelineError},
    invocation::{Request, Response},
    middleware::Middleware,
    pagination::Paginator,
    param::{ParamKind, ParamValue, Parameter},
    permissions::PermissionEvaluator,
    route::Route,
};
