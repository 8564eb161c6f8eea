//! Permission-restriction middleware. Runs earliest (order `-1000`).

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::{HookResult, MiddlewareError},
    invocation::{Request, Response},
    middleware::{Middleware, order},
    permissions::PermissionEvaluator,
};

/// Per-instance options.
#[derive(Debug, Clone, Default)]
pub struct PermissionOptions {
    /// Optional sub-permission appended to the command's permission id as
    /// `":<sub>"`, letting one command gate individual routes separately.
    pub sub: Option<String>,
}

pub struct PermissionMiddleware {
    evaluator: Arc<PermissionEvaluator>,
    options: PermissionOptions,
}

impl PermissionMiddleware {
    #[must_use]
    pub fn new(evaluator: Arc<PermissionEvaluator>) -> Self {
        Self::with_options(evaluator, PermissionOptions::default())
    }

    #[must_use]
    pub fn with_options(evaluator: Arc<PermissionEvaluator>, options: PermissionOptions) -> Self {
        Self { evaluator, options }
    }
}

#[async_trait]
impl Middleware for PermissionMiddleware {
    fn id(&self) -> &str {
        "permissions"
    }

    fn order(&self) -> i32 {
        order::PERMISSIONS
    }

    async fn on_command(&self, request: &Request, _response: &mut Response) -> HookResult {
        let permission_id = match &self.options.sub {
            Some(sub) => format!("{}:{sub}", request.command_id),
            None => request.command_id.clone(),
        };
        if self
            .evaluator
            .is_allowed(&request.message.author, &permission_id)
        {
            Ok(())
        } else {
            Err(MiddlewareError::permission(permission_id).into())
        }
    }
}
