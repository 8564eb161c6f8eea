//! Parameter-count validation middleware.
//!
//! Parse-time binding never fails; this is where required-but-missing and
//! typed-but-rejected bindings turn into a user-visible parameter error.

use async_trait::async_trait;

use crate::{
    error::{HookResult, MiddlewareError},
    invocation::{Request, Response},
    middleware::{Middleware, order},
    param::ParamValue,
};

#[derive(Default)]
pub struct ParamCountMiddleware;

impl ParamCountMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for ParamCountMiddleware {
    fn id(&self) -> &str {
        "param-count"
    }

    fn order(&self) -> i32 {
        order::PARAM_COUNT
    }

    async fn on_command(&self, request: &Request, _response: &mut Response) -> HookResult {
        let mut missing = Vec::new();
        let mut invalid = Vec::new();

        for parameter in request.parameters() {
            if parameter.optional {
                continue;
            }
            match request.value(&parameter.id) {
                Some(ParamValue::Missing) | None => missing.push(parameter.id.as_str()),
                Some(ParamValue::Invalid { .. }) => invalid.push(parameter.id.as_str()),
                Some(_) => {},
            }
        }

        if missing.is_empty() && invalid.is_empty() {
            return Ok(());
        }

        let mut parts = Vec::new();
        if !missing.is_empty() {
            parts.push(format!("missing: {}", missing.join(", ")));
        }
        if !invalid.is_empty() {
            parts.push(format!("invalid: {}", invalid.join(", ")));
        }
        Err(MiddlewareError::parameter(format!(
            "Usage: {} ({})",
            request.route_template(),
            parts.join("; ")
        ))
        .into())
    }
}
