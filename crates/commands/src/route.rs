//! Invocation templates and route matching.
//!
//! A route is an invocation template like `"events add :title :start:date"`:
//! leading literal words form the invocation, the `:token`s declare
//! parameters. The parameter list is derived from the template once, lazily,
//! and immutable afterwards, ordered by left-to-right appearance.

use std::{collections::HashSet, sync::OnceLock};

use {serde::Serialize, tracing::warn};

use crate::param::Parameter;

/// An invocation template plus its derived parameter schema.
#[derive(Debug, Serialize)]
pub struct Route {
    template: String,
    #[serde(skip)]
    parameters: OnceLock<Vec<Parameter>>,
}

/// A successful invocation-prefix match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// Length of the matched invocation text; longest match wins across
    /// routes.
    pub matched_len: usize,
    /// Argument text remaining after the invocation.
    pub rest: &'a str,
}

impl Route {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            parameters: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The declared parameters, derived from the template on first use.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        self.parameters.get_or_init(|| {
            let mut parameters = Vec::new();
            let mut seen = HashSet::new();
            for token in self.template.split_whitespace() {
                if !token.starts_with(':') {
                    continue;
                }
                match Parameter::from_token(token) {
                    Some(parameter) => {
                        if !seen.insert(parameter.id.clone()) {
                            warn!(
                                template = %self.template,
                                id = %parameter.id,
                                "duplicate parameter id in route template"
                            );
                            continue;
                        }
                        parameters.push(parameter);
                    },
                    None => warn!(
                        template = %self.template,
                        token,
                        "malformed parameter token in route template"
                    ),
                }
            }
            parameters
        })
    }

    /// Test whether this route's invocation is a prefix of `text`
    /// (case-insensitive, with a trailing-separator guard so `"event"`
    /// never matches `"events"`). The comparison is word-by-word, so any
    /// run of whitespace between invocation words matches.
    #[must_use]
    pub fn match_invocation<'a>(&self, text: &'a str) -> Option<RouteMatch<'a>> {
        let mut words = self
            .template
            .split_whitespace()
            .take_while(|token| !token.starts_with(':'))
            .peekable();
        words.peek()?;

        let mut remaining = text;
        let mut matched_len = 0;
        for word in words {
            let trimmed = remaining.trim_start();
            matched_len += remaining.len() - trimmed.len();
            let head = trimmed.get(..word.len())?;
            if !head.eq_ignore_ascii_case(word) {
                return None;
            }
            remaining = &trimmed[word.len()..];
            matched_len += word.len();
            // separator guard: each word must end at a word boundary
            if !remaining.is_empty() && !remaining.starts_with(char::is_whitespace) {
                return None;
            }
        }
        Some(RouteMatch {
            matched_len,
            rest: remaining.trim_start(),
        })
    }
}
