//! Typed route parameters: declaration, tokenizing, and binding.
//!
//! A route template embeds parameter tokens as `:name`, `:name?` (optional),
//! or `:name:type` (typed). The text remaining after the matched invocation
//! is tokenized into positional arguments (double-quoted segments count as
//! one token, quotes escapable with `\`), then bound left to right. The last
//! declared parameter is always greedy: it absorbs every remaining token,
//! joined with single spaces, so a trailing parameter can capture free-form
//! text.
//!
//! Missing tokens for required parameters are not a parse error; they bind
//! as [`ParamValue::Missing`] and are rejected downstream by the
//! parameter-count middleware.

use std::collections::HashMap;

use {
    chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime, Utc},
    herald_common::types::{ChannelRef, MessageScope, UserRef},
    serde::{Deserialize, Serialize},
    tracing::warn,
};

// ── Declaration ─────────────────────────────────────────────────────────────

/// How a parameter's raw token(s) are interpreted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ParamKind {
    /// Raw text, no interpretation.
    #[default]
    Plain,
    /// A point in time: ISO date/datetime or a relative phrase.
    Date,
    /// One or more channel references (`<#id>`, a literal id, or a name).
    ChannelList,
    /// One or more user references (`<@id>`, a literal id, or a name).
    MentionList,
}

impl ParamKind {
    /// Parse a template type tag. Unknown tags fall back to plain with a
    /// warning, because templates are developer input and routes must still
    /// construct.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "plain" | "string" => Self::Plain,
            "date" => Self::Date,
            "channel-list" | "channels" => Self::ChannelList,
            "mention-list" | "mentions" => Self::MentionList,
            other => {
                warn!(tag = other, "unknown parameter type tag, treating as plain");
                Self::Plain
            },
        }
    }
}

/// A typed, possibly-optional named slot declared in a route template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameter {
    pub id: String,
    pub optional: bool,
    pub kind: ParamKind,
}

impl Parameter {
    /// Parse one `:token` from a template. `token` includes the leading `:`.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let spec = token.strip_prefix(':')?;
        let (spec, optional) = match spec.strip_suffix('?') {
            Some(rest) => (rest, true),
            None => (spec, false),
        };
        let (id, kind) = match spec.split_once(':') {
            Some((id, tag)) => (id, ParamKind::from_tag(tag)),
            None => (spec, ParamKind::Plain),
        };
        if id.is_empty() {
            return None;
        }
        Some(Self {
            id: id.to_string(),
            optional,
            kind,
        })
    }
}

// ── Values ──────────────────────────────────────────────────────────────────

/// A bound parameter value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamValue {
    /// No token was supplied for this parameter.
    Missing,
    /// A token was supplied but the typed parser rejected it.
    Invalid { raw: String },
    Text(String),
    Date(DateTime<Utc>),
    Channels(Vec<ChannelRef>),
    Mentions(Vec<UserRef>),
}

impl ParamValue {
    /// Whether this binding satisfies a required parameter.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        !matches!(self, Self::Missing | Self::Invalid { .. })
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }
}

// ── Tokenizing ──────────────────────────────────────────────────────────────

/// Split argument text into positional tokens. Double-quoted segments form a
/// single token; `\"` and `\\` are unescaped inside quotes.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for ch in text.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => {
                if in_quotes {
                    tokens.push(std::mem::take(&mut current));
                    in_quotes = false;
                } else {
                    in_quotes = true;
                }
            },
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            },
            c => current.push(c),
        }
    }
    if !current.is_empty() || in_quotes {
        tokens.push(current);
    }
    tokens
}

// ── Binding ─────────────────────────────────────────────────────────────────

/// Bind tokenized arguments to a declared parameter list.
///
/// Each parameter consumes one token in order, except the last declared
/// parameter, which absorbs all remaining tokens joined with single spaces.
#[must_use]
pub fn bind(
    parameters: &[Parameter],
    text: &str,
    scope: &MessageScope,
    now: DateTime<Utc>,
) -> HashMap<String, ParamValue> {
    let tokens = tokenize(text);
    let mut values = HashMap::new();

    for (idx, parameter) in parameters.iter().enumerate() {
        let last = idx + 1 == parameters.len();
        let raw = if last {
            let rest = tokens.get(idx..).unwrap_or_default();
            if rest.is_empty() {
                None
            } else {
                Some(rest.join(" "))
            }
        } else {
            tokens.get(idx).cloned()
        };

        let value = match raw {
            None => ParamValue::Missing,
            Some(raw) => interpret(parameter.kind, &raw, scope, now),
        };
        values.insert(parameter.id.clone(), value);
    }
    values
}

fn interpret(kind: ParamKind, raw: &str, scope: &MessageScope, now: DateTime<Utc>) -> ParamValue {
    match kind {
        ParamKind::Plain => ParamValue::Text(raw.to_string()),
        ParamKind::Date => match parse_date(raw, now) {
            Some(date) => ParamValue::Date(date),
            None => ParamValue::Invalid {
                raw: raw.to_string(),
            },
        },
        ParamKind::ChannelList => {
            let channels = parse_channels(raw, scope);
            if channels.is_empty() {
                ParamValue::Invalid {
                    raw: raw.to_string(),
                }
            } else {
                ParamValue::Channels(channels)
            }
        },
        ParamKind::MentionList => {
            let users = parse_mentions(raw, scope);
            if users.is_empty() {
                ParamValue::Invalid {
                    raw: raw.to_string(),
                }
            } else {
                ParamValue::Mentions(users)
            }
        },
    }
}

// ── Typed parsers ───────────────────────────────────────────────────────────

/// Parse a date expression relative to `now`.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM`, `YYYY-MM-DD`, `HH:MM` (today),
/// `today`, `tomorrow`, and `in N minutes|hours|days`.
#[must_use]
pub fn parse_date(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Some(parsed.and_utc());
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return parsed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    if let Ok(parsed) = NaiveTime::parse_from_str(raw, "%H:%M") {
        return Some(now.date_naive().and_time(parsed).and_utc());
    }

    match raw.to_lowercase().as_str() {
        "now" => return Some(now),
        "today" => return now.date_naive().and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
        "tomorrow" => {
            return (now.date_naive() + ChronoDuration::days(1))
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc());
        },
        _ => {},
    }

    // "in N minutes|hours|days"
    let mut words = raw.split_whitespace();
    if words.next()?.eq_ignore_ascii_case("in") {
        let amount: i64 = words.next()?.parse().ok()?;
        let offset = match words.next()?.to_lowercase().as_str() {
            "minute" | "minutes" | "min" | "mins" => ChronoDuration::minutes(amount),
            "hour" | "hours" => ChronoDuration::hours(amount),
            "day" | "days" => ChronoDuration::days(amount),
            _ => return None,
        };
        return Some(now + offset);
    }
    None
}

/// Resolve channel references from a token: `<#id>`, a literal id, or a
/// case-insensitive name lookup. Separators are whitespace and commas;
/// unresolvable entries are skipped.
#[must_use]
pub fn parse_channels(raw: &str, scope: &MessageScope) -> Vec<ChannelRef> {
    raw.split([' ', ','])
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| resolve_channel(entry, scope))
        .collect()
}

fn resolve_channel(entry: &str, scope: &MessageScope) -> Option<ChannelRef> {
    if let Some(id) = entry.strip_prefix("<#").and_then(|e| e.strip_suffix('>')) {
        return scope
            .channels
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .or_else(|| Some(ChannelRef::new(id, "")));
    }
    if entry.chars().all(|c| c.is_ascii_digit()) {
        return scope
            .channels
            .iter()
            .find(|c| c.id == entry)
            .cloned()
            .or_else(|| Some(ChannelRef::new(entry, "")));
    }
    let name = entry.strip_prefix('#').unwrap_or(entry);
    scope
        .channels
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .cloned()
}

/// Resolve user references from a token: `<@id>` / `<@!id>`, a literal id,
/// or a case-insensitive name lookup.
#[must_use]
pub fn parse_mentions(raw: &str, scope: &MessageScope) -> Vec<UserRef> {
    raw.split([' ', ','])
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| resolve_user(entry, scope))
        .collect()
}

fn resolve_user(entry: &str, scope: &MessageScope) -> Option<UserRef> {
    if let Some(id) = entry
        .strip_prefix("<@")
        .map(|e| e.strip_prefix('!').unwrap_or(e))
        .and_then(|e| e.strip_suffix('>'))
    {
        return scope
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .or_else(|| Some(UserRef::new(id, "")));
    }
    if entry.chars().all(|c| c.is_ascii_digit()) {
        return scope
            .users
            .iter()
            .find(|u| u.id == entry)
            .cloned()
            .or_else(|| Some(UserRef::new(entry, "")));
    }
    let name = entry.strip_prefix('@').unwrap_or(entry);
    scope
        .users
        .iter()
        .find(|u| u.name.eq_ignore_ascii_case(name))
        .cloned()
}
