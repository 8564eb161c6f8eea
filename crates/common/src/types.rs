//! Chat-platform-agnostic message and reply types.
//!
//! The transport crate maps these to/from whatever the concrete platform
//! speaks; everything above the transport boundary works in these terms.

use serde::{Deserialize, Serialize};

// ── References ──────────────────────────────────────────────────────────────

/// A user as seen by the bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRef {
    pub id: String,
    pub name: String,
    /// Whether this account is a bot (the dispatcher ignores bot authors).
    #[serde(default)]
    pub is_bot: bool,
    /// Role IDs held by the user, used for permission-group membership.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserRef {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_bot: false,
            roles: Vec::new(),
        }
    }

    /// Platform mention syntax for this user.
    #[must_use]
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// A channel as seen by the bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: String,
    pub name: String,
}

impl ChannelRef {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Channels and users resolvable by name from where a message was sent.
///
/// Parameter parsers consult this for `channel-list` / `mention-list`
/// name lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageScope {
    pub channels: Vec<ChannelRef>,
    pub users: Vec<UserRef>,
}

/// One inbound chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub channel: ChannelRef,
    pub author: UserRef,
    pub text: String,
    #[serde(default)]
    pub scope: MessageScope,
}

impl ChatMessage {
    /// Cache key identifying this concrete message (`"<channel>.<message>"`).
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{}.{}", self.channel.id, self.id)
    }
}

// ── Reply payloads ──────────────────────────────────────────────────────────

/// A rich-content block attached to a reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// A file attached to a reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub data: Vec<u8>,
}

/// One renderable unit of a multi-page reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
    /// Reaction symbol that jumps directly to this page, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// An outgoing reply. Plain text, optionally decorated with rich content,
/// an attachment, or an ordered page list for paginated replies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<Page>,
}

impl Reply {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embed = Some(embed);
        self
    }

    /// A paginated reply. The visible text starts as the first page's text.
    #[must_use]
    pub fn paginated(pages: Vec<Page>) -> Self {
        let text = pages.first().map(|p| p.text.clone()).unwrap_or_default();
        let embed = pages.first().and_then(|p| p.embed.clone());
        Self {
            text,
            embed,
            attachment: None,
            pages,
        }
    }

    #[must_use]
    pub fn is_paginated(&self) -> bool {
        !self.pages.is_empty()
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginated_reply_starts_on_first_page() {
        let reply = Reply::paginated(vec![
            Page {
                text: "page one".into(),
                ..Page::default()
            },
            Page {
                text: "page two".into(),
                ..Page::default()
            },
        ]);
        assert_eq!(reply.text, "page one");
        assert!(reply.is_paginated());
    }

    #[test]
    fn mention_syntax() {
        let user = UserRef::new("42", "ada");
        assert_eq!(user.mention(), "<@42>");
    }

    #[test]
    fn cache_key_joins_channel_and_message() {
        let msg = ChatMessage {
            id: "9".into(),
            channel: ChannelRef::new("7", "general"),
            author: UserRef::new("1", "ada"),
            text: "hi".into(),
            scope: MessageScope::default(),
        };
        assert_eq!(msg.cache_key(), "7.9");
    }
}
