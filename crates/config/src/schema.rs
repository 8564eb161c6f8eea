//! Config schema types (bot, throttle, auto-remove, caching, permissions,
//! startup).

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    pub bot: BotConfig,
    pub throttle: ThrottleConfig,
    pub auto_remove: AutoRemoveConfig,
    pub cache: ResultCacheConfig,
    pub startup: StartupConfig,
    /// Permission groups, evaluated in declaration order. An implicit
    /// `default` group (everyone, no patterns) is appended at runtime.
    #[serde(rename = "permission-group")]
    pub permission_groups: Vec<PermissionGroup>,
}

/// Bot identity and invocation syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Command prefix stripped from inbound messages. Messages that do not
    /// start with it are ignored.
    pub prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self { prefix: "!".into() }
    }
}

/// What a throttle entry is keyed by.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThrottleScope {
    /// One bucket per invoking user.
    #[default]
    User,
    /// One bucket per command, shared by all users.
    Command,
}

/// Throttle middleware configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub scope: ThrottleScope,
    /// How long a throttle entry lives.
    pub ttl_secs: u64,
    /// Delay before a posted throttle notice is deleted.
    pub notice_delete_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            scope: ThrottleScope::User,
            ttl_secs: 30,
            notice_delete_secs: 5,
        }
    }
}

/// Auto-remove middleware defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoRemoveConfig {
    /// Delay before the originating request message is deleted.
    pub request_delay_secs: u64,
    /// Delay before the posted reply is deleted.
    pub reply_delay_secs: u64,
}

impl Default for AutoRemoveConfig {
    fn default() -> Self {
        Self {
            request_delay_secs: 0,
            reply_delay_secs: 30,
        }
    }
}

/// Result-caching middleware defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultCacheConfig {
    pub ttl_secs: u64,
}

impl Default for ResultCacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 60 }
    }
}

/// Startup connection retry policy for cache and store collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub retry_delay_secs: u64,
    pub retry_attempts: u32,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            retry_delay_secs: 5,
            retry_attempts: 10,
        }
    }
}

/// One named permission group.
///
/// Membership: explicit `user_ids`, or a non-empty intersection with
/// `role_ids`. A group with neither list matches every user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionGroup {
    pub name: String,
    #[serde(rename = "user-ids")]
    pub user_ids: Vec<String>,
    #[serde(rename = "role-ids")]
    pub role_ids: Vec<String>,
    /// Permission-id patterns this group may run.
    pub whitelist: Vec<String>,
    /// Permission-id patterns this group is denied. Checked before whitelist.
    pub blacklist: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = HeraldConfig::default();
        assert_eq!(cfg.bot.prefix, "!");
        assert_eq!(cfg.throttle.ttl_secs, 30);
        assert_eq!(cfg.startup.retry_attempts, 10);
        assert!(cfg.permission_groups.is_empty());
    }

    #[test]
    fn permission_groups_keep_declaration_order() {
        let cfg: HeraldConfig = toml::from_str(
            r#"
            [[permission-group]]
            name = "mods"
            role-ids = ["r1"]
            whitelist = ["admin.*"]

            [[permission-group]]
            name = "everyone"
            blacklist = ["admin.*"]
            "#,
        )
        .unwrap();
        let names: Vec<_> = cfg.permission_groups.iter().map(|g| &g.name).collect();
        assert_eq!(names, ["mods", "everyone"]);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: HeraldConfig = toml::from_str("[bot]\nprefix = \"?\"\n").unwrap();
        assert_eq!(cfg.bot.prefix, "?");
        assert_eq!(cfg.throttle.notice_delete_secs, 5);
    }
}
