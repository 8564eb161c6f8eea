//! Permission evaluation.
//!
//! Groups are walked in configuration-declaration order with an implicit
//! `default` group (everyone, no patterns) appended last. Per group:
//! a blacklist match denies, else a whitelist match allows, else the group
//! yields no verdict and the next group is consulted. The first verdict
//! wins; no verdict anywhere means **allow** — the system is permissive by
//! default.

use {herald_common::types::UserRef, herald_config::PermissionGroup, tracing::debug};

/// Pure evaluator from (user, permission id) to allow/deny.
pub struct PermissionEvaluator {
    groups: Vec<PermissionGroup>,
}

impl PermissionEvaluator {
    #[must_use]
    pub fn new(groups: Vec<PermissionGroup>) -> Self {
        Self { groups }
    }

    /// Check whether `user` may exercise `permission_id`
    /// (`"<module>.<command>[:<sub>]"`).
    #[must_use]
    pub fn is_allowed(&self, user: &UserRef, permission_id: &str) -> bool {
        for group in self.groups.iter().filter(|g| is_member(user, g)) {
            if let Some(verdict) = group_verdict(group, permission_id) {
                debug!(
                    user = %user.id,
                    permission_id,
                    group = %group.name,
                    verdict,
                    "permission verdict"
                );
                return verdict;
            }
        }
        // implicit default group carries no patterns, so: allow
        true
    }
}

/// A group with neither membership predicate matches every user.
fn is_member(user: &UserRef, group: &PermissionGroup) -> bool {
    if group.user_ids.is_empty() && group.role_ids.is_empty() {
        return true;
    }
    if group.user_ids.iter().any(|id| *id == user.id) {
        return true;
    }
    group.role_ids.iter().any(|role| user.roles.contains(role))
}

fn group_verdict(group: &PermissionGroup, permission_id: &str) -> Option<bool> {
    if matches_any(&group.blacklist, permission_id) {
        return Some(false);
    }
    if matches_any(&group.whitelist, permission_id) {
        return Some(true);
    }
    None
}

fn matches_any(patterns: &[String], permission_id: &str) -> bool {
    patterns
        .iter()
        .any(|pattern| pattern_matches(pattern, permission_id))
}

/// Match a permission pattern against an id. `.` is literal; `*` matches any
/// run of characters that does not cross a `:` boundary, so `module.*`
/// matches `module.cmd` but not `module.cmd:sub`.
#[must_use]
pub fn pattern_matches(pattern: &str, id: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let id = id.to_lowercase();
    matches_impl(&pattern, &id)
}

fn matches_impl(pattern: &str, id: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == id,
        Some((head, tail)) => {
            let Some(rest) = id.strip_prefix(head) else {
                return false;
            };
            // '*' consumes any ':'-free prefix of the remainder
            (0..=rest.len())
                .filter(|&k| rest.is_char_boundary(k))
                .filter(|&k| !rest[..k].contains(':'))
                .any(|k| matches_impl(tail, &rest[k..]))
        },
    }
}
