//! Entry validity rules
//!
//! An entry is valid when both checks pass:
//! - context: its path prefix matches the current path segment by segment
//! - expiry: its expiry instant is not before now (inclusive)

use crate::entry::{Entry, Timestamp};

/// Non-empty "/"-separated segments of a path
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Check whether `context` is a segment prefix of `current_path`
///
/// Empty segments are ignored, so `/a//b/` and `a/b` are the same path.
/// Comparison is case-sensitive.
pub fn context_matches(context: Option<&str>, current_path: &str) -> bool {
    let Some(context) = context else {
        return true;
    };
    let wanted: Vec<&str> = segments(context).collect();
    let actual: Vec<&str> = segments(current_path).collect();
    if actual.len() < wanted.len() {
        return false;
    }
    wanted.iter().zip(&actual).all(|(w, a)| w == a)
}

/// Check an expiry against `now`; an entry expiring exactly now is still live
pub fn not_expired(expires_at: Option<Timestamp>, now: Timestamp) -> bool {
    expires_at.is_none_or(|at| at >= now)
}

impl Entry {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        !not_expired(self.expires_at(), now)
    }

    /// Full validity: context check and expiry check
    pub fn is_valid(&self, current_path: &str, now: Timestamp) -> bool {
        match self {
            Entry::Plain(_) => true,
            Entry::Scoped {
                context,
                expires_at,
                ..
            } => context_matches(context.as_deref(), current_path) && not_expired(*expires_at, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_context_matches_everywhere() {
        assert!(context_matches(None, "/"));
        assert!(context_matches(None, "/deep/nested/path"));
    }

    #[test]
    fn test_context_prefix() {
        assert!(context_matches(Some("/admin"), "/admin"));
        assert!(context_matches(Some("/admin"), "/admin/users/7"));
        assert!(!context_matches(Some("/admin"), "/home"));
        assert!(!context_matches(Some("/admin/users"), "/admin"));
    }

    #[test]
    fn test_context_ignores_empty_segments() {
        assert!(context_matches(Some("admin//users/"), "/admin/users"));
        assert!(context_matches(Some("/"), "/anything"));
        assert!(context_matches(Some(""), "/"));
    }

    #[test]
    fn test_context_is_segment_wise_and_case_sensitive() {
        assert!(!context_matches(Some("/adm"), "/admin"));
        assert!(!context_matches(Some("/Admin"), "/admin"));
        assert!(!context_matches(Some("/*"), "/admin"));
    }

    #[test]
    fn test_expiry_inclusive() {
        let now = Timestamp::from_millis(1_000);
        assert!(not_expired(None, now));
        assert!(not_expired(Some(now), now));
        assert!(not_expired(Some(now.offset_millis(1)), now));
        assert!(!not_expired(Some(now.offset_millis(-1)), now));
    }

    #[test]
    fn test_plain_entry_always_valid() {
        let entry = Entry::Plain(json!("raw"));
        assert!(entry.is_valid("/x", Timestamp::from_millis(i64::MAX)));
        assert!(!entry.is_expired(Timestamp::from_millis(i64::MAX)));
    }

    #[test]
    fn test_scoped_entry_needs_both_checks() {
        let now = Timestamp::from_millis(500);
        let entry = Entry::Scoped {
            value: json!(1),
            context: Some("/shop".to_string()),
            expires_at: Some(Timestamp::from_millis(400)),
        };
        assert!(entry.is_expired(now));
        assert!(!entry.is_valid("/shop", now));
        assert!(entry.is_valid("/shop", Timestamp::from_millis(400)));
        assert!(!entry.is_valid("/cart", Timestamp::from_millis(400)));
    }
}
