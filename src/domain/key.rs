//! Throttle bucket identity.
//!
//! Two log calls are duplicates of each other when they share a level and an
//! exact message. Fields and context are deliberately not part of the key:
//! only the first occurrence's fields survive into the summary.

use crate::domain::level::Level;
use std::fmt;
use std::sync::Arc;

/// Identity of a deduplication bucket.
///
/// The message is held as `Arc<str>` so summaries can carry the key without
/// copying the message again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThrottleKey {
    level: Level,
    message: Arc<str>,
}

impl ThrottleKey {
    pub fn new(level: Level, message: &str) -> Self {
        Self {
            level,
            message: Arc::from(message),
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ThrottleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identical_calls_produce_same_key() {
        let k1 = ThrottleKey::new(Level::Info, "User logged in");
        let k2 = ThrottleKey::new(Level::Info, "User logged in");
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_different_levels_produce_different_keys() {
        let k1 = ThrottleKey::new(Level::Info, "Message");
        let k2 = ThrottleKey::new(Level::Warn, "Message");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_messages_compare_exactly() {
        let mut keys = HashSet::new();
        for message in ["test", "tset", "TEST", "test ", " test", "test\0", ""] {
            assert!(
                keys.insert(ThrottleKey::new(Level::Info, message)),
                "duplicate key for {:?}",
                message
            );
        }
    }

    #[test]
    fn test_unicode_normalization_is_not_applied() {
        let composed = ThrottleKey::new(Level::Info, "caf\u{e9}");
        let decomposed = ThrottleKey::new(Level::Info, "cafe\u{301}");
        assert_ne!(composed, decomposed);
    }

    #[test]
    fn test_display_format() {
        let key = ThrottleKey::new(Level::Warn, "disk full");
        assert_eq!(key.to_string(), "[WARN] disk full");
    }
}
