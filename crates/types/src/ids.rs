//! Newtype wrappers for session identifiers.
//!
//! A [`SessionId`] is the only lookup and authorization key for an edit
//! session, so it must never be guessable from another session's id. It wraps
//! a random (v4) UUID rather than a counter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// An opaque, high-entropy identifier for an edit session.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the compact hexadecimal form used in paths and URLs.
    pub fn as_simple(&self) -> String {
        self.0.simple().to_string()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_parses_back() {
        let id = SessionId::generate();
        let text = id.to_string();
        assert_eq!(text.len(), 32);
        assert!(!text.contains('-'));
        assert_eq!(text.parse::<SessionId>().unwrap(), id);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("../../etc/passwd".parse::<SessionId>().is_err());
        assert!("".parse::<SessionId>().is_err());
    }
}
