//! The opaque session identifier shared by every transport and the registry.

use std::sync::Arc;

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// An opaque, unguessable session identifier (`Mcp-Session-Id` on HTTP).
///
/// Generated ids carry 32 URL-safe characters (~192 bits of entropy),
/// comfortably above the 128-bit floor MCP session ids require. The stdio
/// transport's single logical session uses the reserved empty-string id
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Arc<str>);

impl SessionId {
    /// Generate a fresh, random session id.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let s: String = (0..32)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        Self(s.into())
    }

    /// The reserved id for stdio's single, implicit session.
    #[must_use]
    pub fn root() -> Self {
        Self("".into())
    }

    /// Whether this is the stdio root session.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the id as a plain string slice (for headers, map keys, ...).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn generated_ids_have_at_least_128_bits_of_entropy() {
        let id = SessionId::generate();
        // log2(64) = 6 bits per char; 32 chars => 192 bits.
        assert_eq!(id.as_str().len(), 32);
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn root_is_the_empty_string() {
        assert!(SessionId::root().is_root());
        assert_eq!(SessionId::root().as_str(), "");
    }
}
