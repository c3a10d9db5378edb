//! Newtype wrappers for cache keys and digests.
//!
//! Both serialize as plain strings so reports stay readable as JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Length of a hex-encoded SHA-384 digest.
pub const DIGEST_HEX_LEN: usize = 96;

/// Characters that cannot appear in a cache key, since keys are embedded as
/// quoted literals inside a brace-delimited block.
const FORBIDDEN_KEY_CHARS: &[char] = &['"', '\'', '\\', '{', '}', '\n', '\r'];

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// The exact string the service worker uses to look up a cached resource,
    /// e.g. `/dist/bundle.js?v=1.0.0`.
    CacheKey
);

string_newtype!(
    /// Lowercase hex SHA-384 digest of a file's bytes.
    Digest
);

impl CacheKey {
    /// Returns the first character that makes this key unembeddable, if any.
    pub fn invalid_char(&self) -> Option<char> {
        self.0.chars().find(|c| FORBIDDEN_KEY_CHARS.contains(c))
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.invalid_char().is_none()
    }
}

impl Digest {
    /// True when the digest has the SHA-384 length and only lowercase hex digits.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == DIGEST_HEX_LEN
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}
