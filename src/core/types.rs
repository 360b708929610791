//! core::types
//!
//! Strong types for the objects gitpipe reads out of a repository.
//!
//! # Types
//!
//! - [`ObjectId`] - Git object identifier (hex SHA)
//! - [`ObjectKind`] - Object type as reported by git (`blob`, `tree`, ...)
//! - [`TreeEntry`] - One entry of a `git ls-tree` listing
//!
//! # Validation
//!
//! Object ids are checked for format only (length and hex digits). Whether
//! an id actually names an object is for the store to decide.
//!
//! # Examples
//!
//! ```
//! use gitpipe::core::types::{ObjectId, ObjectKind};
//!
//! let id = ObjectId::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(id.short(7), "abc123d");
//!
//! assert_eq!("tree".parse::<ObjectKind>().unwrap(), ObjectKind::Tree);
//! assert!(ObjectId::new("not-a-sha").is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("unknown object type: {0}")]
    UnknownKind(String),
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// Unlike most places in git, ids are kept exactly as given: two ids are
/// equal only if their strings are equal.
///
/// # Example
///
/// ```
/// use gitpipe::core::types::ObjectId;
///
/// let id = ObjectId::new("abc123def4567890abc123def4567890abc12345").unwrap();
/// assert_eq!(id.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(id.short(4), "abc1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Create a new object id after checking its format.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not 40 or 64 hex digits.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the id.
    ///
    /// Returns the first `len` characters, or the full id if `len` is larger.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(format!(
                "object id must be hexadecimal: {oid}"
            )));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<ObjectId> for String {
    fn from(oid: ObjectId) -> Self {
        oid.0
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The type of a git object.
///
/// `ls-tree` only ever reports `blob`, `tree` and `commit` (submodules);
/// `tag` shows up when fetching annotated tags through `cat-file`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    /// The token git uses for this kind on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }
}

impl FromStr for ObjectKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            "tag" => Ok(ObjectKind::Tag),
            other => Err(TypeError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a tree listing.
///
/// Produced transiently while walking a tree; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// File mode as printed by git (e.g. `100644`, `040000`)
    pub mode: String,
    /// Object type of the entry
    pub kind: ObjectKind,
    /// Object the entry points at
    pub id: ObjectId,
    /// Path relative to the listed tree (may contain spaces, never tabs)
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod object_id {
        use super::*;

        #[test]
        fn valid_sha1() {
            let id = ObjectId::new("abc123def4567890abc123def4567890abc12345").unwrap();
            assert_eq!(id.as_str().len(), 40);
        }

        #[test]
        fn valid_sha256() {
            let hex = "a".repeat(64);
            assert!(ObjectId::new(hex).is_ok());
        }

        #[test]
        fn wrong_length_rejected() {
            assert!(ObjectId::new("abc123").is_err());
            assert!(ObjectId::new("").is_err());
        }

        #[test]
        fn non_hex_rejected() {
            let bad = "g".repeat(40);
            assert!(matches!(ObjectId::new(bad), Err(TypeError::InvalidOid(_))));
        }

        #[test]
        fn equality_is_exact() {
            let lower = ObjectId::new("abcdef0123456789abcdef0123456789abcdef01").unwrap();
            let upper = ObjectId::new("ABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap();
            assert_ne!(lower, upper);
        }

        #[test]
        fn short_clamps_to_length() {
            let id = ObjectId::new("abc123def4567890abc123def4567890abc12345").unwrap();
            assert_eq!(id.short(100), id.as_str());
        }
    }

    mod object_kind {
        use super::*;

        #[test]
        fn parse_known_kinds() {
            for kind in [
                ObjectKind::Blob,
                ObjectKind::Tree,
                ObjectKind::Commit,
                ObjectKind::Tag,
            ] {
                assert_eq!(kind.as_str().parse::<ObjectKind>().unwrap(), kind);
            }
        }

        #[test]
        fn unknown_kind_rejected() {
            assert_eq!(
                "missing".parse::<ObjectKind>(),
                Err(TypeError::UnknownKind("missing".into()))
            );
        }
    }
}
