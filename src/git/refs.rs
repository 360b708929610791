//! git::refs
//!
//! Reference enumeration through `git for-each-ref`.
//!
//! This layer only builds arguments; output lines are passed through as
//! rendered by git. [`parse_ref_entry`] is offered for the common
//! `%(objectname) %(refname)` format.

use super::lines::LineStream;
use super::process::InputMode;
use super::{Git, GitError};
use crate::core::types::ObjectId;

/// Format used when the caller does not supply one.
pub const DEFAULT_REF_FORMAT: &str = "%(objectname)";

/// Format understood by [`parse_ref_entry`].
pub const ID_AND_NAME_FORMAT: &str = "%(objectname) %(refname)";

/// A ref and the object it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    pub id: ObjectId,
    pub name: String,
}

/// Build the `for-each-ref` argument list.
///
/// An empty `format` leaves rendering to git's default.
pub fn for_each_ref_args(pattern: &str, format: &str) -> Vec<String> {
    let mut args = vec!["for-each-ref".to_string()];
    if !format.is_empty() {
        args.push("--format".to_string());
        args.push(format.to_string());
    }
    args.push(pattern.to_string());
    args
}

/// Parse a line rendered with [`ID_AND_NAME_FORMAT`].
pub fn parse_ref_entry(line: &str) -> Result<RefEntry, GitError> {
    let (id, name) = line
        .split_once(' ')
        .filter(|(_, name)| !name.is_empty())
        .ok_or_else(|| GitError::InvalidOid {
            oid: line.to_string(),
        })?;
    Ok(RefEntry {
        id: ObjectId::new(id)?,
        name: name.to_string(),
    })
}

impl Git {
    /// List refs matching `pattern`, each rendered with `format`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// for id in git.for_each_ref("refs/heads/", DEFAULT_REF_FORMAT)? {
    ///     println!("{}", id?);
    /// }
    /// ```
    pub fn for_each_ref(&self, pattern: &str, format: &str) -> Result<LineStream, GitError> {
        self.iter(for_each_ref_args(pattern, format), InputMode::NoInput)
    }

    /// List refs matching `pattern` as `(id, name)` pairs.
    pub fn list_refs(&self, pattern: &str) -> Result<Vec<RefEntry>, GitError> {
        self.with_lines(for_each_ref_args(pattern, ID_AND_NAME_FORMAT), |lines| {
            lines
                .map(|line| parse_ref_entry(&line?))
                .collect::<Result<Vec<_>, _>>()
        })
    }
}
