//! git::tree
//!
//! Tree listing through `git ls-tree`.
//!
//! Each output line has the shape `<mode> SP <type> SP <id> TAB <path>`.
//! Paths may contain spaces but never tabs, so a line is split on the first
//! two spaces and then on the first tab. Anything that does not fit is a
//! fatal parse error; no record is ever silently skipped.

use std::process::ExitStatus;

use tracing::warn;

use super::lines::LineStream;
use super::process::InputMode;
use super::{Git, GitError};
use crate::core::types::{ObjectId, ObjectKind, TreeEntry};

/// Build the `ls-tree` argument list.
pub fn ls_tree_args(treeish: &str, path: &str, recursive: bool) -> Vec<String> {
    let mut args = vec!["ls-tree".to_string()];
    if recursive {
        args.push("-r".to_string());
    }
    args.push(treeish.to_string());
    if !path.is_empty() {
        args.push("--".to_string());
        args.push(path.to_string());
    }
    args
}

/// Parse one `ls-tree` output line.
///
/// # Example
///
/// ```
/// use gitpipe::git::parse_tree_line;
///
/// let entry = parse_tree_line(
///     "100644 blob e69de29bb2d1d6434b8b29ae775ad8c2e48c5391\tmy file.txt",
/// ).unwrap();
/// assert_eq!(entry.mode, "100644");
/// assert_eq!(entry.path, "my file.txt");
///
/// assert!(parse_tree_line("100644 blob e69de29bb2d1d6434b8b29ae775ad8c2e48c5391").is_err());
/// ```
pub fn parse_tree_line(line: &str) -> Result<TreeEntry, GitError> {
    let malformed = || GitError::MalformedTreeLine {
        line: line.to_string(),
    };

    let mut fields = line.splitn(3, ' ');
    let (Some(mode), Some(kind), Some(rest)) = (fields.next(), fields.next(), fields.next()) else {
        return Err(malformed());
    };
    let (id, path) = rest.split_once('\t').ok_or_else(malformed)?;

    if mode.is_empty() || path.is_empty() {
        return Err(malformed());
    }
    let kind = match kind.parse::<ObjectKind>() {
        Ok(ObjectKind::Tag) | Err(_) => return Err(malformed()),
        Ok(kind) => kind,
    };
    let id = ObjectId::new(id).map_err(|_| malformed())?;

    Ok(TreeEntry {
        mode: mode.to_string(),
        kind,
        id,
        path: path.to_string(),
    })
}

/// Parsed entries of a tree listing.
///
/// Reaps the worker the same way its underlying [`LineStream`] does. The
/// first malformed line ends the listing: the worker is reaped and nothing
/// after the error is yielded.
#[derive(Debug)]
pub struct TreeEntries {
    lines: LineStream,
    done: bool,
}

impl TreeEntries {
    fn new(lines: LineStream) -> Self {
        Self { lines, done: false }
    }

    /// Stop reading and reap the worker.
    pub fn close(self) -> Result<ExitStatus, GitError> {
        self.lines.close()
    }
}

impl Iterator for TreeEntries {
    type Item = Result<TreeEntry, GitError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let parsed = match self.lines.next()? {
            Ok(line) => parse_tree_line(&line),
            Err(e) => Err(e),
        };
        if parsed.is_err() {
            self.done = true;
            if let Err(e) = self.lines.stop() {
                warn!(pid = self.lines.pid(), "failed to reap ls-tree worker: {}", e);
            }
        }
        Some(parsed)
    }
}

impl Git {
    /// List the entries of `treeish`, optionally limited to `path`.
    ///
    /// An empty `path` lists the whole tree. With `recursive`, subtrees are
    /// descended into and only their leaves are listed.
    pub fn ls_tree(
        &self,
        treeish: &str,
        path: &str,
        recursive: bool,
    ) -> Result<TreeEntries, GitError> {
        let lines = self.iter(ls_tree_args(treeish, path, recursive), InputMode::NoInput)?;
        Ok(TreeEntries::new(lines))
    }
}
