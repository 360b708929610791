//! git::interface
//!
//! The [`Git`] client and its error type.
//!
//! A `Git` value is an explicit client for one repository. It owns its own
//! persistent `cat-file --batch` session and its own notes depth cache, so
//! independent clients (and tests) never share hidden process-wide state.
//!
//! # Error Handling
//!
//! Git failures are categorized into typed variants:
//! - [`GitError::Launch`]: the worker executable could not be started
//! - [`GitError::ProtocolDesync`]: the batch worker answered with the wrong type
//! - [`GitError::MalformedTreeLine`]: `ls-tree` output could not be parsed
//! - [`GitError::CommandFailed`]: a one-shot worker exited unsuccessfully
//!
//! A missing object is not an error: fetches return `Ok(None)`.
//!
//! # Example
//!
//! ```ignore
//! use gitpipe::core::types::ObjectKind;
//! use gitpipe::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! for entry in git.ls_tree("HEAD", "", true)? {
//!     let entry = entry?;
//!     println!("{} {}", entry.id.short(7), entry.path);
//! }
//! let readme = git.cat_file(ObjectKind::Blob, "HEAD:README.md")?;
//! ```

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

use super::batch::BatchObjectReader;
use super::lines::LineStream;
use super::process::{InputMode, ProcessHandle};
use crate::core::config::Config;
use crate::core::types::{ObjectId, ObjectKind, TypeError};
use crate::notes::NotesIndex;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The worker executable could not be started.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        /// Program that was being launched
        program: String,
        source: io::Error,
    },

    /// Reading from or writing to a worker failed.
    #[error("i/o error talking to worker [{pid}]: {source}")]
    Io { pid: u32, source: io::Error },

    /// The worker was already waited on.
    #[error("worker [{pid}] has already been reaped")]
    AlreadyReaped { pid: u32 },

    /// Stdin was not retained for this worker, or has been closed.
    #[error("stdin of worker [{pid}] is not open")]
    StdinClosed { pid: u32 },

    /// Output ended in the middle of a protocol exchange.
    #[error("worker [{pid}] closed its output while reading {context}")]
    UnexpectedEof {
        pid: u32,
        /// What was being read when output ended
        context: &'static str,
    },

    /// A one-shot worker exited unsuccessfully.
    #[error("'{command}' failed: {status}")]
    CommandFailed { command: String, status: ExitStatus },

    /// Worker output was not valid UTF-8.
    #[error("worker [{pid}] produced output that is not valid UTF-8")]
    InvalidUtf8 { pid: u32 },

    /// An `ls-tree` line did not have the `<mode> <type> <id>\t<path>` shape.
    #[error("malformed tree line: {line:?}")]
    MalformedTreeLine { line: String },

    /// A `cat-file --batch` header could not be parsed.
    #[error("malformed cat-file header: {line:?}")]
    MalformedHeader { line: String },

    /// The batch worker answered with a type other than the one requested.
    ///
    /// The channel can no longer be trusted; the session is torn down.
    #[error("cat-file out of sync: requested {requested} for '{spec}', got header {header:?}")]
    ProtocolDesync {
        spec: String,
        requested: ObjectKind,
        header: String,
    },

    /// The object name matched more than one object.
    #[error("ambiguous object name: {spec}")]
    AmbiguousObject { spec: String },

    /// The object name cannot be sent over the batch protocol.
    #[error("invalid object name: {spec:?}")]
    InvalidObjectName { spec: String },

    /// An object type token git is not known to produce.
    #[error("unknown object type: {kind}")]
    UnknownObjectKind { kind: String },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid { oid: String },

    /// The directory is not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo { path: PathBuf },
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(oid) => GitError::InvalidOid { oid },
            TypeError::UnknownKind(kind) => GitError::UnknownObjectKind { kind },
        }
    }
}

/// The Git client.
///
/// Every worker process is spawned with `repo_dir` as its working directory.
/// The batch session is started on first use and closed by [`Git::close`] or
/// when the client is dropped.
pub struct Git {
    program: String,
    repo_dir: PathBuf,
    git_dir: PathBuf,
    batch: BatchObjectReader,
    notes: NotesIndex,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("program", &self.program)
            .field("repo_dir", &self.repo_dir)
            .field("batch_open", &self.batch.is_open())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Opening
    // =========================================================================

    /// Open the repository containing `path`, using configuration from the
    /// default locations.
    ///
    /// The git directory is resolved first, with the globally configured
    /// binary, and the repo config is then read from inside it.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if `git rev-parse` does not find a repository
    /// - [`GitError::Launch`] if git cannot be started
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let global = Config::load(None).unwrap_or_else(|e| {
            tracing::warn!("ignoring unreadable config: {}", e);
            Config::default()
        });
        let git_dir = resolve_git_dir(global.git_binary(), path)?;

        let config = Config::load(Some(&git_dir)).unwrap_or_else(|e| {
            tracing::warn!("ignoring unreadable config: {}", e);
            global
        });
        Ok(Self::assemble(path, git_dir, &config))
    }

    /// Open the repository containing `path` with an explicit configuration.
    pub fn with_config(path: &Path, config: &Config) -> Result<Self, GitError> {
        let git_dir = resolve_git_dir(config.git_binary(), path)?;
        Ok(Self::assemble(path, git_dir, config))
    }

    fn assemble(path: &Path, git_dir: PathBuf, config: &Config) -> Self {
        let program = config.git_binary().to_string();
        Self {
            batch: BatchObjectReader::new(&program, Some(path)),
            notes: NotesIndex::new(config.notes_namespace()),
            program,
            repo_dir: path.to_path_buf(),
            git_dir,
        }
    }

    /// Directory worker processes run in.
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Absolute path of the repository's git directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    // =========================================================================
    // Raw invocation
    // =========================================================================

    /// Start `git <args>` and return the raw process handle.
    pub fn spawn<I, S>(&self, args: I, input: InputMode) -> Result<ProcessHandle, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        ProcessHandle::start(&self.program, args, input, Some(&self.repo_dir))
    }

    /// Start `git <args>` and stream its output lines.
    pub fn iter<I, S>(&self, args: I, input: InputMode) -> Result<LineStream, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Ok(LineStream::new(self.spawn(args, input)?))
    }

    /// Run `git <args>` to completion and collect every output line.
    pub fn run<I, S>(&self, args: I) -> Result<Vec<String>, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.iter(args, InputMode::NoInput)?.collect()
    }

    /// Run `git <args>` and hand the line stream to `f`.
    ///
    /// The worker is reaped when `f` returns, whether it consumed every line,
    /// stopped early, or failed.
    pub fn with_lines<I, S, T, F>(&self, args: I, f: F) -> Result<T, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
        F: FnOnce(&mut LineStream) -> Result<T, GitError>,
    {
        let mut stream = self.iter(args, InputMode::NoInput)?;
        let result = f(&mut stream);
        let closed = stream.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    // =========================================================================
    // Objects and notes
    // =========================================================================

    /// Fetch an object's content through the persistent batch session.
    ///
    /// `spec` is anything `cat-file` accepts: an id, `<rev>:<path>`, ...
    /// Returns `Ok(None)` if the object does not exist.
    pub fn cat_file(&self, kind: ObjectKind, spec: &str) -> Result<Option<Vec<u8>>, GitError> {
        self.batch.fetch(kind, spec)
    }

    /// Read the note attached to `target` in `notes_ref`.
    ///
    /// Short ref names are qualified with the configured notes namespace.
    pub fn read_note(
        &self,
        notes_ref: &str,
        target: &ObjectId,
    ) -> Result<Option<Vec<u8>>, GitError> {
        self.notes.read_note(&self.batch, notes_ref, target)
    }

    /// The batch reader backing [`cat_file`](Self::cat_file).
    pub fn batch(&self) -> &BatchObjectReader {
        &self.batch
    }

    /// The notes index backing [`read_note`](Self::read_note).
    pub fn notes(&self) -> &NotesIndex {
        &self.notes
    }

    /// Close the batch session, waiting for the worker to exit.
    ///
    /// Idempotent; a later fetch starts a fresh session.
    pub fn close(&self) -> Result<(), GitError> {
        self.batch.close()
    }
}

/// Ask `program` for the absolute git directory of the repository at `path`.
fn resolve_git_dir(program: &str, path: &Path) -> Result<PathBuf, GitError> {
    let handle = ProcessHandle::start(
        program,
        ["rev-parse", "--absolute-git-dir"],
        InputMode::NoInput,
        Some(path),
    )?;
    let lines: Result<Vec<String>, GitError> = LineStream::new(handle).collect();
    let git_dir = match lines {
        Ok(lines) => lines.into_iter().next(),
        Err(GitError::CommandFailed { .. }) => None,
        Err(e) => return Err(e),
    };
    git_dir.map(PathBuf::from).ok_or_else(|| GitError::NotARepo {
        path: path.to_path_buf(),
    })
}
