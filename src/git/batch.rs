//! git::batch
//!
//! Persistent `git cat-file --batch` session.
//!
//! # Protocol
//!
//! The session is strictly half-duplex: one request is written, its full
//! response read, and only then may the next request go out.
//!
//! ```text
//! request:  <object-name> LF
//! response: <id> SP <type> SP <size> LF <contents:size bytes> LF
//!         | <object-name> SP missing LF
//!         | <object-name> SP ambiguous LF
//! ```
//!
//! There are no request identifiers, so concurrent callers are serialized by
//! a mutex around the whole exchange. A response whose type differs from the
//! one requested means the two ends disagree about where they are in the
//! stream; the session is killed rather than reused.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use super::process::{InputMode, ProcessHandle};
use super::GitError;
use crate::core::types::ObjectKind;

/// Lazily started, single `cat-file --batch` worker.
pub struct BatchObjectReader {
    program: String,
    cwd: Option<PathBuf>,
    session: Mutex<Option<BatchSession>>,
}

impl std::fmt::Debug for BatchObjectReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchObjectReader")
            .field("program", &self.program)
            .field("cwd", &self.cwd)
            .field("open", &self.is_open())
            .finish()
    }
}

impl BatchObjectReader {
    /// Create a reader; no process is started until the first fetch.
    pub fn new(program: &str, cwd: Option<&Path>) -> Self {
        Self {
            program: program.to_string(),
            cwd: cwd.map(Path::to_path_buf),
            session: Mutex::new(None),
        }
    }

    /// Whether a worker is currently running.
    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Process id of the running worker, if any.
    pub fn pid(&self) -> Option<u32> {
        self.lock().as_ref().map(|s| s.process.pid())
    }

    /// Fetch the contents of `spec`, which must be of type `kind`.
    ///
    /// Returns `Ok(None)` if git reports the object missing.
    ///
    /// # Errors
    ///
    /// - [`GitError::ProtocolDesync`] if git reports a different type; the
    ///   session is torn down and the next fetch starts a new one
    /// - [`GitError::AmbiguousObject`] if `spec` names several objects
    /// - [`GitError::InvalidObjectName`] if `spec` contains a newline
    /// - [`GitError::Launch`] if the worker cannot be started
    pub fn fetch(&self, kind: ObjectKind, spec: &str) -> Result<Option<Vec<u8>>, GitError> {
        if spec.is_empty() || spec.contains('\n') {
            return Err(GitError::InvalidObjectName {
                spec: spec.to_string(),
            });
        }

        let mut slot = self.lock();
        let mut session = match slot.take() {
            Some(session) => session,
            None => BatchSession::launch(&self.program, self.cwd.as_deref())?,
        };

        match session.request(kind, spec) {
            Ok(contents) => {
                *slot = Some(session);
                Ok(contents)
            }
            Err(e @ GitError::AmbiguousObject { .. }) => {
                *slot = Some(session);
                Err(e)
            }
            Err(e) => {
                warn!(
                    pid = session.process.pid(),
                    "tearing down cat-file session: {}", e
                );
                if let Err(kill_err) = session.process.terminate() {
                    warn!("failed to terminate cat-file worker: {}", kill_err);
                }
                Err(e)
            }
        }
    }

    /// Close stdin and wait for the worker to exit.
    ///
    /// Idempotent. A later [`fetch`](Self::fetch) starts a new worker.
    pub fn close(&self) -> Result<(), GitError> {
        let session = self.lock().take();
        if let Some(mut session) = session {
            session.process.wait()?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Option<BatchSession>> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A panic mid-exchange leaves the stream position unknown.
                let mut guard = poisoned.into_inner();
                if let Some(mut session) = guard.take() {
                    if let Err(e) = session.process.terminate() {
                        warn!("failed to terminate cat-file worker: {}", e);
                    }
                }
                self.session.clear_poison();
                guard
            }
        }
    }
}

impl Drop for BatchObjectReader {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to close cat-file session: {}", e);
        }
    }
}

/// The live connection to the worker.
struct BatchSession {
    process: ProcessHandle,
    header: Vec<u8>,
}

impl BatchSession {
    fn launch(program: &str, cwd: Option<&Path>) -> Result<Self, GitError> {
        let process =
            ProcessHandle::start(program, ["cat-file", "--batch"], InputMode::Persistent, cwd)?;
        Ok(Self {
            process,
            header: Vec::new(),
        })
    }

    fn request(&mut self, kind: ObjectKind, spec: &str) -> Result<Option<Vec<u8>>, GitError> {
        let pid = self.process.pid();

        let mut request = Vec::with_capacity(spec.len() + 1);
        request.extend_from_slice(spec.as_bytes());
        request.push(b'\n');
        self.process.write_all(&request)?;

        self.header.clear();
        if self.process.read_line(&mut self.header)? == 0 {
            return Err(GitError::UnexpectedEof {
                pid,
                context: "header",
            });
        }
        let header = String::from_utf8_lossy(&self.header);
        let header = header.trim_end_matches('\n');
        debug!(pid, "[{}] <= {}", pid, header);

        let size = match parse_header(header, spec, kind)? {
            Header::Missing => return Ok(None),
            Header::Found { size } => size,
        };

        let contents = self.process.read_sized(size, "object contents")?;
        let mut terminator = [0u8; 1];
        self.process.read_exact(&mut terminator, "object terminator")?;

        Ok(Some(contents))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Header {
    Missing,
    Found { size: usize },
}

/// Interpret one response header for a request of `kind` on `spec`.
///
/// The name echoed back in `missing`/`ambiguous` replies is the request
/// itself, which may contain spaces, so those are matched as suffixes.
fn parse_header(header: &str, spec: &str, kind: ObjectKind) -> Result<Header, GitError> {
    if header.ends_with(" missing") {
        return Ok(Header::Missing);
    }
    if header.ends_with(" ambiguous") {
        return Err(GitError::AmbiguousObject {
            spec: spec.to_string(),
        });
    }

    let fields: Vec<&str> = header.split_whitespace().collect();
    let &[_, returned, size] = fields.as_slice() else {
        return Err(GitError::MalformedHeader {
            line: header.to_string(),
        });
    };

    if returned != kind.as_str() {
        return Err(GitError::ProtocolDesync {
            spec: spec.to_string(),
            requested: kind,
            header: header.to_string(),
        });
    }

    let size = size.parse::<usize>().map_err(|_| GitError::MalformedHeader {
        line: header.to_string(),
    })?;
    Ok(Header::Found { size })
}
