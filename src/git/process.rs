//! git::process
//!
//! Ownership of a single external worker process.
//!
//! A [`ProcessHandle`] owns the child, its stdin (when piped) and a buffered
//! reader over its stdout. Everything else in [`crate::git`] is built on it.
//!
//! # Input
//!
//! What goes to the worker's stdin is decided once, at start, through
//! [`InputMode`]. Fixed and streaming payloads are written on a dedicated
//! writer thread so a worker that produces output before consuming all of its
//! input cannot deadlock against us.
//!
//! # Reaping
//!
//! [`ProcessHandle::wait`] is the single point where the child is reaped.
//! It may only succeed once; a second call returns
//! [`GitError::AlreadyReaped`]. A handle dropped without being waited on
//! closes both pipes and reaps the child so no zombie is left behind.

use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::GitError;

/// Producer for a streamed stdin payload.
///
/// Every chunk is written in order; stdin is closed once the iterator is
/// exhausted.
pub type PayloadProducer = Box<dyn Iterator<Item = Vec<u8>> + Send>;

/// What to feed the worker on stdin.
pub enum InputMode {
    /// Stdin is connected to the null device.
    NoInput,
    /// Write these bytes, then close stdin.
    Fixed(Vec<u8>),
    /// Drain the producer, then close stdin.
    Streaming(PayloadProducer),
    /// Keep stdin open for a long-lived request/response session.
    Persistent,
}

impl std::fmt::Debug for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputMode::NoInput => f.write_str("NoInput"),
            InputMode::Fixed(data) => write!(f, "Fixed({} bytes)", data.len()),
            InputMode::Streaming(_) => f.write_str("Streaming(..)"),
            InputMode::Persistent => f.write_str("Persistent"),
        }
    }
}

/// A running (or reaped) worker process.
pub struct ProcessHandle {
    child: Child,
    command: String,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
    writer: Option<JoinHandle<io::Result<()>>>,
    started: Instant,
    status: Option<ExitStatus>,
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.child.id())
            .field("command", &self.command)
            .field("status", &self.status)
            .finish()
    }
}

impl ProcessHandle {
    /// Launch `program` with `args`, stdout captured.
    ///
    /// `cwd` sets the child's working directory when given.
    ///
    /// # Errors
    ///
    /// - [`GitError::Launch`] if the executable cannot be started. This is
    ///   never retried.
    pub fn start<I, S>(
        program: &str,
        args: I,
        input: InputMode,
        cwd: Option<&Path>,
    ) -> Result<Self, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let command = render_command(program, &args);

        let mut cmd = Command::new(program);
        cmd.args(&args).stdout(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        match input {
            InputMode::NoInput => cmd.stdin(Stdio::null()),
            _ => cmd.stdin(Stdio::piped()),
        };

        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|source| GitError::Launch {
            program: program.to_string(),
            source,
        })?;

        let pid = child.id();
        info!(pid, "[{}] {}", pid, command);

        let stdout = child.stdout.take().map(BufReader::new);
        let mut stdin = child.stdin.take();

        let writer = match input {
            InputMode::Fixed(data) => stdin.take().map(|mut pipe| {
                thread::spawn(move || {
                    pipe.write_all(&data)?;
                    pipe.flush()
                })
            }),
            InputMode::Streaming(producer) => stdin.take().map(|mut pipe| {
                thread::spawn(move || {
                    for chunk in producer {
                        pipe.write_all(&chunk)?;
                    }
                    pipe.flush()
                })
            }),
            InputMode::NoInput | InputMode::Persistent => None,
        };

        Ok(Self {
            child,
            command,
            stdin,
            stdout,
            writer,
            started,
            status: None,
        })
    }

    /// Process id of the worker.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// The rendered command line, for logs and error messages.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Time since the worker was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Exit status, once the worker has been reaped.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.status
    }

    /// Whether [`wait`](Self::wait) or [`terminate`](Self::terminate) already ran.
    pub fn is_reaped(&self) -> bool {
        self.status.is_some()
    }

    /// Write `data` to a persistent stdin and flush it.
    ///
    /// # Errors
    ///
    /// - [`GitError::StdinClosed`] if stdin was not retained at start or has
    ///   been closed since
    pub fn write_all(&mut self, data: &[u8]) -> Result<(), GitError> {
        let pid = self.pid();
        let stdin = self
            .stdin
            .as_mut()
            .ok_or(GitError::StdinClosed { pid })?;
        stdin
            .write_all(data)
            .and_then(|()| stdin.flush())
            .map_err(|source| GitError::Io { pid, source })
    }

    /// Read up to and including the next `\n` into `buf`.
    ///
    /// Returns the number of bytes read; 0 means end of output.
    pub fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<usize, GitError> {
        let pid = self.pid();
        match self.stdout.as_mut() {
            Some(stdout) => stdout
                .read_until(b'\n', buf)
                .map_err(|source| GitError::Io { pid, source }),
            None => Ok(0),
        }
    }

    /// Fill `buf` entirely from stdout.
    ///
    /// # Errors
    ///
    /// - [`GitError::UnexpectedEof`] if the worker closes stdout first
    pub fn read_exact(&mut self, buf: &mut [u8], context: &'static str) -> Result<(), GitError> {
        let pid = self.pid();
        let stdout = self
            .stdout
            .as_mut()
            .ok_or(GitError::UnexpectedEof { pid, context })?;
        stdout.read_exact(buf).map_err(|source| {
            if source.kind() == io::ErrorKind::UnexpectedEof {
                GitError::UnexpectedEof { pid, context }
            } else {
                GitError::Io { pid, source }
            }
        })
    }

    /// Read exactly `size` bytes from stdout into a new buffer.
    ///
    /// The buffer grows as bytes arrive, so a bogus `size` from a corrupt
    /// header costs nothing until the worker actually sends data.
    ///
    /// # Errors
    ///
    /// - [`GitError::UnexpectedEof`] if the worker closes stdout first
    pub fn read_sized(
        &mut self,
        size: usize,
        context: &'static str,
    ) -> Result<Vec<u8>, GitError> {
        let pid = self.pid();
        let stdout = self
            .stdout
            .as_mut()
            .ok_or(GitError::UnexpectedEof { pid, context })?;

        let mut buf = Vec::new();
        stdout
            .take(size as u64)
            .read_to_end(&mut buf)
            .map_err(|source| GitError::Io { pid, source })?;
        if buf.len() < size {
            return Err(GitError::UnexpectedEof { pid, context });
        }
        Ok(buf)
    }

    /// Close stdin, signalling end of input to the worker.
    pub fn close_stdin(&mut self) {
        self.stdin = None;
    }

    /// Stop reading stdout. A worker still writing gets a broken pipe.
    pub fn close_stdout(&mut self) {
        self.stdout = None;
    }

    /// Close stdin if still open and block until the worker exits.
    ///
    /// # Errors
    ///
    /// - [`GitError::AlreadyReaped`] if the worker was already waited on
    /// - [`GitError::Io`] if waiting fails or the stdin writer failed
    pub fn wait(&mut self) -> Result<ExitStatus, GitError> {
        let pid = self.pid();
        if self.status.is_some() {
            return Err(GitError::AlreadyReaped { pid });
        }

        self.close_stdin();
        let written = self.join_writer();

        let status = self
            .child
            .wait()
            .map_err(|source| GitError::Io { pid, source })?;
        self.status = Some(status);
        info!(
            pid,
            "[{}] wall time: {:.3}s",
            pid,
            self.started.elapsed().as_secs_f64()
        );

        written?;
        Ok(status)
    }

    /// Kill the worker and reap it.
    pub fn terminate(&mut self) -> Result<ExitStatus, GitError> {
        let pid = self.pid();
        if self.status.is_some() {
            return Err(GitError::AlreadyReaped { pid });
        }

        self.close_stdin();
        self.close_stdout();
        if let Err(source) = self.child.kill() {
            // InvalidInput means the child already exited
            if source.kind() != io::ErrorKind::InvalidInput {
                return Err(GitError::Io { pid, source });
            }
        }
        let _ = self.join_writer();
        let status = self
            .child
            .wait()
            .map_err(|source| GitError::Io { pid, source })?;
        self.status = Some(status);
        warn!(pid, "[{}] terminated ({})", pid, self.command);
        Ok(status)
    }

    fn join_writer(&mut self) -> Result<(), GitError> {
        let pid = self.pid();
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        match writer.join() {
            Ok(Ok(())) => Ok(()),
            // The worker stopped reading; its exit status tells the story.
            Ok(Err(source)) if source.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            Ok(Err(source)) => Err(GitError::Io { pid, source }),
            Err(_) => Err(GitError::Io {
                pid,
                source: io::Error::other("stdin writer thread panicked"),
            }),
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if self.status.is_some() {
            return;
        }
        self.close_stdout();
        if let Err(e) = self.wait() {
            warn!(pid = self.pid(), "failed to reap worker on drop: {}", e);
        }
    }
}

/// Render a command line for display.
fn render_command<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(&arg.as_ref().to_string_lossy());
    }
    rendered
}
