//! git::lines
//!
//! Lazy line-by-line view of a worker's stdout.
//!
//! A [`LineStream`] pulls one line at a time from the worker, stripping the
//! trailing newline. Reaching end of output reaps the worker exactly once;
//! a non-zero exit is reported as a final [`GitError::CommandFailed`] item.
//!
//! Stopping early is fine: [`LineStream::close`] (or simply dropping the
//! stream) closes stdout and reaps the worker. Only leaking the stream
//! (e.g. `std::mem::forget`) leaves the process unreaped.

use std::process::ExitStatus;

use tracing::debug;

use super::process::ProcessHandle;
use super::GitError;

/// Forward-only sequence of text lines produced by a worker.
#[derive(Debug)]
pub struct LineStream {
    process: ProcessHandle,
    buf: Vec<u8>,
    done: bool,
}

impl LineStream {
    /// Wrap a started process. The stream takes over reaping it.
    pub fn new(process: ProcessHandle) -> Self {
        Self {
            process,
            buf: Vec::new(),
            done: false,
        }
    }

    /// Process id of the worker behind this stream.
    pub fn pid(&self) -> u32 {
        self.process.pid()
    }

    /// Stop reading and reap the worker.
    ///
    /// Returns the exit status. If the stream was already exhausted this is
    /// the status observed then; otherwise the worker may report a broken
    /// pipe, which is not treated as an error here.
    pub fn close(mut self) -> Result<ExitStatus, GitError> {
        self.stop()
    }

    /// Like [`close`](Self::close), but leaves the stream in place,
    /// exhausted. Later calls return the same status.
    pub fn stop(&mut self) -> Result<ExitStatus, GitError> {
        self.done = true;
        if let Some(status) = self.process.exit_status() {
            return Ok(status);
        }
        self.process.close_stdout();
        self.process.wait()
    }

    fn finish(&mut self) -> Result<ExitStatus, GitError> {
        let status = self.process.wait()?;
        if !status.success() {
            return Err(GitError::CommandFailed {
                command: self.process.command().to_string(),
                status,
            });
        }
        Ok(status)
    }
}

impl Iterator for LineStream {
    type Item = Result<String, GitError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        let read = match self.process.read_line(&mut self.buf) {
            Ok(n) => n,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        if read == 0 {
            self.done = true;
            return self.finish().err().map(Err);
        }

        let pid = self.process.pid();
        debug!(pid, "[{}] => {:?}", pid, String::from_utf8_lossy(&self.buf));

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        match String::from_utf8(std::mem::take(&mut self.buf)) {
            Ok(line) => Some(Ok(line)),
            Err(_) => {
                self.done = true;
                Some(Err(GitError::InvalidUtf8 { pid }))
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::git::process::InputMode;

    fn stream_of(input: &[u8]) -> LineStream {
        let handle =
            ProcessHandle::start("cat", Vec::<&str>::new(), InputMode::Fixed(input.to_vec()), None)
                .unwrap();
        LineStream::new(handle)
    }

    #[test]
    fn strips_trailing_newline() {
        let lines: Vec<String> = stream_of(b"one\ntwo\n")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn last_line_without_newline_is_kept() {
        let lines: Vec<String> = stream_of(b"one\ntwo")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn empty_output_yields_nothing() {
        let mut stream = stream_of(b"");
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
    }

    #[test]
    fn exhaustion_reaps_once_and_close_reports_status() {
        let mut stream = stream_of(b"x\n");
        assert_eq!(stream.next().unwrap().unwrap(), "x");
        assert!(stream.next().is_none());
        assert!(stream.close().unwrap().success());
    }

    #[test]
    fn close_before_exhaustion_reaps() {
        let mut stream = stream_of(b"a\nb\nc\n");
        assert_eq!(stream.next().unwrap().unwrap(), "a");
        stream.close().unwrap();
    }

    #[test]
    fn non_utf8_is_fatal() {
        let mut stream = stream_of(b"\xff\xfe\n");
        assert!(matches!(
            stream.next(),
            Some(Err(GitError::InvalidUtf8 { .. }))
        ));
        assert!(stream.next().is_none());
    }

    #[test]
    fn non_zero_exit_is_reported_at_end() {
        let handle =
            ProcessHandle::start("sh", ["-c", "echo partial; exit 3"], InputMode::NoInput, None)
                .unwrap();
        let mut stream = LineStream::new(handle);
        assert_eq!(stream.next().unwrap().unwrap(), "partial");
        assert!(matches!(
            stream.next(),
            Some(Err(GitError::CommandFailed { .. }))
        ));
        assert!(stream.next().is_none());
    }
}
