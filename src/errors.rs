// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! `ExecError` is `Clone` so a [`FakeExecer`](crate::exec::FakeExecer) can
//! hand out the same configured error on every call. OS errors are therefore
//! kept behind an `Arc`.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;

use thiserror::Error;

/// Which standard stream of the child an I/O failure happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Why a [`Context`](crate::exec::Context) stopped a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => f.write_str("context cancelled"),
            CancelReason::DeadlineExceeded => f.write_str("context deadline exceeded"),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ExecError {
    #[error("executable '{name}' not found in PATH: {reason}")]
    NotFound { name: String, reason: String },

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("failed to read child {stream}: {source}")]
    Read {
        stream: Stream,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("failed to write child {stream} to sink: {source}")]
    Write {
        stream: Stream,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("'{program}' {}", describe_status(.status))]
    Exit { program: String, status: ExitStatus },

    #[error("'{program}' stopped: {reason}")]
    Cancelled {
        program: String,
        reason: CancelReason,
    },

    #[error("failed to exec '{program}': {source}")]
    Exec {
        program: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("failed to create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl ExecError {
    /// Free-form error, mostly useful for programming a fake.
    pub fn other(msg: impl Into<String>) -> Self {
        ExecError::Other(msg.into())
    }

    pub(crate) fn spawn(program: &str, err: io::Error) -> Self {
        ExecError::Spawn {
            program: program.to_string(),
            source: Arc::new(err),
        }
    }

    pub(crate) fn wait(program: &str, err: io::Error) -> Self {
        ExecError::Wait {
            program: program.to_string(),
            source: Arc::new(err),
        }
    }

    pub(crate) fn read(stream: Stream, err: io::Error) -> Self {
        ExecError::Read {
            stream,
            source: Arc::new(err),
        }
    }

    pub(crate) fn write(stream: Stream, err: io::Error) -> Self {
        ExecError::Write {
            stream,
            source: Arc::new(err),
        }
    }

    /// Exit code of the child, if it ran to completion with one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::Exit { status, .. } => status.code(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ExecError::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecError::Cancelled { .. })
    }
}

fn describe_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with status {code}"),
        None => signal_description(status),
    }
}

#[cfg(unix)]
fn signal_description(status: &ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(sig) => format!("terminated by signal {sig}"),
        None => "terminated abnormally".to_string(),
    }
}

#[cfg(not(unix))]
fn signal_description(_status: &ExitStatus) -> String {
    "terminated abnormally".to_string()
}

pub type Result<T> = std::result::Result<T, ExecError>;

/// Output captured before a command failed, together with the failure.
///
/// Returned by the capturing operations so callers can report what the
/// process printed alongside why it failed.
#[derive(Debug, Clone)]
pub struct PartialOutput<T> {
    pub output: T,
    pub error: ExecError,
}

impl<T> fmt::Display for PartialOutput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T: fmt::Debug> std::error::Error for PartialOutput<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> PartialOutput<T> {
    pub fn new(output: T, error: ExecError) -> Self {
        Self { output, error }
    }

    pub fn into_error(self) -> ExecError {
        self.error
    }
}
