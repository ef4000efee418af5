// src/exec/mod.rs

//! Process execution layer.
//!
//! Everything that launches an OS process goes through the [`Execer`] trait,
//! so callers can be handed a real executor in production and a fake in
//! tests.
//!
//! - [`default`] provides [`DefaultExecer`], which spawns processes with
//!   `tokio::process` and streams their output to caller-supplied sinks.
//! - [`fake`] provides [`FakeExecer`], which returns pre-programmed results.
//! - [`context`] holds the cancellation [`Context`] a real executor is
//!   constructed with.
//! - [`drain`] contains the pipe-draining primitives shared by the real
//!   executor.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::io::AsyncWrite;

use crate::errors::{PartialOutput, Result};

pub mod context;
pub mod default;
pub mod drain;
pub mod fake;

pub use context::{CancelHandle, Context};
pub use default::{DefaultExecer, sudo_args};
pub use drain::{SharedBuffer, copy_and_capture};
pub use fake::FakeExecer;

/// Value of [`Execer::os`] on Linux hosts.
pub const OS_LINUX: &str = "linux";
/// Value of [`Execer::os`] on macOS hosts.
pub const OS_MACOS: &str = "macos";
/// Value of [`Execer::os`] on Windows hosts.
pub const OS_WINDOWS: &str = "windows";

/// Boxed future returned by the async [`Execer`] operations.
pub type ExecFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Destination for a child's streamed output.
pub type Sink<'a> = &'a mut (dyn AsyncWrite + Unpin + Send);

/// Environment handed to a child verbatim, as `(key, value)` pairs.
pub type Env<'a> = &'a [(&'a str, &'a str)];

/// Trait abstracting how external processes are located and run.
///
/// Production code uses [`DefaultExecer`]; tests can substitute
/// [`FakeExecer`] or their own implementation. The trait is object safe so
/// it can be passed around as `&dyn Execer`.
///
/// A `dir` of `None` (or an empty path) runs the child in the current
/// working directory.
pub trait Execer: Send + Sync {
    /// Resolve `name` against `PATH`.
    fn look_path(&self, name: &str) -> Result<PathBuf>;

    /// Run a command and return its combined stdout and stderr.
    fn command<'a>(
        &'a self,
        name: &'a str,
        args: &'a [&'a str],
    ) -> ExecFuture<'a, std::result::Result<Vec<u8>, PartialOutput<Vec<u8>>>>;

    /// Run a command with its output forwarded to this process's stdout and
    /// stderr.
    fn run_command<'a>(&'a self, name: &'a str, args: &'a [&'a str]) -> ExecFuture<'a, Result<()>>;

    /// Run a command with `env` as its entire environment.
    fn run_command_with_env<'a>(
        &'a self,
        name: &'a str,
        args: &'a [&'a str],
        env: Env<'a>,
        stdout: Sink<'a>,
        stderr: Sink<'a>,
    ) -> ExecFuture<'a, Result<()>>;

    /// Like [`Execer::run_command`], inside `dir`.
    fn run_command_in_dir<'a>(
        &'a self,
        name: &'a str,
        dir: Option<&'a Path>,
        args: &'a [&'a str],
    ) -> ExecFuture<'a, Result<()>>;

    /// Run a command and return its stdout as text.
    ///
    /// On failure the returned output is stdout immediately followed by
    /// stderr.
    fn run_command_and_return<'a>(
        &'a self,
        name: &'a str,
        dir: Option<&'a Path>,
        args: &'a [&'a str],
    ) -> ExecFuture<'a, std::result::Result<String, PartialOutput<String>>>;

    /// Run `name args...` through the privilege-elevation program.
    fn run_command_with_sudo<'a>(
        &'a self,
        name: &'a str,
        args: &'a [&'a str],
    ) -> ExecFuture<'a, Result<()>>;

    /// Run a command, appending its output to the given buffers.
    ///
    /// A `None` buffer discards that stream.
    fn run_command_with_buffer<'a>(
        &'a self,
        name: &'a str,
        dir: Option<&'a Path>,
        stdout: Option<&'a mut Vec<u8>>,
        stderr: Option<&'a mut Vec<u8>>,
        args: &'a [&'a str],
    ) -> ExecFuture<'a, Result<()>>;

    /// Run a command, streaming stdout and stderr to the given sinks as the
    /// output arrives.
    fn run_command_with_io<'a>(
        &'a self,
        name: &'a str,
        dir: Option<&'a Path>,
        stdout: Sink<'a>,
        stderr: Sink<'a>,
        args: &'a [&'a str],
    ) -> ExecFuture<'a, Result<()>>;

    /// Replace the current process image with `name`.
    ///
    /// `name` is a path and is not searched for in `PATH`; a bare name is
    /// taken relative to the current directory. `argv[0]` becomes the new
    /// program's `argv[0]`. Only returns on failure.
    fn system_call(&self, name: &str, argv: &[&str], env: &[(&str, &str)]) -> Result<()>;

    /// Create `path` and any missing parents with permission bits `mode`.
    fn mkdir_all(&self, path: &Path, mode: u32) -> Result<()>;

    /// Operating system family, e.g. [`OS_LINUX`].
    fn os(&self) -> &str;

    /// CPU architecture, e.g. `"x86_64"`.
    fn arch(&self) -> &str;
}
