// src/exec/default.rs

//! Real executor backed by `tokio::process`.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info};

use crate::config::ExecerConfig;
use crate::errors::{CancelReason, ExecError, PartialOutput, Result, Stream};

use super::context::Context;
use super::drain::{SharedBuffer, drain_pipe};
use super::{Env, ExecFuture, Execer, Sink};

/// Argument vector handed to the elevation program: `[name, args...]`.
pub fn sudo_args<'a>(name: &'a str, args: &[&'a str]) -> Vec<&'a str> {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(name);
    argv.extend_from_slice(args);
    argv
}

/// Executor that runs real OS processes.
///
/// Holds nothing but its cancellation [`Context`] and settings; every call
/// owns its own child, pipes and buffers.
#[derive(Debug, Clone, Default)]
pub struct DefaultExecer {
    ctx: Context,
    config: ExecerConfig,
}

enum Outcome {
    Finished(Result<()>),
    Done(CancelReason),
}

impl DefaultExecer {
    /// Executor with a background context and default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(ctx: Context) -> Self {
        Self {
            ctx,
            config: ExecerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExecerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn config(&self) -> &ExecerConfig {
        &self.config
    }

    fn build_command(
        &self,
        name: &str,
        dir: Option<&Path>,
        env: Option<Env<'_>>,
        args: &[&str],
    ) -> Command {
        let mut cmd = Command::new(name);
        cmd.args(args);
        if let Some(dir) = dir.filter(|d| !d.as_os_str().is_empty()) {
            cmd.current_dir(dir);
        }
        if let Some(env) = env {
            cmd.env_clear();
            cmd.envs(env.iter().copied());
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(self.config.kill_on_drop());
        cmd
    }

    /// Spawn `name`, stream both pipes into the sinks, then wait for exit.
    ///
    /// The context is checked before spawning and raced against the child
    /// afterwards; when it wins the child is killed and reaped.
    async fn run_piped(
        &self,
        name: &str,
        dir: Option<&Path>,
        env: Option<Env<'_>>,
        args: &[&str],
        stdout: Sink<'_>,
        stderr: Sink<'_>,
    ) -> Result<()> {
        if let Some(reason) = self.ctx.err() {
            return Err(cancelled(name, reason));
        }

        let mut cmd = self.build_command(name, dir, env, args);

        debug!(program = name, ?dir, ?args, "starting process");

        let mut child = cmd.spawn().map_err(|e| ExecError::spawn(name, e))?;
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let outcome = tokio::select! {
            res = self.drain_and_wait(name, &mut child, stdout_pipe, stderr_pipe, stdout, stderr) => {
                Outcome::Finished(res)
            }
            reason = self.ctx.done() => Outcome::Done(reason),
        };

        match outcome {
            Outcome::Finished(res) => res,
            Outcome::Done(reason) => {
                info!(program = name, %reason, "context done; killing process");
                if let Err(e) = child.start_kill() {
                    debug!(program = name, error = %e, "process already gone");
                }
                let _ = child.wait().await;
                Err(cancelled(name, reason))
            }
        }
    }

    async fn drain_and_wait(
        &self,
        name: &str,
        child: &mut Child,
        stdout_pipe: Option<ChildStdout>,
        stderr_pipe: Option<ChildStderr>,
        stdout: Sink<'_>,
        stderr: Sink<'_>,
    ) -> Result<()> {
        let chunk_size = self.config.read_chunk_size();

        // Both drains must finish before waiting on the child.
        let drained = tokio::try_join!(
            drain_pipe(stdout_pipe, stdout, Stream::Stdout, chunk_size),
            drain_pipe(stderr_pipe, stderr, Stream::Stderr, chunk_size),
        );

        match drained {
            Ok((out, err)) => {
                debug!(
                    program = name,
                    stdout_bytes = out.len(),
                    stderr_bytes = err.len(),
                    "process output drained"
                );
            }
            Err(e) => {
                // Nobody reads the pipes any more; don't leave the child blocked on them.
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(e);
            }
        }

        let status = child.wait().await.map_err(|e| ExecError::wait(name, e))?;

        debug!(
            program = name,
            code = status.code(),
            success = status.success(),
            "process exited"
        );

        if status.success() {
            Ok(())
        } else {
            Err(ExecError::Exit {
                program: name.to_string(),
                status,
            })
        }
    }
}

/// Path handed to `exec`. `Command` searches `PATH` for names without a
/// separator, so a bare name is pinned to the current directory instead.
#[cfg(unix)]
fn exec_path(name: &str) -> PathBuf {
    let path = Path::new(name);
    if name.contains(std::path::MAIN_SEPARATOR) {
        path.to_path_buf()
    } else {
        Path::new(".").join(path)
    }
}

fn cancelled(name: &str, reason: CancelReason) -> ExecError {
    ExecError::Cancelled {
        program: name.to_string(),
        reason,
    }
}

impl Execer for DefaultExecer {
    fn look_path(&self, name: &str) -> Result<PathBuf> {
        which::which(name).map_err(|e| ExecError::NotFound {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    fn command<'a>(
        &'a self,
        name: &'a str,
        args: &'a [&'a str],
    ) -> ExecFuture<'a, std::result::Result<Vec<u8>, PartialOutput<Vec<u8>>>> {
        Box::pin(async move {
            let combined = SharedBuffer::new();
            let mut out = combined.clone();
            let mut err = combined.clone();

            let res = self
                .run_piped(name, None, None, args, &mut out, &mut err)
                .await;

            let output = combined.take();
            match res {
                Ok(()) => Ok(output),
                Err(e) => Err(PartialOutput::new(output, e)),
            }
        })
    }

    fn run_command<'a>(&'a self, name: &'a str, args: &'a [&'a str]) -> ExecFuture<'a, Result<()>> {
        self.run_command_in_dir(name, None, args)
    }

    fn run_command_with_env<'a>(
        &'a self,
        name: &'a str,
        args: &'a [&'a str],
        env: Env<'a>,
        stdout: Sink<'a>,
        stderr: Sink<'a>,
    ) -> ExecFuture<'a, Result<()>> {
        Box::pin(self.run_piped(name, None, Some(env), args, stdout, stderr))
    }

    fn run_command_in_dir<'a>(
        &'a self,
        name: &'a str,
        dir: Option<&'a Path>,
        args: &'a [&'a str],
    ) -> ExecFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut out = tokio::io::stdout();
            let mut err = tokio::io::stderr();
            self.run_piped(name, dir, None, args, &mut out, &mut err)
                .await
        })
    }

    fn run_command_and_return<'a>(
        &'a self,
        name: &'a str,
        dir: Option<&'a Path>,
        args: &'a [&'a str],
    ) -> ExecFuture<'a, std::result::Result<String, PartialOutput<String>>> {
        Box::pin(async move {
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();

            let res = self
                .run_piped(name, dir, None, args, &mut stdout, &mut stderr)
                .await;

            let mut result = String::from_utf8_lossy(&stdout).into_owned();
            match res {
                Ok(()) => Ok(result),
                Err(e) => {
                    result.push_str(&String::from_utf8_lossy(&stderr));
                    Err(PartialOutput::new(result, e))
                }
            }
        })
    }

    fn run_command_with_sudo<'a>(
        &'a self,
        name: &'a str,
        args: &'a [&'a str],
    ) -> ExecFuture<'a, Result<()>> {
        Box::pin(async move {
            let argv = sudo_args(name, args);
            let mut out = tokio::io::stdout();
            let mut err = tokio::io::stderr();
            self.run_piped(self.config.sudo_program(), None, None, &argv, &mut out, &mut err)
                .await
        })
    }

    fn run_command_with_buffer<'a>(
        &'a self,
        name: &'a str,
        dir: Option<&'a Path>,
        stdout: Option<&'a mut Vec<u8>>,
        stderr: Option<&'a mut Vec<u8>>,
        args: &'a [&'a str],
    ) -> ExecFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut discard_out = Vec::new();
            let mut discard_err = Vec::new();
            let stdout = stdout.unwrap_or(&mut discard_out);
            let stderr = stderr.unwrap_or(&mut discard_err);
            self.run_piped(name, dir, None, args, stdout, stderr).await
        })
    }

    fn run_command_with_io<'a>(
        &'a self,
        name: &'a str,
        dir: Option<&'a Path>,
        stdout: Sink<'a>,
        stderr: Sink<'a>,
        args: &'a [&'a str],
    ) -> ExecFuture<'a, Result<()>> {
        Box::pin(self.run_piped(name, dir, None, args, stdout, stderr))
    }

    #[cfg(unix)]
    fn system_call(&self, name: &str, argv: &[&str], env: &[(&str, &str)]) -> Result<()> {
        use std::os::unix::process::CommandExt;

        let mut cmd = std::process::Command::new(exec_path(name));
        if let Some((arg0, rest)) = argv.split_first() {
            cmd.arg0(arg0).args(rest);
        }
        cmd.env_clear().envs(env.iter().copied());

        debug!(program = name, ?argv, "replacing process image");

        // `exec` only comes back if it failed.
        let err = cmd.exec();
        Err(ExecError::Exec {
            program: name.to_string(),
            source: std::sync::Arc::new(err),
        })
    }

    #[cfg(not(unix))]
    fn system_call(&self, name: &str, _argv: &[&str], _env: &[(&str, &str)]) -> Result<()> {
        Err(ExecError::Exec {
            program: name.to_string(),
            source: std::sync::Arc::new(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "process replacement is only available on unix",
            )),
        })
    }

    fn mkdir_all(&self, path: &Path, mode: u32) -> Result<()> {
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        builder.create(path).map_err(|e| ExecError::CreateDir {
            path: path.to_path_buf(),
            source: std::sync::Arc::new(e),
        })
    }

    fn os(&self) -> &str {
        std::env::consts::OS
    }

    fn arch(&self) -> &str {
        std::env::consts::ARCH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sudo_args_prefix_the_program_once() {
        assert_eq!(sudo_args("apt", &["install", "-y", "git"]), vec!["apt", "install", "-y", "git"]);
        assert_eq!(sudo_args("true", &[]), vec!["true"]);
    }

    #[test]
    fn host_platform_matches_std_consts() {
        let ex = DefaultExecer::new();
        assert_eq!(ex.os(), std::env::consts::OS);
        assert_eq!(ex.arch(), std::env::consts::ARCH);
        assert_eq!(ex.os(), ex.os());
        assert_eq!(ex.arch(), ex.arch());
    }

    #[cfg(unix)]
    #[test]
    fn exec_path_never_searches_path() {
        assert_eq!(exec_path("false"), PathBuf::from("./false"));
        assert_eq!(exec_path("bin/tool"), PathBuf::from("bin/tool"));
        assert_eq!(exec_path("/bin/false"), PathBuf::from("/bin/false"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn already_cancelled_context_never_spawns() {
        let (ctx, cancel) = Context::with_cancel();
        cancel.cancel();
        let ex = DefaultExecer::with_context(ctx);

        let err = ex
            .run_command_with_buffer("definitely-not-a-real-binary-xyz", None, None, None, &[])
            .await
            .unwrap_err();

        // A spawn attempt would have failed with Spawn instead.
        assert!(err.is_cancelled(), "got {err:?}");
    }
}
