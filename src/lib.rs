// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{ExecerConfig, default_config_path, load_and_validate, load_or_default};
use crate::errors::ExecError;

pub use crate::errors::PartialOutput;
pub use crate::exec::{CancelHandle, Context, DefaultExecer, Execer, FakeExecer};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the cancellation context (`--timeout`, Ctrl-C)
/// - the real executor
///
/// and returns the exit code the binary should finish with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config = load_config(args.config.as_deref())?;

    let (mut ctx, cancel) = Context::with_cancel();
    if let Some(secs) = args.timeout {
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }

    // Ctrl-C → kill the running child.
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        cancel.cancel();
    });

    let execer = DefaultExecer::with_context(ctx).with_config(config);
    let mut stdout = std::io::stdout();
    dispatch(&args.command, &execer, &mut stdout).await
}

fn load_config(path: Option<&Path>) -> Result<ExecerConfig> {
    let config = match path {
        Some(path) => load_and_validate(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => load_or_default(default_config_path()).context("loading default config")?,
    };
    debug!(?config, "config loaded");
    Ok(config)
}

/// Carry out one CLI command against `execer`, writing results to `out`.
///
/// Returns the exit code to finish with: a child's own nonzero exit code is
/// passed through, every other failure is an error.
pub async fn dispatch(
    command: &Command,
    execer: &dyn Execer,
    out: &mut (dyn Write + Send),
) -> Result<i32> {
    match command {
        Command::Which { name } => {
            let path = execer.look_path(name)?;
            writeln!(out, "{}", path.display())?;
            Ok(0)
        }

        Command::Run { dir, program, args } => {
            let argv = as_strs(args);
            let res = execer
                .run_command_in_dir(program, dir.as_deref(), &argv)
                .await;
            exit_code(program, res)
        }

        Command::Capture { dir, program, args } => {
            let argv = as_strs(args);
            match execer
                .run_command_and_return(program, dir.as_deref(), &argv)
                .await
            {
                Ok(text) => {
                    write!(out, "{text}")?;
                    Ok(0)
                }
                Err(PartialOutput { output, error }) => {
                    write!(out, "{output}")?;
                    exit_code(program, Err(error))
                }
            }
        }

        Command::Sudo { program, args } => {
            let argv = as_strs(args);
            let res = execer.run_command_with_sudo(program, &argv).await;
            exit_code(program, res)
        }

        Command::Exec { program, args } => {
            let name = program.to_string_lossy();
            let mut argv: Vec<&str> = Vec::with_capacity(args.len() + 1);
            argv.push(&name);
            argv.extend(args.iter().map(String::as_str));

            let vars: Vec<(String, String)> = std::env::vars().collect();
            let env: Vec<(&str, &str)> = vars
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();

            info!(program = %name, "replacing process");
            execer
                .system_call(&name, &argv, &env)
                .with_context(|| format!("exec {name}"))?;
            Ok(0)
        }

        Command::Mkdir { mode, path } => {
            execer.mkdir_all(path, *mode)?;
            Ok(0)
        }

        Command::Info => {
            writeln!(out, "os: {}", execer.os())?;
            writeln!(out, "arch: {}", execer.arch())?;
            Ok(0)
        }
    }
}

fn as_strs(args: &[String]) -> Vec<&str> {
    args.iter().map(String::as_str).collect()
}

fn exit_code(program: &str, res: errors::Result<()>) -> Result<i32> {
    match res {
        Ok(()) => Ok(0),
        Err(err @ ExecError::Exit { .. }) => {
            let code = err.exit_code().unwrap_or(1);
            debug!(program, code, "passing child exit code through");
            Ok(code)
        }
        Err(err) => Err(err).with_context(|| format!("running {program}")),
    }
}
