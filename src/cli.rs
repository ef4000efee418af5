// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `execer`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "execer",
    version,
    about = "Locate, run and capture external commands.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `Execer.toml` in the current directory is used when it
    /// exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EXECER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Kill the command if it is still running after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the resolved path of a program.
    Which { name: String },

    /// Run a program with its output streamed to the terminal.
    Run {
        /// Working directory for the program.
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        program: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run a program and print its captured output once it finishes.
    Capture {
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        program: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run a program through the configured elevation program.
    Sudo {
        program: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Replace this process with a program, keeping the environment.
    Exec {
        /// Path of the program; not looked up in PATH, a bare name is
        /// relative to the current directory.
        program: PathBuf,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Create a directory and any missing parents.
    Mkdir {
        /// Permission bits, in octal.
        #[arg(long, default_value = "755", value_parser = parse_mode)]
        mode: u32,
        path: PathBuf,
    },

    /// Print the host OS and architecture.
    Info,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn parse_mode(s: &str) -> Result<u32, String> {
    let digits = s.trim_start_matches("0o");
    u32::from_str_radix(digits, 8).map_err(|e| format!("invalid octal mode '{s}': {e}"))
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_args_keep_their_dashes() {
        let args = CliArgs::try_parse_from(["execer", "run", "--dir", "/tmp", "ls", "-la", "--color"])
            .unwrap();
        match args.command {
            Command::Run { dir, program, args } => {
                assert_eq!(dir, Some(PathBuf::from("/tmp")));
                assert_eq!(program, "ls");
                assert_eq!(args, vec!["-la", "--color"]);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn mode_is_parsed_as_octal() {
        assert_eq!(parse_mode("755"), Ok(0o755));
        assert_eq!(parse_mode("0o700"), Ok(0o700));
        assert!(parse_mode("9").is_err());

        let args = CliArgs::try_parse_from(["execer", "mkdir", "out/dir"]).unwrap();
        assert!(matches!(args.command, Command::Mkdir { mode: 0o755, .. }));
    }

    #[test]
    fn global_flags_parse() {
        let args =
            CliArgs::try_parse_from(["execer", "--timeout", "3", "--log-level", "debug", "info"])
                .unwrap();
        assert_eq!(args.timeout, Some(3));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(matches!(args.command, Command::Info));
    }
}
