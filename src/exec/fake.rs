// src/exec/fake.rs

//! Pre-programmed [`Execer`] for unit tests of code that runs processes.

use std::future::ready;
use std::path::{Path, PathBuf};

use crate::errors::{ExecError, PartialOutput, Result};

use super::{Env, ExecFuture, Execer, Sink};

/// Executor that never touches the OS.
///
/// Every operation answers from the fields below and ignores its arguments.
/// The fields are set once when the fake is built; calls never change them.
#[derive(Debug, Clone, Default)]
pub struct FakeExecer {
    /// Returned by every run operation, `mkdir_all` and `system_call`.
    pub expect_error: Option<ExecError>,
    /// Returned by `look_path` instead of `expect_look_path`.
    pub expect_look_path_error: Option<ExecError>,
    /// Stdout text of the pretend process.
    pub expect_output: String,
    /// Stderr text of the pretend process.
    pub expect_err_output: String,
    pub expect_os: String,
    pub expect_arch: String,
    pub expect_look_path: PathBuf,
}

impl FakeExecer {
    fn result(&self) -> Result<()> {
        match &self.expect_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn ready_result(&self) -> ExecFuture<'_, Result<()>> {
        Box::pin(ready(self.result()))
    }
}

impl Execer for FakeExecer {
    fn look_path(&self, _name: &str) -> Result<PathBuf> {
        match &self.expect_look_path_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.expect_look_path.clone()),
        }
    }

    fn command<'a>(
        &'a self,
        _name: &'a str,
        _args: &'a [&'a str],
    ) -> ExecFuture<'a, std::result::Result<Vec<u8>, PartialOutput<Vec<u8>>>> {
        let output = self.expect_output.clone().into_bytes();
        let res = match &self.expect_error {
            Some(err) => Err(PartialOutput::new(output, err.clone())),
            None => Ok(output),
        };
        Box::pin(ready(res))
    }

    fn run_command<'a>(&'a self, _name: &'a str, _args: &'a [&'a str]) -> ExecFuture<'a, Result<()>> {
        self.ready_result()
    }

    fn run_command_with_env<'a>(
        &'a self,
        _name: &'a str,
        _args: &'a [&'a str],
        _env: Env<'a>,
        _stdout: Sink<'a>,
        _stderr: Sink<'a>,
    ) -> ExecFuture<'a, Result<()>> {
        self.ready_result()
    }

    fn run_command_in_dir<'a>(
        &'a self,
        _name: &'a str,
        _dir: Option<&'a Path>,
        _args: &'a [&'a str],
    ) -> ExecFuture<'a, Result<()>> {
        self.ready_result()
    }

    fn run_command_and_return<'a>(
        &'a self,
        _name: &'a str,
        _dir: Option<&'a Path>,
        _args: &'a [&'a str],
    ) -> ExecFuture<'a, std::result::Result<String, PartialOutput<String>>> {
        let mut result = self.expect_output.clone();
        let res = match &self.expect_error {
            None => Ok(result),
            Some(err) => {
                result.push_str(&self.expect_err_output);
                Err(PartialOutput::new(result, err.clone()))
            }
        };
        Box::pin(ready(res))
    }

    fn run_command_with_sudo<'a>(
        &'a self,
        _name: &'a str,
        _args: &'a [&'a str],
    ) -> ExecFuture<'a, Result<()>> {
        self.ready_result()
    }

    fn run_command_with_buffer<'a>(
        &'a self,
        _name: &'a str,
        _dir: Option<&'a Path>,
        _stdout: Option<&'a mut Vec<u8>>,
        _stderr: Option<&'a mut Vec<u8>>,
        _args: &'a [&'a str],
    ) -> ExecFuture<'a, Result<()>> {
        self.ready_result()
    }

    fn run_command_with_io<'a>(
        &'a self,
        _name: &'a str,
        _dir: Option<&'a Path>,
        _stdout: Sink<'a>,
        _stderr: Sink<'a>,
        _args: &'a [&'a str],
    ) -> ExecFuture<'a, Result<()>> {
        self.ready_result()
    }

    fn system_call(&self, _name: &str, _argv: &[&str], _env: &[(&str, &str)]) -> Result<()> {
        self.result()
    }

    fn mkdir_all(&self, _path: &Path, _mode: u32) -> Result<()> {
        self.result()
    }

    fn os(&self) -> &str {
        &self.expect_os
    }

    fn arch(&self) -> &str {
        &self.expect_arch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake() -> FakeExecer {
        FakeExecer {
            expect_look_path_error: Some(ExecError::other("fake")),
            expect_output: "output".to_string(),
            expect_err_output: "error".to_string(),
            expect_os: "os".to_string(),
            expect_arch: "arch".to_string(),
            expect_look_path: PathBuf::from("lookpath"),
            ..FakeExecer::default()
        }
    }

    #[test]
    fn look_path_prefers_configured_error() {
        let mut fake = fake();
        assert!(fake.look_path("").is_err());

        fake.expect_look_path_error = None;
        assert_eq!(fake.look_path("").unwrap(), PathBuf::from("lookpath"));
    }

    #[tokio::test]
    async fn successful_fake_echoes_configuration() {
        let fake = fake();

        assert_eq!(fake.command("fake", &[]).await.unwrap(), b"output");
        assert_eq!(fake.os(), "os");
        assert_eq!(fake.arch(), "arch");
        assert!(fake.run_command("", &[""]).await.is_ok());
        assert!(fake.run_command_in_dir("", None, &[]).await.is_ok());
        assert!(fake.run_command_with_sudo("", &[""]).await.is_ok());
        assert!(
            fake.run_command_with_buffer("", None, None, None, &[])
                .await
                .is_ok()
        );
        assert!(fake.system_call("", &[], &[]).is_ok());
        assert!(fake.mkdir_all(Path::new(""), 0).is_ok());

        let mut out: Vec<u8> = Vec::new();
        let mut err: Vec<u8> = Vec::new();
        assert!(
            fake.run_command_with_io("", None, &mut out, &mut err, &[])
                .await
                .is_ok()
        );
        assert!(
            fake.run_command_with_env("", &[], &[], &mut out, &mut err)
                .await
                .is_ok()
        );
        // The fake writes nothing to sinks.
        assert!(out.is_empty() && err.is_empty());

        assert_eq!(
            fake.run_command_and_return("", None, &[]).await.unwrap(),
            "output"
        );
    }

    #[tokio::test]
    async fn failing_fake_concatenates_stdout_and_stderr() {
        let fake = FakeExecer {
            expect_error: Some(ExecError::other("fake")),
            expect_output: "output".to_string(),
            expect_err_output: "error".to_string(),
            ..FakeExecer::default()
        };

        let partial = fake
            .run_command_and_return("", None, &[])
            .await
            .unwrap_err();
        assert_eq!(partial.output, "outputerror");
        assert_eq!(partial.error.to_string(), "fake");

        // `command` only carries stdout alongside the error.
        let partial = fake.command("", &[]).await.unwrap_err();
        assert_eq!(partial.output, b"output");

        assert!(fake.mkdir_all(Path::new(""), 0).is_err());
        assert!(fake.run_command("", &[]).await.is_err());
    }
}
