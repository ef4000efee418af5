use std::path::PathBuf;

use execer::FakeExecer;
use execer::errors::ExecError;

/// Builder for `FakeExecer` to simplify test setup.
///
/// Starts from a fake that succeeds with empty output and reports the host
/// platform.
pub struct FakeExecerBuilder {
    fake: FakeExecer,
}

impl FakeExecerBuilder {
    pub fn new() -> Self {
        Self {
            fake: FakeExecer {
                expect_os: std::env::consts::OS.to_string(),
                expect_arch: std::env::consts::ARCH.to_string(),
                ..FakeExecer::default()
            },
        }
    }

    pub fn output(mut self, stdout: &str) -> Self {
        self.fake.expect_output = stdout.to_string();
        self
    }

    pub fn err_output(mut self, stderr: &str) -> Self {
        self.fake.expect_err_output = stderr.to_string();
        self
    }

    pub fn error(mut self, err: ExecError) -> Self {
        self.fake.expect_error = Some(err);
        self
    }

    /// Fail every operation with a free-form message.
    pub fn failing(self, msg: &str) -> Self {
        self.error(ExecError::other(msg))
    }

    pub fn look_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fake.expect_look_path = path.into();
        self
    }

    pub fn look_path_error(mut self, err: ExecError) -> Self {
        self.fake.expect_look_path_error = Some(err);
        self
    }

    pub fn platform(mut self, os: &str, arch: &str) -> Self {
        self.fake.expect_os = os.to_string();
        self.fake.expect_arch = arch.to_string();
        self
    }

    pub fn build(self) -> FakeExecer {
        self.fake
    }
}

impl Default for FakeExecerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
