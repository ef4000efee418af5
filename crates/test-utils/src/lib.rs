pub mod builders;

use std::future::Future;
use std::io;
use std::sync::Once;
use std::time::Duration;

use execer::errors::ExecError;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Write an executable `/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("writing test script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("marking test script executable");
    path
}

/// Re-run `op` while spawning fails with "text file busy".
///
/// A script written by [`write_script`] can still be open for writing in a
/// child forked by a concurrently running test; exec then fails with
/// `ETXTBSY` until that child has exec'd itself.
pub async fn retry_while_busy<F, Fut, T>(mut op: F) -> execer::errors::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = execer::errors::Result<T>>,
{
    let mut attempts = 0;
    loop {
        match op().await {
            Err(ExecError::Spawn { source, .. })
                if source.kind() == io::ErrorKind::ExecutableFileBusy && attempts < 20 =>
            {
                attempts += 1;
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
            res => return res,
        }
    }
}

/// Fresh temporary directory, removed on drop.
pub fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("creating temp dir")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn busy() -> ExecError {
        ExecError::Spawn {
            program: "script".to_string(),
            source: Arc::new(io::Error::from(io::ErrorKind::ExecutableFileBusy)),
        }
    }

    #[tokio::test]
    async fn busy_spawns_are_retried() {
        let mut calls = 0;
        let res = retry_while_busy(|| {
            calls += 1;
            let res = if calls < 3 { Err(busy()) } else { Ok(calls) };
            async move { res }
        })
        .await;

        assert_eq!(res.unwrap(), 3);
    }

    #[tokio::test]
    async fn other_errors_are_returned_at_once() {
        let mut calls = 0;
        let res: execer::errors::Result<()> = retry_while_busy(|| {
            calls += 1;
            async { Err(ExecError::other("boom")) }
        })
        .await;

        assert_eq!(res.unwrap_err().to_string(), "boom");
        assert_eq!(calls, 1);
    }
}
