// tests/config_loading.rs

use std::io::Write;

use tempfile::NamedTempFile;

use execer::config::{ExecerConfig, load_and_validate, load_or_default};
use execer::errors::ExecError;

#[test]
fn full_config_is_loaded() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
sudo_program = "doas"
read_chunk_size = 4096
kill_on_drop = false
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.sudo_program(), "doas");
    assert_eq!(cfg.read_chunk_size(), 4096);
    assert!(!cfg.kill_on_drop());
}

#[test]
fn empty_file_yields_defaults() {
    let file = NamedTempFile::new().unwrap();

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg, ExecerConfig::default());
}

#[test]
fn out_of_range_chunk_size_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "read_chunk_size = 0\n").unwrap();

    match load_and_validate(file.path()) {
        Err(ExecError::Config(msg)) => assert!(msg.contains("read_chunk_size")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_key_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "sudo = \"doas\"\n").unwrap();

    match load_and_validate(file.path()) {
        Err(ExecError::Config(msg)) => assert!(msg.contains("parsing")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("Execer.toml");

    assert!(matches!(
        load_and_validate(&missing),
        Err(ExecError::Config(_))
    ));
}

#[test]
fn missing_default_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("Execer.toml");

    assert_eq!(load_or_default(&missing).unwrap(), ExecerConfig::default());
}
