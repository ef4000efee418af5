// src/config/validate.rs

use crate::config::model::{ExecerConfig, MAX_READ_CHUNK_SIZE, RawExecerConfig};
use crate::errors::{ExecError, Result};

impl TryFrom<RawExecerConfig> for ExecerConfig {
    type Error = ExecError;

    fn try_from(raw: RawExecerConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ExecerConfig::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawExecerConfig) -> Result<()> {
    validate_sudo_program(cfg)?;
    validate_read_chunk_size(cfg)?;
    Ok(())
}

fn validate_sudo_program(cfg: &RawExecerConfig) -> Result<()> {
    if cfg.sudo_program.trim().is_empty() {
        return Err(ExecError::Config(
            "sudo_program must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_read_chunk_size(cfg: &RawExecerConfig) -> Result<()> {
    if cfg.read_chunk_size == 0 || cfg.read_chunk_size > MAX_READ_CHUNK_SIZE {
        return Err(ExecError::Config(format!(
            "read_chunk_size must be in 1..={} (got {})",
            MAX_READ_CHUNK_SIZE, cfg.read_chunk_size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ExecerConfig::try_from(RawExecerConfig::default()).unwrap();
        assert_eq!(cfg.sudo_program(), "sudo");
        assert_eq!(cfg.read_chunk_size(), 1024);
        assert!(cfg.kill_on_drop());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let raw = RawExecerConfig {
            read_chunk_size: 0,
            ..RawExecerConfig::default()
        };
        match ExecerConfig::try_from(raw) {
            Err(ExecError::Config(msg)) => assert!(msg.contains("read_chunk_size")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn blank_sudo_program_is_rejected() {
        let raw = RawExecerConfig {
            sudo_program: "  ".to_string(),
            ..RawExecerConfig::default()
        };
        assert!(matches!(
            ExecerConfig::try_from(raw),
            Err(ExecError::Config(_))
        ));
    }
}
