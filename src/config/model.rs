// src/config/model.rs

use serde::Deserialize;

/// Largest pipe read the executor will issue in one go.
pub const MAX_READ_CHUNK_SIZE: usize = 64 * 1024;

/// Executor settings as read from a TOML file.
///
/// ```toml
/// sudo_program = "sudo"
/// read_chunk_size = 1024
/// kill_on_drop = true
/// ```
///
/// Every key is optional. This is the unchecked form; convert it with
/// `ExecerConfig::try_from` to get validated settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawExecerConfig {
    /// Program used by `run_command_with_sudo`.
    #[serde(default = "default_sudo_program")]
    pub sudo_program: String,

    /// Maximum number of bytes read from a child pipe per read call.
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,

    /// Kill the child when the future driving it is dropped.
    #[serde(default = "default_kill_on_drop")]
    pub kill_on_drop: bool,
}

fn default_sudo_program() -> String {
    "sudo".to_string()
}

fn default_read_chunk_size() -> usize {
    1024
}

fn default_kill_on_drop() -> bool {
    true
}

impl Default for RawExecerConfig {
    fn default() -> Self {
        Self {
            sudo_program: default_sudo_program(),
            read_chunk_size: default_read_chunk_size(),
            kill_on_drop: default_kill_on_drop(),
        }
    }
}

/// Validated executor settings.
///
/// Only obtainable through `TryFrom<RawExecerConfig>` (or `Default`), so an
/// executor can rely on `read_chunk_size > 0` and a non-empty sudo program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecerConfig {
    sudo_program: String,
    read_chunk_size: usize,
    kill_on_drop: bool,
}

impl ExecerConfig {
    pub(crate) fn new_unchecked(raw: RawExecerConfig) -> Self {
        Self {
            sudo_program: raw.sudo_program,
            read_chunk_size: raw.read_chunk_size,
            kill_on_drop: raw.kill_on_drop,
        }
    }

    pub fn sudo_program(&self) -> &str {
        &self.sudo_program
    }

    pub fn read_chunk_size(&self) -> usize {
        self.read_chunk_size
    }

    pub fn kill_on_drop(&self) -> bool {
        self.kill_on_drop
    }
}

impl Default for ExecerConfig {
    fn default() -> Self {
        Self::new_unchecked(RawExecerConfig::default())
    }
}
