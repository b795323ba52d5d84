//! Detection Engine sizing parameters.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// `ReadLen`/`RetainLen` pair the Detection Engine is constructed with.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct EngineConfig {
    /// Chunk size read from the source per iteration (bytes).
    #[serde(default = "default_read_len")]
    #[validate(range(min = 1024))]
    pub read_len: usize,

    /// Carry-over tail kept across chunk boundaries (bytes). Must be at
    /// least as large as the widest detector's `max_secret_len`; the engine
    /// itself rejects construction if that invariant doesn't hold, so this
    /// only catches configuration that is obviously too small.
    #[serde(default = "default_retain_len")]
    #[validate(range(min = 64))]
    pub retain_len: usize,
}

fn default_read_len() -> usize {
    1024 * 1024
}

fn default_retain_len() -> usize {
    64 * 1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_len: default_read_len(),
            retain_len: default_retain_len(),
        }
    }
}
