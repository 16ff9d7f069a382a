//! # Runtime Configuration Module
//!
//! Environment-driven launcher settings that are not part of the management properties.
//!
//! ## Environment Variables
//!
//! ### `RESTLAUNCH_STACK_SIZE`
//!
//! Stack size for request coroutines. Accepts decimal (`16384`) or hexadecimal
//! (`0x4000`). Default: `0x4000` (16 KB).
//!
//! ### `RESTLAUNCH_PREFERRED_PORT`
//!
//! First port the bind policy probes. Default: `8081`.
//!
//! ### `RESTLAUNCH_RESOURCES_DIR`
//!
//! Comma separated directories that `classpath://` URLs resolve against. Default: none.
//!
//! ## Usage
//!
//! ```rust
//! use restlaunch::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use std::env;
use std::path::PathBuf;

use crate::bind::DEFAULT_PREFERRED_PORT;

const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
    pub preferred_port: u16,
    pub resource_dirs: Vec<PathBuf>,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let stack_size = lookup("RESTLAUNCH_STACK_SIZE")
            .and_then(|val| parse_size(&val))
            .unwrap_or(DEFAULT_STACK_SIZE);
        let preferred_port = lookup("RESTLAUNCH_PREFERRED_PORT")
            .and_then(|val| val.trim().parse().ok())
            .unwrap_or(DEFAULT_PREFERRED_PORT);
        let resource_dirs = lookup("RESTLAUNCH_RESOURCES_DIR")
            .map(|val| {
                val.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();
        RuntimeConfig {
            stack_size,
            preferred_port,
            resource_dirs,
        }
    }

    /// Apply the coroutine settings to the `may` runtime.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            preferred_port: DEFAULT_PREFERRED_PORT,
            resource_dirs: Vec::new(),
        }
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}
