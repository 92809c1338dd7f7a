//! Server configuration types.
//!
//! This module defines the server-level configuration including:
//! - Address and port bindings
//! - Request body limit
//! - Bound on concurrent CPU-bound transforms
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ADDRESS, DEFAULT_MAX_BODY_SIZE, DEFAULT_PORT};

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_body_size() -> usize {
    DEFAULT_MAX_BODY_SIZE
}

// One transform per available core
fn default_max_concurrent_transforms() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum JSON request body size in bytes (default: 1 MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Transforms allowed to run at once (default: available parallelism)
    #[serde(default = "default_max_concurrent_transforms")]
    pub max_concurrent_transforms: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            max_body_size: default_max_body_size(),
            max_concurrent_transforms: default_max_concurrent_transforms(),
        }
    }
}

impl ServerConfig {
    /// `address:port` for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
