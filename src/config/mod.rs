// src/config/mod.rs

pub mod probe_config;

// Re-export main types for convenience
pub use probe_config::{ProbeConfig, LineConfig, LevelConfig};
