// src/config/probe_config.rs

use serde::{Deserialize, Serialize};
use config::{Config, ConfigBuilder, Environment, File};
use config::builder::DefaultState;
use std::path::Path;
use crate::core::access_pattern::DEFAULT_ITERATIONS;
use crate::core::line::{LineStrategy, DEFAULT_LINE_PROBE_MAX};
use crate::error::{ProbeError, Result};

const KIB: usize = 1024;
const MIB: usize = 1024 * 1024;

/// Main probe configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,

    /// Ask the platform before falling back to timing
    pub prefer_native: bool,

    /// Touches per timed walk
    pub iterations: usize,

    /// Measured walks averaged into one timing sample
    pub measured_runs: usize,

    /// Cache line search
    pub line: LineConfig,

    /// Search ranges for each cache level
    pub levels: LevelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    pub strategy: LineStrategy,

    /// Buffer size for the stride sweep, upper bound for the size sweep (default: 1MB)
    pub max_size: usize,

    /// Fixed stride used by the size sweep
    pub size_sweep_stride: usize,
}

/// Doubling ranges searched for L1, L2 and L3/SLC. Empirical, not derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    pub l1_min: usize,
    pub l1_max: usize,
    pub l2_min: usize,
    pub l2_max: usize,
    pub l3_min: usize,
    pub l3_max: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            log_level: "info".to_string(),
            prefer_native: true,
            iterations: DEFAULT_ITERATIONS,
            measured_runs: 1,
            line: LineConfig::default(),
            levels: LevelConfig::default(),
        }
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        LineConfig {
            strategy: LineStrategy::StrideSweep,
            max_size: DEFAULT_LINE_PROBE_MAX,
            size_sweep_stride: 1,
        }
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig {
            l1_min: 16 * KIB,
            l1_max: 512 * KIB,
            l2_min: 256 * KIB,
            l2_max: 16 * MIB,
            l3_min: 4 * MIB,
            l3_max: 64 * MIB,
        }
    }
}

impl LevelConfig {
    pub fn l1(&self) -> (usize, usize) {
        (self.l1_min, self.l1_max)
    }

    pub fn l2(&self) -> (usize, usize) {
        (self.l2_min, self.l2_max)
    }

    pub fn l3(&self) -> (usize, usize) {
        (self.l3_min, self.l3_max)
    }
}

impl ProbeConfig {
    /// Load configuration with precedence: config file → env vars → defaults
    pub fn load() -> Result<Self> {
        let mut builder = Self::defaults()?;

        // Try to load from config files (TOML preferred, YAML fallback)
        if Path::new("cacheprobe.toml").exists() {
            builder = builder.add_source(File::with_name("cacheprobe.toml"));
        } else if Path::new("cacheprobe.yaml").exists() {
            builder = builder.add_source(File::with_name("cacheprobe.yaml"));
        }

        Self::finish(builder)
    }

    /// Load configuration with custom file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut builder = Self::defaults()?;

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        Self::finish(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let d = ProbeConfig::default();
        let builder = Config::builder()
            .set_default("log_level", d.log_level)?
            .set_default("prefer_native", d.prefer_native)?
            .set_default("iterations", d.iterations as u64)?
            .set_default("measured_runs", d.measured_runs as u64)?
            .set_default("line.strategy", "stride_sweep")?
            .set_default("line.max_size", d.line.max_size as u64)?
            .set_default("line.size_sweep_stride", d.line.size_sweep_stride as u64)?
            .set_default("levels.l1_min", d.levels.l1_min as u64)?
            .set_default("levels.l1_max", d.levels.l1_max as u64)?
            .set_default("levels.l2_min", d.levels.l2_min as u64)?
            .set_default("levels.l2_max", d.levels.l2_max as u64)?
            .set_default("levels.l3_min", d.levels.l3_min as u64)?
            .set_default("levels.l3_max", d.levels.l3_max as u64)?;
        Ok(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        // Override with environment variables (CACHEPROBE_LEVELS__L1_MIN, ...)
        let builder = builder.add_source(
            Environment::with_prefix("CACHEPROBE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
        );

        let config: ProbeConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the detectors cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 || self.measured_runs == 0 {
            return Err(ProbeError::Config(config::ConfigError::Message(
                "iterations and measured_runs must be positive".to_string(),
            )));
        }
        if !self.line.max_size.is_power_of_two() {
            return Err(ProbeError::NotPowerOfTwo(self.line.max_size));
        }
        if self.line.size_sweep_stride == 0 {
            return Err(ProbeError::InvalidStride);
        }
        for (min, max) in [self.levels.l1(), self.levels.l2(), self.levels.l3()] {
            if !min.is_power_of_two() || !max.is_power_of_two() || min > max {
                return Err(ProbeError::InvalidRange { min, max });
            }
        }
        Ok(())
    }
}
