// src/core/aggregator.rs

use log::{info, warn};
use serde::{Deserialize, Serialize};
use crate::config::{LevelConfig, LineConfig, ProbeConfig};
use crate::core::buffer::{BufferAllocator, SystemAllocator};
use crate::core::clock::{Clock, MonotonicClock};
use crate::core::harness::TimingHarness;
use crate::core::level::CacheLevelDetector;
use crate::core::line::{CacheLineDetector, DEFAULT_LINE_SIZE};

/// Cache geometry in bytes. A zero field means the value could not be determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDescriptor {
    pub l1: usize,
    pub l2: usize,
    pub l3: usize,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLevel {
    Level1,
    Level2,
    Level3,
}

impl CacheLevel {
    pub fn range(&self, levels: &LevelConfig) -> (usize, usize) {
        match self {
            CacheLevel::Level1 => levels.l1(),
            CacheLevel::Level2 => levels.l2(),
            CacheLevel::Level3 => levels.l3(),
        }
    }
}

/// Runs the line heuristic, then one level sweep per cache level with the line size
/// as stride.
pub struct CacheProber<C: Clock, A: BufferAllocator> {
    harness: TimingHarness<C>,
    allocator: A,
    line: LineConfig,
    levels: LevelConfig,
}

impl CacheProber<MonotonicClock, SystemAllocator> {
    pub fn from_config(config: &ProbeConfig) -> Self {
        CacheProber::new(
            TimingHarness::with_settings(MonotonicClock, config.iterations, config.measured_runs),
            SystemAllocator,
            config.line.clone(),
            config.levels.clone(),
        )
    }
}

impl<C: Clock, A: BufferAllocator> CacheProber<C, A> {
    pub fn new(harness: TimingHarness<C>, allocator: A, line: LineConfig, levels: LevelConfig) -> Self {
        CacheProber {
            harness,
            allocator,
            line,
            levels,
        }
    }

    pub fn detect_line(&self) -> usize {
        let detector = CacheLineDetector::new(&self.harness, &self.allocator);
        match detector.detect_with(self.line.strategy, self.line.max_size, self.line.size_sweep_stride) {
            Ok(line) => line,
            Err(e) => {
                warn!("Line detection failed ({}), assuming {} bytes", e, DEFAULT_LINE_SIZE);
                DEFAULT_LINE_SIZE
            }
        }
    }

    /// Level capacity with a known line size as stride. Zero when undetermined.
    pub fn detect_level(&self, level: CacheLevel, line: usize) -> usize {
        let (min, max) = level.range(&self.levels);
        let detector = CacheLevelDetector::new(&self.harness, &self.allocator);
        match detector.detect(min, max, line) {
            Ok(size) => size,
            Err(e) => {
                warn!("{:?} detection failed: {}", level, e);
                0
            }
        }
    }

    pub fn detect_l1(&self) -> usize {
        let line = self.detect_line();
        self.detect_level(CacheLevel::Level1, line)
    }

    pub fn detect_l2(&self) -> usize {
        let line = self.detect_line();
        self.detect_level(CacheLevel::Level2, line)
    }

    pub fn detect_l3(&self) -> usize {
        let line = self.detect_line();
        self.detect_level(CacheLevel::Level3, line)
    }

    pub fn detect_all(&self) -> CacheDescriptor {
        info!("Probing cache hierarchy ({} touches per walk)", self.harness.iterations());
        let line = self.detect_line();

        let descriptor = CacheDescriptor {
            l1: self.detect_level(CacheLevel::Level1, line),
            l2: self.detect_level(CacheLevel::Level2, line),
            l3: self.detect_level(CacheLevel::Level3, line),
            line,
        };
        info!("Timing heuristic result: {:?}", descriptor);
        descriptor
    }
}
