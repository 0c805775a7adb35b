// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod report;

pub use crate::core::aggregator::{CacheDescriptor, CacheProber};
pub use crate::error::{ProbeError, Result};

use crate::core::buffer::SystemAllocator;
use crate::core::clock::MonotonicClock;
use crate::core::harness::TimingHarness;
use crate::core::level::CacheLevelDetector;
use crate::core::line::CacheLineDetector;

/// Line size from timed walks on this machine. `Some(stride)` sweeps buffer sizes
/// below `max_size` at that stride, `None` sweeps candidate strides over one
/// `max_size` buffer.
pub fn detect_cache_line(max_size: usize, stride: Option<usize>) -> Result<usize> {
    let harness = TimingHarness::new(MonotonicClock);
    CacheLineDetector::new(&harness, &SystemAllocator).detect(max_size, stride)
}

/// Capacity of the cache level whose boundary lies in `[min_size, max_size]`;
/// 0 when it could not be determined.
pub fn detect_cache_level(min_size: usize, max_size: usize, stride: usize) -> Result<usize> {
    let harness = TimingHarness::new(MonotonicClock);
    CacheLevelDetector::new(&harness, &SystemAllocator).detect(min_size, max_size, stride)
}

/// Full timing-based pass with the default configuration.
pub fn detect_all() -> CacheDescriptor {
    CacheProber::from_config(&crate::config::ProbeConfig::default()).detect_all()
}
