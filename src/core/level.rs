// src/core/level.rs

use log::{debug, info, warn};
use crate::core::buffer::BufferAllocator;
use crate::core::clock::Clock;
use crate::core::harness::TimingHarness;
use crate::core::line::largest_positive_jump;
use crate::error::{ProbeError, Result};

/// Unmeasured passes before each measured one, so the level under test is populated.
pub const LEVEL_WARMUP_PASSES: usize = 2;

/// A sample this many times the baseline counts as having left the cache.
pub const BASELINE_RATIO: f64 = 1.5;

/// Doubling sizes from `min` to `max` inclusive.
pub fn level_sweep_points(min: usize, max: usize) -> Vec<usize> {
    let mut sizes = Vec::new();
    let mut size = min;
    while size <= max {
        sizes.push(size);
        size = match size.checked_mul(2) {
            Some(next) => next,
            None => break,
        };
    }
    sizes
}

/// Size reached after `steps` doublings of `min`.
fn size_at_step(min: usize, steps: usize) -> usize {
    (0..steps).fold(min, |size, _| size.saturating_mul(2))
}

/// Capacity implied by a timing series taken over `level_sweep_points(min, max)`.
///
/// The size right before the biggest jump is the largest one that still fits. With
/// no jump, the first sample more than 50% above the baseline plays the same role.
/// Failing both, half of `max` (never below `min`) is the estimate.
pub fn capacity_from_series(min: usize, max: usize, timings: &[f64]) -> usize {
    if let Some(jump) = largest_positive_jump(timings) {
        return size_at_step(min, jump - 1);
    }

    if timings.len() >= 2 && timings[0] > 0.0 {
        let threshold = timings[0] * BASELINE_RATIO;
        if let Some(i) = (1..timings.len()).find(|&i| timings[i] > threshold) {
            return size_at_step(min, i - 1);
        }
    }

    (max / 2).max(min)
}

/// Estimates the capacity of one cache level inside a size range.
pub struct CacheLevelDetector<'a, C: Clock, A: BufferAllocator> {
    harness: &'a TimingHarness<C>,
    allocator: &'a A,
}

impl<'a, C: Clock, A: BufferAllocator> CacheLevelDetector<'a, C, A> {
    pub fn new(harness: &'a TimingHarness<C>, allocator: &'a A) -> Self {
        CacheLevelDetector { harness, allocator }
    }

    /// Returns the detected capacity in `[min, max]`, or 0 when a buffer could not be
    /// allocated and the level stays undetermined.
    pub fn detect(&self, min: usize, max: usize, stride: usize) -> Result<usize> {
        if !min.is_power_of_two() {
            return Err(ProbeError::NotPowerOfTwo(min));
        }
        if !max.is_power_of_two() {
            return Err(ProbeError::NotPowerOfTwo(max));
        }
        if min > max {
            return Err(ProbeError::InvalidRange { min, max });
        }
        if stride == 0 {
            return Err(ProbeError::InvalidStride);
        }

        let sizes = level_sweep_points(min, max);
        let mut timings = Vec::with_capacity(sizes.len());

        for &size in &sizes {
            let mut buffer = match self.allocator.allocate(size) {
                Ok(buffer) => buffer,
                Err(ProbeError::Allocation { size }) => {
                    warn!("Could not allocate {} bytes, level in [{}, {}] left undetermined", size, min, max);
                    return Ok(0);
                }
                Err(e) => return Err(e),
            };
            let sample = self.harness.measure(&mut buffer, stride, LEVEL_WARMUP_PASSES)?;
            debug!("Working set {} at stride {}: {:.0} ns", size, stride, sample);
            timings.push(sample);
        }

        let capacity = capacity_from_series(min, max, &timings);
        info!("Cache level in [{}, {}]: {} bytes", min, max, capacity);
        Ok(capacity)
    }
}
