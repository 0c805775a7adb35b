// src/core/line.rs

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use crate::core::buffer::BufferAllocator;
use crate::core::clock::Clock;
use crate::core::harness::TimingHarness;
use crate::error::{ProbeError, Result};

/// Returned whenever the timing data cannot support an estimate.
pub const DEFAULT_LINE_SIZE: usize = 64;

/// Strides probed by the stride sweep, smallest first.
pub const CANDIDATE_STRIDES: [usize; 4] = [32, 64, 128, 256];

/// Largest buffer used to look for the line size.
pub const DEFAULT_LINE_PROBE_MAX: usize = 1024 * 1024;

/// How the line size is searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStrategy {
    /// Fixed buffer, increasing candidate strides.
    StrideSweep,
    /// Fixed stride, doubling buffer sizes.
    SizeSweep,
}

impl Default for LineStrategy {
    fn default() -> Self {
        LineStrategy::StrideSweep
    }
}

/// Index of the largest strictly positive adjacent increase, first one on ties.
pub fn largest_positive_jump(timings: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for i in 1..timings.len() {
        let delta = timings[i] - timings[i - 1];
        if delta > 0.0 && best.map_or(true, |(_, biggest)| delta > biggest) {
            best = Some((i, delta));
        }
    }
    best.map(|(i, _)| i)
}

/// Stride sweep: the smaller stride of the pair with the biggest positive jump.
pub fn line_size_from_stride_sweep(strides: &[usize], timings: &[f64]) -> usize {
    let points = strides.len().min(timings.len());
    match largest_positive_jump(&timings[..points]) {
        Some(i) => strides[i - 1],
        None => DEFAULT_LINE_SIZE,
    }
}

/// Size sweep over sizes `1, 2, 4, ...`: `2^(i - 1)` where `i` is the biggest
/// adjacent delta. The slow sample sits right before the boundary, hence the step
/// back. Deltas of any sign compete so a decreasing series still yields a point.
pub fn line_size_from_size_sweep(timings: &[f64]) -> usize {
    if timings.len() < 2 {
        return DEFAULT_LINE_SIZE;
    }

    let mut location = 1;
    let mut biggest = f64::NEG_INFINITY;
    for i in 1..timings.len() {
        let delta = timings[i] - timings[i - 1];
        if delta > biggest {
            biggest = delta;
            location = i;
        }
    }

    match 1usize.checked_shl((location - 1) as u32) {
        Some(size) => size,
        None => DEFAULT_LINE_SIZE,
    }
}

/// Doubling sizes strictly below `max`, starting at one byte.
pub fn size_sweep_points(max: usize) -> Vec<usize> {
    let mut sizes = Vec::new();
    let mut size = 1usize;
    while size < max {
        sizes.push(size);
        size = match size.checked_mul(2) {
            Some(next) => next,
            None => break,
        };
    }
    sizes
}

/// Estimates the cache line size from timed walks.
pub struct CacheLineDetector<'a, C: Clock, A: BufferAllocator> {
    harness: &'a TimingHarness<C>,
    allocator: &'a A,
}

impl<'a, C: Clock, A: BufferAllocator> CacheLineDetector<'a, C, A> {
    pub fn new(harness: &'a TimingHarness<C>, allocator: &'a A) -> Self {
        CacheLineDetector { harness, allocator }
    }

    /// With a stride, sweeps buffer sizes below `max_size` at that stride; without
    /// one, sweeps `CANDIDATE_STRIDES` over a single `max_size` buffer.
    pub fn detect(&self, max_size: usize, stride: Option<usize>) -> Result<usize> {
        if !max_size.is_power_of_two() {
            return Err(ProbeError::NotPowerOfTwo(max_size));
        }

        let line = match stride {
            Some(0) => return Err(ProbeError::InvalidStride),
            Some(stride) => self.size_sweep(max_size, stride)?,
            None => self.stride_sweep(max_size)?,
        };

        info!("Detected cache line size: {} bytes", line);
        Ok(line)
    }

    pub fn detect_with(&self, strategy: LineStrategy, max_size: usize, size_sweep_stride: usize) -> Result<usize> {
        match strategy {
            LineStrategy::StrideSweep => self.detect(max_size, None),
            LineStrategy::SizeSweep => self.detect(max_size, Some(size_sweep_stride)),
        }
    }

    fn stride_sweep(&self, max_size: usize) -> Result<usize> {
        let mut buffer = match self.allocator.allocate(max_size) {
            Ok(buffer) => buffer,
            Err(ProbeError::Allocation { size }) => {
                warn!("Could not allocate {} bytes for line detection, assuming {}", size, DEFAULT_LINE_SIZE);
                return Ok(DEFAULT_LINE_SIZE);
            }
            Err(e) => return Err(e),
        };

        let mut timings = Vec::with_capacity(CANDIDATE_STRIDES.len());
        for &stride in CANDIDATE_STRIDES.iter() {
            let sample = self.harness.measure(&mut buffer, stride, 1)?;
            debug!("Stride {} over {} bytes: {:.0} ns", stride, max_size, sample);
            timings.push(sample);
        }

        Ok(line_size_from_stride_sweep(&CANDIDATE_STRIDES, &timings))
    }

    fn size_sweep(&self, max_size: usize, stride: usize) -> Result<usize> {
        let sizes = size_sweep_points(max_size);
        let mut timings = Vec::with_capacity(sizes.len());

        for &size in &sizes {
            let mut buffer = match self.allocator.allocate(size) {
                Ok(buffer) => buffer,
                Err(ProbeError::Allocation { size }) => {
                    warn!("Could not allocate {} bytes for line detection, assuming {}", size, DEFAULT_LINE_SIZE);
                    return Ok(DEFAULT_LINE_SIZE);
                }
                Err(e) => return Err(e),
            };
            let sample = self.harness.measure(&mut buffer, stride, 0)?;
            debug!("Size {} at stride {}: {:.0} ns", size, stride, sample);
            timings.push(sample);
        }

        Ok(line_size_from_size_sweep(&timings))
    }
}
