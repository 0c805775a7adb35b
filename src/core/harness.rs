// src/core/harness.rs

use log::trace;
use crate::core::access_pattern::{walk, DEFAULT_ITERATIONS};
use crate::core::buffer::ProbeBuffer;
use crate::core::clock::{duration_to_nanos, Clock};
use crate::error::{ProbeError, Result};

/// Times strided walks over a buffer.
#[derive(Debug, Clone)]
pub struct TimingHarness<C: Clock> {
    clock: C,
    iterations: usize,
    measured_runs: usize,
}

impl<C: Clock> TimingHarness<C> {
    pub fn new(clock: C) -> Self {
        Self::with_settings(clock, DEFAULT_ITERATIONS, 1)
    }

    pub fn with_settings(clock: C, iterations: usize, measured_runs: usize) -> Self {
        TimingHarness {
            clock,
            iterations,
            measured_runs: measured_runs.max(1),
        }
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Runs `warmup_passes` unmeasured walks, then returns the mean elapsed
    /// nanoseconds of `measured_runs` timed walks.
    pub fn measure(&self, buffer: &mut ProbeBuffer, stride: usize, warmup_passes: usize) -> Result<f64> {
        let data = buffer.as_mut_slice();
        if stride == 0 {
            return Err(ProbeError::InvalidStride);
        }

        for _ in 0..warmup_passes {
            walk(data, stride, self.iterations)?;
        }

        let mut total = 0.0;
        for _ in 0..self.measured_runs {
            let start = self.clock.now();
            walk(data, stride, self.iterations)?;
            let end = self.clock.now();
            total += duration_to_nanos(self.clock.elapsed(start, end));
        }

        let sample = total / self.measured_runs as f64;
        trace!("size={} stride={} -> {:.0} ns", data.len(), stride, sample);
        Ok(sample)
    }
}
