// tests/common/mod.rs

#![allow(dead_code)]

use std::cell::Cell;
use cacheprobe::core::buffer::{BufferAllocator, ProbeBuffer, SystemAllocator};
use cacheprobe::error::{ProbeError, Result};

/// Touches per walk in tests; the scripted clock makes the real work irrelevant.
pub const TEST_ITERATIONS: usize = 1024;

pub const KIB: usize = 1024;
pub const MIB: usize = 1024 * 1024;

/// Fails the n-th allocation (1-based), delegates every other one.
pub struct FailingAllocator {
    fail_on_call: usize,
    calls: Cell<usize>,
}

impl FailingAllocator {
    pub fn failing_call(fail_on_call: usize) -> Self {
        FailingAllocator { fail_on_call, calls: Cell::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl BufferAllocator for FailingAllocator {
    fn allocate(&self, size: usize) -> Result<ProbeBuffer> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if call == self.fail_on_call {
            return Err(ProbeError::Allocation { size });
        }
        SystemAllocator.allocate(size)
    }
}

/// Refuses anything larger than `limit` bytes.
pub struct CappedAllocator {
    pub limit: usize,
}

impl BufferAllocator for CappedAllocator {
    fn allocate(&self, size: usize) -> Result<ProbeBuffer> {
        if size > self.limit {
            return Err(ProbeError::Allocation { size });
        }
        SystemAllocator.allocate(size)
    }
}
