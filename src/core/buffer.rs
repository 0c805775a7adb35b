// src/core/buffer.rs

use log::trace;
use crate::error::{ProbeError, Result};

/// Zero-initialized byte region whose length is a power of two.
///
/// One buffer lives for exactly one timed configuration and is released on drop,
/// so every exit path of a sweep gives its memory back.
#[derive(Debug)]
pub struct ProbeBuffer {
    data: Vec<u8>,
}

impl ProbeBuffer {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Raw memory provider used by the detectors.
pub trait BufferAllocator {
    fn allocate(&self, size: usize) -> Result<ProbeBuffer>;
}

impl<A: BufferAllocator + ?Sized> BufferAllocator for &A {
    fn allocate(&self, size: usize) -> Result<ProbeBuffer> {
        (**self).allocate(size)
    }
}

/// Heap allocator that reports out-of-memory instead of aborting.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAllocator;

impl BufferAllocator for SystemAllocator {
    fn allocate(&self, size: usize) -> Result<ProbeBuffer> {
        if !size.is_power_of_two() {
            return Err(ProbeError::NotPowerOfTwo(size));
        }

        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| ProbeError::Allocation { size })?;
        data.resize(size, 0);
        trace!("Allocated {} byte probe buffer", size);

        Ok(ProbeBuffer { data })
    }
}
