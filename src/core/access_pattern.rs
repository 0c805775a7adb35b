// src/core/access_pattern.rs

use log::warn;
use std::ptr;
use crate::error::{ProbeError, Result};

/// Touches per walk. The walk costs O(iterations), so it has to dwarf the largest
/// buffer tested or loop overhead drowns the cache effects; lower it to shorten runs
/// at the price of noisier samples.
pub const DEFAULT_ITERATIONS: usize = 128 * 1024 * 1024;

/// Strided read-increment-write walk over `data`.
///
/// Iteration `i` touches byte `(i * stride) & (len - 1)`, so the length must be a
/// power of two for the mask to wrap correctly.
pub fn walk(data: &mut [u8], stride: usize, iterations: usize) -> Result<()> {
    let len = data.len();
    debug_assert!(len.is_power_of_two(), "walk over non power-of-two buffer ({} bytes)", len);
    if !len.is_power_of_two() {
        return Err(ProbeError::NotPowerOfTwo(len));
    }
    if stride == 0 {
        return Err(ProbeError::InvalidStride);
    }
    if len > iterations {
        warn!("Walk of {} iterations over a {} byte buffer is dominated by loop overhead", iterations, len);
    }

    let mask = len - 1;
    let base = data.as_mut_ptr();
    for i in 0..iterations {
        let offset = i.wrapping_mul(stride) & mask;
        // SAFETY: offset is masked into 0..len and `base` points at `len` bytes we borrow mutably.
        unsafe {
            let slot = base.add(offset);
            ptr::write_volatile(slot, ptr::read_volatile(slot).wrapping_add(1));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_touches_strided_offsets() {
        let mut data = vec![0u8; 16];
        walk(&mut data, 4, 8).unwrap();
        // Offsets 0, 4, 8, 12 each visited twice
        assert_eq!(data, vec![2, 0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn test_walk_wraps_large_strides() {
        let mut data = vec![0u8; 8];
        walk(&mut data, 64, 5).unwrap();
        assert_eq!(data[0], 5);
        assert_eq!(data.iter().map(|&b| b as usize).sum::<usize>(), 5);
    }

    #[test]
    fn test_walk_increment_wraps_around() {
        let mut data = vec![0u8; 1];
        walk(&mut data, 1, 300).unwrap();
        assert_eq!(data[0], (300 % 256) as u8);
    }

    #[test]
    fn test_walk_rejects_zero_stride() {
        let mut data = vec![0u8; 8];
        assert!(matches!(walk(&mut data, 0, 10), Err(ProbeError::InvalidStride)));
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_walk_rejects_non_power_of_two() {
        let mut data = vec![0u8; 12];
        assert!(matches!(walk(&mut data, 4, 10), Err(ProbeError::NotPowerOfTwo(12))));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "non power-of-two")]
    fn test_walk_asserts_power_of_two_in_debug() {
        let mut data = vec![0u8; 12];
        let _ = walk(&mut data, 4, 10);
    }
}
