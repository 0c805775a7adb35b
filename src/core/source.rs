// src/core/source.rs

use log::info;
use crate::core::aggregator::{CacheDescriptor, CacheProber};
use crate::core::buffer::BufferAllocator;
use crate::core::clock::Clock;
use crate::core::cpu_info::NativeBackend;

/// Somewhere cache geometry can come from.
pub trait CacheSource {
    fn name(&self) -> &'static str;

    /// `None` when this source cannot answer on the current platform.
    fn query(&mut self) -> Option<CacheDescriptor>;
}

/// Platform-reported geometry. Backends are chosen at run time and asked in
/// order; the first that answers wins.
#[derive(Debug)]
pub struct NativeQuery {
    backends: Vec<NativeBackend>,
}

impl NativeQuery {
    pub fn new() -> Self {
        Self::with_backends(NativeBackend::available())
    }

    pub fn with_backends(backends: Vec<NativeBackend>) -> Self {
        NativeQuery { backends }
    }

    pub fn backends(&self) -> &[NativeBackend] {
        &self.backends
    }
}

impl Default for NativeQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheSource for NativeQuery {
    fn name(&self) -> &'static str {
        "native"
    }

    fn query(&mut self) -> Option<CacheDescriptor> {
        for backend in &self.backends {
            if let Some(descriptor) = backend.descriptor() {
                info!("Native cache geometry from {}", backend.name());
                return Some(descriptor);
            }
        }
        None
    }
}

/// Geometry inferred from timed memory walks. Always answers.
pub struct TimingHeuristic<C: Clock, A: BufferAllocator> {
    prober: CacheProber<C, A>,
}

impl<C: Clock, A: BufferAllocator> TimingHeuristic<C, A> {
    pub fn new(prober: CacheProber<C, A>) -> Self {
        TimingHeuristic { prober }
    }

    pub fn prober(&self) -> &CacheProber<C, A> {
        &self.prober
    }
}

impl<C: Clock, A: BufferAllocator> CacheSource for TimingHeuristic<C, A> {
    fn name(&self) -> &'static str {
        "timing"
    }

    fn query(&mut self) -> Option<CacheDescriptor> {
        Some(self.prober.detect_all())
    }
}

/// First source, in order, that answers.
pub fn resolve(sources: &mut [&mut dyn CacheSource]) -> Option<(&'static str, CacheDescriptor)> {
    for source in sources.iter_mut() {
        if let Some(descriptor) = source.query() {
            info!("Cache geometry from {} source", source.name());
            return Some((source.name(), descriptor));
        }
        info!("{} source unavailable", source.name());
    }
    None
}
