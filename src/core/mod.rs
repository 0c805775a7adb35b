// src/core/mod.rs

pub mod clock;
pub mod buffer;
pub mod access_pattern;
pub mod harness;
pub mod line;
pub mod level;
pub mod aggregator;
pub mod cpu_info;
pub mod source;

pub use aggregator::{CacheDescriptor, CacheLevel, CacheProber};
pub use clock::{Clock, MonotonicClock, ScriptedClock};
pub use buffer::{BufferAllocator, ProbeBuffer, SystemAllocator};
pub use harness::TimingHarness;
pub use line::{CacheLineDetector, LineStrategy};
pub use level::CacheLevelDetector;
pub use cpu_info::NativeBackend;
pub use source::{CacheSource, NativeQuery, TimingHeuristic};
