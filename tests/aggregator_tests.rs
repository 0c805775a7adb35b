// tests/aggregator_tests.rs

mod common;

use cacheprobe::config::{LevelConfig, LineConfig};
use cacheprobe::core::aggregator::{CacheDescriptor, CacheLevel, CacheProber};
use cacheprobe::core::buffer::{BufferAllocator, SystemAllocator};
use cacheprobe::core::clock::{MonotonicClock, ScriptedClock};
use cacheprobe::core::harness::TimingHarness;
use cacheprobe::core::line::{LineStrategy, DEFAULT_LINE_SIZE};
use cacheprobe::core::source::{CacheSource, TimingHeuristic};
use common::{CappedAllocator, KIB, TEST_ITERATIONS};

#[cfg(test)]
mod aggregator_tests {
    use super::*;

    fn small_levels() -> LevelConfig {
        LevelConfig {
            l1_min: KIB,
            l1_max: 8 * KIB,
            l2_min: 4 * KIB,
            l2_max: 32 * KIB,
            l3_min: 16 * KIB,
            l3_max: 128 * KIB,
        }
    }

    fn small_line() -> LineConfig {
        LineConfig {
            strategy: LineStrategy::StrideSweep,
            max_size: 4 * KIB,
            size_sweep_stride: 1,
        }
    }

    fn prober<'a, A: BufferAllocator>(clock: &'a ScriptedClock, allocator: A) -> CacheProber<&'a ScriptedClock, A> {
        CacheProber::new(
            TimingHarness::with_settings(clock, TEST_ITERATIONS, 1),
            allocator,
            small_line(),
            small_levels(),
        )
    }

    #[test]
    fn test_detect_all_feeds_line_into_levels() {
        let clock = ScriptedClock::from_nanos(&[
            100, 110, 300, 320, // line: strides 32..256
            10, 10, 40, 41,     // L1: 1K..8K
            5, 5, 5, 5,         // L2: 4K..32K
            10, 30, 31, 32,     // L3: 16K..128K
        ]);

        let descriptor = prober(&clock, SystemAllocator).detect_all();

        assert_eq!(descriptor, CacheDescriptor {
            l1: 2 * KIB,
            l2: 16 * KIB,
            l3: 16 * KIB,
            line: 64,
        });
        assert_eq!(clock.remaining(), 0);
    }

    #[test]
    fn test_failed_level_is_zero_without_aborting_the_pass() {
        let clock = ScriptedClock::from_nanos(&[
            100, 110, 300, 320, // line
            10, 10, 40, 41,     // L1: 1K..8K
            10, 10, 10,         // L2: 4K..16K, 32K refused
            10,                 // L3: 16K, 32K refused
        ]);

        let descriptor = prober(&clock, CappedAllocator { limit: 16 * KIB }).detect_all();

        assert_eq!(descriptor.line, 64);
        assert_eq!(descriptor.l1, 2 * KIB);
        assert_eq!(descriptor.l2, 0);
        assert_eq!(descriptor.l3, 0);
        assert_eq!(clock.remaining(), 0);
    }

    #[test]
    fn test_line_allocation_failure_uses_default_stride() {
        let clock = ScriptedClock::from_nanos(&[10, 10, 40, 41]);
        let prober = prober(&clock, CappedAllocator { limit: 2 * KIB });

        assert_eq!(prober.detect_line(), DEFAULT_LINE_SIZE);
    }

    #[test]
    fn test_single_level_entry_point_detects_line_first() {
        let clock = ScriptedClock::from_nanos(&[100, 100, 100, 500, 10, 10, 40, 41]);
        let prober = prober(&clock, SystemAllocator);

        assert_eq!(prober.detect_l1(), 2 * KIB);
        assert_eq!(clock.intervals_measured(), 8);
    }

    #[test]
    fn test_level_ranges_follow_configuration() {
        let levels = small_levels();
        assert_eq!(CacheLevel::Level1.range(&levels), (KIB, 8 * KIB));
        assert_eq!(CacheLevel::Level3.range(&levels), (16 * KIB, 128 * KIB));
    }

    #[test]
    fn test_timing_source_always_answers() {
        let clock = ScriptedClock::default();
        let mut source = TimingHeuristic::new(prober(&clock, SystemAllocator));

        let descriptor = source.query().expect("timing heuristic answers");
        assert_eq!(source.name(), "timing");
        // Empty script: every interval is zero, so every level falls back
        assert_eq!(descriptor.line, DEFAULT_LINE_SIZE);
        assert_eq!(descriptor.l1, 4 * KIB);
        assert_eq!(descriptor.l2, 16 * KIB);
        assert_eq!(descriptor.l3, 64 * KIB);
    }

    #[test]
    fn test_real_clock_results_stay_in_range() {
        let levels = small_levels();
        let prober = CacheProber::new(
            TimingHarness::with_settings(MonotonicClock, 4096, 1),
            SystemAllocator,
            small_line(),
            levels.clone(),
        );

        let descriptor = prober.detect_all();

        assert!([32, 64, 128, 256].contains(&descriptor.line));
        for (value, (min, max)) in [
            (descriptor.l1, levels.l1()),
            (descriptor.l2, levels.l2()),
            (descriptor.l3, levels.l3()),
        ] {
            assert!(value >= min && value <= max, "{} not in [{}, {}]", value, min, max);
        }
    }
}
