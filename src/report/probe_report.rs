// src/report/probe_report.rs

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::core::aggregator::CacheDescriptor;
use crate::error::Result;
use crate::report::format::format_bytes;
use crate::report::system_info::SystemInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    pub timestamp: DateTime<Utc>,
    pub system_info: SystemInfo,
    /// Which source produced `descriptor` ("native" or "timing")
    pub source: String,
    pub descriptor: CacheDescriptor,
    /// Platform answer kept alongside a timing result as a cross-check
    pub native: Option<CacheDescriptor>,
    pub elapsed_ms: u64,
}

impl ProbeReport {
    pub fn new(source: &str, descriptor: CacheDescriptor, system_info: SystemInfo) -> Self {
        ProbeReport {
            timestamp: Utc::now(),
            system_info,
            source: source.to_string(),
            descriptor,
            native: None,
            elapsed_ms: 0,
        }
    }

    pub fn with_native(mut self, native: Option<CacheDescriptor>) -> Self {
        self.native = native;
        self
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let report = serde_json::from_str(&json)?;
        Ok(report)
    }

    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("CACHE HIERARCHY");
        println!("{}", "=".repeat(60));
        println!("\nTimestamp: {}", self.timestamp);
        println!("{}", self.system_info.to_string_pretty());

        println!("{}", "-".repeat(60));
        println!("{:<20} {:>18} {:>18}", "Level", self.source, "native");
        println!("{}", "-".repeat(60));

        let rows = [
            ("L1", self.descriptor.l1, self.native.map(|n| n.l1)),
            ("L2", self.descriptor.l2, self.native.map(|n| n.l2)),
            ("L3/SLC", self.descriptor.l3, self.native.map(|n| n.l3)),
            ("Cache line", self.descriptor.line, self.native.map(|n| n.line)),
        ];
        for (name, value, native) in rows {
            let native = native.map(format_bytes).unwrap_or_else(|| "-".to_string());
            println!("{:<20} {:>18} {:>18}", name, format_bytes(value), native);
        }

        if self.elapsed_ms > 0 {
            println!("\nProbe time: {} ms", self.elapsed_ms);
        }
        println!("{}", "=".repeat(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> SystemInfo {
        SystemInfo {
            hostname: "bench".to_string(),
            os: "Linux".to_string(),
            os_version: "6.1".to_string(),
            arch: "x86_64".to_string(),
            cpu_model: "Test CPU".to_string(),
            cpu_cores: 4,
            cpu_threads: 8,
            smt: true,
            total_memory_mb: 16384,
            page_size_bytes: Some(4096),
        }
    }

    #[test]
    fn test_save_and_load_report() {
        let descriptor = CacheDescriptor { l1: 32 * 1024, l2: 1024 * 1024, l3: 0, line: 64 };
        let report = ProbeReport::new("timing", descriptor, sample_info())
            .with_native(Some(CacheDescriptor { l1: 48 * 1024, l2: 1280 * 1024, l3: 12 << 20, line: 64 }))
            .with_elapsed_ms(1234);

        let path = std::env::temp_dir().join(format!("cacheprobe-report-{}.json", std::process::id()));
        let path = path.to_string_lossy().to_string();
        report.save_to_file(&path).unwrap();
        let loaded = ProbeReport::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.source, "timing");
        assert_eq!(loaded.descriptor, descriptor);
        assert_eq!(loaded.native.map(|n| n.l3), Some(12 << 20));
        assert_eq!(loaded.elapsed_ms, 1234);
        assert_eq!(loaded.system_info.cpu_threads, 8);
        assert!(loaded.system_info.smt);
        assert_eq!(loaded.system_info.page_size_bytes, Some(4096));
    }
}
