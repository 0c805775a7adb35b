// src/report/system_info.rs

use serde::{Deserialize, Serialize};
use crate::report::format::format_bytes;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub os: String,
    pub os_version: String,
    pub arch: String,
    pub cpu_model: String,
    pub cpu_cores: usize,
    pub cpu_threads: usize,
    pub smt: bool,
    pub total_memory_mb: u64,
    /// Virtual memory page size; working sets above it span several pages
    pub page_size_bytes: Option<usize>,
}

impl SystemInfo {
    pub fn collect() -> Self {
        use sysinfo::System;

        let mut sys = System::new_all();
        sys.refresh_all();

        // CPU info
        let cpu_model = sys.cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let cpu_cores = sys.physical_core_count().unwrap_or(0);
        let cpu_threads = sys.cpus().len();
        // Sibling threads share L1/L2, which skews timings when they are busy
        let smt = cpu_cores > 0 && cpu_threads > cpu_cores;

        // Memory in MB
        let total_memory_mb = sys.total_memory() / 1024 / 1024;

        // OS info
        let os = System::name().unwrap_or_else(|| "Unknown".to_string());
        let os_version = System::os_version().unwrap_or_else(|| "Unknown".to_string());
        let hostname = System::host_name().unwrap_or_else(|| "Unknown".to_string());

        SystemInfo {
            hostname,
            os,
            os_version,
            arch: std::env::consts::ARCH.to_string(),
            cpu_model,
            cpu_cores,
            cpu_threads,
            smt,
            total_memory_mb,
            page_size_bytes: page_size(),
        }
    }

    pub fn to_string_pretty(&self) -> String {
        format!(
            r#"System Information:
  Hostname:     {}
  OS:           {} {} ({})
  CPU:          {} ({} cores, {} threads{})
  Memory:       {} MB, {} pages
"#,
            self.hostname,
            self.os,
            self.os_version,
            self.arch,
            self.cpu_model,
            self.cpu_cores,
            self.cpu_threads,
            if self.smt { ", SMT" } else { "" },
            self.total_memory_mb,
            self.page_size_bytes.map(format_bytes).unwrap_or_else(|| "unknown".to_string()),
        )
    }
}

#[cfg(unix)]
fn page_size() -> Option<usize> {
    // SAFETY: sysconf only reads a system constant.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 { Some(size as usize) } else { None }
}

#[cfg(not(unix))]
fn page_size() -> Option<usize> {
    None
}
