// src/report/mod.rs

pub mod format;
pub mod system_info;
pub mod probe_report;

pub use format::format_bytes;
pub use system_info::SystemInfo;
pub use probe_report::ProbeReport;
