// src/core/cpu_info.rs

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use cache_size::{l1_cache_size, l1_cache_line_size, l2_cache_size, l3_cache_size};
use crate::core::aggregator::CacheDescriptor;

/// Where Linux exposes the cache hierarchy of the first CPU.
pub const SYSFS_CACHE_DIR: &str = "/sys/devices/system/cpu/cpu0/cache";

/// Platform interfaces that can report cache geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeBackend {
    /// `sysctlbyname("hw.cachelinesize")` and friends (macOS).
    Sysctl,
    /// `index*/` entries under a sysfs cache directory (Linux).
    Sysfs(PathBuf),
    /// CPUID through the `cache-size` crate (x86).
    Cpuid,
}

impl NativeBackend {
    /// Backends worth asking on this machine, most precise first. CPUID always
    /// closes the list.
    pub fn available() -> Vec<NativeBackend> {
        let mut backends = Vec::new();
        if cfg!(target_os = "macos") {
            backends.push(NativeBackend::Sysctl);
        }
        if Path::new(SYSFS_CACHE_DIR).is_dir() {
            backends.push(NativeBackend::Sysfs(PathBuf::from(SYSFS_CACHE_DIR)));
        }
        backends.push(NativeBackend::Cpuid);
        backends
    }

    pub fn name(&self) -> &'static str {
        match self {
            NativeBackend::Sysctl => "sysctl",
            NativeBackend::Sysfs(_) => "sysfs",
            NativeBackend::Cpuid => "cpuid",
        }
    }

    pub fn descriptor(&self) -> Option<CacheDescriptor> {
        let descriptor = match self {
            NativeBackend::Sysctl => sysctl_descriptor(),
            NativeBackend::Sysfs(dir) => sysfs_descriptor(dir),
            NativeBackend::Cpuid => CPUInfo::descriptor(),
        };
        debug!("{} reports {:?}", self.name(), descriptor);
        descriptor
    }
}

pub struct CPUInfo;

impl CPUInfo {
    // Fetches the total size in bytes of the L1 data cache.
    pub fn l1_cache_size() -> Option<usize> {
        l1_cache_size()
    }

    // Fetches the line size in bytes of the L1 data cache.
    pub fn cache_line_size() -> Option<usize> {
        l1_cache_line_size()
    }

    // Fetches the total size in bytes of the unified L2 cache.
    pub fn l2_cache_size() -> Option<usize> {
        l2_cache_size()
    }

    // Fetches the total size in bytes of the unified L3 cache.
    pub fn l3_cache_size() -> Option<usize> {
        l3_cache_size()
    }

    /// CPUID view. `None` unless at least the line size is known; missing levels are 0.
    pub fn descriptor() -> Option<CacheDescriptor> {
        let line = Self::cache_line_size().filter(|&line| line > 0)?;
        Some(CacheDescriptor {
            l1: Self::l1_cache_size().unwrap_or(0),
            l2: Self::l2_cache_size().unwrap_or(0),
            l3: Self::l3_cache_size().unwrap_or(0),
            line,
        })
    }
}

#[cfg(target_os = "macos")]
fn sysctl_value(name: &str) -> Option<usize> {
    use std::ffi::CString;

    let name = CString::new(name).ok()?;
    let mut value: u64 = 0;
    let mut len = std::mem::size_of::<u64>();
    // SAFETY: `value` provides `len` writable bytes and the name is NUL terminated.
    let rc = unsafe {
        libc::sysctlbyname(
            name.as_ptr(),
            &mut value as *mut u64 as *mut libc::c_void,
            &mut len,
            std::ptr::null_mut(),
            0,
        )
    };
    if rc != 0 || value == 0 {
        return None;
    }
    Some(value as usize)
}

#[cfg(target_os = "macos")]
fn sysctl_descriptor() -> Option<CacheDescriptor> {
    let line = sysctl_value("hw.cachelinesize")?;
    Some(CacheDescriptor {
        l1: sysctl_value("hw.l1dcachesize").unwrap_or(0),
        l2: sysctl_value("hw.l2cachesize").unwrap_or(0),
        // Apple Silicon has no hw.l3cachesize; its SLC is not reported
        l3: sysctl_value("hw.l3cachesize").unwrap_or(0),
        line,
    })
}

#[cfg(not(target_os = "macos"))]
fn sysctl_descriptor() -> Option<CacheDescriptor> {
    None
}

/// Parses sysfs sizes such as `48K`, `2048K` or `32M`.
pub fn parse_sysfs_size(text: &str) -> Option<usize> {
    let text = text.trim();
    let (digits, multiplier) = match text.chars().last()? {
        'K' | 'k' => (&text[..text.len() - 1], 1024),
        'M' | 'm' => (&text[..text.len() - 1], 1024 * 1024),
        'G' | 'g' => (&text[..text.len() - 1], 1024 * 1024 * 1024),
        _ => (text, 1),
    };
    digits.trim().parse::<usize>().ok()?.checked_mul(multiplier)
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

/// Reads every `index*` entry of a sysfs cache directory. Instruction caches are
/// skipped; the line size comes from L1 data when present.
pub fn sysfs_descriptor(dir: &Path) -> Option<CacheDescriptor> {
    let mut descriptor = CacheDescriptor::default();
    let mut l1_line = None;
    let mut any_line = None;

    for entry in fs::read_dir(dir).ok()?.flatten() {
        if !entry.file_name().to_string_lossy().starts_with("index") {
            continue;
        }
        let index = entry.path();

        let kind = read_trimmed(&index.join("type")).unwrap_or_default();
        if kind == "Instruction" {
            continue;
        }
        let level = match read_trimmed(&index.join("level")).and_then(|l| l.parse::<u32>().ok()) {
            Some(level) => level,
            None => continue,
        };
        let size = read_trimmed(&index.join("size"))
            .and_then(|s| parse_sysfs_size(&s))
            .unwrap_or(0);
        let line = read_trimmed(&index.join("coherency_line_size"))
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&line| line > 0);

        match level {
            1 => {
                descriptor.l1 = size;
                l1_line = line.or(l1_line);
            }
            2 => descriptor.l2 = size,
            3 => descriptor.l3 = size,
            _ => {}
        }
        any_line = any_line.or(line);
    }

    descriptor.line = l1_line.or(any_line)?;
    Some(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_index(root: &Path, name: &str, level: &str, kind: &str, size: &str, line: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("level"), format!("{}\n", level)).unwrap();
        fs::write(dir.join("type"), format!("{}\n", kind)).unwrap();
        fs::write(dir.join("size"), format!("{}\n", size)).unwrap();
        fs::write(dir.join("coherency_line_size"), format!("{}\n", line)).unwrap();
    }

    #[test]
    fn test_sysfs_fixture_parses_into_descriptor() {
        let root = tempfile::tempdir().unwrap();
        write_index(root.path(), "index0", "1", "Data", "48K", "64");
        write_index(root.path(), "index1", "1", "Instruction", "32K", "64");
        write_index(root.path(), "index2", "2", "Unified", "2048K", "64");
        write_index(root.path(), "index3", "3", "Unified", "30M", "64");
        // Not a cache entry
        fs::write(root.path().join("uevent"), "").unwrap();

        let descriptor = sysfs_descriptor(root.path()).unwrap();

        assert_eq!(descriptor, CacheDescriptor {
            l1: 48 * 1024,
            l2: 2 * 1024 * 1024,
            l3: 30 * 1024 * 1024,
            line: 64,
        });
    }

    #[test]
    fn test_sysfs_without_l3_leaves_it_undetermined() {
        let root = tempfile::tempdir().unwrap();
        write_index(root.path(), "index0", "1", "Data", "64K", "128");
        write_index(root.path(), "index1", "2", "Unified", "4096K", "128");

        let descriptor = sysfs_descriptor(root.path()).unwrap();
        assert_eq!(descriptor.l3, 0);
        assert_eq!(descriptor.line, 128);
    }

    #[test]
    fn test_sysfs_without_entries_does_not_answer() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(sysfs_descriptor(root.path()), None);
        assert_eq!(sysfs_descriptor(&root.path().join("missing")), None);
    }

    #[test]
    fn test_parse_sysfs_size() {
        assert_eq!(parse_sysfs_size("32K"), Some(32 * 1024));
        assert_eq!(parse_sysfs_size("16M\n"), Some(16 * 1024 * 1024));
        assert_eq!(parse_sysfs_size("512"), Some(512));
        assert_eq!(parse_sysfs_size(""), None);
        assert_eq!(parse_sysfs_size("K"), None);
    }

    #[test]
    fn test_cpuid_is_always_the_last_backend() {
        let backends = NativeBackend::available();
        assert_eq!(backends.last(), Some(&NativeBackend::Cpuid));
        assert_eq!(backends.contains(&NativeBackend::Sysctl), cfg!(target_os = "macos"));
    }
}
