// src/report/format.rs

const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

/// Scales a byte count to the largest unit that keeps the quantity integral and at
/// least one, e.g. `65536` → `64 KiB`. Zero reads as "undetermined".
pub fn format_bytes(bytes: usize) -> String {
    if bytes == 0 {
        return "undetermined".to_string();
    }

    let mut quantity = bytes;
    let mut unit = 0;
    while unit + 1 < UNITS.len() && quantity >= 1024 && quantity % 1024 == 0 {
        quantity /= 1024;
        unit += 1;
    }

    format!("{} {}", quantity, UNITS[unit])
}
