// ─── Memory Allocator ───
// Derives JVM heap bounds from total host memory.

use serde::{Deserialize, Serialize};

use crate::core::config::MemoryPolicy;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Heap bounds in megabytes. `min <= max`, both positive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryBounds {
    pub min: u64,
    pub max: u64,
}

impl MemoryBounds {
    /// Bounds for a host with `total_mb` of memory.
    ///
    /// The floor wins even when it exceeds what the host has: launching
    /// with a too-large heap beats refusing to launch at all.
    pub fn for_host_mb(total_mb: u64, policy: &MemoryPolicy) -> Self {
        let floor = policy.floor_mb.max(1);
        let ceiling = policy.ceiling_mb.max(floor);

        let candidate = total_mb.saturating_sub(policy.reservation_mb);
        let max = candidate.max(floor).min(ceiling);

        Self { min: floor, max }
    }

    pub fn for_host_bytes(total_bytes: u64, policy: &MemoryPolicy) -> Self {
        Self::for_host_mb(total_bytes / BYTES_PER_MB, policy)
    }

    /// Bounds from a user-chosen maximum. `min` drops to `max` when the
    /// override sits below the floor.
    pub fn from_override(max_mb: u64, policy: &MemoryPolicy) -> Self {
        let max = max_mb.max(1);
        Self {
            min: policy.floor_mb.max(1).min(max),
            max,
        }
    }
}

/// Total physical memory of this machine, in bytes.
pub fn host_total_memory_bytes() -> u64 {
    let mut system = sysinfo::System::new();
    system.refresh_memory();
    system.total_memory()
}

/// Parse a heap override such as `"4096"`, `"4096M"` or `"4G"`.
/// Returns `None` for anything not well-formed or zero.
pub fn parse_memory_mb(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let last = trimmed.chars().last()?;
    let (digits, multiplier) = match last.to_ascii_uppercase() {
        'M' => (&trimmed[..trimmed.len() - 1], 1),
        'G' => (&trimmed[..trimmed.len() - 1], 1024),
        _ => (trimmed, 1),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: u64 = digits.parse().ok()?;
    let mb = value.checked_mul(multiplier)?;
    (mb > 0).then_some(mb)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> MemoryPolicy {
        MemoryPolicy::default()
    }

    #[test]
    fn bounds_stay_within_floor_and_ceiling() {
        for total in [0, 512, 1024, 2048, 3000, 4096, 8192, 10240, 16384, 65536, u64::MAX] {
            let bounds = MemoryBounds::for_host_mb(total, &policy());
            assert_eq!(bounds.min, 1024, "total={total}");
            assert!(bounds.max >= 1024 && bounds.max <= 8192, "total={total}");
        }
    }

    #[test]
    fn max_is_monotonic_in_host_memory() {
        let mut previous = 0;
        for total in (0..20_000).step_by(256) {
            let max = MemoryBounds::for_host_mb(total, &policy()).max;
            assert!(max >= previous, "total={total}");
            previous = max;
        }
    }

    #[test]
    fn reservation_is_subtracted() {
        assert_eq!(MemoryBounds::for_host_mb(6144, &policy()).max, 4096);
        assert_eq!(MemoryBounds::for_host_mb(2500, &policy()).max, 1024);
        assert_eq!(MemoryBounds::for_host_mb(32768, &policy()).max, 8192);
    }

    #[test]
    fn bytes_are_converted_to_megabytes() {
        let sixteen_gb = 16 * 1024 * BYTES_PER_MB;
        assert_eq!(MemoryBounds::for_host_bytes(sixteen_gb, &policy()).max, 8192);
    }

    #[test]
    fn small_override_lowers_min() {
        let bounds = MemoryBounds::from_override(768, &policy());
        assert_eq!(bounds, MemoryBounds { min: 768, max: 768 });
        let bounds = MemoryBounds::from_override(6000, &policy());
        assert_eq!(bounds, MemoryBounds { min: 1024, max: 6000 });
    }

    #[test]
    fn parses_memory_overrides() {
        assert_eq!(parse_memory_mb("4096"), Some(4096));
        assert_eq!(parse_memory_mb(" 4096M "), Some(4096));
        assert_eq!(parse_memory_mb("4g"), Some(4096));
        assert_eq!(parse_memory_mb(""), None);
        assert_eq!(parse_memory_mb("M"), None);
        assert_eq!(parse_memory_mb("0"), None);
        assert_eq!(parse_memory_mb("-512"), None);
        assert_eq!(parse_memory_mb("4.5G"), None);
        assert_eq!(parse_memory_mb("lots"), None);
    }
}
