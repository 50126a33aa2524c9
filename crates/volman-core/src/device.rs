//! Typed device identity for mount requests.

use std::fmt;

/// The memory-backed pseudo-device identifier understood by `mount`.
const MEMORY_BACKED_DEVICE: &str = "tmpfs";

/// Identity of the thing being mounted.
///
/// Memory-backed filesystems may legitimately be mounted at several
/// points at once, so they are exempt from the single-mount-point
/// conflict rule. The tagged variant makes that exemption explicit
/// instead of hiding it behind a string comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSpec {
    /// A block device node, e.g. `/dev/sdb1`.
    Physical(String),
    /// The memory-backed pseudo-device (`tmpfs`).
    MemoryBacked,
}

impl DeviceSpec {
    pub fn physical(path: impl Into<String>) -> Self {
        DeviceSpec::Physical(path.into())
    }

    /// Classify a raw partition path as it appears in the mount table.
    pub fn from_partition_path(path: &str) -> Self {
        if path == MEMORY_BACKED_DEVICE {
            DeviceSpec::MemoryBacked
        } else {
            DeviceSpec::Physical(path.to_string())
        }
    }

    /// The device argument passed to the mount command.
    pub fn as_str(&self) -> &str {
        match self {
            DeviceSpec::Physical(path) => path,
            DeviceSpec::MemoryBacked => MEMORY_BACKED_DEVICE,
        }
    }

    pub fn is_memory_backed(&self) -> bool {
        matches!(self, DeviceSpec::MemoryBacked)
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_partition_path_recognizes_tmpfs() {
        assert_eq!(
            DeviceSpec::from_partition_path("tmpfs"),
            DeviceSpec::MemoryBacked
        );
        assert_eq!(
            DeviceSpec::from_partition_path("/dev/sda1"),
            DeviceSpec::physical("/dev/sda1")
        );
    }

    #[test]
    fn memory_backed_renders_as_tmpfs() {
        assert_eq!(DeviceSpec::MemoryBacked.as_str(), "tmpfs");
        assert!(DeviceSpec::MemoryBacked.is_memory_backed());
        assert!(!DeviceSpec::physical("/dev/sda1").is_memory_backed());
    }
}
