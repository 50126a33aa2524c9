//! Live mount table access trait.

use crate::HalResult;

/// One live OS mount entry: a block device (or pseudo-device identifier)
/// paired with the path where its contents are visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    pub partition_path: String,
    pub mount_point: String,
}

impl MountRecord {
    pub fn new(partition_path: impl Into<String>, mount_point: impl Into<String>) -> Self {
        Self {
            partition_path: partition_path.into(),
            mount_point: mount_point.into(),
        }
    }
}

/// Trait for querying the currently active mounts.
///
/// Implementations must return a fresh snapshot on every call; consumers
/// never cache a table across decisions. How the underlying mount-table
/// text (e.g. `/proc/mounts`) is parsed into records is the implementor's
/// concern, not this crate's.
pub trait MountTableOps {
    fn search_mounts(&self) -> HalResult<Vec<MountRecord>>;
}
