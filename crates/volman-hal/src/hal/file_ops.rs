//! File and device-node access trait for the sysfs detach path.

use crate::HalResult;
use std::path::{Path, PathBuf};

/// The small slice of filesystem access the detach flow needs: resolving
/// sysfs symlinks, writing kernel control files, and reading the device
/// numbers of a block device node.
pub trait FileOps {
    /// Resolve a symbolic link to its target.
    fn read_link(&self, path: &Path) -> HalResult<PathBuf>;

    /// Write a small control string to a file.
    fn write_file_string(&self, path: &Path, contents: &str) -> HalResult<()>;

    /// Major and minor numbers of the block device node at `path`.
    fn device_numbers(&self, path: &Path) -> HalResult<(u64, u64)>;
}
