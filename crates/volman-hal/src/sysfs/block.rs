//! Helpers related to block devices in sysfs.

use crate::{HalError, HalResult};
use std::path::{Path, PathBuf};

/// Path of the sysfs symlink describing the block device with the given
/// major/minor numbers.
pub fn dev_block_link(major: u64, minor: u64) -> PathBuf {
    PathBuf::from(format!("/sys/dev/block/{}:{}", major, minor))
}

/// Location of the kernel's device-removal control file for the whole
/// disk containing the resolved sysfs node.
///
/// The `/sys/dev/block/<major>:<minor>` symlink resolves either to a
/// partition node (`.../block/sda/sda1`) or to a whole-disk node
/// (`.../block/sda`). When the immediate parent directory is literally
/// `block`, the node is already the whole disk; otherwise the parent
/// directory name is the whole disk.
pub fn whole_disk_delete_path(resolved: &Path) -> HalResult<PathBuf> {
    let name = component_name(resolved)?;
    let parent = resolved.parent().ok_or_else(|| bad_path(resolved))?;
    let parent_name = component_name(parent)?;

    let disk = if parent_name == "block" { name } else { parent_name };
    Ok(PathBuf::from("/sys/block").join(disk).join("device/delete"))
}

fn component_name(path: &Path) -> HalResult<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| bad_path(path))
}

fn bad_path(path: &Path) -> HalError {
    HalError::Parse(format!("unexpected sysfs block path {}", path.display()))
}
