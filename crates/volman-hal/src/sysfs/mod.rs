//! Sysfs path conventions.

pub mod block;

pub use block::{dev_block_link, whole_disk_delete_path};
