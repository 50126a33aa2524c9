//! Capability trait definitions and implementations.
//!
//! This module defines the traits for system interactions and provides
//! both real (LinuxSystem) and fake (FakeSystem) implementations.

pub mod fake_system;
pub mod file_ops;
pub mod linux_system;
pub mod mount_table_ops;
pub mod process_ops;

pub use fake_system::{FakeSystem, Operation};
pub use file_ops::FileOps;
pub use linux_system::LinuxSystem;
pub use mount_table_ops::{MountRecord, MountTableOps};
pub use process_ops::{CommandOutput, ProcessOps};
