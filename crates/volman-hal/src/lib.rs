//! Capability interfaces for volman.
//!
//! Everything "world-touching" that the mount reconciliation engine needs
//! lives behind the traits in this crate: querying the live mount table,
//! running external commands, and touching sysfs files. Real backends are
//! provided for Linux ([`LinuxSystem`]) alongside a recording fake
//! ([`FakeSystem`]) for CI-safe tests without root privileges or real
//! devices.

pub mod error;
pub mod hal;
pub mod sysfs;

pub use error::{HalError, HalResult};
pub use hal::{
    CommandOutput, FakeSystem, FileOps, LinuxSystem, MountRecord, MountTableOps, Operation,
    ProcessOps,
};
