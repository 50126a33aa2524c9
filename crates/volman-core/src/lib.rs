//! Block-device mount lifecycle management.
//!
//! The [`LinuxMounter`] reconciles requested mount state against the live
//! OS mount table: it mounts, unmounts, remounts, activates swap, and
//! detaches devices idempotently, shelling out to the standard mount
//! utilities through the capability traits of `volman-hal`. Callers can
//! invoke every operation repeatedly without tracking prior state; the
//! mount table is re-read on every decision.

pub mod device;
pub mod error;
pub mod mounter;

pub use device::DeviceSpec;
pub use error::{MountError, MountResult};
pub use mounter::{DetachOutcome, LinuxMounter, RetryPolicy};
