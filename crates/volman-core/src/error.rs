use thiserror::Error;
use volman_hal::HalError;

pub type MountResult<T> = std::result::Result<T, MountError>;

#[derive(Error, Debug)]
pub enum MountError {
    #[error("Searching mounts: {0}")]
    MountTable(#[source] HalError),

    #[error("Device {device} is already mounted to {existing}, can't mount to {requested}")]
    AlreadyMountedElsewhere {
        device: String,
        existing: String,
        requested: String,
    },

    #[error("Device {occupying} is already mounted to {mount_point}, can't mount {requested}")]
    MountPointOccupied {
        mount_point: String,
        occupying: String,
        requested: String,
    },

    #[error("Shelling out to mount: {0}")]
    MountCommandFailed(#[source] HalError),

    #[error("Shelling out to swapon: {0}")]
    SwapOnFailed(#[source] HalError),

    #[error("Unmounting {target} failed after {attempts} attempts: {source}")]
    UnmountFailed {
        target: String,
        attempts: u32,
        #[source]
        source: HalError,
    },

    #[error("Unmounting {mount_point} for remount: {source}")]
    RemountUnmountFailed {
        mount_point: String,
        #[source]
        source: Box<MountError>,
    },

    #[error("No device found mounted at {0}")]
    MountPointNotFound(String),

    #[error("Detaching {device}: {source}")]
    DetachFailed {
        device: String,
        #[source]
        source: HalError,
    },
}
