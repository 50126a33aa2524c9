//! Mount-state reconciliation against the live OS mount table.
//!
//! Every operation fetches a fresh mount table, decides whether the
//! request is a no-op, a conflict, or actionable, and only then shells
//! out to the mount utilities. The OS is the single source of truth:
//! nothing is cached between calls, and the gap between reading the table
//! and running a command is an accepted race. Concurrent callers on the
//! same host must serialize externally.

use crate::device::DeviceSpec;
use crate::error::{MountError, MountResult};
use std::path::Path;
use std::thread;
use std::time::Duration;
use volman_hal::hal::{FileOps, MountRecord, MountTableOps, ProcessOps};
use volman_hal::sysfs;

/// Retry behavior for `umount`, injected at construction so tests can use
/// a near-zero sleep and a small ceiling.
///
/// Unmount failures are almost always a transient "target is busy"; the
/// large default ceiling makes the operation block until the holder lets
/// go of its file handles or the ceiling is hit.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total `umount` invocations before giving up. A ceiling of zero is
    /// treated as one attempt.
    pub max_attempts: u32,
    /// Pause between consecutive attempts.
    pub sleep: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 600,
            sleep: Duration::from_secs(1),
        }
    }
}

/// Outcome of [`LinuxMounter::detach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachOutcome {
    /// The kernel was told to drop the device.
    Detached,
    /// The device is still mounted, so nothing was done. Unmount first.
    StillMounted,
}

/// How a mount request relates to the current table.
#[derive(Debug, PartialEq, Eq)]
enum MountDecision {
    /// The exact device/mount-point pair already exists.
    AlreadyMounted,
    Proceed,
}

/// The mount reconciliation engine.
///
/// Holds no mount state of its own; the searcher is queried fresh on
/// every decision point.
pub struct LinuxMounter<S, R, F> {
    searcher: S,
    runner: R,
    files: F,
    retry: RetryPolicy,
}

impl<S, R, F> LinuxMounter<S, R, F>
where
    S: MountTableOps,
    R: ProcessOps,
    F: FileOps,
{
    pub fn new(searcher: S, runner: R, files: F, retry: RetryPolicy) -> Self {
        Self {
            searcher,
            runner,
            files,
            retry,
        }
    }

    /// Mount `device` at `mount_point` with no explicit filesystem type.
    pub fn mount(
        &self,
        device: &DeviceSpec,
        mount_point: &str,
        options: &[&str],
    ) -> MountResult<()> {
        self.mount_filesystem(device, mount_point, None, options)
    }

    /// Mount `device` at `mount_point`, idempotently.
    ///
    /// If the pair is already present in the mount table this is a
    /// successful no-op and no command runs. A conflicting table entry
    /// (same device mounted elsewhere, or the mount point occupied by
    /// another device) fails before any command runs. Mount command
    /// failures are not retried; a failing mount is assumed to be a
    /// configuration error, not a transient condition.
    pub fn mount_filesystem(
        &self,
        device: &DeviceSpec,
        mount_point: &str,
        fstype: Option<&str>,
        options: &[&str],
    ) -> MountResult<()> {
        let records = self.search_mounts()?;
        match evaluate_mount(&records, device, mount_point)? {
            MountDecision::AlreadyMounted => {
                log::debug!("{} already mounted at {}", device, mount_point);
                Ok(())
            }
            MountDecision::Proceed => {
                let mut args = vec![device.as_str(), mount_point];
                if let Some(fstype) = fstype {
                    args.push("-t");
                    args.push(fstype);
                }
                for option in options.iter().copied() {
                    args.push("-o");
                    args.push(option);
                }

                log::info!("mounting {} at {}", device, mount_point);
                self.runner
                    .run_command("mount", &args)
                    .map_err(MountError::MountCommandFailed)?;
                Ok(())
            }
        }
    }

    /// Remount whatever is at `mount_point` back onto the same path
    /// read-only.
    pub fn remount_as_readonly(&self, mount_point: &str) -> MountResult<()> {
        self.remount(mount_point, mount_point, &["ro"])
    }

    /// Relocate the device mounted at `from_mount_point` to
    /// `to_mount_point`.
    ///
    /// Not atomic: between the unmount and the mount the device is
    /// mounted nowhere. The OS offers no atomic relocate; use
    /// [`Self::remount_in_place`] when only options need to change.
    pub fn remount(
        &self,
        from_mount_point: &str,
        to_mount_point: &str,
        options: &[&str],
    ) -> MountResult<()> {
        let device = self
            .is_mount_point(from_mount_point)?
            .ok_or_else(|| MountError::MountPointNotFound(from_mount_point.to_string()))?;

        self.unmount(from_mount_point)
            .map_err(|source| MountError::RemountUnmountFailed {
                mount_point: from_mount_point.to_string(),
                source: Box::new(source),
            })?;

        self.mount(
            &DeviceSpec::from_partition_path(&device),
            to_mount_point,
            options,
        )
    }

    /// Change the options of the mount at `mount_point` without a device
    /// handoff, via the OS's in-place remount.
    pub fn remount_in_place(&self, mount_point: &str, options: &[&str]) -> MountResult<()> {
        if !self.is_mounted(mount_point)? {
            return Err(MountError::MountPointNotFound(mount_point.to_string()));
        }

        // Empty device argument plus the remount option delegates to the
        // kernel's in-place remount, avoiding the unmount/mount window.
        let mut args = vec!["", mount_point, "-o", "remount"];
        for option in options.iter().copied() {
            args.push("-o");
            args.push(option);
        }

        log::info!("remounting {} in place", mount_point);
        self.runner
            .run_command("mount", &args)
            .map_err(MountError::MountCommandFailed)?;
        Ok(())
    }

    /// Activate `partition_path` as swap unless it already is.
    pub fn swap_on(&self, partition_path: &str) -> MountResult<()> {
        // A failing `swapon -s` is treated as "no swap active".
        let status = match self.runner.run_command("swapon", &["-s"]) {
            Ok(output) => output.stdout,
            Err(_) => String::new(),
        };

        if swap_device_active(&status, partition_path) {
            log::debug!("{} is already an active swap device", partition_path);
            return Ok(());
        }

        log::info!("activating swap on {}", partition_path);
        self.runner
            .run_command("swapon", &[partition_path])
            .map_err(MountError::SwapOnFailed)?;
        Ok(())
    }

    /// Unmount by device path or mount point.
    ///
    /// Returns `Ok(false)` if nothing matching is mounted (a successful
    /// no-op), `Ok(true)` once the unmount lands. Failures are reissued
    /// up to the retry ceiling with the configured sleep in between,
    /// without re-checking mount state: the original busy condition is
    /// expected to eventually clear.
    pub fn unmount(&self, device_or_mount_point: &str) -> MountResult<bool> {
        if !self.is_mounted(device_or_mount_point)? {
            log::debug!("{} is not mounted, nothing to do", device_or_mount_point);
            return Ok(false);
        }

        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.runner.run_command("umount", &[device_or_mount_point]) {
                Ok(_) => {
                    log::debug!(
                        "unmounted {} after {} attempt(s)",
                        device_or_mount_point,
                        attempt
                    );
                    return Ok(true);
                }
                Err(source) if attempt >= max_attempts => {
                    return Err(MountError::UnmountFailed {
                        target: device_or_mount_point.to_string(),
                        attempts: attempt,
                        source,
                    });
                }
                Err(source) => {
                    log::debug!(
                        "umount {} attempt {} failed, retrying: {}",
                        device_or_mount_point,
                        attempt,
                        source
                    );
                    thread::sleep(self.retry.sleep);
                }
            }
        }
    }

    /// Tell the kernel to remove the physical device behind `real_path`
    /// from its device tree, e.g. before a safe hot-unplug.
    ///
    /// Refuses (without error) while the device is mounted; callers are
    /// expected to unmount first.
    pub fn detach(&self, real_path: &str) -> MountResult<DetachOutcome> {
        if self.is_mounted(real_path)? {
            log::debug!("{} is still mounted, refusing to detach", real_path);
            return Ok(DetachOutcome::StillMounted);
        }

        let detach_err = |source| MountError::DetachFailed {
            device: real_path.to_string(),
            source,
        };

        let (major, minor) = self
            .files
            .device_numbers(Path::new(real_path))
            .map_err(detach_err)?;
        let resolved = self
            .files
            .read_link(&sysfs::dev_block_link(major, minor))
            .map_err(detach_err)?;
        let delete_path = sysfs::whole_disk_delete_path(&resolved).map_err(detach_err)?;

        self.files
            .write_file_string(&delete_path, "1")
            .map_err(detach_err)?;

        log::info!(
            "told kernel to delete device behind {} via {}",
            real_path,
            delete_path.display()
        );
        Ok(DetachOutcome::Detached)
    }

    /// The device mounted at exactly `path`, if any.
    pub fn is_mount_point(&self, path: &str) -> MountResult<Option<String>> {
        let records = self.search_mounts()?;
        Ok(records
            .into_iter()
            .find(|record| record.mount_point == path)
            .map(|record| record.partition_path))
    }

    /// Whether anything in the table matches `device_or_mount_point` on
    /// either field.
    pub fn is_mounted(&self, device_or_mount_point: &str) -> MountResult<bool> {
        let records = self.search_mounts()?;
        Ok(records.iter().any(|record| {
            record.partition_path == device_or_mount_point
                || record.mount_point == device_or_mount_point
        }))
    }

    fn search_mounts(&self) -> MountResult<Vec<MountRecord>> {
        self.searcher.search_mounts().map_err(MountError::MountTable)
    }
}

/// Scan a fresh table for the requested pair; first matching record wins.
fn evaluate_mount(
    records: &[MountRecord],
    device: &DeviceSpec,
    mount_point: &str,
) -> MountResult<MountDecision> {
    let partition_path = device.as_str();

    for record in records {
        if record.partition_path == partition_path && record.mount_point == mount_point {
            return Ok(MountDecision::AlreadyMounted);
        }
        // Memory-backed filesystems may be mounted at several points at
        // once, so a second mount point is not a conflict for them.
        if record.partition_path == partition_path && !device.is_memory_backed() {
            return Err(MountError::AlreadyMountedElsewhere {
                device: partition_path.to_string(),
                existing: record.mount_point.clone(),
                requested: mount_point.to_string(),
            });
        }
        if record.mount_point == mount_point {
            return Err(MountError::MountPointOccupied {
                mount_point: mount_point.to_string(),
                occupying: record.partition_path.clone(),
                requested: partition_path.to_string(),
            });
        }
    }

    Ok(MountDecision::Proceed)
}

/// Whether `partition_path` appears as an active swap device in
/// `swapon -s` output. The first line is a header and always skipped.
fn swap_device_active(swapon_output: &str, partition_path: &str) -> bool {
    swapon_output
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .any(|device| device == partition_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<MountRecord> {
        vec![
            MountRecord::new("/dev/sda1", "/mnt/a"),
            MountRecord::new("tmpfs", "/dev/shm"),
        ]
    }

    #[test]
    fn evaluate_mount_detects_satisfied_request() {
        let decision =
            evaluate_mount(&table(), &DeviceSpec::physical("/dev/sda1"), "/mnt/a").unwrap();
        assert_eq!(decision, MountDecision::AlreadyMounted);
    }

    #[test]
    fn evaluate_mount_proceeds_on_empty_table() {
        let decision =
            evaluate_mount(&[], &DeviceSpec::physical("/dev/sda1"), "/mnt/a").unwrap();
        assert_eq!(decision, MountDecision::Proceed);
    }

    #[test]
    fn evaluate_mount_rejects_device_mounted_elsewhere() {
        let err =
            evaluate_mount(&table(), &DeviceSpec::physical("/dev/sda1"), "/mnt/b").unwrap_err();
        assert!(matches!(
            err,
            MountError::AlreadyMountedElsewhere { existing, requested, .. }
                if existing == "/mnt/a" && requested == "/mnt/b"
        ));
    }

    #[test]
    fn evaluate_mount_rejects_occupied_mount_point() {
        let err =
            evaluate_mount(&table(), &DeviceSpec::physical("/dev/sdb1"), "/mnt/a").unwrap_err();
        assert!(matches!(
            err,
            MountError::MountPointOccupied { occupying, requested, .. }
                if occupying == "/dev/sda1" && requested == "/dev/sdb1"
        ));
    }

    #[test]
    fn evaluate_mount_exempts_memory_backed_devices() {
        let decision = evaluate_mount(&table(), &DeviceSpec::MemoryBacked, "/mnt/y").unwrap();
        assert_eq!(decision, MountDecision::Proceed);
    }

    #[test]
    fn swap_device_active_skips_header_line() {
        let output = "Filename\tType\tSize\tUsed\tPriority\n/dev/sdb2 partition 1024 0 -2\n";
        assert!(swap_device_active(output, "/dev/sdb2"));
        assert!(!swap_device_active(output, "/dev/sdc1"));
    }

    #[test]
    fn swap_device_active_ignores_blank_lines_and_header_only_output() {
        assert!(!swap_device_active(
            "Filename\tType\tSize\tUsed\tPriority\n\n",
            "/dev/sdb2"
        ));
        // A device named only in the header line does not count.
        assert!(!swap_device_active("/dev/sdb2 partition\n", "/dev/sdb2"));
    }
}
