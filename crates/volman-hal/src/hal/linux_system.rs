//! Real capability implementations backed by the host system.

use super::{CommandOutput, FileOps, ProcessOps};
use crate::{HalError, HalResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Real implementation of [`ProcessOps`] and [`FileOps`] for Linux hosts.
///
/// Commands are run synchronously with captured output; non-zero exits
/// surface as [`HalError::CommandFailed`]. There is deliberately no
/// per-command timeout: the mount utilities either finish or the caller's
/// retry policy bounds the overall operation.
#[derive(Debug, Clone, Default)]
pub struct LinuxSystem;

impl LinuxSystem {
    pub fn new() -> Self {
        Self
    }
}

fn map_command_err(program: &str, err: std::io::Error) -> HalError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return HalError::CommandNotFound(program.to_string());
    }
    HalError::Io(err)
}

impl ProcessOps for LinuxSystem {
    fn run_command(&self, program: &str, args: &[&str]) -> HalResult<CommandOutput> {
        log::debug!("running {} {:?}", program, args);

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| map_command_err(program, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(HalError::CommandFailed {
                program: program.to_string(),
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

impl FileOps for LinuxSystem {
    fn read_link(&self, path: &Path) -> HalResult<PathBuf> {
        Ok(fs::read_link(path)?)
    }

    fn write_file_string(&self, path: &Path, contents: &str) -> HalResult<()> {
        Ok(fs::write(path, contents)?)
    }

    fn device_numbers(&self, path: &Path) -> HalResult<(u64, u64)> {
        let stat = nix::sys::stat::stat(path)?;
        let rdev = stat.st_rdev;
        Ok((nix::sys::stat::major(rdev), nix::sys::stat::minor(rdev)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn run_command_captures_stdout() {
        let sys = LinuxSystem::new();
        let output = sys.run_command("echo", &["hello"]).unwrap();
        assert_eq!(output.stdout, "hello\n");
    }

    #[test]
    fn run_command_reports_nonzero_exit() {
        let sys = LinuxSystem::new();
        let err = sys.run_command("false", &[]).unwrap_err();
        assert!(matches!(
            err,
            HalError::CommandFailed { code: Some(1), .. }
        ));
    }

    #[test]
    fn run_command_reports_missing_program() {
        let sys = LinuxSystem::new();
        let err = sys
            .run_command("volman-no-such-program", &[])
            .unwrap_err();
        assert!(matches!(err, HalError::CommandNotFound(_)));
    }

    #[test]
    fn write_file_string_writes_contents() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("delete");

        let sys = LinuxSystem::new();
        sys.write_file_string(&path, "1").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "1");
    }

    #[test]
    fn read_link_resolves_symlink() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("target");
        let link = tmp.path().join("link");
        fs::write(&target, "x").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let sys = LinuxSystem::new();
        assert_eq!(sys.read_link(&link).unwrap(), target);
    }

    #[test]
    fn device_numbers_of_regular_file_are_zero() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("file");
        fs::write(&path, "x").unwrap();

        let sys = LinuxSystem::new();
        assert_eq!(sys.device_numbers(&path).unwrap(), (0, 0));
    }
}
