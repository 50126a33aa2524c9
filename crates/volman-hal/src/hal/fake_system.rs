//! Fake capability implementations for testing.
//!
//! This implementation records all operations without executing them,
//! allowing for CI-safe testing without root privileges or real devices.

use super::{CommandOutput, FileOps, MountRecord, MountTableOps, ProcessOps};
use crate::{HalError, HalResult};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Operation records for testing and verification.
#[derive(Debug, Clone)]
pub enum Operation {
    Command {
        program: String,
        args: Vec<String>,
    },
    ReadLink {
        path: PathBuf,
    },
    WriteFile {
        path: PathBuf,
        contents: String,
    },
}

#[derive(Debug, Clone)]
enum ScriptedResult {
    Succeed(CommandOutput),
    Fail { code: i32, stderr: String },
}

/// Shared state for FakeSystem operations.
#[derive(Debug, Default)]
struct FakeSystemState {
    /// Current fake mount table.
    mounts: Vec<MountRecord>,
    search_mounts_error: Option<String>,
    /// Queued results per program; unscripted invocations succeed with
    /// empty output.
    scripted_commands: HashMap<String, VecDeque<ScriptedResult>>,
    symlinks: HashMap<PathBuf, PathBuf>,
    device_numbers: HashMap<PathBuf, (u64, u64)>,
    write_error: Option<String>,
    /// All operations that were recorded.
    operations: Vec<Operation>,
}

/// Fake system that records operations without executing them.
///
/// Clones share state, so a single instance can be handed to a consumer
/// as mount-table searcher, command runner, and file accessor at once and
/// then inspected afterwards. Successful `mount` and `umount` commands
/// update the fake mount table so multi-step flows observe their own
/// effects.
#[derive(Debug, Clone, Default)]
pub struct FakeSystem {
    state: Arc<Mutex<FakeSystemState>>,
}

impl FakeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mount table returned by `search_mounts`.
    pub fn set_mounts(&self, mounts: Vec<MountRecord>) {
        self.state.lock().unwrap().mounts = mounts;
    }

    /// Make every `search_mounts` call fail with the given message.
    pub fn fail_search_mounts(&self, message: &str) {
        self.state.lock().unwrap().search_mounts_error = Some(message.to_string());
    }

    /// Queue one successful invocation of `program` producing `stdout`.
    pub fn succeed_command(&self, program: &str, stdout: &str) {
        self.push_scripted(
            program,
            ScriptedResult::Succeed(CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
        );
    }

    /// Queue `times` failing invocations of `program`.
    pub fn fail_command(&self, program: &str, times: u32, stderr: &str) {
        for _ in 0..times {
            self.push_scripted(
                program,
                ScriptedResult::Fail {
                    code: 1,
                    stderr: stderr.to_string(),
                },
            );
        }
    }

    /// Register a symlink target for `read_link`.
    pub fn set_symlink(&self, path: impl Into<PathBuf>, target: impl Into<PathBuf>) {
        self.state
            .lock()
            .unwrap()
            .symlinks
            .insert(path.into(), target.into());
    }

    /// Register major/minor numbers for a device node path.
    pub fn set_device_numbers(&self, path: impl Into<PathBuf>, major: u64, minor: u64) {
        self.state
            .lock()
            .unwrap()
            .device_numbers
            .insert(path.into(), (major, minor));
    }

    /// Make every `write_file_string` call fail with the given message.
    pub fn fail_writes(&self, message: &str) {
        self.state.lock().unwrap().write_error = Some(message.to_string());
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().operations.clone()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state.lock().unwrap().operations.iter().any(check)
    }

    /// Number of times `program` was invoked.
    pub fn command_count(&self, program: &str) -> usize {
        self.commands(program).len()
    }

    /// Argument lists of every invocation of `program`, in order.
    pub fn commands(&self, program: &str) -> Vec<Vec<String>> {
        self.state
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::Command {
                    program: recorded,
                    args,
                } if recorded == program => Some(args.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every `(path, contents)` pair passed to `write_file_string`.
    pub fn written_files(&self) -> Vec<(PathBuf, String)> {
        self.state
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::WriteFile { path, contents } => {
                    Some((path.clone(), contents.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn push_scripted(&self, program: &str, result: ScriptedResult) {
        self.state
            .lock()
            .unwrap()
            .scripted_commands
            .entry(program.to_string())
            .or_default()
            .push_back(result);
    }
}

impl MountTableOps for FakeSystem {
    fn search_mounts(&self) -> HalResult<Vec<MountRecord>> {
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.search_mounts_error {
            return Err(HalError::Other(message.clone()));
        }
        Ok(state.mounts.clone())
    }
}

impl ProcessOps for FakeSystem {
    fn run_command(&self, program: &str, args: &[&str]) -> HalResult<CommandOutput> {
        let mut state = self.state.lock().unwrap();
        state.operations.push(Operation::Command {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        });

        let scripted = state
            .scripted_commands
            .get_mut(program)
            .and_then(|queue| queue.pop_front());

        match scripted {
            Some(ScriptedResult::Fail { code, stderr }) => Err(HalError::CommandFailed {
                program: program.to_string(),
                code: Some(code),
                stderr,
            }),
            Some(ScriptedResult::Succeed(output)) => {
                apply_mount_effect(&mut state, program, args);
                Ok(output)
            }
            None => {
                apply_mount_effect(&mut state, program, args);
                Ok(CommandOutput::default())
            }
        }
    }
}

/// Keep the fake mount table consistent with successful mount commands,
/// so multi-step flows observe their own effects.
fn apply_mount_effect(state: &mut FakeSystemState, program: &str, args: &[&str]) {
    match (program, args) {
        ("mount", [device, target, ..]) if !device.is_empty() => {
            state.mounts.push(MountRecord::new(*device, *target));
        }
        ("umount", [target]) => {
            state
                .mounts
                .retain(|record| record.partition_path != *target && record.mount_point != *target);
        }
        _ => {}
    }
}

impl FileOps for FakeSystem {
    fn read_link(&self, path: &Path) -> HalResult<PathBuf> {
        let mut state = self.state.lock().unwrap();
        state.operations.push(Operation::ReadLink {
            path: path.to_path_buf(),
        });
        state
            .symlinks
            .get(path)
            .cloned()
            .ok_or_else(|| HalError::Other(format!("no symlink registered for {}", path.display())))
    }

    fn write_file_string(&self, path: &Path, contents: &str) -> HalResult<()> {
        let mut state = self.state.lock().unwrap();
        state.operations.push(Operation::WriteFile {
            path: path.to_path_buf(),
            contents: contents.to_string(),
        });
        if let Some(message) = &state.write_error {
            return Err(HalError::Other(message.clone()));
        }
        Ok(())
    }

    fn device_numbers(&self, path: &Path) -> HalResult<(u64, u64)> {
        self.state
            .lock()
            .unwrap()
            .device_numbers
            .get(path)
            .copied()
            .ok_or_else(|| {
                HalError::Other(format!(
                    "no device numbers registered for {}",
                    path.display()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_records_commands_in_order() {
        let fake = FakeSystem::new();
        fake.run_command("swapon", &["-s"]).unwrap();
        fake.run_command("swapon", &["/dev/sdb2"]).unwrap();

        assert_eq!(fake.commands("swapon"), vec![vec!["-s"], vec!["/dev/sdb2"]]);
        assert_eq!(fake.command_count("swapon"), 2);
    }

    #[test]
    fn scripted_failures_run_out_before_default_success() {
        let fake = FakeSystem::new();
        fake.fail_command("umount", 2, "target is busy");

        assert!(fake.run_command("umount", &["/mnt/a"]).is_err());
        assert!(fake.run_command("umount", &["/mnt/a"]).is_err());
        assert!(fake.run_command("umount", &["/mnt/a"]).is_ok());
    }

    #[test]
    fn successful_mount_and_umount_update_the_table() {
        let fake = FakeSystem::new();
        fake.run_command("mount", &["/dev/sda1", "/mnt/a"]).unwrap();
        assert_eq!(
            fake.search_mounts().unwrap(),
            vec![MountRecord::new("/dev/sda1", "/mnt/a")]
        );

        fake.run_command("umount", &["/mnt/a"]).unwrap();
        assert!(fake.search_mounts().unwrap().is_empty());
    }

    #[test]
    fn in_place_remount_does_not_grow_the_table() {
        let fake = FakeSystem::new();
        fake.set_mounts(vec![MountRecord::new("/dev/sda1", "/mnt/a")]);

        fake.run_command("mount", &["", "/mnt/a", "-o", "remount"])
            .unwrap();

        assert_eq!(fake.search_mounts().unwrap().len(), 1);
    }

    #[test]
    fn clones_share_state() {
        let fake = FakeSystem::new();
        let clone = fake.clone();
        clone.run_command("mount", &["/dev/sda1", "/mnt/a"]).unwrap();

        assert!(fake.has_operation(|op| matches!(op, Operation::Command { .. })));
    }

    #[test]
    fn write_file_string_records_contents() {
        let fake = FakeSystem::new();
        fake.write_file_string(Path::new("/sys/block/sdb/device/delete"), "1")
            .unwrap();

        assert_eq!(
            fake.written_files(),
            vec![(PathBuf::from("/sys/block/sdb/device/delete"), "1".to_string())]
        );
    }
}
