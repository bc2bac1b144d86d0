use std::ffi::OsString;
#[cfg(unix)]
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, Command as ProcessCommand, Stdio};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(unix)]
use nix::sys::signal::{kill, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use crate::control::{ControlCommand, ControlError, ControlPipe};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::pump::spawn_pump;

const SHUTDOWN_POLL: Duration = Duration::from_millis(40);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn label(self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Output { stream: StreamKind, text: String },
    StreamClosed { stream: StreamKind },
    StreamFailed {
        pid: u32,
        stream: StreamKind,
        reason: String,
    },
    Exited {
        pid: u32,
        diagnostic: String,
    },
}

/// Command line for one runner launch: `wrapper launcher project_root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub wrapper: PathBuf,
    pub launcher: PathBuf,
    pub project_root: PathBuf,
}

impl LaunchSpec {
    pub fn new(
        wrapper: impl Into<PathBuf>,
        launcher: impl Into<PathBuf>,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            wrapper: wrapper.into(),
            launcher: launcher.into(),
            project_root: project_root.into(),
        }
    }

    pub fn argv(&self) -> [OsString; 3] {
        [
            self.wrapper.clone().into_os_string(),
            self.launcher.clone().into_os_string(),
            self.project_root.clone().into_os_string(),
        ]
    }

    pub fn display_command(&self) -> String {
        format!(
            "{} {} {}",
            self.wrapper.display(),
            self.launcher.display(),
            self.project_root.display()
        )
    }

    fn command(&self) -> ProcessCommand {
        let [wrapper, launcher, project_root] = self.argv();
        let mut process = ProcessCommand::new(wrapper);
        process
            .args([launcher, project_root])
            .current_dir(&self.project_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        process.process_group(0);
        process
    }
}

#[derive(Debug)]
pub enum ProcessManagerError {
    AlreadyRunning {
        project_root: PathBuf,
    },
    Spawn {
        command: String,
        error: std::io::Error,
    },
    MissingStdio {
        command: String,
    },
    NotStarted,
    NotRunning {
        state: LifecycleState,
    },
    Control(ControlError),
}

impl std::fmt::Display for ProcessManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessManagerError::AlreadyRunning { project_root } => write!(
                f,
                "guard is already running for {}",
                project_root.display()
            ),
            ProcessManagerError::Spawn { command, error } => {
                write!(f, "failed to spawn guard with command `{command}`: {error}")
            }
            ProcessManagerError::MissingStdio { command } => {
                write!(f, "guard command `{command}` missing stdin/stdout/stderr pipe")
            }
            ProcessManagerError::NotStarted => write!(f, "guard has not been started"),
            ProcessManagerError::NotRunning { state } => {
                write!(f, "guard is not running (state: {state})")
            }
            ProcessManagerError::Control(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ProcessManagerError {}

impl From<ControlError> for ProcessManagerError {
    fn from(value: ControlError) -> Self {
        Self::Control(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownProgress {
    SendingStop,
    Waiting,
    Terminating,
    Complete { forced: bool },
}

struct ProcessHandle {
    spec: LaunchSpec,
    pid: u32,
    control: ControlPipe<ChildStdin>,
    lifecycle: Arc<Lifecycle>,
}

/// Owns at most one runner process and the control pipe into it.
///
/// Output never flows through the supervisor itself: the stream pumps and the
/// exit waiter publish [`ProcessEvent`]s on the channel handed to [`new`].
///
/// [`new`]: ProcessSupervisor::new
pub struct ProcessSupervisor {
    current: Option<ProcessHandle>,
    events_tx: Sender<ProcessEvent>,
}

impl ProcessSupervisor {
    pub fn new(events_tx: Sender<ProcessEvent>) -> Self {
        Self {
            current: None,
            events_tx,
        }
    }

    pub fn start(&mut self, spec: LaunchSpec) -> Result<(), ProcessManagerError> {
        if let Some(current) = self.current.as_ref() {
            if current.lifecycle.is_running() {
                return Err(ProcessManagerError::AlreadyRunning {
                    project_root: current.spec.project_root.clone(),
                });
            }
        }

        let command = spec.display_command();
        let mut child = spec
            .command()
            .spawn()
            .map_err(|error| ProcessManagerError::Spawn {
                command: command.clone(),
                error,
            })?;
        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProcessManagerError::MissingStdio { command });
        };
        let pid = child.id();
        info!(pid, command = %command, "started guard");

        let lifecycle = Arc::new(Lifecycle::running(2));
        spawn_pump(
            StreamKind::Stdout,
            pid,
            stdout,
            self.events_tx.clone(),
            lifecycle.clone(),
        );
        spawn_pump(
            StreamKind::Stderr,
            pid,
            stderr,
            self.events_tx.clone(),
            lifecycle.clone(),
        );
        {
            let tx = self.events_tx.clone();
            thread::spawn(move || {
                let diagnostic = match child.wait() {
                    Ok(status) => format_exit_diagnostic(status),
                    Err(err) => format!("wait-error={err}"),
                };
                debug!(pid, %diagnostic, "guard exited");
                let _ = tx.send(ProcessEvent::Exited { pid, diagnostic });
            });
        }

        if let Some(previous) = self.current.replace(ProcessHandle {
            spec,
            pid,
            control: ControlPipe::new(stdin),
            lifecycle,
        }) {
            debug!(
                pid = previous.pid,
                state = %previous.lifecycle.state(),
                "released previous guard process"
            );
        }
        Ok(())
    }

    /// Asks the runner to exit and reports it as no longer running right away.
    ///
    /// The state reads `Stopping` until both output streams have closed.
    pub fn stop(&self) -> Result<(), ProcessManagerError> {
        let handle = self.running_handle()?;
        handle.control.send(ControlCommand::Stop)?;
        handle.lifecycle.begin_stopping();
        info!(pid = handle.pid, "requested guard stop");
        Ok(())
    }

    pub fn reload(&self) -> Result<(), ProcessManagerError> {
        self.send(ControlCommand::Reload)
    }

    pub fn run_all_tests(&self) -> Result<(), ProcessManagerError> {
        self.send(ControlCommand::RunAll)
    }

    pub fn output_help(&self) -> Result<(), ProcessManagerError> {
        self.send(ControlCommand::Help)
    }

    pub fn toggle_notifications(&self) -> Result<(), ProcessManagerError> {
        self.send(ControlCommand::ToggleNotifications)
    }

    pub fn pause(&self) -> Result<(), ProcessManagerError> {
        self.send(ControlCommand::Pause)
    }

    pub fn send(&self, command: ControlCommand) -> Result<(), ProcessManagerError> {
        if command == ControlCommand::Stop {
            return self.stop();
        }
        let handle = self.running_handle()?;
        debug!(pid = handle.pid, command = command.label(), "sending control token");
        handle.control.send(command)?;
        Ok(())
    }

    pub fn state(&self) -> LifecycleState {
        self.current
            .as_ref()
            .map(|handle| handle.lifecycle.state())
            .unwrap_or(LifecycleState::NotStarted)
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.current
            .as_ref()
            .map(|handle| handle.spec.project_root.as_path())
    }

    pub fn pid(&self) -> Option<u32> {
        self.current.as_ref().map(|handle| handle.pid)
    }

    pub fn shutdown(&self, grace: Duration) -> ShutdownProgress {
        let mut last = ShutdownProgress::Complete { forced: false };
        self.shutdown_with_progress(grace, |progress| last = progress);
        last
    }

    /// Stops the runner for good: stop token, bounded wait, then SIGTERM to its group.
    pub fn shutdown_with_progress<F>(&self, grace: Duration, mut on_progress: F)
    where
        F: FnMut(ShutdownProgress),
    {
        let Some(handle) = self.current.as_ref() else {
            on_progress(ShutdownProgress::Complete { forced: false });
            return;
        };

        if handle.lifecycle.is_running() {
            on_progress(ShutdownProgress::SendingStop);
            if let Err(err) = self.stop() {
                warn!(pid = handle.pid, error = %err, "stop token not delivered during shutdown");
            }
        }

        on_progress(ShutdownProgress::Waiting);
        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if handle.lifecycle.state() == LifecycleState::Stopped {
                on_progress(ShutdownProgress::Complete { forced: false });
                return;
            }
            thread::sleep(SHUTDOWN_POLL);
        }

        on_progress(ShutdownProgress::Terminating);
        warn!(pid = handle.pid, "guard did not stop in time, terminating");
        terminate_process_group(handle.pid);
        on_progress(ShutdownProgress::Complete { forced: true });
    }

    fn running_handle(&self) -> Result<&ProcessHandle, ProcessManagerError> {
        let handle = self
            .current
            .as_ref()
            .ok_or(ProcessManagerError::NotStarted)?;
        let state = handle.lifecycle.state();
        if state != LifecycleState::Running {
            return Err(ProcessManagerError::NotRunning { state });
        }
        Ok(handle)
    }
}

pub fn format_exit_diagnostic(status: std::process::ExitStatus) -> String {
    #[cfg(unix)]
    {
        if let Some(code) = status.code() {
            return format!("exit={code}");
        }
        if let Some(signal) = status.signal() {
            return format!("signal={signal}");
        }
        "exit=unknown".to_owned()
    }
    #[cfg(not(unix))]
    {
        format!("exit={}", status.code().unwrap_or(-1))
    }
}

#[cfg(unix)]
fn terminate_process_group(pid: u32) {
    let Ok(pid) = i32::try_from(pid) else {
        return;
    };
    if pid <= 0 {
        return;
    }
    if let Err(err) = kill(Pid::from_raw(-pid), Signal::SIGTERM) {
        debug!(pid, error = %err, "process group already gone");
    }
}

#[cfg(not(unix))]
fn terminate_process_group(pid: u32) {
    warn!(pid, "forced termination is only supported on unix");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn launch_command_is_wrapper_then_launcher_then_root() {
        let spec = LaunchSpec::new("/opt/guard_wrapper", "/opt/run_guard.sh", "/work/app");
        assert_eq!(
            spec.argv(),
            [
                OsString::from("/opt/guard_wrapper"),
                OsString::from("/opt/run_guard.sh"),
                OsString::from("/work/app"),
            ]
        );

        let command = spec.command();
        assert_eq!(command.get_program(), OsStr::new("/opt/guard_wrapper"));
        assert_eq!(
            command.get_args().collect::<Vec<&OsStr>>(),
            vec![OsStr::new("/opt/run_guard.sh"), OsStr::new("/work/app")]
        );
        assert_eq!(command.get_current_dir(), Some(Path::new("/work/app")));
        assert_eq!(
            spec.display_command(),
            "/opt/guard_wrapper /opt/run_guard.sh /work/app"
        );
    }
}
