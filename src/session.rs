use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::control::ControlCommand;
use crate::lifecycle::LifecycleState;
use crate::locator::{locate_project_root, LocateError};
use crate::panel::{DisplaySink, Panel};
use crate::process_manager::{
    LaunchSpec, ProcessEvent, ProcessManagerError, ProcessSupervisor, ShutdownProgress,
};

pub const MAX_EVENTS_PER_DISPATCH: usize = 200;
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub enum SessionError {
    Locate(LocateError),
    Process(ProcessManagerError),
    CommandDisabled { command: &'static str },
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Locate(err) => write!(f, "{err}"),
            SessionError::Process(err) => write!(f, "{err}"),
            SessionError::CommandDisabled { command } => {
                write!(f, "`{command}` is not available right now")
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<LocateError> for SessionError {
    fn from(value: LocateError) -> Self {
        Self::Locate(value)
    }
}

impl From<ProcessManagerError> for SessionError {
    fn from(value: ProcessManagerError) -> Self {
        Self::Process(value)
    }
}

/// One editor session: the runner supervisor plus the panel it writes into.
///
/// Owned by the host's control thread and passed to command handlers. Output
/// from the stream pumps queues on a channel until [`Session::dispatch_pending`]
/// moves it into the panel, so the sink only ever sees this thread.
pub struct Session<S: DisplaySink> {
    config: Config,
    supervisor: ProcessSupervisor,
    panel: Panel<S>,
    events_rx: Receiver<ProcessEvent>,
}

impl<S: DisplaySink> Session<S> {
    pub fn new(config: Config, sink: S) -> Self {
        let (events_tx, events_rx) = mpsc::channel::<ProcessEvent>();
        let panel = Panel::new(sink, config.word_wrap);
        Self {
            config,
            supervisor: ProcessSupervisor::new(events_tx),
            panel,
            events_rx,
        }
    }

    /// Locates the project among `folders` and launches the runner there.
    ///
    /// Nothing is spawned and no state changes when no folder qualifies.
    pub fn start<P: AsRef<Path>>(&mut self, folders: &[P]) -> Result<PathBuf, SessionError> {
        if self.supervisor.is_running() {
            let project_root = self
                .supervisor
                .project_root()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            return Err(ProcessManagerError::AlreadyRunning { project_root }.into());
        }
        let root = locate_project_root(folders).inspect_err(|err| {
            warn!(error = %err, "no guard project among open folders");
        })?;
        let spec = LaunchSpec::new(&self.config.wrapper, &self.config.launcher, &root);
        self.supervisor.start(spec)?;
        info!(root = %root.display(), "guard session started");
        self.panel.show();
        Ok(root)
    }

    pub fn stop(&mut self) -> Result<(), SessionError> {
        Ok(self.supervisor.stop()?)
    }

    pub fn reload(&mut self) -> Result<(), SessionError> {
        Ok(self.supervisor.reload()?)
    }

    pub fn run_all_tests(&mut self) -> Result<(), SessionError> {
        Ok(self.supervisor.run_all_tests()?)
    }

    pub fn output_help(&mut self) -> Result<(), SessionError> {
        Ok(self.supervisor.output_help()?)
    }

    pub fn toggle_notifications(&mut self) -> Result<(), SessionError> {
        Ok(self.supervisor.toggle_notifications()?)
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        Ok(self.supervisor.pause()?)
    }

    pub fn send(&mut self, command: ControlCommand) -> Result<(), SessionError> {
        Ok(self.supervisor.send(command)?)
    }

    pub fn show(&mut self) {
        self.panel.show();
    }

    pub fn hide(&mut self) {
        self.panel.hide();
    }

    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    pub fn state(&self) -> LifecycleState {
        self.supervisor.state()
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.supervisor.project_root()
    }

    pub fn pid(&self) -> Option<u32> {
        self.supervisor.pid()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn panel(&self) -> &Panel<S> {
        &self.panel
    }

    pub fn sink(&self) -> &S {
        self.panel.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.panel.sink_mut()
    }

    /// Applies queued pump events to the panel without blocking.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut applied = 0usize;
        while applied < MAX_EVENTS_PER_DISPATCH {
            let Ok(event) = self.events_rx.try_recv() else {
                break;
            };
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Waits up to `timeout` for the first event, then drains what is queued.
    pub fn dispatch_pending_timeout(&mut self, timeout: Duration) -> usize {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.apply(event);
                1 + self.dispatch_pending()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Keeps dispatching until `done` holds or `timeout` elapses.
    pub fn dispatch_until<F>(&mut self, timeout: Duration, mut done: F) -> bool
    where
        F: FnMut(&Self) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if done(self) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.dispatch_pending_timeout((deadline - now).min(Duration::from_millis(20)));
        }
    }

    pub fn shutdown(&mut self, grace: Duration) -> ShutdownProgress {
        self.shutdown_with_progress(grace, |_| {})
    }

    /// Disposes of the session's runner and flushes its remaining output.
    ///
    /// Unlike [`Session::dispatch_pending`] the final flush is not capped, so
    /// everything the runner printed while stopping reaches the panel.
    pub fn shutdown_with_progress<F>(&mut self, grace: Duration, mut on_progress: F) -> ShutdownProgress
    where
        F: FnMut(&ShutdownProgress),
    {
        let mut last = ShutdownProgress::Complete { forced: false };
        self.supervisor.shutdown_with_progress(grace, |progress| {
            on_progress(&progress);
            last = progress;
        });
        let mut flushed = 0usize;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            flushed += 1;
        }
        debug!(flushed, "flushed runner output after shutdown");
        last
    }

    fn apply(&mut self, event: ProcessEvent) {
        match event {
            ProcessEvent::Output { text, .. } => self.panel.append(&text),
            ProcessEvent::StreamClosed { stream } => {
                debug!(stream = stream.label(), "stream closed");
            }
            ProcessEvent::StreamFailed {
                pid,
                stream,
                reason,
            } => {
                let detail = format!("{} read failed: {reason}", stream.label());
                self.append_instance_notice(pid, &detail);
            }
            ProcessEvent::Exited { pid, diagnostic } => {
                self.append_instance_notice(pid, &format!("guard exited: {diagnostic}"));
            }
        }
    }

    /// Notices from a runner that a later start replaced name its pid, so they
    /// are not read as news about the current one.
    fn append_instance_notice(&mut self, pid: u32, detail: &str) {
        if self.supervisor.pid() == Some(pid) {
            self.panel.append_notice(detail);
        } else {
            self.panel
                .append_notice(&format!("replaced runner {pid}: {detail}"));
        }
    }
}
