//! Line-oriented host: panel output on stdout, command names read from stdin,
//! status and errors on stderr.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::commands::{dispatch, HostCommand};
use crate::panel::DisplaySink;
use crate::process_manager::ShutdownProgress;
use crate::session::{Session, SessionError, SHUTDOWN_GRACE};
use crate::ui::{NoticeLevel, PlainRenderer, Renderer, UiError};

const INPUT_POLL_WAIT: Duration = Duration::from_millis(50);
const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];
const LIST_WORDS: [&str; 2] = ["?", "commands"];

#[derive(Debug)]
pub enum PlainError {
    Session(SessionError),
    Ui(UiError),
}

impl std::fmt::Display for PlainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlainError::Session(err) => write!(f, "{err}"),
            PlainError::Ui(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PlainError {}

impl From<SessionError> for PlainError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<UiError> for PlainError {
    fn from(value: UiError) -> Self {
        Self::Ui(value)
    }
}

/// Streams panel text to a writer as it arrives.
///
/// While hidden, output is held back and written on the next `show`.
pub struct PlainSink<W: Write> {
    renderer: PlainRenderer<W>,
    read_only: bool,
    visible: bool,
    held: String,
    write_failed: bool,
}

impl<W: Write> PlainSink<W> {
    pub fn new(renderer: PlainRenderer<W>) -> Self {
        Self {
            renderer,
            read_only: true,
            visible: false,
            held: String::new(),
            write_failed: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn held(&self) -> &str {
        &self.held
    }

    pub fn into_inner(self) -> W {
        self.renderer.into_inner()
    }

    fn write(&mut self, text: &str) {
        if let Err(err) = self.renderer.raw(text) {
            if !self.write_failed {
                warn!(error = %err, "panel output could not be written");
            }
            self.write_failed = true;
        }
    }
}

impl<W: Write> DisplaySink for PlainSink<W> {
    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn append(&mut self, text: &str) {
        if self.read_only {
            return;
        }
        if self.visible {
            self.write(text);
        } else {
            self.held.push_str(text);
        }
    }

    fn scroll_to_end(&mut self) {}

    fn show(&mut self) {
        self.visible = true;
        if !self.held.is_empty() {
            let held = std::mem::take(&mut self.held);
            self.write(&held);
        }
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineOutcome {
    Continue,
    Quit,
}

/// Starts guard for `folders`, then forwards commands read from `input`
/// until a quit word or end of input, and shuts the runner down.
///
/// A failed initial start is returned as an error; later command failures
/// are reported through `notices` and the loop carries on.
pub fn run_plain<W, R, N, P>(
    session: &mut Session<PlainSink<W>>,
    folders: &[P],
    input: R,
    notices: &mut N,
) -> Result<(), PlainError>
where
    W: Write,
    R: BufRead + Send + 'static,
    N: Renderer,
    P: AsRef<Path>,
{
    let root = session.start(folders)?;
    notices.notice(
        NoticeLevel::Success,
        &format!("guard started in {}", root.display()),
    )?;

    let lines = spawn_input_reader(input);
    'session: loop {
        session.dispatch_pending_timeout(INPUT_POLL_WAIT);
        loop {
            match lines.try_recv() {
                Ok(line) => {
                    if handle_line(session, &line, folders, notices)? == LineOutcome::Quit {
                        break 'session;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("command input closed");
                    break 'session;
                }
            }
        }
    }

    shutdown_with_spinner(session, notices)
}

fn handle_line<S, N, P>(
    session: &mut Session<S>,
    line: &str,
    folders: &[P],
    notices: &mut N,
) -> Result<LineOutcome, UiError>
where
    S: DisplaySink,
    N: Renderer,
    P: AsRef<Path>,
{
    let word = line.trim();
    if word.is_empty() {
        return Ok(LineOutcome::Continue);
    }
    if QUIT_WORDS.contains(&word) {
        return Ok(LineOutcome::Quit);
    }
    if LIST_WORDS.contains(&word) {
        let running = session.is_running();
        let items = HostCommand::ALL
            .iter()
            .filter(|command| command.is_enabled(running))
            .map(|command| format!("{} ({})", command.alias(), command.name()))
            .collect::<Vec<String>>();
        notices.bullet_list(&format!("guard is {}", session.state()), &items)?;
        return Ok(LineOutcome::Continue);
    }

    let Some(command) = HostCommand::parse(word) else {
        notices.notice(
            NoticeLevel::Warning,
            &format!("unknown command `{word}`; type `?` to list commands"),
        )?;
        return Ok(LineOutcome::Continue);
    };
    match dispatch(session, command, folders) {
        Ok(()) => notices.notice(NoticeLevel::Info, command.caption())?,
        Err(err) => notices.notice(NoticeLevel::Error, &err.to_string())?,
    }
    Ok(LineOutcome::Continue)
}

fn spawn_input_reader<R: BufRead + Send + 'static>(input: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn shutdown_with_spinner<W, N>(
    session: &mut Session<PlainSink<W>>,
    notices: &mut N,
) -> Result<(), PlainError>
where
    W: Write,
    N: Renderer,
{
    let spinner = notices.spinner("Stopping guard")?;
    let outcome = session.shutdown_with_progress(SHUTDOWN_GRACE, |progress| match progress {
        ShutdownProgress::SendingStop => spinner.set_message("Sending stop to guard"),
        ShutdownProgress::Waiting => spinner.set_message("Waiting for guard to exit"),
        ShutdownProgress::Terminating => spinner.set_message("Terminating guard"),
        ShutdownProgress::Complete { .. } => {}
    });
    match outcome {
        ShutdownProgress::Complete { forced: true } => {
            spinner.finish_error("Guard terminated after the grace period")
        }
        _ => spinner.finish_success("Guard stopped"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::panel::{MemorySink, Panel};
    use std::io::Cursor;
    use std::path::PathBuf;

    fn sink() -> PlainSink<Vec<u8>> {
        PlainSink::new(PlainRenderer::new(Vec::new(), false))
    }

    fn idle_session() -> Session<MemorySink> {
        Session::new(
            Config::from_bundle_dir(&PathBuf::from("/nonexistent")),
            MemorySink::default(),
        )
    }

    fn rendered(renderer: PlainRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).expect("utf8")
    }

    #[test]
    fn hidden_output_is_held_until_shown() {
        let mut panel = Panel::new(sink(), false);
        panel.append("before show\n");
        assert_eq!(panel.sink().held(), "before show\n");

        panel.show();
        panel.append("after\n");
        assert_eq!(panel.sink().held(), "");
        let out = String::from_utf8(panel.into_sink().into_inner()).expect("utf8");
        assert_eq!(out, "before show\nafter\n");
    }

    #[test]
    fn direct_writes_are_dropped_while_read_only() {
        let mut panel = Panel::new(sink(), false);
        panel.show();
        panel.sink_mut().append("sneaky");
        let out = String::from_utf8(panel.into_sink().into_inner()).expect("utf8");
        assert_eq!(out, "");
    }

    #[test]
    fn lines_map_onto_commands_and_quit_words() {
        let mut session = idle_session();
        let mut notices = PlainRenderer::new(Vec::new(), false);
        let none: [PathBuf; 0] = [];

        assert_eq!(
            handle_line(&mut session, "  ", &none, &mut notices).expect("blank"),
            LineOutcome::Continue
        );
        assert_eq!(
            handle_line(&mut session, "show", &none, &mut notices).expect("show"),
            LineOutcome::Continue
        );
        assert!(session.sink().visible);
        assert_eq!(
            handle_line(&mut session, "reload", &none, &mut notices).expect("reload"),
            LineOutcome::Continue
        );
        assert_eq!(
            handle_line(&mut session, "frobnicate", &none, &mut notices).expect("unknown"),
            LineOutcome::Continue
        );
        assert_eq!(
            handle_line(&mut session, "quit", &none, &mut notices).expect("quit"),
            LineOutcome::Quit
        );

        let out = rendered(notices);
        assert!(out.contains("info: Guard: Show Output"));
        assert!(out.contains("error: `reload_guard` is not available right now"));
        assert!(out.contains("warn: unknown command `frobnicate`"));
    }

    #[test]
    fn listing_shows_only_enabled_commands() {
        let mut session = idle_session();
        let mut notices = PlainRenderer::new(Vec::new(), false);
        let none: [PathBuf; 0] = [];
        handle_line(&mut session, "?", &none, &mut notices).expect("list");

        let out = rendered(notices);
        assert!(out.starts_with("guard is not started:\n"));
        assert!(out.contains("- start (start_guard)"));
        assert!(out.contains("- hide (hide_guard)"));
        assert!(!out.contains("reload"));
    }

    #[test]
    fn run_plain_reports_missing_project_without_spawning() {
        let mut session = Session::new(
            Config::from_bundle_dir(&PathBuf::from("/nonexistent")),
            sink(),
        );
        let mut notices = PlainRenderer::new(Vec::new(), false);
        let none: [PathBuf; 0] = [];
        let err = run_plain(&mut session, &none, Cursor::new(Vec::new()), &mut notices)
            .expect_err("no folders");
        assert!(matches!(err, PlainError::Session(SessionError::Locate(_))));
        assert!(!session.is_running());
    }
}
