//! Full-screen terminal host: renders the panel and maps keys onto the
//! command surface.

use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnableLineWrap, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, warn};

use crate::commands::{dispatch, HostCommand};
use crate::lifecycle::LifecycleState;
use crate::process_manager::ShutdownProgress;
use crate::session::{Session, SHUTDOWN_GRACE};
use crate::ui::NoticeLevel;

mod keys;
mod panel_buffer;
mod render;

pub use panel_buffer::PanelBuffer;

use keys::{map_key, KeyAction};
use render::{draw_status_only, render_ui, PanelView, StatusLine};

const INPUT_POLL_WAIT: Duration = Duration::from_millis(50);

type TuiTerminal = Terminal<CrosstermBackend<io::Stdout>>;

#[derive(Debug)]
pub enum TuiError {
    Io(io::Error),
}

impl std::fmt::Display for TuiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TuiError::Io(err) => write!(f, "terminal error: {err}"),
        }
    }
}

impl std::error::Error for TuiError {}

impl From<io::Error> for TuiError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Starts guard for `folders` and runs the panel until the user quits.
///
/// The session is shut down before the terminal is restored, so a runner
/// that ignores the stop token is terminated rather than orphaned.
pub fn run_tui<P: AsRef<Path>>(
    session: &mut Session<PanelBuffer>,
    folders: &[P],
) -> Result<(), TuiError> {
    let mut terminal = init_terminal()?;

    let result = event_loop(&mut terminal, session, folders);

    let outcome = session.shutdown_with_progress(SHUTDOWN_GRACE, |progress| {
        let label = match progress {
            ShutdownProgress::SendingStop => "Shutdown: asking guard to stop...",
            ShutdownProgress::Waiting => "Shutdown: waiting for guard to exit...",
            ShutdownProgress::Terminating => "Shutdown: terminating guard...",
            ShutdownProgress::Complete { .. } => "Shutdown: complete.",
        };
        let _ = terminal.draw(|frame| draw_status_only(frame, label));
    });
    debug!(?outcome, "terminal session shut down");

    restore_terminal(&mut terminal)?;
    result
}

fn event_loop<P: AsRef<Path>>(
    terminal: &mut TuiTerminal,
    session: &mut Session<PanelBuffer>,
    folders: &[P],
) -> Result<(), TuiError> {
    let mut status = Some(start_status(session, folders));
    let mut show_help = false;
    let mut last_state = session.state();

    loop {
        session.dispatch_pending();

        let state = session.state();
        if state != last_state {
            if state == LifecycleState::Stopped {
                status = Some(StatusLine::new(
                    NoticeLevel::Warning,
                    "guard stopped. Press s to start it again.",
                ));
            }
            last_state = state;
        }

        terminal.draw(|frame| {
            render_ui(
                frame,
                &PanelView {
                    buffer: session.sink(),
                    state,
                    project_root: session.project_root(),
                    status: status.as_ref(),
                    show_help,
                },
            )
        })?;

        if !event::poll(INPUT_POLL_WAIT)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match map_key(&key) {
            KeyAction::Quit => return Ok(()),
            KeyAction::ToggleHelp => show_help = !show_help,
            KeyAction::ScrollUp(amount) => session.sink_mut().scroll_up(amount),
            KeyAction::ScrollDown(amount) => session.sink_mut().scroll_down(amount),
            KeyAction::Follow => session.sink_mut().scroll_down(usize::MAX),
            KeyAction::Command(command) => {
                show_help = false;
                status = Some(run_command(session, command, folders));
            }
            KeyAction::Ignore => {}
        }
    }
}

fn start_status<P: AsRef<Path>>(session: &mut Session<PanelBuffer>, folders: &[P]) -> StatusLine {
    match session.start(folders) {
        Ok(root) => StatusLine::new(
            NoticeLevel::Info,
            format!("guard started in {}", root.display()),
        ),
        Err(err) => {
            warn!(error = %err, "initial start failed");
            StatusLine::new(NoticeLevel::Error, err.to_string())
        }
    }
}

fn run_command<P: AsRef<Path>>(
    session: &mut Session<PanelBuffer>,
    command: HostCommand,
    folders: &[P],
) -> StatusLine {
    if command == HostCommand::Start {
        return start_status(session, folders);
    }
    match dispatch(session, command, folders) {
        Ok(()) => StatusLine::new(NoticeLevel::Info, command.caption()),
        Err(err) => StatusLine::new(NoticeLevel::Error, err.to_string()),
    }
}

fn init_terminal() -> Result<TuiTerminal, io::Error> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut TuiTerminal) -> Result<(), io::Error> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, EnableLineWrap)?;
    terminal.show_cursor()?;
    Ok(())
}
