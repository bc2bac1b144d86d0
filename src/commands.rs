use std::path::Path;

use crate::control::ControlCommand;
use crate::panel::DisplaySink;
use crate::session::{Session, SessionError};

/// The command surface offered to the host's command palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCommand {
    Start,
    Stop,
    Show,
    Hide,
    Reload,
    RunAllTests,
    OutputHelp,
    ToggleNotifications,
    Pause,
}

impl HostCommand {
    pub const ALL: [HostCommand; 9] = [
        HostCommand::Start,
        HostCommand::Stop,
        HostCommand::Show,
        HostCommand::Hide,
        HostCommand::Reload,
        HostCommand::RunAllTests,
        HostCommand::OutputHelp,
        HostCommand::ToggleNotifications,
        HostCommand::Pause,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HostCommand::Start => "start_guard",
            HostCommand::Stop => "stop_guard",
            HostCommand::Show => "show_guard",
            HostCommand::Hide => "hide_guard",
            HostCommand::Reload => "reload_guard",
            HostCommand::RunAllTests => "run_all_tests_guard",
            HostCommand::OutputHelp => "output_help_guard",
            HostCommand::ToggleNotifications => "toggle_notifications_guard",
            HostCommand::Pause => "pause_guard",
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            HostCommand::Start => "Guard: Start",
            HostCommand::Stop => "Guard: Stop",
            HostCommand::Show => "Guard: Show Output",
            HostCommand::Hide => "Guard: Hide Output",
            HostCommand::Reload => "Guard: Reload",
            HostCommand::RunAllTests => "Guard: Run All Tests",
            HostCommand::OutputHelp => "Guard: Output Help",
            HostCommand::ToggleNotifications => "Guard: Toggle Notifications",
            HostCommand::Pause => "Guard: Pause",
        }
    }

    pub fn alias(self) -> &'static str {
        match self {
            HostCommand::Start => "start",
            HostCommand::Stop => "stop",
            HostCommand::Show => "show",
            HostCommand::Hide => "hide",
            HostCommand::Reload => "reload",
            HostCommand::RunAllTests => "all",
            HostCommand::OutputHelp => "help",
            HostCommand::ToggleNotifications => "notify",
            HostCommand::Pause => "pause",
        }
    }

    pub fn key(self) -> char {
        match self {
            HostCommand::Start => 's',
            HostCommand::Stop => 'e',
            HostCommand::Show => 'o',
            HostCommand::Hide => 'c',
            HostCommand::Reload => 'r',
            HostCommand::RunAllTests => 'a',
            HostCommand::OutputHelp => 'h',
            HostCommand::ToggleNotifications => 'n',
            HostCommand::Pause => 'p',
        }
    }

    /// Accepts the palette name or the short alias.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::ALL
            .into_iter()
            .find(|command| command.name() == input || command.alias() == input)
    }

    pub fn from_key(key: char) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.key() == key)
    }

    /// The control token this command writes to the runner, if any.
    pub fn control(self) -> Option<ControlCommand> {
        match self {
            HostCommand::Start | HostCommand::Show | HostCommand::Hide => None,
            HostCommand::Stop => Some(ControlCommand::Stop),
            HostCommand::Reload => Some(ControlCommand::Reload),
            HostCommand::RunAllTests => Some(ControlCommand::RunAll),
            HostCommand::OutputHelp => Some(ControlCommand::Help),
            HostCommand::ToggleNotifications => Some(ControlCommand::ToggleNotifications),
            HostCommand::Pause => Some(ControlCommand::Pause),
        }
    }

    pub fn requires_running(self) -> bool {
        !matches!(
            self,
            HostCommand::Start | HostCommand::Show | HostCommand::Hide
        )
    }

    pub fn is_enabled(self, running: bool) -> bool {
        match self {
            HostCommand::Start => !running,
            HostCommand::Show | HostCommand::Hide => true,
            _ => running,
        }
    }
}

/// Runs `command` against the session after checking its enablement.
///
/// `folders` are the host's open folders; only `Start` looks at them.
pub fn dispatch<S, P>(
    session: &mut Session<S>,
    command: HostCommand,
    folders: &[P],
) -> Result<(), SessionError>
where
    S: DisplaySink,
    P: AsRef<Path>,
{
    if !command.is_enabled(session.is_running()) {
        return Err(SessionError::CommandDisabled {
            command: command.name(),
        });
    }
    match command {
        HostCommand::Start => session.start(folders).map(|_| ()),
        HostCommand::Stop => session.stop(),
        HostCommand::Show => {
            session.show();
            Ok(())
        }
        HostCommand::Hide => {
            session.hide();
            Ok(())
        }
        HostCommand::Reload => session.reload(),
        HostCommand::RunAllTests => session.run_all_tests(),
        HostCommand::OutputHelp => session.output_help(),
        HostCommand::ToggleNotifications => session.toggle_notifications(),
        HostCommand::Pause => session.pause(),
    }
}
