use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::commands::HostCommand;

pub(super) const PAGE_SCROLL: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum KeyAction {
    Quit,
    Command(HostCommand),
    ToggleHelp,
    ScrollUp(usize),
    ScrollDown(usize),
    Follow,
    Ignore,
}

/// Maps a pressed key onto the panel's actions.
///
/// `Enter` runs all tests, matching Guard's own prompt. `?` opens the key
/// help overlay so `h` stays free for Guard's help output.
pub(super) fn map_key(key: &KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => KeyAction::Quit,
            _ => KeyAction::Ignore,
        };
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('?') => KeyAction::ToggleHelp,
        KeyCode::Enter => KeyAction::Command(HostCommand::RunAllTests),
        KeyCode::Up => KeyAction::ScrollUp(1),
        KeyCode::Down => KeyAction::ScrollDown(1),
        KeyCode::PageUp => KeyAction::ScrollUp(PAGE_SCROLL),
        KeyCode::PageDown => KeyAction::ScrollDown(PAGE_SCROLL),
        KeyCode::End => KeyAction::Follow,
        KeyCode::Char(c) => HostCommand::from_key(c)
            .map(KeyAction::Command)
            .unwrap_or(KeyAction::Ignore),
        _ => KeyAction::Ignore,
    }
}
