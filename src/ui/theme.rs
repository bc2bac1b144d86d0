use anstyle::{AnsiColor, Color, Style};

use crate::ui::widgets::NoticeLevel;

pub const COLOR_ENV: &str = "GUARDPOST_COLOR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Auto,
    Always,
    Never,
}

impl OutputMode {
    pub fn from_env() -> Self {
        std::env::var(COLOR_ENV)
            .map(|value| Self::parse(&value))
            .unwrap_or(OutputMode::Auto)
    }

    /// Unrecognized values fall back to `Auto`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "always" | "on" => OutputMode::Always,
            "never" | "off" => OutputMode::Never,
            _ => OutputMode::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub info: Style,
    pub muted: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub key: Style,
}

impl Default for Theme {
    fn default() -> Self {
        let fg = |color: AnsiColor| Style::new().fg_color(Some(Color::Ansi(color)));
        Self {
            info: fg(AnsiColor::Cyan).bold(),
            muted: fg(AnsiColor::BrightBlack),
            success: fg(AnsiColor::Green).bold(),
            warning: fg(AnsiColor::Yellow).bold(),
            error: fg(AnsiColor::Red).bold(),
            key: fg(AnsiColor::Blue).bold(),
        }
    }
}

impl Theme {
    pub fn notice(&self, level: NoticeLevel) -> Style {
        match level {
            NoticeLevel::Info => self.info,
            NoticeLevel::Success => self.success,
            NoticeLevel::Warning => self.warning,
            NoticeLevel::Error => self.error,
        }
    }
}

/// `NO_COLOR` wins over everything, then the output mode, then the tty check.
pub fn resolve_color_enabled(mode: OutputMode, is_tty: bool) -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    match mode {
        OutputMode::Always => true,
        OutputMode::Never => false,
        OutputMode::Auto => is_tty,
    }
}

pub fn is_ci_environment() -> bool {
    std::env::var_os("CI").is_some()
}
