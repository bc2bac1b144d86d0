use std::path::Path;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::border;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::commands::HostCommand;
use crate::lifecycle::LifecycleState;
use crate::ui::NoticeLevel;

use super::panel_buffer::PanelBuffer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct StatusLine {
    pub(super) level: NoticeLevel,
    pub(super) text: String,
}

impl StatusLine {
    pub(super) fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

pub(super) struct PanelView<'a> {
    pub(super) buffer: &'a PanelBuffer,
    pub(super) state: LifecycleState,
    pub(super) project_root: Option<&'a Path>,
    pub(super) status: Option<&'a StatusLine>,
    pub(super) show_help: bool,
}

pub(super) fn render_ui(frame: &mut Frame<'_>, view: &PanelView<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], view);
    if view.show_help {
        render_help(frame, chunks[1]);
    } else {
        render_output(frame, chunks[1], view.buffer);
    }
    render_footer(frame, chunks[2], view);
}

fn render_header(frame: &mut Frame<'_>, area: Rect, view: &PanelView<'_>) {
    let muted = Style::default().fg(Color::DarkGray);
    let root = view
        .project_root
        .map(|root| root.display().to_string())
        .unwrap_or_else(|| "<no project>".to_owned());
    let line = Line::from(vec![
        Span::styled("guard ", muted),
        Span::styled(
            view.state.label().to_owned(),
            Style::default()
                .fg(state_color(view.state))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  |  ", muted),
        Span::raw(root),
    ]);
    let header = Paragraph::new(line).block(panel_block(Some(" GUARDPOST "), true, Color::Magenta));
    frame.render_widget(header, area);
}

fn render_output(frame: &mut Frame<'_>, area: Rect, buffer: &PanelBuffer) {
    let title = if buffer.is_following() {
        " output ".to_owned()
    } else {
        format!(" output (scrolled {}, End to follow) ", buffer.scroll_back())
    };
    let block = panel_block(None, false, Color::DarkGray).title_top(
        Line::from(Span::styled(title, Style::default().fg(Color::Gray))).left_aligned(),
    );

    if !buffer.is_visible() {
        let hint = Paragraph::new(Line::from(Span::styled(
            "Output hidden. Press o to show it.",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let inner_height = area.height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(2) as usize;
    let window = buffer.visible_window(inner_height, inner_width);
    let lines = buffer.lines()[window]
        .iter()
        .map(|line| Line::raw(line.clone()))
        .collect::<Vec<Line>>();
    let mut output = Paragraph::new(lines).block(block);
    if buffer.word_wrap() {
        output = output.wrap(Wrap { trim: false });
    }
    frame.render_widget(output, area);
}

fn render_help(frame: &mut Frame<'_>, area: Rect) {
    let key_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let mut lines = HostCommand::ALL
        .iter()
        .map(|command| {
            Line::from(vec![
                Span::styled(format!(" {:<6}", command.key()), key_style),
                Span::raw(command.caption()),
            ])
        })
        .collect::<Vec<Line>>();
    for (key, label) in [
        ("enter", "Guard: Run All Tests"),
        ("↑/↓", "Scroll one line"),
        ("pg", "Scroll one page"),
        ("end", "Follow output"),
        ("?", "Close this help"),
        ("q", "Quit (stops guard)"),
    ] {
        lines.push(Line::from(vec![
            Span::styled(format!(" {key:<6}"), key_style),
            Span::raw(label),
        ]));
    }
    let help = Paragraph::new(lines).block(panel_block(Some(" KEYS "), false, Color::Yellow));
    frame.render_widget(help, area);
}

fn render_footer(frame: &mut Frame<'_>, area: Rect, view: &PanelView<'_>) {
    if let Some(status) = view.status {
        let footer = Paragraph::new(status.text.clone())
            .style(Style::default().fg(notice_color(status.level)));
        frame.render_widget(footer, area);
        return;
    }

    let running = view.state == LifecycleState::Running;
    let muted = Style::default().fg(Color::DarkGray);
    let enabled = Style::default().fg(Color::Yellow);
    let mut spans = Vec::new();
    for command in HostCommand::ALL {
        if !spans.is_empty() {
            spans.push(Span::styled(" ", muted));
        }
        let style = if command.is_enabled(running) {
            enabled
        } else {
            muted
        };
        spans.push(Span::styled(
            format!("{}:{}", command.key(), command.alias()),
            style,
        ));
    }
    spans.push(Span::styled("  |  ?:keys q:quit", muted));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub(super) fn draw_status_only(frame: &mut Frame<'_>, status: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.area());
    let footer = Paragraph::new(status.to_owned()).style(Style::default().fg(Color::Yellow));
    frame.render_widget(footer, chunks[1]);
}

fn panel_block<'a>(title: Option<&'a str>, show_version: bool, border_color: Color) -> Block<'a> {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(border_color));
    if let Some(title) = title {
        block = block.title_top(
            Line::from(Span::styled(
                title.to_owned(),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ))
            .left_aligned(),
        );
    }
    if show_version {
        let version = format!(" v{} ", env!("CARGO_PKG_VERSION"));
        block = block.title_bottom(
            Line::from(Span::styled(
                version,
                Style::default().fg(Color::LightMagenta),
            ))
            .right_aligned(),
        );
    }
    block
}

fn state_color(state: LifecycleState) -> Color {
    match state {
        LifecycleState::Running => Color::Green,
        LifecycleState::Stopping => Color::Yellow,
        LifecycleState::Stopped | LifecycleState::NotStarted => Color::DarkGray,
    }
}

fn notice_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Info => Color::Cyan,
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Warning => Color::Yellow,
        NoticeLevel::Error => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::Panel;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        let mut out = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn renders_state_output_and_key_hints() {
        let mut panel = Panel::new(PanelBuffer::default(), false);
        panel.show();
        panel.append("Guard is now watching at '/tmp/app'\n");
        let root = Path::new("/tmp/app");
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).expect("terminal");
        terminal
            .draw(|frame| {
                render_ui(
                    frame,
                    &PanelView {
                        buffer: panel.sink(),
                        state: LifecycleState::Running,
                        project_root: Some(root),
                        status: None,
                        show_help: false,
                    },
                )
            })
            .expect("draw");

        let screen = screen_text(&terminal);
        assert!(screen.contains("GUARDPOST"));
        assert!(screen.contains("running"));
        assert!(screen.contains("/tmp/app"));
        assert!(screen.contains("Guard is now watching"));
        assert!(screen.contains("r:reload"));
    }

    #[test]
    fn hidden_panel_and_status_line() {
        let panel = Panel::new(PanelBuffer::default(), false);
        let status = StatusLine::new(NoticeLevel::Error, "no open folders to search");
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).expect("terminal");
        terminal
            .draw(|frame| {
                render_ui(
                    frame,
                    &PanelView {
                        buffer: panel.sink(),
                        state: LifecycleState::NotStarted,
                        project_root: None,
                        status: Some(&status),
                        show_help: false,
                    },
                )
            })
            .expect("draw");

        let screen = screen_text(&terminal);
        assert!(screen.contains("Output hidden"));
        assert!(screen.contains("no open folders to search"));
        assert!(screen.contains("<no project>"));
    }
}
