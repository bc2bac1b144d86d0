use std::ops::Range;

use crate::panel::DisplaySink;

pub(crate) const MAX_PANEL_LINES: usize = 20_000;

/// Line buffer behind the terminal output panel.
#[derive(Debug, Clone)]
pub struct PanelBuffer {
    lines: Vec<String>,
    read_only: bool,
    visible: bool,
    word_wrap: bool,
    scroll_back: usize,
    dropped_lines: usize,
}

impl Default for PanelBuffer {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            read_only: true,
            visible: false,
            word_wrap: false,
            scroll_back: 0,
            dropped_lines: 0,
        }
    }
}

impl PanelBuffer {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn word_wrap(&self) -> bool {
        self.word_wrap
    }

    pub fn is_following(&self) -> bool {
        self.scroll_back == 0
    }

    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    pub fn dropped_lines(&self) -> usize {
        self.dropped_lines
    }

    pub fn scroll_up(&mut self, amount: usize) {
        let max = self.lines.len().saturating_sub(1);
        self.scroll_back = self.scroll_back.saturating_add(amount).min(max);
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(amount);
    }

    /// Lines that fit in a `height` x `width` viewport, ending at the scroll position.
    pub fn visible_window(&self, height: usize, width: usize) -> Range<usize> {
        visible_window(&self.lines, height, width, self.word_wrap, self.scroll_back)
    }

    fn trim_to_capacity(&mut self) {
        if self.lines.len() <= MAX_PANEL_LINES {
            return;
        }
        let excess = self.lines.len() - MAX_PANEL_LINES;
        self.lines.drain(..excess);
        self.dropped_lines += excess;
        self.scroll_back = self.scroll_back.min(self.lines.len().saturating_sub(1));
    }
}

impl DisplaySink for PanelBuffer {
    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn append(&mut self, text: &str) {
        if self.read_only {
            return;
        }
        let mut pieces = text.split('\n');
        if let Some(first) = pieces.next() {
            if let Some(last) = self.lines.last_mut() {
                last.push_str(first);
            }
        }
        self.lines.extend(pieces.map(str::to_owned));
        self.trim_to_capacity();
    }

    fn scroll_to_end(&mut self) {
        self.scroll_back = 0;
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn set_word_wrap(&mut self, enabled: bool) {
        self.word_wrap = enabled;
    }
}

pub(crate) fn visible_window(
    lines: &[String],
    height: usize,
    width: usize,
    wrap: bool,
    scroll_back: usize,
) -> Range<usize> {
    let end = lines.len().saturating_sub(scroll_back);
    let mut start = end;
    let mut rows = 0usize;
    while start > 0 {
        let needed = if wrap && width > 0 {
            lines[start - 1].chars().count().div_ceil(width).max(1)
        } else {
            1
        };
        if rows + needed > height {
            break;
        }
        rows += needed;
        start -= 1;
    }
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::Panel;

    fn panel() -> Panel<PanelBuffer> {
        Panel::new(PanelBuffer::default(), false)
    }

    #[test]
    fn appends_split_into_lines_and_continue_partial_lines() {
        let mut panel = panel();
        panel.append("one\ntw");
        panel.append("o\nthree");
        assert_eq!(panel.sink().lines(), ["one", "two", "three"]);
        panel.append("\n");
        assert_eq!(panel.sink().lines(), ["one", "two", "three", ""]);
    }

    #[test]
    fn direct_appends_are_ignored_while_read_only() {
        let mut panel = panel();
        panel.sink_mut().append("typed by user");
        assert_eq!(panel.sink().lines(), [""]);
    }

    #[test]
    fn new_output_snaps_the_view_back_to_the_end() {
        let mut panel = panel();
        panel.append("a\nb\nc\nd\n");
        panel.sink_mut().scroll_up(2);
        assert!(!panel.sink().is_following());
        assert_eq!(panel.sink().visible_window(2, 80), 1..3);

        panel.append("e\n");
        assert!(panel.sink().is_following());
        assert_eq!(panel.sink().visible_window(2, 80), 4..6);
    }

    #[test]
    fn buffer_is_capped_and_counts_dropped_lines() {
        let mut panel = panel();
        panel.append(&"x\n".repeat(MAX_PANEL_LINES + 10));
        assert_eq!(panel.sink().lines().len(), MAX_PANEL_LINES);
        assert_eq!(panel.sink().dropped_lines(), 11);
    }

    #[test]
    fn window_accounts_for_wrapped_rows() {
        let lines = vec!["short".to_owned(), "x".repeat(25), "tail".to_owned()];
        assert_eq!(visible_window(&lines, 3, 10, false, 0), 0..3);
        assert_eq!(visible_window(&lines, 3, 10, true, 0), 2..3);
        assert_eq!(visible_window(&lines, 4, 10, true, 0), 1..3);
        assert_eq!(visible_window(&lines, 2, 10, false, 1), 0..2);
        assert_eq!(visible_window(&lines, 0, 10, false, 0), 3..3);
    }

    #[test]
    fn scroll_up_is_clamped_to_buffer() {
        let mut panel = panel();
        panel.append("a\nb");
        panel.sink_mut().scroll_up(100);
        assert_eq!(panel.sink().scroll_back(), 1);
    }
}
