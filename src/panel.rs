/// The host-owned output panel.
///
/// Implementations are only ever touched from the control thread; the stream
/// pumps reach them through [`crate::session::Session`], never directly.
pub trait DisplaySink {
    fn set_read_only(&mut self, read_only: bool);
    /// Appends at the current end of the buffer.
    fn append(&mut self, text: &str);
    fn scroll_to_end(&mut self);
    fn show(&mut self);
    fn hide(&mut self);
    fn set_word_wrap(&mut self, _enabled: bool) {}
}

/// Wraps a sink so every append leaves it read-only again.
#[derive(Debug)]
pub struct Panel<S: DisplaySink> {
    sink: S,
    at_line_start: bool,
}

impl<S: DisplaySink> Panel<S> {
    pub fn new(mut sink: S, word_wrap: bool) -> Self {
        sink.set_word_wrap(word_wrap);
        sink.set_read_only(true);
        Self {
            sink,
            at_line_start: true,
        }
    }

    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.sink.set_read_only(false);
        self.sink.append(text);
        self.sink.scroll_to_end();
        self.sink.set_read_only(true);
        self.at_line_start = text.ends_with('\n');
    }

    /// Appends a bracketed status line, starting a fresh line if needed.
    pub fn append_notice(&mut self, notice: &str) {
        let lead = if self.at_line_start { "" } else { "\n" };
        self.append(&format!("{lead}[{notice}]\n"));
    }

    pub fn show(&mut self) {
        self.sink.show();
    }

    pub fn hide(&mut self) {
        self.sink.hide();
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// In-memory sink holding the whole buffer; used by headless hosts and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySink {
    pub text: String,
    pub read_only: bool,
    pub visible: bool,
    pub word_wrap: bool,
    pub rejected_appends: usize,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self {
            text: String::new(),
            read_only: false,
            visible: false,
            word_wrap: false,
            rejected_appends: 0,
        }
    }
}

impl DisplaySink for MemorySink {
    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn append(&mut self, text: &str) {
        if self.read_only {
            self.rejected_appends += 1;
            return;
        }
        self.text.push_str(text);
    }

    fn scroll_to_end(&mut self) {}

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

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSink {
        calls: Vec<String>,
    }

    impl DisplaySink for RecordingSink {
        fn set_read_only(&mut self, read_only: bool) {
            self.calls.push(format!("read_only={read_only}"));
        }

        fn append(&mut self, text: &str) {
            self.calls.push(format!("append:{text}"));
        }

        fn scroll_to_end(&mut self) {
            self.calls.push("scroll".to_owned());
        }

        fn show(&mut self) {
            self.calls.push("show".to_owned());
        }

        fn hide(&mut self) {
            self.calls.push("hide".to_owned());
        }
    }

    #[test]
    fn append_is_bracketed_by_writable_and_read_only() {
        let mut panel = Panel::new(RecordingSink::default(), true);
        panel.sink_mut().calls.clear();
        panel.append("hello");
        assert_eq!(
            panel.sink().calls,
            vec!["read_only=false", "append:hello", "scroll", "read_only=true"]
        );
    }

    #[test]
    fn empty_append_touches_nothing() {
        let mut panel = Panel::new(RecordingSink::default(), false);
        panel.sink_mut().calls.clear();
        panel.append("");
        assert!(panel.sink().calls.is_empty());
    }

    #[test]
    fn new_panel_starts_read_only_with_word_wrap() {
        let panel = Panel::new(MemorySink::default(), true);
        assert!(panel.sink().read_only);
        assert!(panel.sink().word_wrap);
        assert!(!panel.sink().visible);
    }

    #[test]
    fn memory_sink_accepts_only_bracketed_appends() {
        let mut panel = Panel::new(MemorySink::default(), false);
        panel.append("a");
        panel.sink_mut().append("sneaky");
        panel.append("b");
        assert_eq!(panel.sink().text, "ab");
        assert_eq!(panel.sink().rejected_appends, 1);
        assert!(panel.sink().read_only);
    }

    #[test]
    fn notices_start_on_their_own_line() {
        let mut panel = Panel::new(MemorySink::default(), false);
        panel.append_notice("guard started");
        panel.append("partial");
        panel.append_notice("guard exited: exit=0");
        assert_eq!(
            panel.sink().text,
            "[guard started]\npartial\n[guard exited: exit=0]\n"
        );
    }

    #[test]
    fn show_and_hide_toggle_visibility() {
        let mut panel = Panel::new(MemorySink::default(), false);
        panel.show();
        assert!(panel.sink().visible);
        panel.hide();
        assert!(!panel.sink().visible);
    }
}
