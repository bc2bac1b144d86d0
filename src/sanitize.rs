use std::sync::LazyLock;

use regex::Regex;

static SGR_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid SGR pattern"));

// A chunk boundary can cut an SGR sequence in half. The fragment waits for the
// next read or end-of-stream, so a runner that stalls mid-sequence shows the
// text before it late.
static INCOMPLETE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b(?:\[[0-9;]*)?$").expect("valid tail pattern"));

/// Normalizes line endings and strips SGR color/style escapes.
///
/// Only `ESC [ <digits/semicolons> m` is removed; cursor movement and other
/// control sequences pass through untouched.
pub fn sanitize(raw: &str) -> String {
    strip_color_codes(&normalize_line_endings(raw))
}

pub fn normalize_line_endings(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

pub fn strip_color_codes(raw: &str) -> String {
    let mut text = raw.to_owned();
    // Removing one sequence can splice its neighbours into a new one.
    while SGR_SEQUENCE.is_match(&text) {
        text = SGR_SEQUENCE.replace_all(&text, "").into_owned();
    }
    text
}

/// Splits off a trailing fragment that may complete in the next read.
pub(crate) fn split_incomplete_tail(text: &str) -> (&str, &str) {
    match INCOMPLETE_TAIL.find(text) {
        Some(tail) => text.split_at(tail.start()),
        None => (text, ""),
    }
}
