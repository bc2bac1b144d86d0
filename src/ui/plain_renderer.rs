use std::io::{IsTerminal, Write};
use std::time::Duration;

use anstream::{AutoStream, ColorChoice};
use anstyle::Style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::ui::renderer::{
    IndicatifSpinnerHandle, NoopSpinnerHandle, Renderer, SpinnerHandle, UiResult,
};
use crate::ui::table::render_table;
use crate::ui::theme::{is_ci_environment, resolve_color_enabled, OutputMode, Theme};
use crate::ui::widgets::{KeyValue, MessageBlock, NoticeLevel, TableSpec};

const SPINNER_TICK: Duration = Duration::from_millis(80);

/// Line renderer over any writer, colored only when enabled.
pub struct PlainRenderer<W: Write> {
    writer: W,
    color_enabled: bool,
    spinner_target: Option<SpinnerTarget>,
    theme: Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpinnerTarget {
    Stdout,
    Stderr,
}

impl<W: Write> PlainRenderer<W> {
    pub fn new(writer: W, color_enabled: bool) -> Self {
        Self {
            writer,
            color_enabled,
            spinner_target: None,
            theme: Theme::default(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes panel output verbatim and flushes, so partial lines show up.
    pub fn raw(&mut self, body: &str) -> UiResult<()> {
        self.writer.write_all(body.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if !self.color_enabled {
            return text.to_owned();
        }
        format!("{}{}{}", style.render(), text, style.render_reset())
    }
}

fn color_choice(mode: OutputMode) -> ColorChoice {
    match mode {
        OutputMode::Auto => ColorChoice::Auto,
        OutputMode::Always => ColorChoice::AlwaysAnsi,
        OutputMode::Never => ColorChoice::Never,
    }
}

impl PlainRenderer<AutoStream<std::io::Stdout>> {
    pub fn stdout(mode: OutputMode) -> Self {
        let is_tty = std::io::stdout().is_terminal();
        let mut renderer = Self::new(
            AutoStream::new(std::io::stdout(), color_choice(mode)),
            resolve_color_enabled(mode, is_tty),
        );
        if is_tty && !is_ci_environment() {
            renderer.spinner_target = Some(SpinnerTarget::Stdout);
        }
        renderer
    }
}

impl PlainRenderer<AutoStream<std::io::Stderr>> {
    pub fn stderr(mode: OutputMode) -> Self {
        let is_tty = std::io::stderr().is_terminal();
        let mut renderer = Self::new(
            AutoStream::new(std::io::stderr(), color_choice(mode)),
            resolve_color_enabled(mode, is_tty),
        );
        if is_tty && !is_ci_environment() {
            renderer.spinner_target = Some(SpinnerTarget::Stderr);
        }
        renderer
    }
}

impl<W: Write> Renderer for PlainRenderer<W> {
    fn notice(&mut self, level: NoticeLevel, body: &str) -> UiResult<()> {
        let marker = self.paint(self.theme.notice(level), "•");
        let label = self.paint(self.theme.muted, level.label());
        writeln!(self.writer, "{marker} {label}: {body}")?;
        Ok(())
    }

    fn bullet_list(&mut self, title: &str, items: &[String]) -> UiResult<()> {
        writeln!(self.writer, "{title}:")?;
        if items.is_empty() {
            writeln!(self.writer, "- <none>")?;
        }
        for item in items {
            writeln!(self.writer, "- {item}")?;
        }
        Ok(())
    }

    fn error_block(&mut self, block: &MessageBlock) -> UiResult<()> {
        let marker = self.paint(self.theme.error, "[error]");
        writeln!(self.writer, "{marker} {}", block.title)?;
        writeln!(self.writer, "  {}", block.body)?;
        if let Some(hint) = &block.hint {
            let label = self.paint(self.theme.muted, "hint");
            writeln!(self.writer, "  {label}: {hint}")?;
        }
        Ok(())
    }

    fn key_values(&mut self, items: &[KeyValue]) -> UiResult<()> {
        for item in items {
            let key = self.paint(self.theme.key, &item.key);
            writeln!(self.writer, "{key}: {}", item.value)?;
        }
        Ok(())
    }

    fn table(&mut self, spec: &TableSpec) -> UiResult<()> {
        writeln!(self.writer, "{}", render_table(spec))?;
        Ok(())
    }

    fn spinner(&mut self, label: &str) -> UiResult<Box<dyn SpinnerHandle>> {
        let Some(target) = self.spinner_target else {
            let marker = self.paint(self.theme.info, "◌");
            writeln!(self.writer, "{marker} {label}")?;
            return Ok(Box::new(NoopSpinnerHandle));
        };
        let draw_target = match target {
            SpinnerTarget::Stdout => ProgressDrawTarget::stdout(),
            SpinnerTarget::Stderr => ProgressDrawTarget::stderr(),
        };
        let spinner = ProgressBar::with_draw_target(None, draw_target);
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(label.to_owned());
        spinner.enable_steady_tick(SPINNER_TICK);
        Ok(Box::new(IndicatifSpinnerHandle::new(spinner)))
    }
}
