use std::io::{self, BufReader, IsTerminal};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::commands::HostCommand;
use crate::config::{Config, ConfigError};
use crate::locator::{find_project_root, is_project_root, missing_markers, LocateError};
use crate::logging::{self, LogTarget};
use crate::plain::{run_plain, PlainError, PlainSink};
use crate::session::{Session, SessionError};
use crate::tui::{run_tui, PanelBuffer, TuiError};
use crate::ui::theme::resolve_color_enabled;
use crate::ui::{KeyValue, OutputMode, PlainRenderer, Renderer, TableSpec, UiError};
use crate::{Command, CommandsArgs, LocateArgs, RunArgs};

const COMMANDS_SCHEMA: &str = "guardpost.commands.v1";

#[derive(Debug)]
pub enum AppError {
    Cwd(io::Error),
    Config(ConfigError),
    Locate(LocateError),
    Logging(io::Error),
    Plain(PlainError),
    Tui(TuiError),
    Ui(UiError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Cwd(err) => write!(f, "failed to read current directory: {err}"),
            AppError::Config(err) => write!(f, "{err}"),
            AppError::Locate(err) => write!(f, "{err}"),
            AppError::Logging(err) => write!(f, "failed to open log file: {err}"),
            AppError::Plain(err) => write!(f, "{err}"),
            AppError::Tui(err) => write!(f, "{err}"),
            AppError::Ui(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LocateError> for AppError {
    fn from(value: LocateError) -> Self {
        Self::Locate(value)
    }
}

impl From<PlainError> for AppError {
    fn from(value: PlainError) -> Self {
        match value {
            PlainError::Session(SessionError::Locate(err)) => Self::Locate(err),
            other => Self::Plain(other),
        }
    }
}

impl From<TuiError> for AppError {
    fn from(value: TuiError) -> Self {
        Self::Tui(value)
    }
}

impl From<UiError> for AppError {
    fn from(value: UiError) -> Self {
        Self::Ui(value)
    }
}

impl AppError {
    pub fn title(&self) -> &'static str {
        match self {
            AppError::Locate(_) => "Guard project not found",
            AppError::Config(_) => "Invalid configuration",
            AppError::Plain(PlainError::Session(_)) => "Guard failed",
            _ => "guardpost failed",
        }
    }

    /// Per-folder detail for a failed project search.
    pub fn hint(&self) -> Option<String> {
        let AppError::Locate(LocateError::NotFound { candidates }) = self else {
            return None;
        };
        if candidates.is_empty() {
            return Some("Pass --folder <PATH> for each folder to search".to_owned());
        }
        let details = candidates
            .iter()
            .map(|path| {
                format!(
                    "{}: missing {}",
                    path.display(),
                    missing_markers(path).join(", ")
                )
            })
            .collect::<Vec<String>>();
        Some(details.join("; "))
    }
}

/// Runs a parsed command. Report commands return their rendered output;
/// `run` owns the terminal until the user quits and returns nothing.
pub fn run_command(cmd: Command) -> Result<String, AppError> {
    match cmd {
        Command::Run(args) => {
            run_session(args)?;
            Ok(String::new())
        }
        Command::Locate(args) => render_locate(&args),
        Command::Commands(args) => render_commands(&args),
        Command::Help => Ok(crate::usage().to_owned()),
    }
}

fn resolve_folders(folders: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
    if !folders.is_empty() {
        return Ok(folders.to_vec());
    }
    let cwd = std::env::current_dir().map_err(AppError::Cwd)?;
    Ok(vec![cwd])
}

fn run_session(args: RunArgs) -> Result<(), AppError> {
    let folders = resolve_folders(&args.folders)?;
    let config = Config::load(args.config.as_deref())?;
    let interactive = io::stdout().is_terminal() && io::stdin().is_terminal();

    if args.plain || !interactive {
        logging::init(LogTarget::for_plain()).map_err(AppError::Logging)?;
        debug!(folders = folders.len(), "starting plain session");
        let mode = OutputMode::from_env();
        let sink = PlainSink::new(PlainRenderer::stdout(mode));
        let mut session = Session::new(config, sink);
        let mut notices = PlainRenderer::stderr(mode);
        run_plain(
            &mut session,
            &folders,
            BufReader::new(io::stdin()),
            &mut notices,
        )?;
        return Ok(());
    }

    logging::init(LogTarget::for_tui()).map_err(AppError::Logging)?;
    debug!(folders = folders.len(), "starting terminal session");
    let mut session = Session::new(config, PanelBuffer::default());
    run_tui(&mut session, &folders)?;
    Ok(())
}

fn render_locate(args: &LocateArgs) -> Result<String, AppError> {
    let folders = resolve_folders(&args.folders)?;
    let Some(root) = find_project_root(&folders) else {
        return Err(LocateError::NotFound {
            candidates: folders,
        }
        .into());
    };

    let mut renderer = PlainRenderer::new(Vec::<u8>::new(), stdout_color_enabled());
    renderer.key_values(&[KeyValue::new("project", root.display().to_string())])?;
    if folders.len() > 1 {
        renderer.table(&candidate_table(&folders, &root))?;
    }
    Ok(rendered_text(renderer))
}

fn candidate_table(folders: &[PathBuf], root: &Path) -> TableSpec {
    let mut table = TableSpec::with_headers(&["folder", "status"]);
    for folder in folders {
        let status = if folder == root {
            "selected".to_owned()
        } else if is_project_root(folder) {
            "eligible".to_owned()
        } else {
            format!("missing {}", missing_markers(folder).join(", "))
        };
        table.push_row(vec![folder.display().to_string(), status]);
    }
    table
}

#[derive(Serialize)]
struct CommandRow {
    name: &'static str,
    alias: &'static str,
    key: String,
    caption: &'static str,
    requires_running: bool,
    control_token: Option<&'static str>,
}

#[derive(Serialize)]
struct CommandsJson {
    schema: &'static str,
    schema_version: u32,
    commands: Vec<CommandRow>,
}

fn command_rows() -> Vec<CommandRow> {
    HostCommand::ALL
        .into_iter()
        .map(|command| CommandRow {
            name: command.name(),
            alias: command.alias(),
            key: command.key().to_string(),
            caption: command.caption(),
            requires_running: command.requires_running(),
            control_token: command.control().map(|control| control.token()),
        })
        .collect()
}

fn render_commands(args: &CommandsArgs) -> Result<String, AppError> {
    let rows = command_rows();
    if args.output_json {
        let payload = CommandsJson {
            schema: COMMANDS_SCHEMA,
            schema_version: 1,
            commands: rows,
        };
        return serde_json::to_string_pretty(&payload)
            .map_err(|error| AppError::Ui(UiError::from(error)));
    }

    let mut table = TableSpec::with_headers(&["command", "alias", "key", "enabled", "caption"]);
    for row in rows {
        let enabled = if row.requires_running {
            "while running"
        } else if row.name == HostCommand::Start.name() {
            "while stopped"
        } else {
            "always"
        };
        table.push_row(vec![
            row.name.to_owned(),
            row.alias.to_owned(),
            row.key,
            enabled.to_owned(),
            row.caption.to_owned(),
        ]);
    }
    let mut renderer = PlainRenderer::new(Vec::<u8>::new(), stdout_color_enabled());
    renderer.table(&table)?;
    Ok(rendered_text(renderer))
}

fn stdout_color_enabled() -> bool {
    resolve_color_enabled(OutputMode::from_env(), io::stdout().is_terminal())
}

fn rendered_text(renderer: PlainRenderer<Vec<u8>>) -> String {
    String::from_utf8_lossy(&renderer.into_inner())
        .trim_end()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_rows_cover_the_whole_surface() {
        let rows = command_rows();
        assert_eq!(rows.len(), HostCommand::ALL.len());
        let run_all = rows
            .iter()
            .find(|row| row.name == "run_all_tests_guard")
            .expect("run all row");
        assert_eq!(run_all.control_token, Some("\n"));
        assert_eq!(run_all.key, "a");
        let start = rows
            .iter()
            .find(|row| row.name == "start_guard")
            .expect("start row");
        assert!(!start.requires_running);
        assert_eq!(start.control_token, None);
    }

    #[test]
    fn commands_json_has_schema_header() {
        let rendered = render_commands(&CommandsArgs { output_json: true }).expect("json");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
        assert_eq!(value["schema"], COMMANDS_SCHEMA);
        assert_eq!(value["schema_version"], 1);
        assert_eq!(value["commands"].as_array().map(Vec::len), Some(9));
        assert_eq!(value["commands"][1]["control_token"], "e\n");
    }

    #[test]
    fn locate_hint_lists_missing_markers_per_folder() {
        let folder = std::env::temp_dir().join("guardpost-app-hint-missing");
        let err = AppError::Locate(LocateError::NotFound {
            candidates: vec![folder.clone()],
        });
        assert_eq!(err.title(), "Guard project not found");
        assert_eq!(
            err.hint().expect("hint"),
            format!("{}: missing Guardfile, Gemfile", folder.display())
        );

        let empty = AppError::Locate(LocateError::NotFound { candidates: vec![] });
        assert!(empty.hint().expect("hint").contains("--folder"));
    }

    #[test]
    fn plain_locate_failures_keep_their_folder_detail() {
        let err = AppError::from(PlainError::Session(SessionError::Locate(
            LocateError::NotFound { candidates: vec![] },
        )));
        assert!(matches!(err, AppError::Locate(_)));
    }
}
