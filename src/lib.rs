pub mod app;
pub mod commands;
pub mod config;
pub mod control;
pub mod lifecycle;
pub mod locator;
pub mod logging;
pub mod panel;
pub mod plain;
pub mod process_manager;
pub mod pump;
pub mod sanitize;
pub mod session;
pub mod tui;
pub mod ui;

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunArgs),
    Locate(LocateArgs),
    Commands(CommandsArgs),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunArgs {
    pub folders: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub plain: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocateArgs {
    pub folders: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandsArgs {
    pub output_json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliParseError {
    MissingFolderValue,
    MissingConfigValue,
    UnknownArgument(String),
}

impl std::fmt::Display for CliParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliParseError::MissingFolderValue => write!(f, "--folder requires a value"),
            CliParseError::MissingConfigValue => write!(f, "--config requires a value"),
            CliParseError::UnknownArgument(arg) => write!(f, "unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for CliParseError {}

/// Parses arguments after the program name. No arguments means `run`.
pub fn parse_command<I>(args: I) -> Result<Command, CliParseError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().peekable();
    let Some(cmd) = args.peek().cloned() else {
        return Ok(Command::Run(RunArgs::default()));
    };

    match cmd.as_str() {
        "--help" | "-h" | "help" => Ok(Command::Help),
        "run" => parse_run(args.skip(1)),
        "locate" => parse_locate(args.skip(1)),
        "commands" => parse_commands(args.skip(1)),
        flag if flag.starts_with('-') => parse_run(args),
        other => Err(CliParseError::UnknownArgument(other.to_owned())),
    }
}

fn parse_run<I>(args: I) -> Result<Command, CliParseError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut run = RunArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--folder" => {
                let Some(path) = args.next() else {
                    return Err(CliParseError::MissingFolderValue);
                };
                run.folders.push(PathBuf::from(path));
            }
            "--config" => {
                let Some(path) = args.next() else {
                    return Err(CliParseError::MissingConfigValue);
                };
                run.config = Some(PathBuf::from(path));
            }
            "--plain" => run.plain = true,
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(CliParseError::UnknownArgument(other.to_owned())),
        }
    }

    Ok(Command::Run(run))
}

fn parse_locate<I>(args: I) -> Result<Command, CliParseError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut folders = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--folder" => {
                let Some(path) = args.next() else {
                    return Err(CliParseError::MissingFolderValue);
                };
                folders.push(PathBuf::from(path));
            }
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(CliParseError::UnknownArgument(other.to_owned())),
        }
    }

    Ok(Command::Locate(LocateArgs { folders }))
}

fn parse_commands<I>(args: I) -> Result<Command, CliParseError>
where
    I: IntoIterator<Item = String>,
{
    let mut output_json = false;
    for arg in args {
        match arg.as_str() {
            "--json" => output_json = true,
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(CliParseError::UnknownArgument(other.to_owned())),
        }
    }
    Ok(Command::Commands(CommandsArgs { output_json }))
}

pub fn usage() -> &'static str {
    "guardpost\n\nUSAGE:\n  guardpost [run] [--folder <PATH>]... [--config <PATH>] [--plain]\n  guardpost locate [--folder <PATH>]...\n  guardpost commands [--json]\n\nCOMMANDS:\n  run               Start guard in the first folder holding a Guardfile and Gemfile\n  locate            Report which folder guard would start in\n  commands          List the guard commands and their keys\n\nOPTIONS (run, locate):\n  --folder <PATH>   Candidate project folder, in priority order (default: current dir)\n\nOPTIONS (run):\n  --config <PATH>   Read guardpost.toml from PATH\n  --plain           Line mode: output on stdout, command names on stdin\n\nOPTIONS (commands):\n  --json            Print the command table as JSON\n\nENVIRONMENT:\n  GUARDPOST_CONFIG      Config file used when --config is absent\n  GUARDPOST_BUNDLE_DIR  Directory holding guard_wrapper and run_guard.sh\n  GUARDPOST_COLOR       auto | always | never\n  GUARDPOST_LOG_FILE    Write diagnostics to this file\n  RUST_LOG              Diagnostic filter (default: warn)\n\nGENERAL:\n  -h, --help        Print help\n"
}

pub fn print_usage() {
    eprintln!("{}", usage());
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
