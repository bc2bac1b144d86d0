use super::{
    parse_command, usage, CliParseError, Command, CommandsArgs, LocateArgs, RunArgs,
};
use std::path::PathBuf;

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

#[test]
fn parse_defaults_to_run_in_current_folder() {
    let cmd = parse_command(Vec::<String>::new()).expect("parse should succeed");
    assert_eq!(cmd, Command::Run(RunArgs::default()));
}

#[test]
fn parse_run_with_folders_config_and_plain() {
    let cmd = parse_command(args(&[
        "run",
        "--folder",
        "/work/app",
        "--folder",
        "/work/lib",
        "--config",
        "/etc/guardpost.toml",
        "--plain",
    ]))
    .expect("parse should succeed");
    assert_eq!(
        cmd,
        Command::Run(RunArgs {
            folders: vec![PathBuf::from("/work/app"), PathBuf::from("/work/lib")],
            config: Some(PathBuf::from("/etc/guardpost.toml")),
            plain: true,
        })
    );
}

#[test]
fn parse_leading_flags_imply_run() {
    let cmd = parse_command(args(&["--plain", "--folder", "."])).expect("parse should succeed");
    assert_eq!(
        cmd,
        Command::Run(RunArgs {
            folders: vec![PathBuf::from(".")],
            config: None,
            plain: true,
        })
    );
}

#[test]
fn parse_locate_and_commands() {
    assert_eq!(
        parse_command(args(&["locate", "--folder", "a"])).expect("locate"),
        Command::Locate(LocateArgs {
            folders: vec![PathBuf::from("a")],
        })
    );
    assert_eq!(
        parse_command(args(&["commands", "--json"])).expect("commands"),
        Command::Commands(CommandsArgs { output_json: true })
    );
    assert_eq!(
        parse_command(args(&["commands"])).expect("commands"),
        Command::Commands(CommandsArgs::default())
    );
}

#[test]
fn parse_help_forms() {
    let forms: [&[&str]; 5] = [
        &["--help"],
        &["-h"],
        &["help"],
        &["run", "--help"],
        &["locate", "-h"],
    ];
    for form in forms {
        assert_eq!(parse_command(args(form)).expect("help"), Command::Help);
    }
}

#[test]
fn parse_reports_missing_values_and_unknown_arguments() {
    assert_eq!(
        parse_command(args(&["run", "--folder"])),
        Err(CliParseError::MissingFolderValue)
    );
    assert_eq!(
        parse_command(args(&["--config"])),
        Err(CliParseError::MissingConfigValue)
    );
    assert_eq!(
        parse_command(args(&["commands", "--plain"])),
        Err(CliParseError::UnknownArgument("--plain".to_owned()))
    );
    assert_eq!(
        parse_command(args(&["deploy"])),
        Err(CliParseError::UnknownArgument("deploy".to_owned()))
    );
}

#[test]
fn usage_lists_every_command_form() {
    let text = usage();
    assert!(text.contains("guardpost [run] [--folder <PATH>]... [--config <PATH>] [--plain]"));
    assert!(text.contains("guardpost locate [--folder <PATH>]..."));
    assert!(text.contains("guardpost commands [--json]"));
    assert!(text.contains("GUARDPOST_BUNDLE_DIR"));
}
