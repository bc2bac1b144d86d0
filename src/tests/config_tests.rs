use super::{Config, ConfigError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[test]
fn defaults_point_into_bundle_dir() {
    let config = Config::from_bundle_dir(Path::new("/opt/guardpost/bundle"));
    assert_eq!(
        config.wrapper,
        PathBuf::from("/opt/guardpost/bundle/guard_wrapper")
    );
    assert_eq!(
        config.launcher,
        PathBuf::from("/opt/guardpost/bundle/run_guard.sh")
    );
    assert!(config.word_wrap);
    assert_eq!(config.source, None);
}

#[test]
fn empty_config_keeps_defaults() {
    let config = Config::parse("", Path::new("/etc"), Path::new("/bundle")).expect("parse");
    assert_eq!(config, Config::from_bundle_dir(Path::new("/bundle")));
}

#[test]
fn relative_paths_resolve_against_config_dir() {
    let config = Config::parse(
        "[launcher]\nwrapper = \"bin/wrap\"\nscript = \"/abs/run.sh\"\n\n[panel]\nword_wrap = false\n",
        Path::new("/home/dev/.config/guardpost"),
        Path::new("/bundle"),
    )
    .expect("parse");
    assert_eq!(
        config.wrapper,
        PathBuf::from("/home/dev/.config/guardpost/bin/wrap")
    );
    assert_eq!(config.launcher, PathBuf::from("/abs/run.sh"));
    assert!(!config.word_wrap);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = Config::parse(
        "[launcher]\nwraper = \"typo\"\n",
        Path::new("/"),
        Path::new("/bundle"),
    )
    .expect_err("unknown key");
    assert!(err.to_string().contains("wraper"));
}

#[test]
fn from_file_records_source_and_reports_parse_errors() {
    let dir = temp_dir("from-file");
    let good = dir.join("guardpost.toml");
    fs::write(&good, "[panel]\nword_wrap = false\n").expect("write config");
    let config = Config::from_file(&good, Path::new("/bundle")).expect("load");
    assert_eq!(config.source, Some(good.clone()));
    assert!(!config.word_wrap);

    let bad = dir.join("bad.toml");
    fs::write(&bad, "[panel\n").expect("write bad config");
    let err = Config::from_file(&bad, Path::new("/bundle")).expect_err("parse error");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("bad.toml"));
}

#[test]
fn explicit_missing_config_is_an_error() {
    let missing = temp_dir("missing").join("nope.toml");
    let err = Config::load(Some(&missing)).expect_err("missing explicit config");
    assert!(matches!(err, ConfigError::MissingExplicit { .. }));
}

fn temp_dir(name: &str) -> PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("guardpost-config-{name}-{ts}"));
    fs::create_dir_all(&dir).expect("mkdir temp");
    dir
}
