use std::path::{Path, PathBuf};

use tracing::debug;

pub const CONFIG_FILE: &str = "guardpost.toml";
pub const CONFIG_ENV: &str = "GUARDPOST_CONFIG";
pub const BUNDLE_DIR_ENV: &str = "GUARDPOST_BUNDLE_DIR";
pub const DEFAULT_WRAPPER: &str = "guard_wrapper";
pub const DEFAULT_LAUNCHER: &str = "run_guard.sh";

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    launcher: Option<LauncherSection>,
    #[serde(default)]
    panel: Option<PanelSection>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct LauncherSection {
    #[serde(default)]
    wrapper: Option<PathBuf>,
    #[serde(default)]
    script: Option<PathBuf>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct PanelSection {
    #[serde(default)]
    word_wrap: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub wrapper: PathBuf,
    pub launcher: PathBuf,
    pub word_wrap: bool,
    pub source: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        error: std::io::Error,
    },
    Parse {
        path: PathBuf,
        error: toml::de::Error,
    },
    MissingExplicit {
        path: PathBuf,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, error } => {
                write!(f, "failed reading {}: {error}", path.display())
            }
            ConfigError::Parse { path, error } => {
                write!(f, "failed parsing {}: {error}", path.display())
            }
            ConfigError::MissingExplicit { path } => {
                write!(f, "config file does not exist: {}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Defaults for a bundle directory holding the wrapper and launcher script.
    pub fn from_bundle_dir(bundle_dir: &Path) -> Self {
        Self {
            wrapper: bundle_dir.join(DEFAULT_WRAPPER),
            launcher: bundle_dir.join(DEFAULT_LAUNCHER),
            word_wrap: true,
            source: None,
        }
    }

    /// Resolves configuration from `--config`, then `GUARDPOST_CONFIG`, then
    /// `guardpost.toml` inside the bundle directory; falls back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let bundle_dir = default_bundle_dir();
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::MissingExplicit { path });
                }
                Self::from_file(&path, &bundle_dir)
            }
            None => {
                let candidate = bundle_dir.join(CONFIG_FILE);
                if candidate.is_file() {
                    Self::from_file(&candidate, &bundle_dir)
                } else {
                    debug!(bundle = %bundle_dir.display(), "no config file, using bundle defaults");
                    Ok(Self::from_bundle_dir(&bundle_dir))
                }
            }
        }
    }

    pub fn from_file(path: &Path, bundle_dir: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let mut config = Self::parse(&source, base, bundle_dir).map_err(|error| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            }
        })?;
        config.source = Some(path.to_path_buf());
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parses config text; relative paths resolve against `base`.
    pub fn parse(source: &str, base: &Path, bundle_dir: &Path) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(source)?;
        let mut config = Self::from_bundle_dir(bundle_dir);
        if let Some(launcher) = file.launcher {
            if let Some(wrapper) = launcher.wrapper {
                config.wrapper = resolve_relative(base, wrapper);
            }
            if let Some(script) = launcher.script {
                config.launcher = resolve_relative(base, script);
            }
        }
        if let Some(word_wrap) = file.panel.and_then(|panel| panel.word_wrap) {
            config.word_wrap = word_wrap;
        }
        Ok(config)
    }
}

/// `GUARDPOST_BUNDLE_DIR`, else `bundle/` next to the running executable.
pub fn default_bundle_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(BUNDLE_DIR_ENV).filter(|value| !value.is_empty()) {
        return PathBuf::from(dir);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("bundle")))
        .unwrap_or_else(|| PathBuf::from("bundle"))
}

fn resolve_relative(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
