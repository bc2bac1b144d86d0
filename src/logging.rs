//! Diagnostic tracing for the supervisor, pumps and hosts.
//!
//! Guard's own output goes to the panel; this is only for debugging guardpost
//! itself. Filtering follows `RUST_LOG` and defaults to `warn`.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_ENV: &str = "GUARDPOST_LOG_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Disabled,
}

impl LogTarget {
    /// The terminal panel owns the screen, so it only logs to a file when asked.
    pub fn for_tui() -> Self {
        match std::env::var_os(LOG_FILE_ENV).filter(|value| !value.is_empty()) {
            Some(path) => LogTarget::File(PathBuf::from(path)),
            None => LogTarget::Disabled,
        }
    }

    pub fn for_plain() -> Self {
        match std::env::var_os(LOG_FILE_ENV).filter(|value| !value.is_empty()) {
            Some(path) => LogTarget::File(PathBuf::from(path)),
            None => LogTarget::Stderr,
        }
    }
}

pub fn init(target: LogTarget) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match target {
        LogTarget::Disabled => {}
        LogTarget::Stderr => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr).compact())
                .try_init();
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .compact(),
                )
                .try_init();
        }
    }
    Ok(())
}
