use std::path::{Path, PathBuf};

use tracing::debug;

pub const GUARDFILE: &str = "Guardfile";
pub const GEMFILE: &str = "Gemfile";

const ROOT_MARKERS: [&str; 2] = [GUARDFILE, GEMFILE];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    NotFound { candidates: Vec<PathBuf> },
}

impl std::fmt::Display for LocateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocateError::NotFound { candidates } if candidates.is_empty() => {
                write!(f, "no open folders to search for a Guardfile and Gemfile")
            }
            LocateError::NotFound { .. } => write!(
                f,
                "failed to find Guardfile and Gemfile in any of the open folders"
            ),
        }
    }
}

impl std::error::Error for LocateError {}

/// Returns the first candidate directory that holds both marker files.
///
/// Candidates are probed in the given order on every call; nothing is cached.
pub fn find_project_root<P: AsRef<Path>>(candidates: &[P]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(AsRef::as_ref)
        .find(|path| {
            debug!(path = %path.display(), "checking folder for guard markers");
            is_project_root(path)
        })
        .map(Path::to_path_buf)
}

pub fn locate_project_root<P: AsRef<Path>>(candidates: &[P]) -> Result<PathBuf, LocateError> {
    find_project_root(candidates).ok_or_else(|| LocateError::NotFound {
        candidates: candidates
            .iter()
            .map(|path| path.as_ref().to_path_buf())
            .collect(),
    })
}

pub fn is_project_root(path: &Path) -> bool {
    ROOT_MARKERS.iter().all(|marker| path.join(marker).exists())
}

pub fn missing_markers(path: &Path) -> Vec<&'static str> {
    ROOT_MARKERS
        .iter()
        .copied()
        .filter(|marker| !path.join(marker).exists())
        .collect()
}

#[cfg(test)]
#[path = "tests/locator_tests.rs"]
mod tests;
