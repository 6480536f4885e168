//! Platform-specific default paths.
//!
//! Uses XDG on Linux, standard locations on macOS/Windows.

use std::path::PathBuf;

use directories::ProjectDirs;

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "kingtable";
const APPLICATION: &str = "kingtable";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Settings file remembering the page size between runs.
pub fn settings_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join("settings.json"))
}

/// Log file of the latest run.
pub fn log_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().join("latest.log"))
}
