//! Platform directories for the session log and conversation exports.

use std::path::PathBuf;

use crate::core::app;

/// Project directories from the standard platform locations.
pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("io", app::VENDOR, app::NAME)
}

/// Cache directory (~/.cache/omnichat/), created on demand. Holds the session log.
pub fn cache_dir() -> Option<PathBuf> {
    let dir = project_dirs()?.cache_dir().to_path_buf();
    if let Err(e) = std::fs::create_dir_all(&dir) {
        log::warn!("Cannot create cache dir {}: {}", dir.display(), e);
        return None;
    }
    Some(dir)
}

/// Session log file inside the cache directory.
pub fn log_file() -> Option<PathBuf> {
    cache_dir().map(|d| d.join(format!("{}.log", app::NAME)))
}

/// Default target for `/export`: the user's Downloads folder, else the working directory.
pub fn export_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|u| u.download_dir().map(|d| d.to_path_buf()))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
