//! Discovery of `YYYY/MM` month folders.

use std::path::{Path, PathBuf};

use glob::Pattern;

/// Returns the month folders under `base`, laid out as `base/YYYY/MM`.
///
/// Only directories matching `[0-9][0-9][0-9][0-9]/[0-1][0-9]` count. The
/// result is sorted by year, then month. A missing `base` yields nothing.
pub fn find_year_month_folders(base: &Path) -> Vec<PathBuf> {
    let pattern = format!(
        "{}/[0-9][0-9][0-9][0-9]/[0-1][0-9]",
        Pattern::escape(&base.to_string_lossy())
    );
    let entries = match glob::glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(base = %base.display(), error = %e, "invalid folder pattern");
            return Vec::new();
        }
    };

    let mut folders: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable entry while scanning month folders");
                None
            }
        })
        .filter(|p| p.is_dir())
        .collect();
    folders.sort();
    folders
}
