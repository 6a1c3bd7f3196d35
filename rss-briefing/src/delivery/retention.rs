use crate::types::Result;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Deletes regular files in `dir` last modified more than `retention_days` before `now`.
/// Hidden files are left alone. Returns how many files were removed.
pub fn sweep(dir: &Path, retention_days: u64, now: SystemTime) -> Result<usize> {
    if !dir.exists() {
        debug!("Retention sweep skipped, {} does not exist", dir.display());
        return Ok(0);
    }

    let max_age = Duration::from_secs(retention_days * 24 * 60 * 60);
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }

        let age = match metadata.modified().map(|m| now.duration_since(m)) {
            Ok(Ok(age)) => age,
            // Modified in the future relative to `now`, or no mtime support.
            _ => continue,
        };
        if age <= max_age {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!("Removed expired artifact {}", entry.path().display());
                removed += 1;
            }
            Err(e) => warn!("Could not remove {}: {}", entry.path().display(), e),
        }
    }

    info!("Retention sweep removed {} files from {}", removed, dir.display());
    Ok(removed)
}
