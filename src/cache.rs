use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub const TERM_HISTORY_FILE: &str = "term_history.txt";
pub const LOG_FILE: &str = "potato.log";

/// Files under the cache directory removed by `--clear-cache`.
const CACHE_FILES: &[&str] = &[TERM_HISTORY_FILE, LOG_FILE];

/// Owns the per-user cache directory (term history, default log file).
#[derive(Clone, Debug)]
pub struct CacheManager {
    pub(crate) cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(app_name: &str) -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| eyre!("Could not determine cache directory"))?
            .join(app_name);
        Ok(Self { cache_dir })
    }

    /// Cache rooted at an explicit directory (tests).
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_file(&self, filename: &str) -> PathBuf {
        self.cache_dir.join(filename)
    }

    pub fn ensure_cache_dir(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Remove every registered cache file. Files that cannot be removed are
    /// reported and skipped; returns how many were deleted.
    pub fn clear_all(&self) -> Result<usize> {
        let mut removed = 0;
        for filename in CACHE_FILES {
            let file_path = self.cache_file(filename);
            if !file_path.exists() {
                continue;
            }
            match fs::remove_file(&file_path) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!("Warning: Could not remove cache file {}: {}", filename, e),
            }
        }
        Ok(removed)
    }
}
