//! Scoped working directory

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A freshly created directory that is removed when dropped.
///
/// Removal happens exactly once, on every exit path, and never replaces the
/// error that caused the exit: a failed removal is only logged.
#[derive(Debug)]
pub struct WorkingDirectory {
    path: PathBuf,
}

impl WorkingDirectory {
    /// Create `path`, wiping leftovers from an interrupted earlier run.
    ///
    /// The stored path is absolute, so tools started elsewhere can use it.
    pub fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            warn!("Removing stale {}", path.display());
            std::fs::remove_dir_all(path)?;
        }
        info!("Creating {}", path.display());
        std::fs::create_dir_all(path)?;
        let path = std::fs::canonicalize(path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkingDirectory {
    fn drop(&mut self) {
        info!("Removing {}", self.path.display());
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!("Failed to remove {}: {}", self.path.display(), e);
        }
    }
}
