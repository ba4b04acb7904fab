//! Worker configuration

use std::path::PathBuf;

/// Default working directory, recreated for every object
pub const DEFAULT_WORK_DIR: &str = "work";

/// Default directory for files reused across objects
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Scratch directory owned by the current object; removed after each run
    pub work_dir: PathBuf,

    /// Directory that persists between objects (reference datasets)
    pub cache_dir: PathBuf,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}

impl WorkerConfig {
    /// Create a new config builder
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }
}

/// Builder for WorkerConfig
#[derive(Default)]
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    /// Set the working directory
    pub fn work_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.work_dir = path.into();
        self
    }

    /// Set the cache directory
    pub fn cache_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = path.into();
        self
    }

    /// Build the config
    pub fn build(self) -> WorkerConfig {
        self.config
    }
}
