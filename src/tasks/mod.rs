//! Processing tasks
//!
//! A task turns one downloaded (and already decompressed) file into one
//! output file by running an external tool. The topmost path segment of the
//! object key selects the task through the `TaskRegistry`.

pub mod ape_near_field;
pub mod pdal_info;
pub mod pdal_translate;
pub mod registry;
pub mod rimtatls;
pub mod subprocess;

pub use ape_near_field::ApeNearFieldPrcs;
pub use pdal_info::PdalInfo;
pub use pdal_translate::{PdalTranslate, TranslateConfig};
pub use registry::{TaskConstructor, TaskRegistry};
pub use rimtatls::Rimtatls;
pub use subprocess::{argv, CommandRunner, ProcessInvocation, SystemCommandRunner};

use crate::clients::ObjectStore;
use crate::error::Result;
use crate::model::ObjectRef;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default S3 subdirectory, next to the source object, that receives results
pub const DEFAULT_S3_OUTPUT_DIR: &str = "output";

/// Everything a task may touch while processing one object
pub struct TaskContext<'a> {
    /// The object being processed
    pub source: &'a ObjectRef,
    /// Private working directory; all relative file names resolve here
    pub work_dir: &'a Path,
    /// Directory that survives between runs
    pub cache_dir: &'a Path,
    pub store: &'a dyn ObjectStore,
    pub commands: &'a dyn CommandRunner,
}

impl TaskContext<'_> {
    /// Absolute path of a file inside the working directory
    pub fn path(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    /// Run an external tool inside the working directory, logging its output
    pub async fn run_tool(&self, args: Vec<String>) -> Result<ProcessInvocation> {
        info!("Running {:?}", args);
        let invocation = self.commands.run(&args, self.work_dir).await?;
        info!("Complete: {}", invocation.combined_output().trim_end());
        Ok(invocation)
    }
}

/// A processing step bound to a key prefix
#[async_trait]
pub trait Task: Send + Sync {
    /// Stable identifier used in logs and notifications
    fn name(&self) -> &'static str;

    /// S3 subdirectory, relative to the source object's directory, for results
    fn s3_output_dir(&self) -> &str {
        DEFAULT_S3_OUTPUT_DIR
    }

    /// Produce one output file from `filename`.
    ///
    /// Both `filename` and the returned path are relative to the working
    /// directory.
    async fn process(&self, ctx: &TaskContext<'_>, filename: &str) -> Result<String>;
}
