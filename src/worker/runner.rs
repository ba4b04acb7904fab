//! Runs one task against one object

use crate::clients::ObjectStore;
use crate::error::{MagicBucketError, Result};
use crate::model::{basename, ObjectRef, ResultRef};
use crate::tasks::{CommandRunner, Task, TaskContext};
use crate::worker::extract::extract_in_place;
use crate::worker::workdir::WorkingDirectory;
use crate::worker::WorkerConfig;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Drives the download, extract, process, upload lifecycle of a work item
pub struct WorkItemRunner {
    store: Arc<dyn ObjectStore>,
    commands: Arc<dyn CommandRunner>,
    config: WorkerConfig,
}

impl WorkItemRunner {
    /// Create a new runner
    pub fn new(
        store: Arc<dyn ObjectStore>,
        commands: Arc<dyn CommandRunner>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            commands,
            config,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run `task` on `object` and return where the result was uploaded.
    ///
    /// The working directory is removed before this returns, whatever the
    /// outcome.
    pub async fn run(&self, task: &dyn Task, object: &ObjectRef) -> Result<ResultRef> {
        let work = WorkingDirectory::create(&self.config.work_dir)?;
        let result = self.run_in(task, object, work.path()).await;
        drop(work);
        result
    }

    async fn run_in(&self, task: &dyn Task, object: &ObjectRef, dir: &Path) -> Result<ResultRef> {
        let filename = self.download_and_extract(object, dir).await?;

        let ctx = TaskContext {
            source: object,
            work_dir: dir,
            cache_dir: &self.config.cache_dir,
            store: self.store.as_ref(),
            commands: self.commands.as_ref(),
        };
        let output = task.process(&ctx, &filename).await?;

        self.upload(task, object, dir, &output).await
    }

    /// Download the object into `dir` and unpack it if it is an archive.
    ///
    /// Returns the local file name to process.
    pub async fn download_and_extract(&self, object: &ObjectRef, dir: &Path) -> Result<String> {
        let name = object.basename();
        if name.is_empty() {
            return Err(MagicBucketError::NotAFile {
                bucket: object.bucket.clone(),
                key: object.key.clone(),
            });
        }
        info!("Downloading {} to {}", object.key, name);
        if !self
            .store
            .download(&object.bucket, &object.key, &dir.join(name))
            .await?
        {
            return Err(MagicBucketError::MissingS3File {
                bucket: object.bucket.clone(),
                key: object.key.clone(),
            });
        }
        extract_in_place(dir, name)
    }

    /// Upload `output` (relative to `dir`) next to the source object.
    ///
    /// Only the output's basename is kept, so files a task writes into its
    /// own subdirectories still land directly in the S3 output directory.
    pub async fn upload(
        &self,
        task: &dyn Task,
        object: &ObjectRef,
        dir: &Path,
        output: &str,
    ) -> Result<ResultRef> {
        let key = object.output_key(task.s3_output_dir(), basename(output));
        info!("Uploading {} to {}", output, key);
        self.store
            .upload(&dir.join(output), &object.bucket, &key)
            .await?;
        Ok(ResultRef {
            bucket: object.bucket.clone(),
            key,
        })
    }
}
