//! `pdal info` metadata dump

use crate::error::Result;
use crate::tasks::{argv, Task, TaskContext};
use async_trait::async_trait;
use tracing::info;

/// Writes the output of `pdal info --all` next to the input as `<file>.json`
#[derive(Debug, Clone, Copy, Default)]
pub struct PdalInfo;

impl PdalInfo {
    pub const NAME: &'static str = "pdal-info";
}

#[async_trait]
impl Task for PdalInfo {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn process(&self, ctx: &TaskContext<'_>, filename: &str) -> Result<String> {
        // stdout is the product here, so it is not echoed to the log
        let args = argv(&["pdal", "info", "--all", filename]);
        info!("Running {:?}", args);
        let invocation = ctx.commands.run(&args, ctx.work_dir).await?;

        let output = format!("{}.json", filename);
        tokio::fs::write(ctx.path(&output), &invocation.stdout).await?;
        Ok(output)
    }
}
