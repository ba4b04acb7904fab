//! Riegl's `rimtatls` MTA correction

use crate::error::Result;
use crate::model::split_extension;
use crate::tasks::{argv, Task, TaskContext};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct Rimtatls;

impl Rimtatls {
    pub const NAME: &'static str = "rimtatls";

    pub fn output_name(filename: &str) -> String {
        format!("{}.mta.rxp", split_extension(filename).0)
    }
}

#[async_trait]
impl Task for Rimtatls {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn process(&self, ctx: &TaskContext<'_>, filename: &str) -> Result<String> {
        let output = Self::output_name(filename);
        ctx.run_tool(argv(&["rimtatls", filename, output.as_str()])).await?;
        Ok(output)
    }
}
