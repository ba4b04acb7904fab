//! ATLAS near-field PRCS correction with `ape cpd`
//!
//! Every scan is registered against one fixed reference scan. The reference
//! lives in the magic bucket as a `.laz` file and is converted to `.las` once;
//! the converted copy is kept in the cache directory for later runs.

use crate::error::{MagicBucketError, Result};
use crate::model::split_extension;
use crate::tasks::{Task, TaskContext};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Key of the reference scan, in the same bucket as the processed object
pub const FIXED_S3_KEY: &str = "pdal-translate/ATLAS/near-field-prcs/output/150728_180208.mta.laz";

const FIXED_LAZ: &str = "150728_180208.mta.laz";
const FIXED_LAS: &str = "150728_180208.mta.las";

#[derive(Debug, Clone, Copy, Default)]
pub struct ApeNearFieldPrcs;

impl ApeNearFieldPrcs {
    pub const NAME: &'static str = "ape-near-field-prcs";

    /// Make sure the converted reference exists in the cache and return its path
    pub async fn ensure_fixed(&self, ctx: &TaskContext<'_>) -> Result<PathBuf> {
        tokio::fs::create_dir_all(ctx.cache_dir).await?;
        let cache_dir = tokio::fs::canonicalize(ctx.cache_dir).await?;
        let fixed = cache_dir.join(FIXED_LAS);
        if tokio::fs::try_exists(&fixed).await? {
            info!("Using cached reference {}", fixed.display());
            return Ok(fixed);
        }

        let fixed_laz = cache_dir.join(FIXED_LAZ);
        info!(
            "Downloading reference s3://{}/{}",
            ctx.source.bucket, FIXED_S3_KEY
        );
        if !ctx
            .store
            .download(&ctx.source.bucket, FIXED_S3_KEY, &fixed_laz)
            .await?
        {
            return Err(MagicBucketError::MissingFixedFile {
                bucket: ctx.source.bucket.clone(),
                key: FIXED_S3_KEY.to_string(),
            });
        }

        let converted = ctx
            .run_tool(vec![
                "pdal".to_string(),
                "translate".to_string(),
                fixed_laz.display().to_string(),
                fixed.display().to_string(),
            ])
            .await;
        if let Err(e) = converted {
            // a partial conversion must not be mistaken for a cached reference
            let _ = tokio::fs::remove_file(&fixed).await;
            return Err(e);
        }
        Ok(fixed)
    }
}

#[async_trait]
impl Task for ApeNearFieldPrcs {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn process(&self, ctx: &TaskContext<'_>, filename: &str) -> Result<String> {
        let fixed = self.ensure_fixed(ctx).await?;

        let stem = split_extension(filename).0;
        let las = format!("{}.las", stem);
        ctx.run_tool(vec![
            "pdal".to_string(),
            "translate".to_string(),
            filename.to_string(),
            las.clone(),
        ])
        .await?;

        let output = format!("{}.dat", stem);
        ctx.run_tool(vec![
            "ape".to_string(),
            "cpd".to_string(),
            fixed.display().to_string(),
            las,
            output.clone(),
        ])
        .await?;
        Ok(output)
    }
}
