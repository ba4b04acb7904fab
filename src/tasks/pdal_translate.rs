//! `pdal translate` driven by a JSON configuration file

use crate::error::{MagicBucketError, Result};
use crate::model::{join_key, split_extension};
use crate::tasks::{argv, Task, TaskContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Local name of the downloaded configuration
pub const CONFIG_FILE: &str = "config.json";

/// Local name of the filters pipeline handed to pdal
pub const FILTERS_FILE: &str = "filters.json";

/// Local directory that receives the translated file
pub const OUTPUT_DIR: &str = "output";

/// Per-file or per-directory translation settings.
///
/// ```json
/// {"filters": [{"type": "filters.reprojection", "out_srs": "EPSG:32615"}],
///  "output_ext": ".laz",
///  "args": ["--writers.las.scale_x", "0.001"]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// pdal filter stages, written verbatim to `filters.json`
    #[serde(default)]
    pub filters: Option<Value>,

    /// Replaces the input's final extension, e.g. `.laz`
    #[serde(default)]
    pub output_ext: Option<String>,

    /// Extra arguments appended to the command line
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

impl TranslateConfig {
    /// Parse configuration JSON
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| MagicBucketError::InvalidConfig(e.to_string()))
    }

    /// Output file name for `filename`, before the output directory is prepended
    pub fn output_name(&self, filename: &str) -> String {
        match self.output_ext.as_deref().filter(|ext| !ext.is_empty()) {
            Some(ext) => format!("{}{}", split_extension(filename).0, ext),
            None => filename.to_string(),
        }
    }

    /// Filters worth writing out; empty arrays and objects count as absent
    fn active_filters(&self) -> Option<&Value> {
        self.filters.as_ref().filter(|filters| match filters {
            Value::Null => false,
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
            _ => true,
        })
    }
}

/// Runs `pdal translate` on a file
#[derive(Debug, Clone, Copy, Default)]
pub struct PdalTranslate;

impl PdalTranslate {
    pub const NAME: &'static str = "pdal-translate";

    /// Fetch the configuration into the working directory.
    ///
    /// A sidecar `<key>.json` wins over the directory's `config.json`.
    pub async fn fetch_config(&self, ctx: &TaskContext<'_>) -> Result<TranslateConfig> {
        let local = ctx.path(CONFIG_FILE);
        let source = ctx.source;

        let sidecar_key = format!("{}.json", source.key);
        let directory_key = join_key(source.dirname(), CONFIG_FILE);

        let mut found = None;
        for key in [sidecar_key, directory_key] {
            if ctx.store.download(&source.bucket, &key, &local).await? {
                found = Some(key);
                break;
            }
        }
        let Some(key) = found else {
            return Err(MagicBucketError::MissingConfigFile);
        };
        info!("Using configuration s3://{}/{}", source.bucket, key);

        let text = tokio::fs::read_to_string(&local).await?;
        TranslateConfig::from_json(&text)
    }

    /// Build the pdal command line
    pub fn command(&self, config: &TranslateConfig, input: &str, output: &str) -> Vec<String> {
        let mut args = argv(&["pdal", "translate", "-i", input, "-o", output]);
        if config.active_filters().is_some() {
            args.extend(argv(&["--json", FILTERS_FILE]));
        }
        if let Some(extra) = &config.args {
            args.extend(extra.iter().cloned());
        }
        args
    }
}

#[async_trait]
impl Task for PdalTranslate {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn process(&self, ctx: &TaskContext<'_>, filename: &str) -> Result<String> {
        let config = self.fetch_config(ctx).await?;

        tokio::fs::create_dir_all(ctx.path(OUTPUT_DIR)).await?;
        let output = join_key(OUTPUT_DIR, &config.output_name(filename));

        if let Some(filters) = config.active_filters() {
            tokio::fs::write(ctx.path(FILTERS_FILE), serde_json::to_vec(filters)?).await?;
        }

        ctx.run_tool(self.command(&config, filename, &output)).await?;
        Ok(output)
    }
}
