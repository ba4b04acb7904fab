//! Object references and S3 key helpers

use crate::error::{MagicBucketError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An object in the magic bucket, as announced by a queue message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse an `s3://bucket/key` URI
    pub fn from_uri(uri: &str) -> Result<Self> {
        let parsed = url::Url::parse(uri)
            .map_err(|e| MagicBucketError::Config(format!("Invalid S3 URI {}: {}", uri, e)))?;
        if parsed.scheme() != "s3" {
            return Err(MagicBucketError::Config(format!(
                "Expected an s3:// URI, got: {}",
                uri
            )));
        }
        let bucket = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| MagicBucketError::Config(format!("Missing bucket in URI: {}", uri)))?;
        let key = parsed.path().trim_start_matches('/');
        if key.is_empty() {
            return Err(MagicBucketError::Config(format!(
                "Missing key in URI: {}",
                uri
            )));
        }
        Ok(Self::new(bucket, key))
    }

    /// Final path segment of the key
    pub fn basename(&self) -> &str {
        basename(&self.key)
    }

    /// Directory part of the key, empty for top-level objects
    pub fn dirname(&self) -> &str {
        dirname(&self.key)
    }

    /// The topmost path segment, which names the task to run.
    ///
    /// Equivalent to repeatedly stripping the last segment until no parent
    /// directory is left.
    pub fn task_name(&self) -> &str {
        task_name(&self.key)
    }

    /// Key of a sibling object in the same directory
    pub fn sibling(&self, name: &str) -> String {
        join_key(self.dirname(), name)
    }

    /// Where a task's output file lands: `<dirname>/<output_dir>/<basename(output_file)>`
    pub fn output_key(&self, output_dir: &str, output_file: &str) -> String {
        join_key(&join_key(self.dirname(), output_dir), basename(output_file))
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Location of an uploaded task result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRef {
    pub bucket: String,
    pub key: String,
}

impl fmt::Display for ResultRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// A raw queue message: its receipt handle and JSON body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub receipt_handle: String,
    pub body: String,
}

/// The subset of an S3 event notification record the worker reads
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEntity {
    pub key: String,
}

impl EventRecord {
    /// Parse a queue message body into the object it refers to
    pub fn parse_object(body: &str) -> Result<ObjectRef> {
        let record: EventRecord = serde_json::from_str(body)
            .map_err(|e| MagicBucketError::InvalidMessage(format!("{}: {}", e, body)))?;
        Ok(ObjectRef::new(record.s3.bucket.name, record.s3.object.key))
    }
}

/// Final segment of a slash-delimited path
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Everything before the final slash, empty when there is none
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => path[..idx].trim_end_matches('/'),
        None => "",
    }
}

/// Topmost segment of a key, ignoring leading slashes
pub fn task_name(key: &str) -> &str {
    let trimmed = key.trim_start_matches('/');
    match trimmed.find('/') {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    }
}

/// Join two key fragments with a single slash
pub fn join_key(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

/// Split the final extension off a file name.
///
/// Leading dots do not start an extension, so `.hidden` has none.
/// `split_extension("simple.las.zip")` is `("simple.las", ".zip")`.
pub fn split_extension(name: &str) -> (&str, &str) {
    let file_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    let file = &name[file_start..];
    let leading_dots = file.len() - file.trim_start_matches('.').len();
    match file[leading_dots..].rfind('.') {
        Some(idx) => name.split_at(file_start + leading_dots + idx),
        None => (name, ""),
    }
}
