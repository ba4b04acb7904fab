//! In-memory stand-ins for the worker's external services

#![allow(dead_code)]

use async_trait::async_trait;
use magic_bucket::clients::{MessageQueue, Notifier, ObjectStore};
use magic_bucket::tasks::{CommandRunner, ProcessInvocation};
use magic_bucket::{Dispatcher, MagicBucketError, QueueMessage, Result, TaskRegistry, WorkerConfig};
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const BUCKET: &str = "crrel-magic-bucket";

// ---------------------------------------------------------------------------
// Object store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    downloads: Mutex<Vec<String>>,
    uploads: Mutex<Vec<String>>,
    fail_uploads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, key: &str, bytes: impl Into<Vec<u8>>) {
        self.objects
            .lock()
            .unwrap()
            .insert((BUCKET.to_string(), key.to_string()), bytes.into());
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(BUCKET.to_string(), key.to_string()))
            .cloned()
    }

    /// Keys requested through `download`, in order (including misses)
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    /// Keys written through `upload`, in order
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<bool> {
        self.downloads.lock().unwrap().push(key.to_string());
        let bytes = self
            .objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned();
        match bytes {
            Some(bytes) => {
                std::fs::write(local_path, bytes)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn upload(&self, local_path: &Path, bucket: &str, key: &str) -> Result<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MagicBucketError::Storage("PutObject: access denied".to_string()));
        }
        let bytes = std::fs::read(local_path)?;
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), bytes);
        self.uploads.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryQueue {
    pending: Mutex<VecDeque<QueueMessage>>,
    events: Mutex<Vec<String>>,
    sent: Mutex<Vec<String>>,
    next_id: AtomicUsize,
    fail_receive: AtomicBool,
}

pub fn event_body(bucket: &str, key: &str) -> String {
    serde_json::json!({
        "eventSource": "aws:s3",
        "eventName": "ObjectCreated:Put",
        "s3": {
            "bucket": {"name": bucket},
            "object": {"key": key, "size": 42}
        }
    })
    .to_string()
}

impl MemoryQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A queue holding one S3 event message per key
    pub fn with_keys(keys: &[&str]) -> Arc<Self> {
        let queue = Self::new();
        for key in keys {
            queue.push_body(&event_body(BUCKET, key));
        }
        queue
    }

    pub fn push_body(&self, body: &str) {
        let handle = format!("m{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.pending.lock().unwrap().push_back(QueueMessage {
            receipt_handle: handle,
            body: body.to_string(),
        });
    }

    /// `receive:<handle>`, `receive:none` and `delete:<handle>` in call order
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn fail_receive(&self) {
        self.fail_receive.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn receive_one(&self) -> Result<Option<QueueMessage>> {
        if self.fail_receive.load(Ordering::SeqCst) {
            return Err(MagicBucketError::Queue("ReceiveMessage: throttled".to_string()));
        }
        // an unacknowledged message stays visible until deleted
        let message = self.pending.lock().unwrap().front().cloned();
        let event = match &message {
            Some(m) => format!("receive:{}", m.receipt_handle),
            None => "receive:none".to_string(),
        };
        self.events.lock().unwrap().push(event);
        Ok(message)
    }

    async fn delete(&self, message: &QueueMessage) -> Result<()> {
        self.pending
            .lock()
            .unwrap()
            .retain(|m| m.receipt_handle != message.receipt_handle);
        self.events
            .lock()
            .unwrap()
            .push(format!("delete:{}", message.receipt_handle));
        Ok(())
    }

    async fn send(&self, body: &str) -> Result<()> {
        self.sent.lock().unwrap().push(body.to_string());
        Ok(())
    }

    fn url(&self) -> &str {
        "memory://magic-bucket"
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Fail,
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(Level, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn of(&self, level: Level) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn info(&self, text: &str) {
        self.messages.lock().unwrap().push((Level::Info, text.to_string()));
    }

    async fn success(&self, text: &str) {
        self.messages.lock().unwrap().push((Level::Success, text.to_string()));
    }

    async fn fail(&self, text: &str) {
        self.messages.lock().unwrap().push((Level::Fail, text.to_string()));
    }
}

// ---------------------------------------------------------------------------
// External tools
// ---------------------------------------------------------------------------

pub const PDAL_INFO_STDOUT: &str = "{\"pdal_version\": \"2.6.0\", \"stats\": {}}\n";

/// Pretends to be pdal, rimtatls and ape by creating their output files
#[derive(Default)]
pub struct FakeTools {
    calls: Mutex<Vec<Vec<String>>>,
    failures: Mutex<HashMap<String, (i32, String)>>,
    filters_seen: Mutex<Vec<String>>,
    info_stdout: Mutex<Option<Vec<u8>>>,
}

impl FakeTools {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every call of `program` exit with `exit_code`, printing `output`
    pub fn fail(&self, program: &str, exit_code: i32, output: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(program.to_string(), (exit_code, output.to_string()));
    }

    /// Replace what `pdal info` prints
    pub fn set_info_stdout(&self, bytes: &[u8]) {
        *self.info_stdout.lock().unwrap() = Some(bytes.to_vec());
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Contents of `filters.json` at the time of each `--json` call
    pub fn filters_seen(&self) -> Vec<String> {
        self.filters_seen.lock().unwrap().clone()
    }

    fn touch(cwd: &Path, path: &str) -> Result<()> {
        let target: PathBuf = cwd.join(path);
        std::fs::write(target, b"processed")?;
        Ok(())
    }
}

#[async_trait]
impl CommandRunner for FakeTools {
    async fn run(&self, args: &[String], cwd: &Path) -> Result<ProcessInvocation> {
        self.calls.lock().unwrap().push(args.to_vec());
        let program = args[0].as_str();

        if let Some((exit_code, output)) = self.failures.lock().unwrap().get(program).cloned() {
            return Err(MagicBucketError::Subprocess {
                program: program.to_string(),
                exit_code,
                output,
            });
        }

        let mut invocation = ProcessInvocation {
            args: args.to_vec(),
            ..Default::default()
        };
        match (program, args.get(1).map(String::as_str)) {
            ("pdal", Some("info")) => {
                invocation.stdout = self
                    .info_stdout
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| PDAL_INFO_STDOUT.as_bytes().to_vec());
            }
            ("pdal", Some("translate")) => {
                if let Some(pos) = args.iter().position(|a| a == "-o") {
                    Self::touch(cwd, &args[pos + 1])?;
                    if args.iter().any(|a| a == "--json") {
                        let filters = std::fs::read_to_string(cwd.join("filters.json"))?;
                        self.filters_seen.lock().unwrap().push(filters);
                    }
                } else {
                    Self::touch(cwd, &args[3])?;
                }
            }
            ("rimtatls", _) => Self::touch(cwd, &args[2])?,
            ("ape", _) => Self::touch(cwd, &args[4])?,
            _ => {}
        }
        Ok(invocation)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        for (name, content) in files {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }
    buf
}

pub fn gz_bytes(content: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap()
}

pub struct Harness {
    pub queue: Arc<MemoryQueue>,
    pub store: Arc<MemoryStore>,
    pub tools: Arc<FakeTools>,
    pub notifier: Arc<RecordingNotifier>,
    pub root: tempfile::TempDir,
}

impl Harness {
    pub fn new(queue: Arc<MemoryQueue>) -> Self {
        Self {
            queue,
            store: MemoryStore::new(),
            tools: FakeTools::new(),
            notifier: RecordingNotifier::new(),
            root: tempfile::tempdir().unwrap(),
        }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.path().join("work")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.path().join("cache")
    }

    pub fn config(&self) -> WorkerConfig {
        WorkerConfig::builder()
            .work_dir(self.work_dir())
            .cache_dir(self.cache_dir())
            .build()
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.queue.clone(),
            self.store.clone(),
            self.tools.clone(),
            self.notifier.clone(),
            TaskRegistry::default(),
            self.config(),
        )
    }

    pub fn single_object_dispatcher(&self) -> Dispatcher {
        Dispatcher::without_queue(
            self.store.clone(),
            self.tools.clone(),
            self.notifier.clone(),
            TaskRegistry::default(),
            self.config(),
        )
    }
}
