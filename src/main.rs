//! Magic Bucket CLI
//!
//! Runs the worker that drains the magic-bucket queue, processes a single
//! object by hand, or fans an S3 event out onto the queue.

use anyhow::Result;
use clap::{Parser, Subcommand};
use magic_bucket::clients::{load_aws_config, MessageQueue, S3Store, SlackNotifier, SqsQueue};
use magic_bucket::tasks::SystemCommandRunner;
use magic_bucket::trigger::{fan_out, S3Event};
use magic_bucket::{Dispatcher, ItemOutcome, ObjectRef, Settings, TaskRegistry, WorkerConfig};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "magic-bucket")]
#[command(about = "Run point-cloud processing tools on files dropped into an S3 bucket")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every message on the queue, then exit
    Worker {
        /// Scratch directory, recreated for every object
        #[arg(long, default_value = "work")]
        work_dir: PathBuf,

        /// Directory for files kept between objects
        #[arg(long, default_value = "cache")]
        cache_dir: PathBuf,
    },

    /// Process a single object without going through the queue
    Run {
        /// Object to process, as s3://bucket/key
        uri: String,

        /// Scratch directory
        #[arg(long, default_value = "work")]
        work_dir: PathBuf,

        /// Directory for files kept between objects
        #[arg(long, default_value = "cache")]
        cache_dir: PathBuf,
    },

    /// Send the records of an S3 event notification to the queue
    Enqueue {
        /// Event JSON file (stdin when omitted)
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load .env file if present
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    let aws = load_aws_config(&settings.region).await;

    match cli.command {
        Commands::Worker {
            work_dir,
            cache_dir,
        } => {
            let config = WorkerConfig::builder()
                .work_dir(work_dir)
                .cache_dir(cache_dir)
                .build();
            let queue = SqsQueue::from_config(&aws, settings.require_queue_url()?);
            let dispatcher = Dispatcher::new(
                Arc::new(queue),
                Arc::new(S3Store::from_config(&aws)),
                Arc::new(SystemCommandRunner),
                Arc::new(slack_notifier(&settings)?),
                TaskRegistry::default(),
                config,
            );
            let summary = dispatcher.run().await?;
            info!("Processed {} objects", summary.total());
        }

        Commands::Run {
            uri,
            work_dir,
            cache_dir,
        } => {
            let object = ObjectRef::from_uri(&uri)?;
            let config = WorkerConfig::builder()
                .work_dir(work_dir)
                .cache_dir(cache_dir)
                .build();
            let dispatcher = Dispatcher::without_queue(
                Arc::new(S3Store::from_config(&aws)),
                Arc::new(SystemCommandRunner),
                Arc::new(slack_notifier(&settings)?),
                TaskRegistry::default(),
                config,
            );
            match dispatcher.run_one(&object).await? {
                ItemOutcome::Completed { task, result } => {
                    println!("{} completed, uploaded to {}", task, result);
                }
                ItemOutcome::UnknownTask { task_name } => {
                    anyhow::bail!("Unknown task: {}", task_name);
                }
                ItemOutcome::Failed { task, error } => {
                    anyhow::bail!("{} failed: {}", task, error);
                }
            }
        }

        Commands::Enqueue { event } => {
            let text = match event {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text)?;
                    text
                }
            };
            let event = S3Event::from_json(&text)?;
            let queue = SqsQueue::from_config(&aws, settings.require_queue_url()?);
            let sent = fan_out(&queue, &event).await?;
            println!("Sent {} of {} records to {}", sent, event.records.len(), queue.url());
        }
    }

    Ok(())
}

fn slack_notifier(settings: &Settings) -> magic_bucket::Result<SlackNotifier> {
    Ok(SlackNotifier::with_channel(
        settings.require_slack_token()?,
        &settings.slack_channel,
        &settings.slack_username,
    ))
}
