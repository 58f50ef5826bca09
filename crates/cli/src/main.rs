//! `sotd`: one-shot helpers around the worker's collaborators.
//!
//! - `sotd saint` scrapes today's saint and prints it as JSON
//! - `sotd subscribe <file>` stores a push subscription in the worker database
//! - `sotd push` sends a notification to the stored subscription
//! - `sotd vapid-public-key` prints the key the page subscribes with

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use sotd_client::{FetchClient, FetchConfig, SaintLoader, WebPushSender, send_stored};
use sotd_core::store::{SUBSCRIPTION_KEY, save_subscription};
use sotd_core::{CacheDb, PushConfig, PushContent, SubscriptionStore, WorkerConfig};

#[derive(Parser)]
#[command(name = "sotd", version, about = "Saint of the day helpers")]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape the saint of the day and print it as JSON (default)
    Saint,
    /// Store a push subscription read from a JSON file
    Subscribe {
        file: PathBuf,
        /// Database to write to; overrides the configured db_path
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print the stored push subscription, if any
    Subscription {
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Send a push notification to the stored subscription
    Push {
        /// Defaults to the daily announcement title
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        /// Seconds to wait before sending
        #[arg(long, default_value_t = 0)]
        delay: u64,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print the VAPID public key
    VapidPublicKey,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = WorkerConfig::load()?;

    match cli.cmd.unwrap_or(Command::Saint) {
        Command::Saint => saint(&config).await,
        Command::Subscribe { file, db } => subscribe(&config, file, db).await,
        Command::Subscription { db } => subscription(&config, db).await,
        Command::Push { title, body, delay, db } => push(&config, announcement(title, body), delay, db).await,
        Command::VapidPublicKey => {
            println!("{}", PushConfig::load()?.public_key()?);
            Ok(())
        }
    }
}

async fn saint(config: &WorkerConfig) -> Result<()> {
    let network = Arc::new(FetchClient::new(FetchConfig::from(config))?);
    let loader = SaintLoader::new(network)?;

    match loader.load().await {
        Ok(saint) => {
            println!("{}", serde_json::to_string_pretty(&saint)?);
            Ok(())
        }
        Err(error) => {
            tracing::error!(%error, "failed to load saint of the day");
            let body = json!({ "title": error.title(), "message": error.message(), "status": error.status() });
            println!("{}", serde_json::to_string_pretty(&body)?);
            bail!(error)
        }
    }
}

async fn open_db(config: &WorkerConfig, db: Option<PathBuf>) -> Result<CacheDb> {
    let Some(path) = db.or_else(|| config.db_path.clone()) else {
        bail!("no database configured; pass --db or set SOTD_DB_PATH");
    };
    Ok(CacheDb::open(&path).await?)
}

async fn subscribe(config: &WorkerConfig, file: PathBuf, db: Option<PathBuf>) -> Result<()> {
    let raw = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let value: Value = serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;

    let store = open_db(config, db).await?;
    if !save_subscription(&store, &value).await? {
        bail!("{} is not a push subscription (missing endpoint)", file.display());
    }

    tracing::info!(file = %file.display(), "stored push subscription");
    Ok(())
}

async fn subscription(config: &WorkerConfig, db: Option<PathBuf>) -> Result<()> {
    let store = open_db(config, db).await?;
    store.init().await?;

    match store.get(SUBSCRIPTION_KEY).await? {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("null"),
    }
    Ok(())
}

/// The daily announcement with any overrides applied.
fn announcement(title: Option<String>, body: Option<String>) -> PushContent {
    let daily = PushContent::daily();
    PushContent::new(title.unwrap_or(daily.title), body.unwrap_or(daily.body))
}

async fn push(config: &WorkerConfig, content: PushContent, delay: u64, db: Option<PathBuf>) -> Result<()> {
    let sender = WebPushSender::new(&PushConfig::load()?)?;
    let store = open_db(config, db).await?;

    if delay > 0 {
        tracing::debug!(delay, "waiting before sending push");
        tokio::time::sleep(Duration::from_secs(delay)).await;
    }

    send_stored(&store, &sender, &content).await?;
    tracing::info!(title = %content.title, "push sent");
    Ok(())
}
