//! pytutor - a Telegram bot that teaches Python
//!
//! A conversation state machine drives the bot: lessons, quizzes, and code
//! execution, with per-user sessions persisted across restarts.

mod bot;
mod config;
mod content;
mod engine;
mod exec;
mod runtime;
mod store;
mod telegram;
mod texts;

use bot::Bot;
use config::Config;
use exec::PythonRunner;
use runtime::{FsContent, ProductionRuntime};
use store::SessionDb;
use telegram::TelegramClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pytutor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Ensure the store directory exists
    if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path, "opening session store");
    let store = SessionDb::open(&config.db_path)?;

    tracing::info!(dir = %config.content_dir, "content directory");
    let content = FsContent::new(&config.content_dir);
    let runner = PythonRunner::new(&config.python_bin, config.exec_timeout);

    let runtime = ProductionRuntime::new(store, content, runner);
    let client = TelegramClient::new(&config.token);

    if config.admin_ids.is_empty() {
        tracing::warn!("no admin ids configured; /add_user and /list_users are disabled");
    }

    let bot = Bot::new(client, runtime, config.admin_ids, config.poll_timeout_secs);
    bot.run().await?;

    Ok(())
}
