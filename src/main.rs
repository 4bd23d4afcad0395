//! djinn - a small IRC channel bot.
//!
//! Connects to the configured server, joins its home channel, and answers
//! greetings, `.tell` relays, and keepalive pings until the admin sends the
//! shutdown phrase.

mod config;
mod dispatch;
mod session;

use crate::config::Config;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "djinn.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        server = %config.server.addr(),
        nick = %config.bot.nick,
        channel = %config.bot.channel,
        "Starting djinn"
    );

    session::run(config).await
}
