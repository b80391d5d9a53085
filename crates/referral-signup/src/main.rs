//! Referral Signup - Entry point.

use anyhow::Context;
use referral_signup::{
    api::{create_router, AppState},
    config::Config,
    referral::{DisabledSender, NotificationDispatcher, SmsSender},
    registry::Database,
};
use slicktext_client::SlickTextClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    init_logging(&config.log.level);

    info!("Starting Referral Signup");

    let database = Database::connect(&config.database.url, config.database.max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;
    database
        .migrate()
        .await
        .context("Failed to apply database schema")?;

    let sender: Arc<dyn SmsSender> = match &config.slicktext.public_key {
        Some(key) if !key.is_empty() => {
            let client = SlickTextClient::new(
                &config.slicktext.base_url,
                key.as_str(),
                config.slicktext.list_id,
                config.slicktext.timeout,
            )
            .context("Failed to create SlickText client")?;
            info!(list_id = client.list_id(), "SlickText notifications enabled");
            Arc::new(client)
        }
        _ => {
            warn!("SLICKTEXT__PUBLIC_KEY not set, referral notifications disabled");
            Arc::new(DisabledSender)
        }
    };

    let (notifications, _dispatcher) =
        NotificationDispatcher::spawn(sender, config.slicktext.queue_capacity);

    let state = AppState::new(database, notifications, config.signup.clone());
    let app = create_router(state);

    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server is running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
