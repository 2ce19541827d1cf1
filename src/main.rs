/// Chalkline - school administration API server
///
/// Multi-tenant staff accounts with role and location scoped access control,
/// per-location custom buttons, and templated bulk email dispatch with
/// per-recipient outcome tracking.

mod account;
mod api;
mod auth;
mod authz;
mod buttons;
mod config;
mod context;
mod db;
mod error;
mod location;
mod mailer;
mod notify;
mod server;
mod session;
mod templates;

use config::ServerConfig;
use context::AppContext;
use error::ApiResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ApiResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chalkline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}
