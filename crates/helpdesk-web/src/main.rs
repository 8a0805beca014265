//! JSON HTTP interface for the helpdesk.
//!
//! Resolves the caller from session headers, runs the core operation and
//! maps its outcome to an HTTP status.

mod config;
mod error;
mod routes;
mod state;

use std::collections::HashMap;
use std::sync::Arc;

use helpdesk::{Helpdesk, Settings};
use helpdesk_db::Database;
use ticket_mailer::{LogMailer, Mailer, SmtpConfig, SmtpMailer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting helpdesk web server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Pick a mail transport
    let mailer: Arc<dyn Mailer> = if SmtpConfig::is_configured() {
        Arc::new(SmtpMailer::new(SmtpConfig::from_env()?)?)
    } else {
        warn!("MAIL_SMTP_HOST not set, notifications will only be logged");
        Arc::new(LogMailer::new())
    };
    info!(mailer = mailer.name(), "Mail transport ready");

    let settings = Arc::new(Settings::new(db.clone()).with_ttl(config.settings_ttl));
    let helpdesk = Helpdesk::with_settings(db, settings, mailer);
    if config.seed_settings {
        helpdesk.settings().seed_defaults(&HashMap::new()).await?;
    }

    // Build application state
    let state = AppState::new(helpdesk);

    // Build router
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    info!(addr = %config.addr, "Helpdesk web server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
