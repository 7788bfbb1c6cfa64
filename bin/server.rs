// FastMoney - Web Server
// REST API over the results listing and the admin content store

use anyhow::{Context, Result};
use fastmoney::{api, init_logging, seed_defaults, Config, LogTarget, SqliteStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LogTarget::Stderr)?;

    println!("🌐 FastMoney - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::load()?;

    if config.uses_default_password() {
        warn!(
            email = %config.admin_email,
            "admin password is the built-in default; set FASTMONEY_ADMIN_PASSWORD"
        );
    }

    // Open database
    let store = SqliteStore::open(&config.database_path)?;
    seed_defaults(&store)?;
    info!(path = %config.database_path.display(), "database opened");

    let state = api::AppState::new(store, config.auth_provider()?, config.listing_engine());
    let app = api::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "server listening");
    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   API: http://{}/api/results", config.bind_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
