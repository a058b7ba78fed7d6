// TIPS Account Lookup - Web Server
// GET /account/:account_num backed by the TIPS XML service

use anyhow::{Context, Result};
use tips_account::server::build_router;
use tips_account::{init_tracing, AccountLookup, TipsConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = TipsConfig::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_level);

    tracing::info!(
        version = tips_account::VERSION,
        tips_url = %config.tips_url,
        timeout_secs = config.timeout.as_secs(),
        log_level = %config.log_level,
        "Configuration loaded"
    );

    let lookup = AccountLookup::new(&config).context("Failed to build HTTP client")?;
    let app = build_router(lookup);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("API: http://{}/account/<account-number>", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
