use std::sync::Arc;

use anyhow::Context;

use warden_api::config::ApiConfig;
use warden_auth::InMemoryUserDirectory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    warden_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;

    let directory = Arc::new(InMemoryUserDirectory::new());
    for (id, role) in &config.users {
        directory.insert(id.clone(), *role);
    }
    if config.users.is_empty() {
        tracing::warn!("WARDEN_USERS not set; every token will be rejected");
    }

    let app = warden_api::app::build_app(&config, directory);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
