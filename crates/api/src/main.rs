use anyhow::Context;

use minibill_api::{AppConfig, Mode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    minibill_observability::init(config.log_format());

    tracing::info!(
        mode = ?config.mode,
        bind_addr = %config.bind_addr,
        token_ttl_secs = config.token_ttl.num_seconds(),
        default_dateline_days = config.billing.default_dateline_days,
        admin_seeding = config.admin_password.is_some(),
        "configuration loaded"
    );
    if config.ephemeral_secret {
        tracing::warn!("JWT_SECRET not set; using a random secret, tokens will not survive a restart");
    }
    if config.mode == Mode::Development {
        tracing::warn!("development mode: requests without credentials run as the bootstrap superuser");
    }

    let app = minibill_api::build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
