use anyhow::Context;

use bankes_api::config::BankConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BankConfig::from_env().context("invalid configuration")?;
    bankes_observability::init(config.log_format);

    let bank = bankes_api::app::services::start_bank(&config).await?;
    let app = bankes_api::app::build_app(bank);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
