use std::sync::Arc;

use anyhow::Context;

use bankes_infra::{AccountRouter, Bank, EventStore, InMemoryEventStore};

use crate::config::{BankConfig, StoreKind};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub bank: Bank,
}

impl AppServices {
    pub fn new(bank: Bank) -> Self {
        Self { bank }
    }
}

/// Open the configured event store, recover the account router on top of it and return
/// the client handle. Fails if the persisted state cannot be recovered.
pub async fn start_bank(config: &BankConfig) -> anyhow::Result<Bank> {
    let store = open_store(config).await?;
    let bank = AccountRouter::start(store, config.ask_timeout)
        .await
        .context("failed to recover account router")?;
    Ok(bank)
}

async fn open_store(config: &BankConfig) -> anyhow::Result<Arc<dyn EventStore>> {
    match config.store {
        StoreKind::Memory => {
            tracing::warn!("using in-memory event store; state is lost on restart");
            Ok(Arc::new(InMemoryEventStore::new()))
        }
        StoreKind::Postgres => open_postgres(config).await,
    }
}

#[cfg(feature = "postgres")]
async fn open_postgres(config: &BankConfig) -> anyhow::Result<Arc<dyn EventStore>> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set")?;
    let store = bankes_infra::PostgresEventStore::connect(url)
        .await
        .context("failed to connect to postgres event store")?;
    tracing::info!("using postgres event store");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn open_postgres(_config: &BankConfig) -> anyhow::Result<Arc<dyn EventStore>> {
    anyhow::bail!("BANK_STORE=postgres but the binary was built without the `postgres` feature")
}
