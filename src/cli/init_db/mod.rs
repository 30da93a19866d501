//! Init-db command - creates the lease store schema

use tracing::info;

use super::bootstrap;

pub async fn run() -> anyhow::Result<()> {
    let config = bootstrap()?;

    let store = crate::create_lease_store(&config).await?;
    store.ensure_schema().await?;

    info!("Database initialized");
    Ok(())
}
