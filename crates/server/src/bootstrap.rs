use std::sync::Arc;

use shoply_core::config::{AppConfig, ConfigError, LoadOptions};
use shoply_db::repositories::{
    SqlCartRepository, SqlGoodRepository, SqlOrderRepository, SqlPromotionRepository,
    SqlUserRepository,
};
use shoply_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::dispatcher::Dispatcher;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub dispatcher: Arc<Dispatcher>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(SqlUserRepository::new(db_pool.clone())),
        Arc::new(SqlGoodRepository::new(db_pool.clone())),
        Arc::new(SqlCartRepository::new(db_pool.clone())),
        Arc::new(SqlOrderRepository::new(db_pool.clone())),
        Arc::new(SqlPromotionRepository::new(db_pool.clone())),
        config.settlement.failed_order_log.clone(),
    ));

    Ok(Application { config, db_pool, dispatcher })
}
