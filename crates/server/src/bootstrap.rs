use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use quoteflow_core::config::{AppConfig, ConfigError, LoadOptions};
use quoteflow_core::notify::{NoopNotificationTrigger, NotificationTrigger};
use quoteflow_db::repositories::SqlWorkflowRepository;
use quoteflow_db::{connect_with_settings, migrations, DbPool};

use crate::notifier::WebhookNotifier;
use crate::service::WorkflowService;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub service: WorkflowService,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("notifier client construction failed: {0}")]
    Notifier(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let trigger: Arc<dyn NotificationTrigger> =
        match WebhookNotifier::from_config(&config.notifier).map_err(BootstrapError::Notifier)? {
            Some(notifier) => {
                info!(
                    event_name = "system.bootstrap.notifier_configured",
                    correlation_id = "bootstrap",
                    "webhook notifier configured"
                );
                Arc::new(notifier)
            }
            None => Arc::new(NoopNotificationTrigger),
        };

    let service =
        WorkflowService::new(Arc::new(SqlWorkflowRepository::new(db_pool.clone())), trigger);

    Ok(Application { config, db_pool, service })
}
