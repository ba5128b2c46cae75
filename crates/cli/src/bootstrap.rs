use std::sync::Arc;
use std::time::Duration;

use roster_agent::ollama::{ModelStatus, OllamaServer, SupervisorError, DEFAULT_PROGRAM};
use roster_agent::{AgentRuntime, Dispatcher, OllamaClient};
use roster_core::config::{AppConfig, ConfigError};
use roster_db::{connect_with_settings, migrations, DbPool, SqlUserRepository};
use thiserror::Error;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runtime: AgentRuntime,
    backend: Option<OllamaServer>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("text-generation backend failed to start: {0}")]
    Backend(#[source] SupervisorError),
    #[error("text-generation client could not be built: {0}")]
    Client(#[source] reqwest::Error),
}

impl BootstrapError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_validation",
            Self::DatabaseConnect(_) => "db_connectivity",
            Self::Migration(_) => "migration",
            Self::Backend(_) | Self::Client(_) => "backend_startup",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::DatabaseConnect(_) => 4,
            Self::Migration(_) => 5,
            Self::Backend(_) | Self::Client(_) => 3,
        }
    }
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

    let backend = if config.llm.manage_server {
        let server = OllamaServer::start(
            DEFAULT_PROGRAM,
            Duration::from_millis(config.llm.startup_grace_ms),
        )
        .await
        .map_err(BootstrapError::Backend)?;
        let model_status =
            server.ensure_model(&config.llm.model).await.map_err(BootstrapError::Backend)?;
        info!(
            event_name = "system.bootstrap.backend_ready",
            correlation_id = "bootstrap",
            model = %config.llm.model,
            pulled = model_status == ModelStatus::Pulled,
            "supervised backend ready"
        );
        Some(server)
    } else {
        info!(
            event_name = "system.bootstrap.backend_external",
            correlation_id = "bootstrap",
            base_url = %config.llm.base_url,
            "using externally managed backend"
        );
        None
    };

    let client = OllamaClient::from_config(&config.llm).map_err(BootstrapError::Client)?;
    let store = Arc::new(SqlUserRepository::new(db_pool.clone()));
    let runtime = AgentRuntime::new(Arc::new(client), Dispatcher::new(store));

    Ok(Application { config, db_pool, runtime, backend })
}

impl Application {
    /// Stop the supervised backend, if any, and close the pool.
    pub async fn shutdown(self) {
        if let Some(backend) = self.backend {
            if let Err(error) = backend.shutdown().await {
                warn!(
                    event_name = "system.shutdown.backend_failed",
                    correlation_id = "shutdown",
                    error = %error,
                    "failed to stop backend"
                );
            }
        }
        self.db_pool.close().await;
        info!(event_name = "system.shutdown.complete", correlation_id = "shutdown", "shut down");
    }
}

#[cfg(test)]
mod tests {
    use roster_core::config::AppConfig;

    use super::{bootstrap_with_config, BootstrapError};

    fn local_config(database_url: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.database.url = database_url.to_string();
        config.database.max_connections = 1;
        config.llm.manage_server = false;
        config
    }

    #[tokio::test]
    async fn bootstrap_migrates_store_without_managing_backend() {
        let app = bootstrap_with_config(local_config("sqlite::memory:")).await.expect("bootstrap");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("users table lookup");
        assert_eq!(table_count, 1);

        let listed = app.runtime.execute_response("list all users").await.expect("list");
        assert_eq!(listed, "No users found in the database.");

        app.shutdown().await;
    }

    #[tokio::test]
    async fn unreachable_database_maps_to_db_connectivity() {
        let error = bootstrap_with_config(local_config(
            "sqlite:///roster-test-missing-dir/nested/roster.db",
        ))
        .await
        .err()
        .expect("connect should fail");

        assert!(matches!(error, BootstrapError::DatabaseConnect(_)));
        assert_eq!(error.error_class(), "db_connectivity");
        assert_eq!(error.exit_code(), 4);
    }
}
