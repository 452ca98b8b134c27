use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Open the process-wide connection pool
pub async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Internal("DATABASE_URL must be set".to_string()))?;

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout())
        .connect_timeout(config.db_acquire_timeout());

    Database::connect(options)
        .await
        .map_err(|e| AppError::Unavailable(format!("Failed to connect to database: {}", e)))
}

/// Bring the schema up to date. Safe to run on every startup.
pub async fn migrate(db: &DatabaseConnection) -> AppResult<()> {
    migration::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to run migrations: {}", e)))
}
