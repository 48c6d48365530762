use std::time::Duration;

use db_migration::Migrator;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;

pub use sea_orm::{DatabaseConnection, DbErr, SqlErr, TransactionTrait};

pub mod entities;
pub mod models;
pub mod types;

pub type DbPool = DatabaseConnection;

#[derive(Clone, Debug)]
pub struct DBService {
    pub pool: DbPool,
}

impl DBService {
    /// Connects to `database_url` and brings the schema up to date.
    pub async fn new(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_owned());
        options
            .acquire_timeout(Duration::from_secs(30))
            .sqlx_logging(false);
        // Every connection to an in-memory SQLite database is a separate database.
        if database_url.contains(":memory:") {
            options.max_connections(1).min_connections(1);
        }

        let pool = Database::connect(options).await?;
        Migrator::up(&pool, None).await?;
        tracing::debug!("Database ready");
        Ok(DBService { pool })
    }
}
