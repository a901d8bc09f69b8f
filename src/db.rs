use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::migration::Migrator;

/// Create a SeaORM connection.
///
/// An in-memory SQLite database lives only as long as its connection, so the
/// pool is pinned to a single long-lived connection in that case.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    if is_in_memory(database_url) {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(60 * 60 * 24 * 365))
            .max_lifetime(Duration::from_secs(60 * 60 * 24 * 365));
    }
    options.sqlx_logging(false);

    let conn = Database::connect(options).await?;
    Ok(conn)
}

/// Apply every pending schema migration.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    Migrator::up(conn, None).await?;
    Ok(())
}

pub fn is_in_memory(database_url: &str) -> bool {
    database_url.starts_with("sqlite:") && database_url.contains(":memory:")
}

#[cfg(test)]
mod tests {
    use super::is_in_memory;

    #[test]
    fn detects_in_memory_sqlite() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(!is_in_memory("sqlite://data.db"));
        assert!(!is_in_memory("postgres://localhost/school_payments"));
    }
}
