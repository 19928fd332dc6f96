use crate::assets::MigrationAssets;
use crate::config::{defaults::DEFAULT_MAX_CONNECTIONS, DatabaseConfig};
use crate::models::TableCounts;
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::{debug, info};

pub mod revenue;
pub mod sales;

/// Shared handle to the sales store.
///
/// Cloning is cheap; every clone uses the same connection pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub fn pool(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }

    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout()?);

        // An in-memory database lives only as long as its connection, so pin
        // it to one connection that is never recycled.
        let pool_options = if config.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS))
        };

        let pool = pool_options.connect_with(options).await?;
        debug!("Connected to {}", config.url);

        Ok(Self { pool })
    }

    /// Apply every embedded migration not yet recorded in
    /// `schema_migrations`, each in its own transaction.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;

        let applied: HashSet<i64> = sqlx::query_scalar("SELECT version FROM schema_migrations")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .collect();

        for (name, sql) in MigrationAssets::get_migrations() {
            let version = migration_version(&name)?;
            if applied.contains(&version) {
                debug!("Migration {} already applied", name);
                continue;
            }

            // Dropping the transaction on error rolls the schema change back.
            let mut tx = self.pool.begin().await?;
            sqlx::query(&sql)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Migration {} failed", name))?;
            sqlx::query("INSERT INTO schema_migrations (version, name) VALUES (?, ?)")
                .bind(version)
                .bind(&name)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            info!("Applied migration {}", name);
        }

        Ok(())
    }

    /// Connectivity check used by the health endpoint
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
    }

    pub async fn table_counts(&self) -> Result<TableCounts, sqlx::Error> {
        let (customers, products, orders, order_items) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                "SELECT
                    (SELECT COUNT(*) FROM customers),
                    (SELECT COUNT(*) FROM products),
                    (SELECT COUNT(*) FROM orders),
                    (SELECT COUNT(*) FROM order_items)",
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(TableCounts {
            customers,
            products,
            orders,
            order_items,
        })
    }
}

/// `001_initial_schema.sql` -> 1
fn migration_version(name: &str) -> Result<i64> {
    name.split('_')
        .next()
        .and_then(|prefix| prefix.parse().ok())
        .with_context(|| format!("Migration {} has no numeric version prefix", name))
}
