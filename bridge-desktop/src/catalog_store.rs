//! Catalog Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{CatalogEntry, CatalogStore},
};
use chrono::DateTime;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::PathBuf;
use tracing::debug;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS catalog_entries (
        stored_file_name TEXT PRIMARY KEY,
        original_name TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )
"#;

/// SQLite-backed catalog store
///
/// Entries are keyed by stored file name. `created_at` is kept as Unix
/// milliseconds so ordering happens in SQL.
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    /// Open (or create) the catalog database at `db_path`
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to connect to DB: {}", e)))?;

        Self::create_schema(&pool).await?;
        debug!(
            file = ?db_path.file_name().unwrap_or_default(),
            "Initialized catalog store"
        );

        Ok(Self { pool })
    }

    /// Create an in-memory catalog store (for testing)
    pub async fn in_memory() -> Result<Self> {
        // A second connection would open a different, empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to connect to DB: {}", e)))?;

        Self::create_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to create table: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn load_entries(&self) -> Result<Vec<CatalogEntry>> {
        let rows = sqlx::query(
            "SELECT stored_file_name, original_name, created_at FROM catalog_entries \
             ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BridgeError::Storage(format!("Failed to load entries: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                let stored_file_name: String = row.get(0);
                let original_name: String = row.get(1);
                let millis: i64 = row.get(2);
                let created_at = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                    BridgeError::Storage(format!(
                        "Invalid timestamp {} for {}",
                        millis, stored_file_name
                    ))
                })?;
                Ok(CatalogEntry {
                    created_at,
                    stored_file_name,
                    original_name,
                })
            })
            .collect()
    }

    async fn insert(&self, entry: &CatalogEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO catalog_entries (stored_file_name, original_name, created_at) \
             VALUES (?, ?, ?)",
        )
        .bind(&entry.stored_file_name)
        .bind(&entry.original_name)
        .bind(entry.created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::Storage(format!("Failed to insert entry: {}", e)))?;

        debug!(track_id = %entry.stored_file_name, "Stored catalog entry");
        Ok(())
    }

    async fn delete(&self, stored_file_name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM catalog_entries WHERE stored_file_name = ?")
            .bind(stored_file_name)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to delete entry: {}", e)))?;

        debug!(
            track_id = stored_file_name,
            rows = result.rows_affected(),
            "Deleted catalog entry"
        );
        Ok(result.rows_affected() > 0)
    }
}
