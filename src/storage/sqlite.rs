//! This module is responsible for reading, writing and managing the SQLite key-value store.

use crate::storage::{migrations, Storage};
use crate::Result;
use anyhow::{bail, Context};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, trace};

/// The schema version this build of the app expects.
pub(super) const CURRENT_VERSION: i32 = 1;

/// A `Storage` backed by a single `kv` table in an SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the schema
    pub async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display());
        }
        let pool = connect(path, true).await?;

        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Failed to create schema_version table")?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .context("Failed to insert initial schema version")?;

        migrations::run(&pool, 0, CURRENT_VERSION).await?;
        debug!("Created SQLite store at {}", path.display());
        Ok(Self { pool })
    }

    /// - Validates that there is an SQLite file at `path`
    /// - Updates the schema with migrations if it is out-of-date
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let pool = connect(path, false).await?;
        let version = schema_version(&pool).await?;
        if version > CURRENT_VERSION {
            bail!(
                "The database schema version {version} is newer than this program supports \
                ({CURRENT_VERSION}). Is a newer version of finboard available?"
            );
        }
        migrations::run(&pool, version, CURRENT_VERSION).await?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl Storage for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        trace!("get {key}");
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read '{key}'"))?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        trace!("set {key}");
        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write '{key}'"))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        trace!("remove {key}");
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to remove '{key}'"))?;
        Ok(())
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .context("Failed to parse SQLite connection string")?
        .create_if_missing(create);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open SQLite database at {}", path.display()))
}

async fn schema_version(pool: &SqlitePool) -> Result<i32> {
    let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .context("Failed to query schema version")?;
    Ok(row.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("finboard.sqlite");

        let storage = SqliteStorage::init(&path).await.unwrap();
        storage
            .set("@app:user", r#"{"id":"1"}"#.to_string())
            .await
            .unwrap();
        drop(storage);

        let storage = SqliteStorage::load(&path).await.unwrap();
        assert_eq!(
            storage.get("@app:user").await.unwrap().as_deref(),
            Some(r#"{"id":"1"}"#)
        );
        assert_eq!(schema_version(&storage.pool).await.unwrap(), CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_init_fails_when_file_exists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("finboard.sqlite");
        let _storage = SqliteStorage::init(&path).await.unwrap();
        assert!(SqliteStorage::init(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_load_fails_when_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.sqlite");
        assert!(SqliteStorage::load(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_set_overwrites_and_remove() {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::init(dir.path().join("s.sqlite"))
            .await
            .unwrap();

        storage.set("k", "one".to_string()).await.unwrap();
        storage.set("k", "two".to_string()).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("two"));

        storage.remove("k").await.unwrap();
        assert!(storage.get("k").await.unwrap().is_none());
        storage.remove("k").await.unwrap();
    }
}
