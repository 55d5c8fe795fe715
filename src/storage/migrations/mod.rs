//! Schema migrations for the SQLite store.
//!
//! Migration files live next to this module:
//! - `migration_NN_up.sql` brings the schema from version `NN-1` to `NN`
//! - `migration_NN_down.sql` brings the schema from version `NN` back to `NN-1`

use crate::Result;
use anyhow::{bail, Context};
use sqlx::{Executor, SqlitePool};
use tracing::debug;

struct Migration {
    /// The version this migration brings the schema to when going up.
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up_sql: include_str!("migration_01_up.sql"),
    down_sql: include_str!("migration_01_down.sql"),
}];

/// Moves the schema from `from` to `to`, running up or down migrations one version at a time.
/// Every required migration is checked to exist before any of them runs.
pub(super) async fn run(pool: &SqlitePool, from: i32, to: i32) -> Result<()> {
    if from == to {
        debug!("Schema already at version {to}");
        return Ok(());
    }
    check_available(from, to)?;

    if from < to {
        for version in (from + 1)..=to {
            debug!("Running migration {version:02} (up)");
            apply(pool, find(version)?.up_sql, version).await?;
        }
    } else {
        for version in ((to + 1)..=from).rev() {
            debug!("Running migration {version:02} (down)");
            apply(pool, find(version)?.down_sql, version - 1).await?;
        }
    }

    debug!("Schema now at version {to}");
    Ok(())
}

fn find(version: i32) -> Result<&'static Migration> {
    MIGRATIONS
        .iter()
        .find(|m| m.version == version)
        .with_context(|| format!("Migration {version} not found"))
}

/// Runs `sql` and records `new_version`, in one transaction.
async fn apply(pool: &SqlitePool, sql: &str, new_version: i32) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin migration transaction")?;

    (&mut *tx)
        .execute(sql)
        .await
        .context("Failed to execute migration SQL")?;

    sqlx::query("UPDATE schema_version SET version = ?")
        .bind(new_version)
        .execute(&mut *tx)
        .await
        .context("Failed to update schema_version")?;

    tx.commit()
        .await
        .context("Failed to commit migration transaction")
}

fn check_available(from: i32, to: i32) -> Result<()> {
    let (start, end) = if from < to { (from + 1, to) } else { (to + 1, from) };
    for version in start..=end {
        if !MIGRATIONS.iter().any(|m| m.version == version) {
            bail!("Migration {version} is missing but required to migrate from {from} to {to}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn version_zero_db() -> (TempDir, SqlitePool) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sqlite");
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .unwrap()
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .unwrap();
        (dir, pool)
    }

    async fn version(pool: &SqlitePool) -> i32 {
        let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await
            .unwrap();
        row.0
    }

    async fn kv_exists(pool: &SqlitePool) -> bool {
        let row: (i32,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='kv'")
                .fetch_one(pool)
                .await
                .unwrap();
        row.0 > 0
    }

    #[tokio::test]
    async fn test_up_then_down() {
        let (_dir, pool) = version_zero_db().await;

        run(&pool, 0, 1).await.unwrap();
        assert_eq!(version(&pool).await, 1);
        assert!(kv_exists(&pool).await);

        run(&pool, 1, 0).await.unwrap();
        assert_eq!(version(&pool).await, 0);
        assert!(!kv_exists(&pool).await);
    }

    #[tokio::test]
    async fn test_same_version_is_noop() {
        let (_dir, pool) = version_zero_db().await;
        run(&pool, 0, 1).await.unwrap();
        run(&pool, 1, 1).await.unwrap();
        assert_eq!(version(&pool).await, 1);
    }

    #[test]
    fn test_check_available() {
        assert!(check_available(0, 1).is_ok());
        assert!(check_available(1, 0).is_ok());
        assert!(check_available(0, 2).is_err());
        assert!(check_available(1, 3).is_err());
    }
}
