//! Configuration file handling for finboard.
//!
//! The configuration file is stored at `$FINBOARD_HOME/config.json`. Next to it lives the
//! key-value store, `finboard.sqlite`, unless the app runs in `Mode::Memory`.

use crate::auth::AuthSession;
use crate::storage::{Keys, MemoryStorage, Mode, SharedStorage, SqliteStorage, DEFAULT_NAMESPACE};
use crate::transactions::TransactionStore;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const APP_NAME: &str = "finboard";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const FINBOARD_SQLITE: &str = "finboard.sqlite";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$FINBOARD_HOME` and from there it loads `$FINBOARD_HOME/config.json` and opens the
/// key-value store.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    sqlite_path: PathBuf,
    storage: SharedStorage,
    keys: Keys,
}

impl Config {
    /// Creates the data directory, an initial `config.json` and, in `Mode::Sqlite`, the
    /// `finboard.sqlite` store.
    ///
    /// Nothing is written when `dir` already holds a `config.json` or a store.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    /// - Returns an error if the config file or the store already exists.
    pub async fn create(dir: impl Into<PathBuf>, mode: Mode) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the finboard home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        let sqlite_path = root.join(FINBOARD_SQLITE);
        if config_path.exists() {
            bail!("A config file already exists at '{}'", config_path.display());
        }
        if mode == Mode::Sqlite && sqlite_path.exists() {
            bail!("A store already exists at '{}'", sqlite_path.display());
        }

        let storage: SharedStorage = match mode {
            Mode::Sqlite => Arc::new(
                SqliteStorage::init(&sqlite_path)
                    .await
                    .context("Unable to create the SQLite store")?,
            ),
            Mode::Memory => Arc::new(MemoryStorage::default()),
        };
        // The config file is written only once the store exists.
        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;
        let keys = config_file.keys();

        Ok(Self {
            root,
            config_path,
            config_file,
            sqlite_path,
            storage,
            keys,
        })
    }

    /// Loads `config.json` from `finboard_home` and opens the store.
    ///
    /// In `Mode::Memory` the home directory is optional: when it has no `config.json` the
    /// defaults are used and nothing is read from or written to disk.
    pub async fn load(finboard_home: impl Into<PathBuf>, mode: Mode) -> Result<Self> {
        let home = finboard_home.into();
        if mode == Mode::Memory && !home.join(CONFIG_JSON).is_file() {
            debug!("No config file in {}, running in memory", home.display());
            let config_file = ConfigFile::default();
            let keys = config_file.keys();
            return Ok(Self {
                config_path: home.join(CONFIG_JSON),
                sqlite_path: home.join(FINBOARD_SQLITE),
                root: home,
                config_file,
                storage: Arc::new(MemoryStorage::default()),
                keys,
            });
        }

        let root = utils::canonicalize(&home)
            .await
            .context("The finboard home directory is missing, run 'finboard init' first")?;
        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let sqlite_path = root.join(FINBOARD_SQLITE);
        let storage: SharedStorage = match mode {
            Mode::Sqlite => Arc::new(
                SqliteStorage::load(&sqlite_path)
                    .await
                    .context("Unable to open the SQLite store")?,
            ),
            Mode::Memory => Arc::new(MemoryStorage::default()),
        };
        let keys = config_file.keys();

        Ok(Self {
            root,
            config_path,
            config_file,
            sqlite_path,
            storage,
            keys,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn config_version(&self) -> u8 {
        self.config_file.config_version
    }

    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    pub fn storage(&self) -> SharedStorage {
        self.storage.clone()
    }

    /// A new, not yet restored, auth session over this config's store.
    pub fn session(&self) -> AuthSession {
        AuthSession::new(self.storage(), self.keys.clone())
    }

    pub fn transactions(&self) -> TransactionStore {
        TransactionStore::new(self.storage(), self.keys.clone())
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "finboard",
///   "config_version": 1,
///   "storage_namespace": "app"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "finboard"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The prefix of every storage key, `app` in `@app:user`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage_namespace: Option<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            storage_namespace: None,
        }
    }
}

impl ConfigFile {
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or is not a finboard config.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;
        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.config_version <= CONFIG_VERSION,
            "The config file version {} is newer than this program supports ({})",
            config.config_version,
            CONFIG_VERSION
        );
        if let Some(ns) = &config.storage_namespace {
            ensure!(
                !ns.is_empty() && !ns.contains(':'),
                "Invalid storage_namespace '{ns}' in config file"
            );
        }
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }

    fn keys(&self) -> Keys {
        Keys::new(
            self.storage_namespace
                .as_deref()
                .unwrap_or(DEFAULT_NAMESPACE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::get_json;
    use crate::storage::set_json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create_then_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("finboard_home");

        let created = Config::create(&home, Mode::Sqlite).await.unwrap();
        assert!(created.config_path().is_file());
        assert!(created.sqlite_path().is_file());
        set_json(created.storage().as_ref(), "@app:thing", &7u32)
            .await
            .unwrap();

        let loaded = Config::load(&home, Mode::Sqlite).await.unwrap();
        assert_eq!(loaded.root(), created.root());
        assert_eq!(loaded.keys().user(), "@app:user");
        let found: Option<u32> = get_json(loaded.storage().as_ref(), "@app:thing")
            .await
            .unwrap();
        assert_eq!(found, Some(7));
    }

    #[tokio::test]
    async fn test_config_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        Config::create(&home, Mode::Sqlite).await.unwrap();
        assert!(Config::create(&home, Mode::Sqlite).await.is_err());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("nope");
        assert!(Config::load(&home, Mode::Sqlite).await.is_err());

        let memory = Config::load(&home, Mode::Memory).await.unwrap();
        assert_eq!(memory.keys().namespace(), "app");
        assert!(!home.exists());
    }

    #[tokio::test]
    async fn test_config_namespace_and_app_name() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let config = Config::create(&home, Mode::Sqlite).await.unwrap();

        utils::write(
            config.config_path(),
            r#"{"app_name":"finboard","config_version":1,"storage_namespace":"finance"}"#,
        )
        .await
        .unwrap();
        let loaded = Config::load(&home, Mode::Sqlite).await.unwrap();
        assert_eq!(loaded.keys().user(), "@finance:user");

        utils::write(
            config.config_path(),
            r#"{"app_name":"tiller","config_version":1}"#,
        )
        .await
        .unwrap();
        assert!(Config::load(&home, Mode::Sqlite).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_re_init_keeps_config() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let config = Config::create(&home, Mode::Sqlite).await.unwrap();
        let custom = r#"{"app_name":"finboard","config_version":1,"storage_namespace":"finance"}"#;
        utils::write(config.config_path(), custom).await.unwrap();

        assert!(Config::create(&home, Mode::Sqlite).await.is_err());
        assert!(Config::create(&home, Mode::Memory).await.is_err());

        assert_eq!(utils::read(config.config_path()).await.unwrap(), custom);
        let loaded = Config::load(&home, Mode::Sqlite).await.unwrap();
        assert_eq!(loaded.keys().namespace(), "finance");
    }

    #[tokio::test]
    async fn test_create_refuses_existing_store() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        utils::make_dir(&home).await.unwrap();
        utils::write(home.join(FINBOARD_SQLITE), "").await.unwrap();

        assert!(Config::create(&home, Mode::Sqlite).await.is_err());
        assert!(!home.join(CONFIG_JSON).exists());
    }
}
