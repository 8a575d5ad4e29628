//! User configuration, read from `config.toml` and overridable per field
//! through `BANGLA_GAN_*` environment variables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "banglagan";
const APPLICATION: &str = "bangla-gan";

/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "bangla_song_database.sqlite";
const LOG_FILE_NAME: &str = "bangla-gan.log";
const CONFIG_FILE_NAME: &str = "config.toml";

const ENV_DATABASE_PATH: &str = "BANGLA_GAN_DATABASE_PATH";
const ENV_LOG_PATH: &str = "BANGLA_GAN_LOG_PATH";
const ENV_SEARCH_DEBOUNCE_MS: &str = "BANGLA_GAN_SEARCH_DEBOUNCE_MS";
const ENV_SEED_ON_CREATE: &str = "BANGLA_GAN_SEED_ON_CREATE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog database file.
    pub database_path: PathBuf,

    /// Where log lines go. The terminal itself is taken by the UI.
    pub log_path: PathBuf,

    /// Quiet period after the last keystroke before a search runs.
    pub search_debounce_ms: u64,

    /// Fill a newly created catalog with the starter songs.
    pub seed_on_create: bool,

    /// Problems noticed while loading, held until logging is installed.
    #[serde(skip)]
    notices: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_data_dir(ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION))
    }
}

impl Config {
    fn with_data_dir(project_dirs: Option<ProjectDirs>) -> Self {
        let mut notices = Vec::new();
        let data_dir = match project_dirs {
            Some(project_dirs) => project_dirs.data_dir().to_path_buf(),
            None => {
                notices.push(
                    "ProjectDirs unavailable; falling back to current directory for data path"
                        .to_string(),
                );
                PathBuf::from(".")
            }
        };

        Self {
            database_path: data_dir.join(DB_FILE_NAME),
            log_path: data_dir.join(LOG_FILE_NAME),
            search_debounce_ms: 300,
            seed_on_create: true,
            notices,
        }
    }

    /// Load the config file at `config_path`, or at the default location when
    /// none is given. A missing file is created with the effective settings.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path()?,
        };

        let mut config = if config_file.exists() {
            let content = fs::read_to_string(&config_file)
                .with_context(|| format!("failed to read {}", config_file.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", config_file.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| env::var(key).ok());

        if !config_file.exists() {
            if let Some(parent) = config_file.parent() {
                fs::create_dir_all(parent).context("failed to create config directory")?;
            }
            config.save(&config_file)?;
        }

        Ok(config)
    }

    /// Apply per-field overrides looked up by environment variable name.
    /// Values that fail to parse are ignored.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            self.database_path = PathBuf::from(path);
        }

        if let Some(path) = lookup(ENV_LOG_PATH) {
            self.log_path = PathBuf::from(path);
        }

        if let Some(debounce) = lookup(ENV_SEARCH_DEBOUNCE_MS) {
            match debounce.trim().parse::<u64>() {
                Ok(value) => self.search_debounce_ms = value,
                Err(_) => self
                    .notices
                    .push(format!("Ignoring {ENV_SEARCH_DEBOUNCE_MS}={debounce:?}")),
            }
        }

        if let Some(seed) = lookup(ENV_SEED_ON_CREATE) {
            match seed.trim().parse::<bool>() {
                Ok(value) => self.seed_on_create = value,
                Err(_) => self
                    .notices
                    .push(format!("Ignoring {ENV_SEED_ON_CREATE}={seed:?}")),
            }
        }
    }

    /// Problems found while loading. Empty on a clean load.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Write the load notices to the log. Call once logging is installed,
    /// since `load` runs before there is anywhere to send them.
    pub fn log_notices(&self) {
        for notice in &self.notices {
            warn!("{notice}");
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    fn default_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .ok_or_else(|| anyhow!("Failed to determine project directories"))?;

        Ok(project_dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn writes_defaults_on_first_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let config = Config::load(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(config.search_debounce_ms, 300);
        assert!(config.seed_on_create);

        let reloaded = Config::load(Some(&path)).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "database_path = \"/tmp/gan.sqlite\"\nseed_on_create = false\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/gan.sqlite"));
        assert!(!config.seed_on_create);
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
    }

    #[test]
    fn rejects_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "search_debounce_ms = \"soon\"").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn environment_overrides_fields() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_DATABASE_PATH, "/var/lib/gan.sqlite"),
            (ENV_SEARCH_DEBOUNCE_MS, "50"),
            (ENV_SEED_ON_CREATE, "not-a-bool"),
        ]);
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(config.database_path, PathBuf::from("/var/lib/gan.sqlite"));
        assert_eq!(config.search_debounce_ms, 50);
        assert!(config.seed_on_create);
        assert_eq!(config.log_path, Config::default().log_path);
        assert_eq!(
            config.notices().last(),
            Some(&format!("Ignoring {ENV_SEED_ON_CREATE}=\"not-a-bool\""))
        );
    }

    #[test]
    fn missing_project_dirs_is_kept_for_the_log() {
        let config = Config::with_data_dir(None);
        assert_eq!(config.database_path, PathBuf::from(".").join(DB_FILE_NAME));
        assert_eq!(config.notices().len(), 1);
        assert!(config.notices()[0].contains("falling back to current directory"));

        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        config.save(&path).unwrap();
        let saved = fs::read_to_string(&path).unwrap();
        assert!(!saved.contains("notices"));
    }
}
