//! User configuration loaded from `~/.taskdesk/config.toml`.
//!
//! ```toml
//! database = "/home/me/notes/tasks.db"
//! default_priority = "high"
//! default_sort = "due"
//! log_filter = "taskdesk=info"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::fields::{Priority, SortKey};

pub const CONFIG_FILE: &str = "config.toml";
pub const DATABASE_FILE: &str = "taskdesk.db";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Database file; relative paths resolve against the config directory.
    pub database: Option<PathBuf>,
    /// Priority for new tasks when none is given.
    pub default_priority: Priority,
    /// Sort order for `list` when none is given.
    pub default_sort: SortKey,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default file is read
    /// when present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Config::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let mut config = Self::parse(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        if let Some(db) = config.database.take() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.database = Some(if db.is_relative() { base.join(db) } else { db });
        }
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Pick the database path: explicit flag, then config, then the default
    /// data directory.
    pub fn database_path(&self, cli_db: Option<&Path>) -> Result<PathBuf> {
        if let Some(p) = cli_db {
            return Ok(p.to_path_buf());
        }
        if let Some(p) = &self.database {
            return Ok(p.clone());
        }
        data_dir()
            .map(|d| d.join(DATABASE_FILE))
            .ok_or_else(|| Error::Config("cannot determine home directory; pass --db".into()))
    }
}

/// `~/.taskdesk`, holding the config file, database and backups.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".taskdesk"))
}

pub fn default_config_path() -> Option<PathBuf> {
    data_dir().map(|d| d.join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            database = "/tmp/tasks.db"
            default_priority = "high"
            default_sort = "due"
            log_filter = "taskdesk=debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.database, Some(PathBuf::from("/tmp/tasks.db")));
        assert_eq!(config.default_priority, Priority::High);
        assert_eq!(config.default_sort, SortKey::Due);
        assert_eq!(config.log_filter.as_deref(), Some("taskdesk=debug"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.default_priority, Priority::Medium);
        assert_eq!(config.default_sort, SortKey::Created);
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_values() {
        assert!(Config::parse("colour = true").is_err());
        assert!(Config::parse("default_priority = \"urgent\"").is_err());
    }

    #[test]
    fn test_relative_database_resolves_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "database = \"data/tasks.db\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.database, Some(dir.path().join("data/tasks.db")));
        assert_eq!(config.database_path(None).unwrap(), dir.path().join("data/tasks.db"));

        let flag = PathBuf::from("/elsewhere.db");
        assert_eq!(config.database_path(Some(&flag)).unwrap(), flag);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
