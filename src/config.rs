use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EduBattleConfig {
    pub database: Option<String>,
    pub feed_url: Option<String>,
    pub mirror_dir: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Settings after applying CLI overrides and defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: PathBuf,
    pub feed_url: String,
    pub mirror_dir: PathBuf,
    pub timeout: Duration,
}

impl EduBattleConfig {
    /// A config file populated with the defaults, for `config init`
    pub fn with_defaults(base: &Path) -> Self {
        Self {
            database: Some(default_database_path_in(base).display().to_string()),
            feed_url: Some(DEFAULT_FEED_URL.to_string()),
            mirror_dir: Some(default_mirror_dir_in(base).display().to_string()),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Resolve final settings; `database` and `feed_url` override the file
    pub fn resolve(&self, base: &Path, database: Option<PathBuf>, feed_url: Option<String>) -> Settings {
        Settings {
            database: database
                .or_else(|| self.database.as_ref().map(PathBuf::from))
                .unwrap_or_else(|| default_database_path_in(base)),
            feed_url: feed_url
                .or_else(|| self.feed_url.clone())
                .unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            mirror_dir: self
                .mirror_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| default_mirror_dir_in(base)),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("edubattle.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".edubattle").join("edubattle.db")
}

pub fn default_mirror_dir_in(base: &Path) -> PathBuf {
    base.join(".edubattle").join("mirror")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<EduBattleConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: EduBattleConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &EduBattleConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
