use crate::cache::sqlite::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Where `init` loads customers from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerSource {
    #[default]
    Snapshot,
    Sqlite,
}

impl CustomerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerSource::Snapshot => "snapshot",
            CustomerSource::Sqlite => "sqlite",
        }
    }
}

impl FromStr for CustomerSource {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "snapshot" | "json" => Ok(CustomerSource::Snapshot),
            "sqlite" | "sql" => Ok(CustomerSource::Sqlite),
            _ => Err(crate::Error::Parse(format!("Unknown customer source: {}", s))),
        }
    }
}

impl fmt::Display for CustomerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrdercacheConfig {
    /// Directory holding the snapshot files and the SQLite database
    pub data_dir: Option<String>,
    /// Directory with bundled default caches
    pub assets_dir: Option<String>,
    /// SQLite file name, relative to `data_dir`
    pub database: Option<String>,
    pub chunk_size: Option<usize>,
    pub customer_source: Option<CustomerSource>,
}

impl OrdercacheConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(self.data_dir.as_deref().unwrap_or("data"))
    }

    pub fn assets_dir(&self) -> PathBuf {
        PathBuf::from(self.assets_dir.as_deref().unwrap_or("assets/datamodel"))
    }

    pub fn database_name(&self) -> &str {
        self.database.as_deref().unwrap_or("sqlcache.db")
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(self.database_name())
    }

    pub fn default_database_path(&self) -> PathBuf {
        self.assets_dir().join(self.database_name())
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE).max(1)
    }

    pub fn customer_source(&self) -> CustomerSource {
        self.customer_source.unwrap_or_default()
    }

    /// Config with every default spelled out, as written by `init`
    pub fn with_defaults() -> Self {
        let base = Self::default();
        Self {
            data_dir: Some(base.data_dir().display().to_string()),
            assets_dir: Some(base.assets_dir().display().to_string()),
            database: Some(base.database_name().to_string()),
            chunk_size: Some(base.chunk_size()),
            customer_source: Some(base.customer_source()),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("ordercache.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<OrdercacheConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: OrdercacheConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &OrdercacheConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_data_dir(config: &OrdercacheConfig) -> anyhow::Result<()> {
    let dir = config.data_dir();
    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}
