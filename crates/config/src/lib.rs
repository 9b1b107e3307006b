//! Layered configuration for backcheck.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults,
//! 2. a configuration file (TOML, YAML or JSON, chosen by extension),
//! 3. `BACKCHECK_*` environment variables, with `__` separating nested keys
//!    (`BACKCHECK_POOL__CAPACITY=32`).
//!
//! ```toml
//! log = "backcheck=debug,info"
//!
//! [pool]
//! capacity = 100
//!
//! [hashing]
//! max_attempts = 5
//! buffer_size = 65536
//!
//! [cache]
//! backend = "sqlite"
//! path = "/var/cache/backcheck"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use backcheck_asyncutils::{DEFAULT_CAPACITY, DEFAULT_MAX_ATTEMPTS};
use backcheck_storage::DEFAULT_BUFFER_SIZE;
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "BACKCHECK_";
const CONFIG_FILE: &str = "config.toml";
const FALLBACK_CACHE_DIR: &str = ".cache";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default `tracing` filter directive, used when `BACKCHECK_LOG` is unset.
    pub log: String,
    pub pool: PoolConfig,
    pub hashing: HashingConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of digests computed at once.
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    pub max_attempts: u32,
    pub buffer_size: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// One JSON file per artifact under `cache.path`.
    #[default]
    Directory,
    /// A single SQLite database under `cache.path`.
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log: "info".to_string(),
            pool: PoolConfig::default(),
            hashing: HashingConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}
impl Default for PoolConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_CAPACITY }
    }
}
impl Default for HashingConfig {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, buffer_size: DEFAULT_BUFFER_SIZE }
    }
}
impl Default for CacheConfig {
    fn default() -> Self {
        let path = project_dirs()
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIR));
        Self { backend: CacheBackend::default(), path }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "backcheck")
}

impl Config {
    /// `config.toml` in the platform configuration directory, if the
    /// platform has one.
    pub fn default_file() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load configuration from every source.
    ///
    /// An explicit `file` must exist. Without one, the default file is used
    /// if present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_file().filter(|path| path.is_file()),
        };
        tracing::debug!(file = ?file, "Loading configuration");
        Self::from_figment(Self::figment(file.as_deref()))
    }

    /// The provider stack behind [`load`](Self::load), without any file
    /// existence checks.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = match path.extension().and_then(|extension| extension.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        // BACKCHECK_LOG is an EnvFilter directive read by the binary itself.
        figment.merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["log"]))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Extract)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.pool.capacity == 0 {
            exn::bail!(ErrorKind::Invalid("pool.capacity"));
        }
        if self.hashing.max_attempts == 0 {
            exn::bail!(ErrorKind::Invalid("hashing.max_attempts"));
        }
        if self.hashing.buffer_size == 0 {
            exn::bail!(ErrorKind::Invalid("hashing.buffer_size"));
        }
        Ok(())
    }
}
