//! Configuration loading and path resolution
//!
//! The config file location is resolved in priority order:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. Per-user default (`<config_dir>/music-indexer/config.toml`), if it exists
//!
//! A missing config file is not fatal: the indexer warns and runs on defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Application directory name used under the platform config/data dirs
const APP_DIR: &str = "music-indexer";

/// Indexer configuration (TOML)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Root directories scanned once per run, in order
    pub dirs: Vec<PathBuf>,
    /// SQLite file holding the durable work queue
    pub queue_db: PathBuf,
    /// SQLite file holding the track/file index
    pub index_db: PathBuf,
    /// Acoustic fingerprint settings
    pub fingerprint: FingerprintConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Acoustic fingerprint subprocess settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Path (or bare name looked up in PATH) of the Chromaprint `fpcalc` binary
    pub fpcalc_path: PathBuf,
    /// Arguments placed before `-json <file>` (e.g. `["-length", "60"]`)
    pub extra_args: Vec<String>,
    /// Seconds before a fingerprint attempt is abandoned
    pub timeout_secs: u64,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is not set
    pub level: String,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            dirs: Vec::new(),
            queue_db: data_dir.join("queue.db"),
            index_db: data_dir.join("index.db"),
            fingerprint: FingerprintConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            fpcalc_path: PathBuf::from("fpcalc"),
            extra_args: Vec::new(),
            timeout_secs: 120,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl IndexerConfig {
    /// Load configuration from `path`, or defaults when `path` is None or missing
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Read {} failed: {}", path.display(), e))
                })?;
                let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
                info!("Loaded configuration from {}", path.display());
                Self::from_toml_str(&content, base_dir)?
            }
            Some(path) => {
                warn!(
                    "Config file not found: {} (using defaults)",
                    path.display()
                );
                Self::default()
            }
            None => {
                warn!("No config file found (using defaults)");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content; relative paths are resolved against `base_dir`
    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self> {
        let mut config: IndexerConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

        config.queue_db = resolve_relative(&config.queue_db, base_dir);
        config.index_db = resolve_relative(&config.index_db, base_dir);
        config.dirs = config
            .dirs
            .iter()
            .map(|dir| resolve_relative(dir, base_dir))
            .collect();

        Ok(config)
    }

    /// Reject settings the indexer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.queue_db.as_os_str().is_empty() {
            return Err(Error::Config("queue_db must not be empty".to_string()));
        }
        if self.index_db.as_os_str().is_empty() {
            return Err(Error::Config("index_db must not be empty".to_string()));
        }
        if self.fingerprint.timeout_secs == 0 {
            return Err(Error::Config(
                "fingerprint.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve which config file to read
///
/// Returns None when neither an explicit path nor the per-user default exists.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config file
    default_config_file().filter(|path| path.exists())
}

/// Per-user config file location, if the platform has a config dir
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// OS-dependent default directory for the database files
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./music_indexer_data"))
}

fn resolve_relative(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_relative() && !path.as_os_str().is_empty() {
        base_dir.join(path)
    } else {
        path.to_path_buf()
    }
}
