//! Builder configuration

use crate::adapter::CallPolicy;
use crate::graph::ConceptType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid fixture: {0}")]
    Fixture(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Adapter calls allowed in flight at once
    pub max_concurrency: usize,
    /// Per-call deadline in milliseconds
    pub call_timeout_ms: u64,
    /// Types never pruned, in addition to the query's terminal types
    pub protected_types: Vec<ConceptType>,
    /// SQLite output; `None` uses the platform data directory
    pub sqlite_path: Option<PathBuf>,
    /// Memoize source adapter answers for the length of a run
    pub cache_responses: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            call_timeout_ms: 30_000,
            protected_types: vec![ConceptType::DiseaseName, ConceptType::DrugName],
            sqlite_path: None,
            cache_responses: true,
        }
    }
}

impl BuilderConfig {
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn call_policy(&self) -> CallPolicy {
        CallPolicy::new(self.max_concurrency, self.call_timeout())
    }

    /// Configured database path, or `<data dir>/kgbuild/kgbuild.db`.
    pub fn database_path(&self) -> PathBuf {
        self.sqlite_path.clone().unwrap_or_else(default_db_path)
    }
}

/// Default database location under the platform data directory.
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir().unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("kgbuild").join("kgbuild.db")
}
