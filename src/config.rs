//! Configuration for the index and the library around it.
//!
//! Every field has a default, so a partial JSON or TOML document is enough:
//!
//! ```rust
//! use mediatree::{Config, RebalancePolicy, SearchMode};
//!
//! let config = Config::from_json(r#"{
//!     "index": { "max_children": 8, "rebalance": "root_only" },
//!     "search_mode": "exact"
//! }"#).unwrap();
//!
//! assert_eq!(config.index.max_children, 8);
//! assert_eq!(config.index.rebalance, RebalancePolicy::RootOnly);
//! assert_eq!(config.search_mode, SearchMode::Exact);
//! ```
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How node overflow is handled after an insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RebalancePolicy {
    /// Only the root is checked and split. Deeper nodes may grow past the
    /// fan-out bound.
    RootOnly,
    /// Every node on the insertion path is checked, bottom-up.
    #[default]
    Cascading,
}

/// Matching rule applied to leaf records during a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Records whose box intersects the query box.
    #[default]
    Overlap,
    /// Records whose box equals the query box coordinate for coordinate.
    Exact,
}

/// Shape parameters of a single spatial index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Maximum entries a node holds before it is split
    #[serde(default = "IndexConfig::default_max_children")]
    pub max_children: usize,

    #[serde(default)]
    pub rebalance: RebalancePolicy,
}

impl IndexConfig {
    pub const DEFAULT_MAX_CHILDREN: usize = 4;

    const fn default_max_children() -> usize {
        Self::DEFAULT_MAX_CHILDREN
    }

    pub fn with_max_children(mut self, max_children: usize) -> Self {
        assert!(max_children >= 2, "max_children must be at least 2");
        self.max_children = max_children;
        self
    }

    pub fn with_rebalance(mut self, policy: RebalancePolicy) -> Self {
        self.rebalance = policy;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_children < 2 {
            return Err(format!(
                "max_children must be at least 2, got {}",
                self.max_children
            ));
        }
        Ok(())
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_children: Self::default_max_children(),
            rebalance: RebalancePolicy::default(),
        }
    }
}

/// Where records and search reports are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistenceConfig {
    #[serde(default = "PersistenceConfig::default_data_file")]
    pub data_file: PathBuf,

    /// Directory receiving `<user>_search_result.txt` reports
    #[serde(default = "PersistenceConfig::default_results_dir")]
    pub results_dir: PathBuf,
}

impl PersistenceConfig {
    fn default_data_file() -> PathBuf {
        PathBuf::from("users_content.csv")
    }

    fn default_results_dir() -> PathBuf {
        PathBuf::from(".")
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            data_file: Self::default_data_file(),
            results_dir: Self::default_results_dir(),
        }
    }
}

/// Library configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub search_mode: SearchMode,

    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    pub fn with_index(mut self, index: IndexConfig) -> Self {
        self.index = index;
        self
    }

    pub fn with_max_children(mut self, max_children: usize) -> Self {
        self.index = self.index.with_max_children(max_children);
        self
    }

    pub fn with_rebalance(mut self, policy: RebalancePolicy) -> Self {
        self.index = self.index.with_rebalance(policy);
        self
    }

    pub fn with_search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.persistence.data_file = path.into();
        self
    }

    pub fn with_results_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.persistence.results_dir = path.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.index.validate()?;

        if self.persistence.data_file.as_os_str().is_empty() {
            return Err("data_file must not be empty".to_string());
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
