use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::ConfigError;

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub table: TableStyle,
}

/// Connection settings for the hosted content store.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub project_id: Option<String>,
    pub dataset: String,
    pub api_version: String,
    pub token: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            dataset: "production".to_string(),
            api_version: "2024-01-01".to_string(),
            token: None,
        }
    }
}

/// Class attributes written into rendered table markup.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TableStyle {
    pub class: String,
    pub header_cell_class: String,
    pub body_cell_class: String,
    pub code_class: String,
    pub link_class: String,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            class: "min-w-full divide-y divide-gray-200 dark:divide-gray-700 border border-gray-300 dark:border-gray-600 my-4".to_string(),
            header_cell_class: "px-4 py-2 text-left bg-gray-100 dark:bg-gray-800 font-semibold border-b border-gray-300 dark:border-gray-600".to_string(),
            body_cell_class: "px-4 py-2 border-t border-gray-200 dark:border-gray-700".to_string(),
            code_class: "bg-gray-100 dark:bg-gray-800 px-1 py-0.5 rounded text-sm font-mono".to_string(),
            link_class: "text-blue-600 dark:text-blue-400 hover:underline".to_string(),
        }
    }
}

impl TableStyle {
    /// Markup without any class attributes.
    pub fn unstyled() -> Self {
        Self {
            class: String::new(),
            header_cell_class: String::new(),
            body_cell_class: String::new(),
            code_class: String::new(),
            link_class: String::new(),
        }
    }
}

impl Config {
    /// The defaults shipped in `default_config.toml`.
    pub fn compiled_default() -> Self {
        // build.rs checks the syntax; the tests check the schema
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Load config from a TOML file, or return defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                return Ok(Self::compiled_default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `SANITY_*` environment variables over the loaded values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(project_id) = get("SANITY_PROJECT_ID") {
            self.store.project_id = Some(project_id);
        }
        if let Some(dataset) = get("SANITY_DATASET") {
            self.store.dataset = dataset;
        }
        if let Some(api_version) = get("SANITY_API_VERSION") {
            self.store.api_version = api_version;
        }
        if let Some(token) = get("SANITY_API_TOKEN") {
            self.store.token = Some(token);
        }
        self
    }
}
