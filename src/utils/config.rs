//! Layered configuration loading.
//!
//! A named configuration is resolved in three layers, later ones winning:
//! the type's `Default`, then `<config_dir>/<name>.json`, then environment
//! variables named `<PREFIX>_<NAME>_<FIELD>`. Environment values are parsed
//! as JSON first and taken as plain strings when that fails, so
//! `HDKEYS_SETTINGS_ADDRESS_COUNT=5` yields a number and
//! `HDKEYS_SETTINGS_NETWORK=testnet` yields a string.

use crate::{HdError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "HDKEYS";

/// Loads and stores JSON configuration files in one directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
    environment_prefix: String,
}

impl ConfigManager {
    pub fn new(config_dir: impl Into<PathBuf>, environment_prefix: &str) -> Self {
        Self {
            config_dir: config_dir.into(),
            environment_prefix: environment_prefix.to_string(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn config_path(&self, config_name: &str) -> PathBuf {
        self.config_dir.join(format!("{}.json", config_name))
    }

    /// Resolve `config_name` from defaults, file and environment.
    pub fn load_config<T>(&self, config_name: &str) -> Result<T>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        let mut config_value = serde_json::to_value(T::default())?;

        let config_file_path = self.config_path(config_name);
        if config_file_path.exists() {
            let file_config = load_from_file(&config_file_path)?;
            merge_config_values(&mut config_value, file_config);
            log::debug!("Configuration '{}' read from {:?}", config_name, config_file_path);
        }

        let env_config = self.load_from_environment(config_name);
        merge_config_values(&mut config_value, env_config);

        serde_json::from_value(config_value).map_err(|e| {
            HdError::InvalidInput(format!("invalid configuration '{}': {}", config_name, e))
        })
    }

    /// Save configuration to file
    pub fn save_config<T>(&self, config_name: &str, config: &T) -> Result<()>
    where
        T: Serialize,
    {
        fs::create_dir_all(&self.config_dir)?;

        let config_file_path = self.config_path(config_name);
        let config_json = serde_json::to_string_pretty(config)?;
        fs::write(&config_file_path, config_json)?;

        log::info!("Configuration '{}' saved to {:?}", config_name, config_file_path);
        Ok(())
    }

    pub fn config_exists(&self, config_name: &str) -> bool {
        self.config_path(config_name).exists()
    }

    /// Removes the file for `config_name`; missing files are not an error.
    pub fn delete_config(&self, config_name: &str) -> Result<()> {
        let config_file_path = self.config_path(config_name);

        if config_file_path.exists() {
            fs::remove_file(&config_file_path)?;
            log::info!("Configuration '{}' deleted", config_name);
        }

        Ok(())
    }

    /// Names of all `*.json` files in the directory, sorted.
    pub fn list_configs(&self) -> Result<Vec<String>> {
        if !self.config_dir.exists() {
            return Ok(Vec::new());
        }

        let mut configs = Vec::new();
        for entry in fs::read_dir(&self.config_dir)? {
            let path = entry?.path();

            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(file_stem) = path.file_stem().and_then(|s| s.to_str()) {
                    configs.push(file_stem.to_string());
                }
            }
        }

        configs.sort();
        Ok(configs)
    }

    fn load_from_environment(&self, config_name: &str) -> serde_json::Value {
        let prefix = format!(
            "{}_{}_",
            self.environment_prefix.to_uppercase(),
            config_name.to_uppercase()
        );

        let env_config: serde_json::Map<_, _> = env::vars()
            .filter_map(|(key, value)| {
                let field = key.strip_prefix(&prefix)?.to_lowercase();
                if field.is_empty() {
                    return None;
                }
                let parsed_value =
                    serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
                Some((field, parsed_value))
            })
            .collect();

        serde_json::Value::Object(env_config)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new(".", DEFAULT_ENV_PREFIX)
    }
}

fn load_from_file(file_path: &Path) -> Result<serde_json::Value> {
    let content = fs::read_to_string(file_path)?;
    serde_json::from_str(&content).map_err(|e| {
        HdError::InvalidInput(format!("failed to parse config file {:?}: {}", file_path, e))
    })
}

/// Top-level keys of `overlay` replace those in `base`.
fn merge_config_values(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(overlay_map)) => {
            base_map.extend(overlay_map);
        }
        (base, overlay) => *base = overlay,
    }
}
