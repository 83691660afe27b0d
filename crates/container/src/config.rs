//! Container configuration.
//!
//! Loaded from TOML or JSON (file or string) and optionally overridden by
//! `SOLO_CONTAINER_*` environment variables.

use std::{env, fs, path::Path};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "SOLO_CONTAINER_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Name used in logs and statistics
    pub name: String,
    /// Deepest resolution chain allowed before `DepthExceeded` is reported
    pub max_resolution_depth: usize,
    /// Log a warning when a factory replaces an existing one
    pub warn_on_overwrite: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_resolution_depth: 128,
            warn_on_overwrite: true,
        }
    }
}

impl ContainerConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ContainerConfig =
            toml::from_str(content).context("Failed to parse container config (TOML)")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: ContainerConfig =
            serde_json::from_str(content).context("Failed to parse container config (JSON)")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(anyhow!(
                "Unsupported configuration file format: {:?}",
                other
            )),
        }
    }

    /// Apply `SOLO_CONTAINER_*` variables from the process environment.
    pub fn apply_environment(&mut self) -> Result<()> {
        self.apply_env_vars(env::vars())
    }

    /// Apply overrides from `(key, value)` pairs; unrelated keys are ignored.
    pub fn apply_env_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(config_key) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            self.apply_env_var(config_key, value.as_ref())?;
        }
        self.validate()
    }

    fn apply_env_var(&mut self, key: &str, value: &str) -> Result<()> {
        match key.to_uppercase().as_str() {
            "NAME" => self.name = value.to_string(),
            "MAX_RESOLUTION_DEPTH" => {
                self.max_resolution_depth = value
                    .parse()
                    .with_context(|| format!("Invalid {ENV_PREFIX}{key}: {value}"))?;
            }
            "WARN_ON_OVERWRITE" => {
                self.warn_on_overwrite = value
                    .parse()
                    .with_context(|| format!("Invalid {ENV_PREFIX}{key}: {value}"))?;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_resolution_depth == 0 {
            return Err(anyhow!("max_resolution_depth must be greater than zero"));
        }
        if self.name.trim().is_empty() {
            return Err(anyhow!("container name must not be empty"));
        }
        Ok(())
    }
}
