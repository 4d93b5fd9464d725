use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Built-in endpoint used until the user confirms a different one.
pub const DEFAULT_ENDPOINT: &str = "https://bango.app.n8n.cloud/webhook/chat";

/// Persisted configuration: a single endpoint URL. The value is opaque; no
/// syntax validation happens here, so a bad URL only surfaces later as a
/// connection-error message.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub endpoint_url: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// The built-in default, without touching persisted state. Persistence
    /// only ever happens through `save`.
    pub fn reset() -> String {
        DEFAULT_ENDPOINT.to_string()
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("taclink").join("config.json"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
