//! Configuration Management
//!
//! Handles persistent configuration storage for armwalk.

use crate::azure::client::DEFAULT_ENDPOINT;
use crate::resource::EnumerationScope;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default subscription id
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// ARM endpoint, for sovereign clouds
    #[serde(default)]
    pub endpoint: Option<String>,
    /// How subresource enumeration is scoped
    #[serde(default)]
    pub enumeration_scope: EnumerationScope,
    /// Last listed resource group
    #[serde(default)]
    pub last_resource_group: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("armwalk").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file; missing or invalid files yield defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config file {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective subscription (config > AZURE_SUBSCRIPTION_ID > Azure CLI default)
    pub fn effective_subscription(&self) -> Option<String> {
        self.subscription_id
            .clone()
            .or_else(crate::azure::auth::get_default_subscription)
    }

    /// Get effective ARM endpoint (config > public cloud)
    pub fn effective_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Set subscription and save
    pub fn set_subscription(&mut self, subscription_id: &str) -> Result<()> {
        self.subscription_id = Some(subscription_id.to_string());
        self.save()
    }

    /// Remember the last listed resource group and save
    pub fn set_last_resource_group(&mut self, group: &str) -> Result<()> {
        self.last_resource_group = Some(group.to_string());
        self.save()
    }
}
