//! Configuration management for MIDI Commander
//!
//! Loads the YAML configuration file. The binding table it describes is
//! built once at startup and is not reloaded.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::bindings::{BindingTable, ControllerBinding};
use crate::relay::DEFAULT_QUEUE_CAPACITY;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    /// Replaces the stock binding table when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings: Option<Vec<ControllerBinding>>,
}

/// MIDI input configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Device name filters (case-insensitive substrings); empty enables all devices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<String>,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            queue_capacity: default_queue_capacity(),
            devices: Vec::new(),
        }
    }
}

fn default_client_name() -> String {
    "midi-commander".to_string()
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load the file if it exists, defaults otherwise
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if self.midi.queue_capacity == 0 {
            anyhow::bail!("midi.queue_capacity must be at least 1");
        }
        self.binding_table()?;
        Ok(())
    }

    /// Binding table described by this config
    pub fn binding_table(&self) -> Result<BindingTable> {
        match &self.bindings {
            Some(bindings) => {
                BindingTable::from_bindings(bindings).context("Invalid controller bindings")
            }
            None => Ok(BindingTable::default()),
        }
    }
}
