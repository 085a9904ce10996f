use anyhow::{Context, Result};
use log::warn;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use crate::config::EngineConfig;

/// Engine configuration backed by a JSON file.
///
/// A missing file means defaults; an unreadable or invalid one also falls
/// back to defaults so a bad edit never stops the engine from starting.
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<EngineConfig>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            match parse(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!(
                        "Ignoring config at {} ({err:#}); using defaults",
                        path.display()
                    );
                    EngineConfig::default()
                }
            }
        } else {
            EngineConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> EngineConfig {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validate, persist, then swap in `config`.
    pub fn update(&self, config: EngineConfig) -> Result<()> {
        config.validate().context("Refusing to store invalid config")?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        self.persist(&config)?;
        *guard = config;
        Ok(())
    }

    fn persist(&self, data: &EngineConfig) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))
    }

    /// Re-read the file. Unlike `new`, a bad file is an error here and the
    /// current config stays in place.
    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {}", self.path.display()))?;
        let data = parse(&contents)?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = data;
        Ok(())
    }
}

fn parse(contents: &str) -> Result<EngineConfig> {
    let config: EngineConfig = serde_json::from_str(contents).context("malformed config JSON")?;
    config.validate()?;
    Ok(config)
}
