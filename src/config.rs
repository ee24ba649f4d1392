//! Configuration Management
//!
//! Handles persistent configuration storage for oktf: sticky defaults for
//! the org address and output format, so repeat invocations against the
//! same org don't need the full flag set.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::okta::auth::DomainFlag;
use crate::tf::OutputFormat;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Last used Okta subdomain
    #[serde(default)]
    pub subdomain: Option<String>,
    /// Last used domain flag
    #[serde(default)]
    pub domain_flag: Option<DomainFlag>,
    /// Last used output format
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("oktf").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Fold in the flags of the current run; returns true when anything
    /// changed and the file is worth rewriting
    pub fn remember(
        &mut self,
        subdomain: Option<&str>,
        domain_flag: Option<DomainFlag>,
        format: Option<OutputFormat>,
    ) -> bool {
        let mut changed = false;
        if let Some(subdomain) = subdomain {
            if self.subdomain.as_deref() != Some(subdomain) {
                self.subdomain = Some(subdomain.to_string());
                changed = true;
            }
        }
        if let Some(flag) = domain_flag {
            if self.domain_flag != Some(flag) {
                self.domain_flag = Some(flag);
                changed = true;
            }
        }
        if let Some(format) = format {
            if self.format != Some(format) {
                self.format = Some(format);
                changed = true;
            }
        }
        changed
    }
}
