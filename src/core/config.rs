//! Riposte rule configuration
//!
//! Names are matched against alias lists rather than single fixed strings so
//! that translated or renamed presentations of the same rule still qualify.

use crate::core::error::{Result, RiposteError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for the retaliation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiposteConfig {
    /// Talent names that grant retaliation (e.g. "Riposte")
    ///
    /// A defender holding several of these uses the highest rank among them.
    pub talent_aliases: Vec<String>,

    /// Weapon quality names that gate retaliation (e.g. "Fast")
    pub quality_aliases: Vec<String>,

    /// Label attached to a granted retaliation when reported back to the host
    pub effect_name: String,

    /// Scope and key under which the host may persist per-actor usage
    pub flag_scope: String,
    pub flag_key: String,
}

impl Default for RiposteConfig {
    fn default() -> Self {
        Self {
            talent_aliases: vec!["Riposte".to_string()],
            quality_aliases: vec!["Fast".to_string()],
            effect_name: "Riposte".to_string(),
            flag_scope: "wfrp4e-riposte".to_string(),
            flag_key: "uses".to_string(),
        }
    }
}

impl RiposteConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text; missing fields fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config from a TOML file
    ///
    /// A config that parses but fails validation is still returned: the
    /// mismatch is logged and evaluation proceeds with the aliases that remain.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        if let Err(e) = config.validate() {
            tracing::warn!("{} ({})", e, path.display());
        }
        Ok(config)
    }

    /// Validate the alias lists
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if !has_usable_alias(&self.talent_aliases) {
            problems.push("talent_aliases has no usable entries");
        }
        if !has_usable_alias(&self.quality_aliases) {
            problems.push("quality_aliases has no usable entries");
        }
        if self
            .talent_aliases
            .iter()
            .chain(&self.quality_aliases)
            .any(|a| a.trim().is_empty())
        {
            problems.push("blank alias entries are ignored");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(RiposteError::ConfigurationMismatch(problems.join("; ")))
        }
    }
}

fn has_usable_alias(aliases: &[String]) -> bool {
    aliases.iter().any(|a| !a.trim().is_empty())
}
