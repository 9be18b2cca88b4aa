//! Generate-mode configuration
//!
//! Settings for synthetic entries can come from a TOML file, from the
//! command line, or both; command-line values win.
//!
//! # Example skilltime.toml
//!
//! ```toml
//! quantity = 500
//! skill_name = "goto"
//! weights = [3.0, 1.0]
//! lower_bound = 1.0
//! upper_bound = 120.0
//! seed = 42
//!
//! [[components]]
//! mean = 20.0
//! stddev = 4.0
//!
//! [[components]]
//! mean = 60.0
//! stddev = 10.0
//!
//! [[args]]
//! name = "place"
//! values = ["M-BS-I", "C-CS1-O", "C-RS2-I"]
//! ```

use crate::arguments::ArgumentSpec;
use crate::error::{Result, SkillTimeError};
use crate::mixture::GaussianComponent;
use serde::Deserialize;
use std::fs;
use std::path::Path;

fn default_upper_bound() -> f64 {
    f64::INFINITY
}

/// Everything a generate pass needs
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    /// Number of entries to create
    pub quantity: usize,
    pub skill_name: String,
    pub args: Vec<ArgumentSpec>,
    pub components: Vec<GaussianComponent>,
    /// Relative component weights; missing ones default to 1
    pub weights: Vec<f64>,
    pub lower_bound: f64,
    #[serde(default = "default_upper_bound")]
    pub upper_bound: f64,
    /// Total-draw budget of the rejection sampler
    pub max_draws: Option<u64>,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            quantity: 0,
            skill_name: String::new(),
            args: Vec::new(),
            components: Vec::new(),
            weights: Vec::new(),
            lower_bound: 0.0,
            upper_bound: default_upper_bound(),
            max_draws: None,
            seed: None,
        }
    }
}

impl GenerateConfig {
    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SkillTimeError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SkillTimeError::Config(format!("failed to parse TOML: {}", e)))
    }

    /// Check the settings before any sampling happens
    pub fn validate(&self) -> Result<()> {
        if self.quantity == 0 {
            return Err(SkillTimeError::Config(
                "quantity must be at least 1".to_string(),
            ));
        }
        if self.skill_name.is_empty() {
            return Err(SkillTimeError::Config("skill name is required".to_string()));
        }
        if self.components.is_empty() {
            return Err(SkillTimeError::Config(
                "at least one gaussian component (mean, stddev) is required".to_string(),
            ));
        }
        if self.lower_bound.is_nan() || self.upper_bound.is_nan() {
            return Err(SkillTimeError::Config("bounds must be numbers".to_string()));
        }
        if self.lower_bound > self.upper_bound {
            return Err(SkillTimeError::InvalidBounds {
                lower: self.lower_bound,
                upper: self.upper_bound,
            });
        }
        if self.max_draws == Some(0) {
            return Err(SkillTimeError::Config(
                "max_draws must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
