//! Engine configuration
//!
//! Loaded once at startup. Every field has a default, so a config file only
//! needs the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::collision::grid::PoolLimits;
use crate::collision::rules::CollisionRules;
use crate::collision::scheduler::CellSizing;
use crate::error::ConfigError;

/// Collision engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Adaptive cell size tiers and resample cadence
    pub sizing: CellSizing,
    /// Spare cell-list pool bounds
    pub pool: PoolLimits,
    /// Which entity types may collide
    pub rules: CollisionRules,
}

impl EngineConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded engine config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Engine config saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizing = &self.sizing;
        let positive = |size: f32| size.is_finite() && size > 0.0;

        if !positive(sizing.dense_cell_size) {
            return Err(ConfigError::Invalid(format!(
                "dense cell size must be positive, got {}",
                sizing.dense_cell_size
            )));
        }
        if let Some(tier) = sizing.tiers.iter().find(|t| !positive(t.cell_size)) {
            return Err(ConfigError::Invalid(format!(
                "tier below {} has non-positive cell size {}",
                tier.below, tier.cell_size
            )));
        }
        if sizing.tiers.windows(2).any(|w| w[0].below >= w[1].below) {
            return Err(ConfigError::Invalid(
                "cell size tiers must be strictly ascending".to_string(),
            ));
        }
        if sizing.resample_interval_ms.is_nan() || sizing.resample_interval_ms < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "resample interval must be non-negative, got {}",
                sizing.resample_interval_ms
            )));
        }
        if self.pool.min > self.pool.max {
            return Err(ConfigError::Invalid(format!(
                "pool min {} exceeds max {}",
                self.pool.min, self.pool.max
            )));
        }
        if self.pool.factor.is_nan() || self.pool.factor < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "pool factor must be non-negative, got {}",
                self.pool.factor
            )));
        }
        Ok(())
    }
}
