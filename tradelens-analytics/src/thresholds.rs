//! Insight thresholds — tunable limits for the advisory rules, TOML-loadable.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunable limits the insight rules evaluate against.
///
/// Every field carries a serde default, so a partial TOML override keeps the
/// documented value for any key it omits. The engine receives a complete
/// value per call and never merges or persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightThresholds {
    /// Win rate (percent) at or above which the win rate is a strength.
    pub win_rate_good: f64,
    /// Win rate (percent) below which the win rate is weak.
    pub win_rate_weak: f64,
    pub profit_factor_good: f64,
    pub profit_factor_weak: f64,
    /// Trades entered on a single calendar day that flag overtrading.
    pub overtrading_trades_per_day: u32,
    /// Loser hold time is a weakness beyond winner hold time × this factor.
    pub hold_loss_factor: f64,
    pub avg_r_target: f64,
    pub avg_r_concern: f64,
    /// Drawdown as a fraction of peak equity rated High.
    pub drawdown_high_pct: f64,
    /// Drawdown as a fraction of peak equity rated Med.
    pub drawdown_med_pct: f64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            win_rate_good: 55.0,
            win_rate_weak: 45.0,
            profit_factor_good: 1.5,
            profit_factor_weak: 1.2,
            overtrading_trades_per_day: 6,
            hold_loss_factor: 1.2,
            avg_r_target: 1.0,
            avg_r_concern: 0.8,
            drawdown_high_pct: 0.5,
            drawdown_med_pct: 0.3,
        }
    }
}

/// Errors from loading a thresholds file.
#[derive(Debug, Error)]
pub enum ThresholdsError {
    #[error("read thresholds file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse thresholds TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

impl InsightThresholds {
    /// Load thresholds from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ThresholdsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse thresholds from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ThresholdsError> {
        Ok(toml::from_str(content)?)
    }
}
