//! Well-clear thresholds and alerting rules.

use serde::{Deserialize, Serialize};

use crate::bands::Region;
use crate::error::ConfigError;

/// Threshold table for the well-clear volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WcvTable {
    /// Horizontal distance threshold (meters)
    pub dthr: f64,
    /// Vertical distance threshold (meters)
    pub zthr: f64,
    /// Horizontal time threshold (seconds)
    pub tthr: f64,
    /// Time to co-altitude threshold (seconds)
    pub tcoa: f64,
}

impl Default for WcvTable {
    fn default() -> Self {
        Self {
            dthr: 50.0,
            zthr: 30.0,
            tthr: 20.0,
            tcoa: 0.0,
        }
    }
}

impl WcvTable {
    pub fn new(dthr: f64, zthr: f64, tthr: f64, tcoa: f64) -> Self {
        Self {
            dthr,
            zthr,
            tthr,
            tcoa,
        }
    }

    /// Table with distance thresholds multiplied by `factor`. Time thresholds
    /// are kept as is.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            dthr: self.dthr * factor,
            zthr: self.zthr * factor,
            ..*self
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("dthr", self.dthr)?;
        check_threshold("zthr", self.zthr)?;
        check_threshold("tthr", self.tthr)?;
        check_threshold("tcoa", self.tcoa)?;
        Ok(())
    }
}

/// Validate the activation time B against the lookahead time T.
pub fn validate_horizon(activation_s: f64, lookahead_s: f64) -> Result<(), ConfigError> {
    check_threshold("activation_time", activation_s)?;
    check_threshold("lookahead_time", lookahead_s)?;
    if activation_s > lookahead_s {
        return Err(ConfigError::ActivationAfterLookahead {
            activation: activation_s,
            lookahead: lookahead_s,
        });
    }
    Ok(())
}

pub(crate) fn check_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidThreshold { name, value });
    }
    Ok(())
}

/// One alerting level: a conflict region painted in the bands when the
/// scaled well-clear volume is violated within the level's alerting time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertLevel {
    pub region: Region,
    /// Alerting time (seconds)
    pub alerting_time_s: f64,
    /// Multiplier applied to DTHR and ZTHR
    pub threshold_factor: f64,
}

impl AlertLevel {
    pub fn validate(&self, activation_s: f64, lookahead_s: f64) -> Result<(), ConfigError> {
        if !self.region.is_conflict_band() {
            return Err(ConfigError::InvalidAlertLevel {
                region: self.region.to_string(),
                reason: "region must be FAR, MID or NEAR".to_string(),
            });
        }
        if !self.threshold_factor.is_finite() || self.threshold_factor <= 0.0 {
            return Err(ConfigError::InvalidAlertLevel {
                region: self.region.to_string(),
                reason: format!("threshold factor {} must be positive", self.threshold_factor),
            });
        }
        if !self.alerting_time_s.is_finite()
            || self.alerting_time_s < activation_s
            || self.alerting_time_s > lookahead_s
        {
            return Err(ConfigError::InvalidAlertLevel {
                region: self.region.to_string(),
                reason: format!(
                    "alerting time {} must lie within [{}, {}]",
                    self.alerting_time_s, activation_s, lookahead_s
                ),
            });
        }
        Ok(())
    }
}
