//! Threshold configuration.
//!
//! The configuration is a flat set of named scalars, read either from a
//! parameter file (`key = value [unit]` lines, `#` comments) or from JSON.
//! Values are stored in SI units (meters, seconds, degrees, m/s); parameter
//! files may give other units, which are converted on load.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::bands::{Axis, AxisConfig, LevelDetector, Region, SearchContext};
use crate::conflict::{Cylinder, Detection, HorizontalCriterion, VerticalCriterion, WellClear};
use crate::diagnostics::Diagnostics;
use crate::error::ConfigError;
use crate::models::AircraftId;
use crate::rules::{validate_horizon, AlertLevel, WcvTable};
use crate::urgency::UrgencyStrategy;

/// Vertical criterion selector as written in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalKind {
    #[default]
    Tcoa,
    Vmod,
}

/// Urgency strategy selector as written in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyKind {
    #[default]
    None,
    Fixed,
    MostUrgent,
}

/// DAA engine configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaaConfig {
    /// Horizontal distance threshold (m)
    #[serde(alias = "DTHR")]
    pub dthr: f64,
    /// Vertical distance threshold (m)
    #[serde(alias = "ZTHR")]
    pub zthr: f64,
    /// Horizontal time threshold (s)
    #[serde(alias = "TTHR")]
    pub tthr: f64,
    /// Time to co-altitude threshold (s)
    #[serde(alias = "TCOA")]
    pub tcoa: f64,
    /// Lookahead time T (s)
    pub lookahead_time: f64,
    /// Activation time B (s)
    pub activation_time: f64,

    pub horizontal_criterion: HorizontalCriterion,
    pub vertical_criterion: VerticalKind,
    /// Non-hazard zone height for the VMOD criterion (m)
    pub znhz: f64,

    pub far_alerting_time: f64,
    pub far_threshold_factor: f64,
    pub mid_alerting_time: f64,
    pub mid_threshold_factor: f64,
    pub near_alerting_time: f64,
    pub near_threshold_factor: f64,

    /// NMAC cylinder radius (m)
    pub horizontal_nmac: f64,
    /// NMAC cylinder half height (m)
    pub vertical_nmac: f64,
    pub recovery_bands: bool,

    /// Track window to the left of the current track (deg)
    #[serde(alias = "left_hdir")]
    pub left_trk: f64,
    /// Track window to the right of the current track (deg)
    #[serde(alias = "right_hdir")]
    pub right_trk: f64,
    #[serde(alias = "step_hdir")]
    pub trk_step: f64,
    #[serde(alias = "min_hs")]
    pub min_gs: f64,
    #[serde(alias = "max_hs")]
    pub max_gs: f64,
    #[serde(alias = "step_hs")]
    pub gs_step: f64,
    pub min_vs: f64,
    pub max_vs: f64,
    #[serde(alias = "step_vs")]
    pub vs_step: f64,

    pub urgency: UrgencyKind,
    /// Aircraft id for the fixed urgency strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency_aircraft: Option<u32>,
}

impl Default for DaaConfig {
    fn default() -> Self {
        let table = WcvTable::default();
        Self {
            dthr: table.dthr,
            zthr: table.zthr,
            tthr: table.tthr,
            tcoa: table.tcoa,
            lookahead_time: 60.0,
            activation_time: 0.0,
            horizontal_criterion: HorizontalCriterion::TauMod,
            vertical_criterion: VerticalKind::Tcoa,
            znhz: 15.0,
            far_alerting_time: 60.0,
            far_threshold_factor: 2.0,
            mid_alerting_time: 45.0,
            mid_threshold_factor: 1.5,
            near_alerting_time: 30.0,
            near_threshold_factor: 1.0,
            horizontal_nmac: 10.0,
            vertical_nmac: 5.0,
            recovery_bands: true,
            left_trk: 180.0,
            right_trk: 180.0,
            trk_step: 1.0,
            min_gs: 0.0,
            max_gs: 30.0,
            gs_step: 1.0,
            min_vs: -10.0,
            max_vs: 10.0,
            vs_step: 0.5,
            urgency: UrgencyKind::None,
            urgency_aircraft: None,
        }
    }
}

impl DaaConfig {
    /// Parse a parameter file. Unknown keys, duplicate keys and units that
    /// can't be converted are rejected. The result is validated.
    pub fn from_params(text: &str) -> Result<Self, ConfigError> {
        let mut map = Map::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let malformed = |reason: String| ConfigError::MalformedLine { line, reason };

            let content = raw.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            let Some((key, value)) = content.split_once('=') else {
                return Err(malformed(format!("expected 'key = value', got '{content}'")));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(malformed("missing key".to_string()));
            }
            let value = parse_value(value.trim()).map_err(malformed)?;
            if map.insert(key.to_string(), value).is_some() {
                return Err(malformed(format!("duplicate key '{key}'")));
            }
        }
        let config: DaaConfig =
            serde_json::from_value(Value::Object(map)).map_err(|e| ConfigError::Decode(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON object with the same keys. The result is validated.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: DaaConfig = serde_json::from_str(text).map_err(|e| ConfigError::Decode(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` files are JSON, anything else is a
    /// parameter file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&text)
        } else {
            Self::from_params(&text)
        }
    }

    /// Parameter file text for this configuration, one key per line in
    /// SI units.
    pub fn to_params(&self) -> String {
        let Ok(Value::Object(map)) = serde_json::to_value(self) else {
            return String::new();
        };
        let mut out = String::new();
        for (key, value) in map {
            let text = match value {
                Value::String(s) => s,
                Value::Null => continue,
                other => other.to_string(),
            };
            out.push_str(&format!("{key} = {text}\n"));
        }
        out
    }

    /// Reject every configuration the engine can't run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_horizon(self.activation_time, self.lookahead_time)?;
        self.detector()?;
        self.alert_levels()?;
        self.nmac()?;
        self.urgency()?;
        for axis in Axis::ALL {
            self.axis(axis).validate(axis)?;
        }
        Ok(())
    }

    pub fn table(&self) -> WcvTable {
        WcvTable::new(self.dthr, self.zthr, self.tthr, self.tcoa)
    }

    /// Well-clear detector at nominal thresholds.
    pub fn detector(&self) -> Result<Detection, ConfigError> {
        let vertical = match self.vertical_criterion {
            VerticalKind::Tcoa => VerticalCriterion::Tcoa,
            VerticalKind::Vmod => VerticalCriterion::Vmod { znhz: self.znhz },
        };
        let wcv = WellClear::new(self.table(), self.horizontal_criterion, vertical)?;
        Ok(Detection::WellClear(wcv))
    }

    /// Alert levels ordered from least to most severe.
    pub fn alert_levels(&self) -> Result<Vec<AlertLevel>, ConfigError> {
        let levels = vec![
            AlertLevel {
                region: Region::Far,
                alerting_time_s: self.far_alerting_time,
                threshold_factor: self.far_threshold_factor,
            },
            AlertLevel {
                region: Region::Mid,
                alerting_time_s: self.mid_alerting_time,
                threshold_factor: self.mid_threshold_factor,
            },
            AlertLevel {
                region: Region::Near,
                alerting_time_s: self.near_alerting_time,
                threshold_factor: self.near_threshold_factor,
            },
        ];
        for level in &levels {
            level.validate(self.activation_time, self.lookahead_time)?;
        }
        Ok(levels)
    }

    pub fn nmac(&self) -> Result<Cylinder, ConfigError> {
        Cylinder::new(self.horizontal_nmac, self.vertical_nmac)
    }

    pub fn axis(&self, axis: Axis) -> AxisConfig {
        match axis {
            Axis::Track => AxisConfig::new(-self.left_trk, self.right_trk, self.trk_step),
            Axis::GroundSpeed => AxisConfig::new(self.min_gs, self.max_gs, self.gs_step),
            Axis::VerticalSpeed => AxisConfig::new(self.min_vs, self.max_vs, self.vs_step),
        }
    }

    pub fn urgency(&self) -> Result<UrgencyStrategy, ConfigError> {
        match (self.urgency, self.urgency_aircraft) {
            (UrgencyKind::None, _) => Ok(UrgencyStrategy::None),
            (UrgencyKind::MostUrgent, _) => Ok(UrgencyStrategy::MostUrgent),
            (UrgencyKind::Fixed, Some(id)) => Ok(UrgencyStrategy::Fixed(AircraftId(id))),
            (UrgencyKind::Fixed, None) => Err(ConfigError::Decode(
                "urgency = fixed requires urgency_aircraft".to_string(),
            )),
        }
    }

    /// Everything the per-axis search needs, with each level's detector
    /// scaled by its threshold factor.
    pub fn search_context(&self, diagnostics: Diagnostics) -> Result<SearchContext, ConfigError> {
        let detector = self.detector()?;
        let levels = self
            .alert_levels()?
            .into_iter()
            .map(|level| LevelDetector {
                region: level.region,
                detector: detector.scaled(level.threshold_factor),
                alerting_time_s: level.alerting_time_s,
            })
            .collect();
        Ok(SearchContext {
            levels,
            activation_s: self.activation_time,
            lookahead_s: self.lookahead_time,
            nmac: self.nmac()?,
            recovery: self.recovery_bands,
            diagnostics,
        })
    }
}

/// Scalar value of a parameter line, with an optional `[unit]` suffix.
fn parse_value(raw: &str) -> Result<Value, String> {
    let (number, unit) = match raw.split_once('[') {
        Some((number, rest)) => {
            let unit = rest
                .strip_suffix(']')
                .ok_or_else(|| format!("unterminated unit in '{raw}'"))?;
            (number.trim(), Some(unit.trim()))
        }
        None => (raw, None),
    };

    if let Some(unit) = unit {
        let factor = unit_factor(unit).ok_or_else(|| format!("unsupported unit '{unit}'"))?;
        let value: f64 = number
            .parse()
            .map_err(|_| format!("'{number}' is not a number"))?;
        return finite(value * factor, raw);
    }

    if let Ok(int) = number.parse::<i64>() {
        return Ok(Value::from(int));
    }
    if let Ok(float) = number.parse::<f64>() {
        return finite(float, raw);
    }
    match number.to_ascii_lowercase().as_str() {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        _ => Ok(Value::String(number.trim_matches('"').to_string())),
    }
}

fn finite(value: f64, raw: &str) -> Result<Value, String> {
    if value.is_finite() {
        Ok(Value::from(value))
    } else {
        Err(format!("'{raw}' is not a finite number"))
    }
}

/// Multiplier converting `unit` to the SI unit used internally.
fn unit_factor(unit: &str) -> Option<f64> {
    let factor = match unit {
        "m" | "s" | "deg" | "m/s" | "unitless" | "" => 1.0,
        "ft" => 0.3048,
        "nmi" => 1852.0,
        "km" => 1000.0,
        "min" => 60.0,
        "knot" | "kn" | "kts" => 1852.0 / 3600.0,
        "fpm" => 0.3048 / 60.0,
        _ => return None,
    };
    Some(factor)
}
