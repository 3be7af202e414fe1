//! Per-axis bands search.
//!
//! The ownship velocity is varied along one axis at a time (instantaneous
//! maneuver), sampled on a fixed step grid, and every sample is checked
//! against every intruder at every alert level. Runs of conflicting samples
//! become hazard intervals for the merger.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AxisDomain, Bands, BandsMerger, Interval, Region};
use crate::conflict::{Cylinder, Detection};
use crate::diagnostics::Diagnostics;
use crate::error::ConfigError;
use crate::models::{KinematicState, Velocity};
use crate::spatial::{almost_equals, EPSILON};

/// Upper bound on samples per axis.
const MAX_SAMPLES: f64 = 100_000.0;

/// Maneuver axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Track,
    GroundSpeed,
    VerticalSpeed,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Track, Axis::GroundSpeed, Axis::VerticalSpeed];

    pub fn name(&self) -> &'static str {
        match self {
            Axis::Track => "track",
            Axis::GroundSpeed => "ground_speed",
            Axis::VerticalSpeed => "vertical_speed",
        }
    }

    /// Current value of this axis for `velocity`.
    pub fn current(&self, velocity: &Velocity) -> f64 {
        match self {
            Axis::Track => velocity.track_deg(),
            Axis::GroundSpeed => velocity.gs(),
            Axis::VerticalSpeed => velocity.vs(),
        }
    }

    /// `velocity` with this axis set to `value`.
    fn apply(&self, velocity: &Velocity, value: f64) -> Velocity {
        match self {
            Axis::Track => velocity.with_track(value),
            Axis::GroundSpeed => velocity.with_gs(value),
            Axis::VerticalSpeed => velocity.with_vs(value),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Search range of one axis.
///
/// For the track axis `min`/`max` are offsets from the current track
/// (degrees, `min <= 0 <= max`); a window of 360 degrees or more covers the
/// whole circle. Speed axes use absolute bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl AxisConfig {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    pub fn validate(&self, axis: Axis) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidAxis {
            axis: axis.name(),
            reason,
        };
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(invalid(format!(
                "bounds must be finite, got [{}, {}]",
                self.min, self.max
            )));
        }
        if self.min >= self.max {
            return Err(invalid(format!(
                "lower bound {} must be below upper bound {}",
                self.min, self.max
            )));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(invalid(format!("step {} must be positive", self.step)));
        }
        if (self.max - self.min) / self.step > MAX_SAMPLES {
            return Err(invalid(format!(
                "step {} is too fine for range [{}, {}]",
                self.step, self.min, self.max
            )));
        }
        if axis == Axis::Track && (self.min > 0.0 || self.max < 0.0) {
            return Err(invalid(format!(
                "track window [{}, {}] must contain the current track",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Domain and unwrapped sampling bounds around `current`.
    fn search_range(&self, axis: Axis, current: f64) -> (AxisDomain, f64, f64) {
        match axis {
            Axis::Track if self.max - self.min >= 360.0 => (AxisDomain::circular(360.0), 0.0, 360.0),
            Axis::Track => {
                let lo = snap_to_seam(current + self.min, 360.0);
                let hi = snap_to_seam(current + self.max, 360.0);
                (AxisDomain::circular_window(lo, hi, 360.0), lo, hi)
            }
            _ => (AxisDomain::linear(self.min, self.max), self.min, self.max),
        }
    }
}

/// Conflict detector of one alert level, already scaled by the level's
/// threshold factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelDetector {
    pub region: Region,
    pub detector: Detection,
    pub alerting_time_s: f64,
}

impl LevelDetector {
    /// True when `ownship` is predicted to lose well-clear with `intruder`
    /// within `[activation_s, alerting_time_s]`.
    pub fn conflict(&self, ownship: &KinematicState, intruder: &KinematicState, activation_s: f64) -> bool {
        match self
            .detector
            .conflict(ownship, intruder, activation_s, self.alerting_time_s)
        {
            Ok(interval) => interval.conflict(),
            // Unreachable with a validated configuration; count it as a conflict
            Err(_) => true,
        }
    }
}

/// Everything the per-axis search needs besides the traffic itself.
#[derive(Debug, Clone)]
pub struct SearchContext {
    pub levels: Vec<LevelDetector>,
    pub activation_s: f64,
    pub lookahead_s: f64,
    pub nmac: Cylinder,
    /// Paint recovery bands when the most severe level saturates an axis
    pub recovery: bool,
    pub diagnostics: Diagnostics,
}

impl SearchContext {
    /// Most severe level; it decides when recovery bands are needed.
    fn most_severe(&self) -> Option<&LevelDetector> {
        self.levels.iter().max_by_key(|level| level.region)
    }

    /// Most severe level at which `intruder` is in conflict.
    pub fn alert_region(&self, ownship: &KinematicState, intruder: &KinematicState) -> Region {
        self.levels
            .iter()
            .filter(|level| level.conflict(ownship, intruder, self.activation_s))
            .map(|level| level.region)
            .max()
            .unwrap_or(Region::None)
    }

    fn nmac_free(&self, ownship: &KinematicState, intruders: &[KinematicState]) -> bool {
        let nmac = Detection::Cylinder(self.nmac);
        intruders.iter().all(|intruder| {
            nmac.conflict(ownship, intruder, 0.0, self.lookahead_s)
                .map(|interval| interval.is_empty())
                .unwrap_or(false)
        })
    }
}

/// Compute the bands of `axis` for `ownship` against `intruders`.
pub fn compute_axis(
    axis: Axis,
    config: &AxisConfig,
    ctx: &SearchContext,
    ownship: &KinematicState,
    intruders: &[KinematicState],
) -> Bands {
    let current = axis.current(&ownship.velocity);
    let (domain, lo, hi) = config.search_range(axis, if current.is_finite() { current } else { 0.0 });
    let mut merger = BandsMerger::new(domain);

    if !ownship.is_finite() {
        tracing::warn!("Ownship state is not finite, {} bands are unknown", axis);
        merger.saturate(Region::Unknown);
        return merger.finish();
    }

    let intruders: Vec<KinematicState> = intruders
        .iter()
        .filter(|intruder| {
            let finite = intruder.is_finite();
            if !finite {
                tracing::warn!("Skipping intruder {:?} with non-finite state on {} axis", intruder.id, axis);
            }
            finite
        })
        .copied()
        .collect();

    let samples = sample_grid(lo, hi, config.step);
    let trials: Vec<KinematicState> = samples
        .iter()
        .map(|value| ownship.with_velocity(axis.apply(&ownship.velocity, *value)))
        .collect();

    let mut saturated = false;
    for level in &ctx.levels {
        let flags: Vec<bool> = trials
            .iter()
            .map(|trial| {
                intruders
                    .iter()
                    .any(|intruder| level.conflict(trial, intruder, ctx.activation_s))
            })
            .collect();

        let runs = runs_of(&flags, true);
        if ctx.diagnostics.is_verbose() {
            tracing::debug!(
                "[{}] {} level on {}: {} conflict run(s)",
                ctx.diagnostics.label(),
                level.region,
                axis,
                runs.len()
            );
        }
        for (first, last) in runs {
            // Widen to the neighbouring conflict-free samples
            let low = samples[first.saturating_sub(1)];
            let up = samples[(last + 1).min(samples.len() - 1)];
            insert_logged(&mut merger, axis, Interval::new(low, up), level.region);
        }

        if Some(level.region) == ctx.most_severe().map(|l| l.region) && !flags.is_empty() {
            saturated = flags.iter().all(|flag| *flag);
        }
    }

    if saturated && ctx.recovery {
        let free: Vec<bool> = trials
            .iter()
            .map(|trial| ctx.nmac_free(trial, &intruders))
            .collect();
        for (first, last) in runs_of(&free, true) {
            // Single samples have no width to paint
            if first < last {
                insert_logged(
                    &mut merger,
                    axis,
                    Interval::new(samples[first], samples[last]),
                    Region::Recovery,
                );
            }
        }
        tracing::debug!(
            "[{}] {} saturated, {} sample(s) free of NMAC",
            ctx.diagnostics.label(),
            axis,
            free.iter().filter(|f| **f).count()
        );
    }

    let bands = merger.finish();
    tracing::debug!(
        "[{}] {} bands: {} range(s) over {} intruder(s)",
        ctx.diagnostics.label(),
        axis,
        bands.len(),
        intruders.len()
    );
    bands
}

fn insert_logged(merger: &mut BandsMerger, axis: Axis, interval: Interval, region: Region) {
    if let Err(err) = merger.insert(interval, region, region) {
        tracing::warn!(
            "Skipping {} interval [{}, {}] on {} axis: {}",
            region,
            interval.low,
            interval.up,
            axis,
            err
        );
    }
}

/// Values from `lo` to `hi` every `step`, always including `hi`.
fn sample_grid(lo: f64, hi: f64, step: f64) -> Vec<f64> {
    let count = ((hi - lo) / step).floor().max(0.0) as usize;
    let mut values: Vec<f64> = (0..=count).map(|k| lo + k as f64 * step).collect();
    match values.last_mut() {
        Some(last) if hi - *last <= EPSILON => *last = hi,
        _ => values.push(hi),
    }
    values
}

/// `value`, or the nearest multiple of `modulo` when it is within rounding
/// of one.
fn snap_to_seam(value: f64, modulo: f64) -> f64 {
    let seam = (value / modulo).round() * modulo;
    if almost_equals(value, seam) {
        seam
    } else {
        value
    }
}

/// Inclusive index ranges of consecutive entries equal to `wanted`.
fn runs_of(flags: &[bool], wanted: bool) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, flag) in flags.iter().enumerate() {
        match (start, *flag == wanted) {
            (None, true) => start = Some(i),
            (Some(s), false) => {
                runs.push((s, i - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, flags.len() - 1));
    }
    runs
}
