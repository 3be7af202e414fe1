//! Maneuver bands: colored partitions of a control axis.
//!
//! Each conflicting intruder contributes hazard intervals on an axis (track,
//! ground speed, vertical speed). The merger combines them into one sorted,
//! non-overlapping cover of the axis where every point carries the most
//! severe region contributed to it.

mod colored;
mod compute;
mod merger;

pub use colored::ColoredValue;
pub use compute::{compute_axis, Axis, AxisConfig, LevelDetector, SearchContext};
pub use merger::{AxisDomain, BandsMerger};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MergeError;

/// Hazard region, declared from least to most severe. The derived ordering
/// is the severity ranking used when merging.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    #[default]
    None,
    Far,
    Mid,
    Near,
    Recovery,
    /// Bands could not be computed safely
    Unknown,
}

impl Region {
    pub const ALL: [Region; 6] = [
        Region::None,
        Region::Far,
        Region::Mid,
        Region::Near,
        Region::Recovery,
        Region::Unknown,
    ];

    /// FAR, MID and NEAR are the regions painted by alert levels.
    pub fn is_conflict_band(&self) -> bool {
        matches!(self, Region::Far | Region::Mid | Region::Near)
    }

    /// Regions a maneuver may be steered into.
    pub fn is_resolution(&self) -> bool {
        matches!(self, Region::None | Region::Recovery)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::None => "NONE",
            Region::Far => "FAR",
            Region::Mid => "MID",
            Region::Near => "NEAR",
            Region::Recovery => "RECOVERY",
            Region::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|region| region.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MergeError::UnknownRegion(s.to_string()))
    }
}

/// Closed interval on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub low: f64,
    pub up: f64,
}

impl Interval {
    pub fn new(low: f64, up: f64) -> Self {
        Self { low, up }
    }
}

/// Closed range `[lower, upper]` of an axis with its region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandsRange {
    pub lower: f64,
    pub upper: f64,
    pub region: Region,
}

impl BandsRange {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

impl fmt::Display for BandsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}, {:.2}] -> {}", self.lower, self.upper, self.region)
    }
}

/// Canonical bands of one axis: sorted, non-overlapping and covering the
/// whole domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bands {
    domain: AxisDomain,
    ranges: Vec<BandsRange>,
}

impl Bands {
    pub(crate) fn new(domain: AxisDomain, ranges: Vec<BandsRange>) -> Self {
        Self { domain, ranges }
    }

    pub fn domain(&self) -> &AxisDomain {
        &self.domain
    }

    pub fn ranges(&self) -> &[BandsRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Region at `value`. Shared endpoints take the more severe of the two
    /// adjacent regions, including across the seam of a circular axis;
    /// values outside the domain are `Unknown`.
    pub fn region_of(&self, value: f64) -> Region {
        let points = self.domain.aliases(value);
        self.ranges
            .iter()
            .filter(|range| points.iter().flatten().any(|v| range.contains(*v)))
            .map(|range| range.region)
            .max()
            .unwrap_or(Region::Unknown)
    }

    /// True when no value of the axis is free of conflict bands.
    pub fn is_saturated(&self) -> bool {
        !self.ranges.iter().any(|range| range.region.is_resolution())
    }

    /// Nearest value from `current`, moving up (`up == true`) or down, that
    /// lies in a resolution region. Wraps around on circular axes.
    ///
    /// The result is the boundary of the resolution range. At that boundary
    /// `region_of` still reports the conflict band it touches; every value
    /// strictly past it is a resolution.
    pub fn resolution(&self, current: f64, up: bool) -> Option<f64> {
        let current = self.domain.normalize(current);
        if self.region_of(current).is_resolution() {
            return Some(current);
        }
        let modulo = self.domain.modulo();
        let candidates = self
            .ranges
            .iter()
            .filter(|range| range.region.is_resolution())
            .map(|range| {
                let target = if up { range.lower } else { range.upper };
                let mut distance = if up { target - current } else { current - target };
                if distance < 0.0 && modulo > 0.0 {
                    distance += modulo;
                }
                (distance, target)
            })
            .filter(|(distance, _)| *distance >= 0.0);
        candidates
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, target)| target)
    }
}

impl fmt::Display for Bands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for range in &self.ranges {
            writeln!(f, "  {range}")?;
        }
        Ok(())
    }
}
