//! Axis domains and the per-axis bands merger.

use serde::{Deserialize, Serialize};

use super::{Bands, ColoredValue, Interval, Region};
use crate::error::{ConfigError, MergeError};

/// Bounds of one maneuver axis. `modulo > 0` makes the axis circular, in
/// which case `min > max` describes a window that crosses the seam.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisDomain {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub modulo: f64,
}

impl AxisDomain {
    pub fn linear(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            modulo: 0.0,
        }
    }

    /// Full circle `[0, modulo)`.
    pub fn circular(modulo: f64) -> Self {
        Self {
            min: 0.0,
            max: modulo,
            modulo,
        }
    }

    /// Circular window from `min` to `max`. `min` is normalized to
    /// `[0, modulo)` and `max` to `(0, modulo]`, so a window ending on the
    /// seam keeps `max == modulo`.
    pub fn circular_window(min: f64, max: f64, modulo: f64) -> Self {
        let mut domain = Self {
            min: 0.0,
            max: modulo,
            modulo,
        };
        domain.min = domain.normalize(min);
        let upper = domain.normalize(max);
        domain.max = if upper == 0.0 { modulo } else { upper };
        domain
    }

    pub fn modulo(&self) -> f64 {
        self.modulo
    }

    pub fn is_circular(&self) -> bool {
        self.modulo > 0.0
    }

    /// Length of the axis covered by the domain.
    pub fn span(&self) -> f64 {
        if self.is_circular() && self.min > self.max {
            self.max + self.modulo - self.min
        } else {
            self.max - self.min
        }
    }

    /// Map `value` into `[0, modulo)` on circular axes.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.is_circular() {
            let wrapped = value.rem_euclid(self.modulo);
            if wrapped >= self.modulo {
                0.0
            } else {
                wrapped
            }
        } else {
            value
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.aliases(value).into_iter().flatten().any(|v| {
            if self.is_circular() && self.min > self.max {
                v >= self.min || v <= self.max
            } else {
                self.min <= v && v <= self.max
            }
        })
    }

    /// Positions of `value` on the axis. The seam of a circular axis has
    /// two: `0` and `modulo`.
    pub(crate) fn aliases(&self, value: f64) -> [Option<f64>; 2] {
        let value = self.normalize(value);
        let seam = (self.is_circular() && value == 0.0).then_some(self.modulo);
        [Some(value), seam]
    }

    pub fn validate(&self, axis: &'static str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidAxis { axis, reason };
        if !self.min.is_finite() || !self.max.is_finite() || !self.modulo.is_finite() {
            return Err(invalid(format!(
                "bounds must be finite, got [{}, {}] mod {}",
                self.min, self.max, self.modulo
            )));
        }
        if self.modulo < 0.0 {
            return Err(invalid(format!("modulo {} is negative", self.modulo)));
        }
        if self.is_circular() {
            let in_circle = |v: f64| (0.0..=self.modulo).contains(&v);
            if !in_circle(self.min) || !in_circle(self.max) || self.min == self.max {
                return Err(invalid(format!(
                    "circular bounds [{}, {}] must be distinct values within [0, {}]",
                    self.min, self.max, self.modulo
                )));
            }
        } else if self.min >= self.max {
            return Err(invalid(format!(
                "lower bound {} must be below upper bound {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Merges hazard intervals for one axis into canonical bands.
///
/// A merger is owned by a single axis computation; independent axes use
/// independent mergers.
#[derive(Debug, Clone)]
pub struct BandsMerger {
    domain: AxisDomain,
    lists: Vec<Vec<ColoredValue>>,
}

impl BandsMerger {
    pub fn new(domain: AxisDomain) -> Self {
        let bounds = if domain.is_circular() && domain.min > domain.max {
            vec![(0.0, domain.max), (domain.min, domain.modulo)]
        } else {
            vec![(domain.min, domain.max)]
        };
        let lists = bounds
            .into_iter()
            .filter(|(min, max)| min < max)
            .map(|(min, max)| ColoredValue::init(min, max))
            .collect();
        Self { domain, lists }
    }

    pub fn domain(&self) -> &AxisDomain {
        &self.domain
    }

    /// Insert one hazard interval. On circular axes `ii.low > ii.up` means
    /// the interval crosses the seam; it is split into two insertions.
    pub fn insert(&mut self, ii: Interval, lb_color: Region, ub_color: Region) -> Result<(), MergeError> {
        if !ii.low.is_finite() || !ii.up.is_finite() {
            return Err(MergeError::NonFiniteBound {
                lower: ii.low,
                upper: ii.up,
            });
        }
        if !self.domain.is_circular() {
            return ColoredValue::insert(&mut self.lists[0], ii, lb_color, ub_color);
        }

        let modulo = self.domain.modulo;
        let up = if ii.low > ii.up { ii.up + modulo } else { ii.up };
        let width = up - ii.low;
        let pieces = if width >= modulo {
            vec![Interval::new(0.0, modulo)]
        } else {
            let low = self.domain.normalize(ii.low);
            let up = low + width;
            if up <= modulo {
                vec![Interval::new(low, up)]
            } else {
                vec![Interval::new(low, modulo), Interval::new(0.0, up - modulo)]
            }
        };

        for piece in pieces {
            for list in &mut self.lists {
                ColoredValue::insert(list, piece, lb_color, ub_color)?;
            }
        }
        Ok(())
    }

    /// Paint the whole domain with `region`.
    pub fn saturate(&mut self, region: Region) {
        for list in &mut self.lists {
            let (Some(first), Some(last)) = (list.first().copied(), list.last().copied()) else {
                continue;
            };
            let whole = Interval::new(first.value, last.value);
            if let Err(err) = ColoredValue::insert(list, whole, region, region) {
                tracing::warn!("Failed to saturate [{}, {}] with {}: {}", whole.low, whole.up, region, err);
            }
        }
    }

    /// Canonical bands, sorted by lower bound.
    pub fn finish(self) -> Bands {
        let mut ranges = Vec::new();
        for list in &self.lists {
            ColoredValue::to_bands(&mut ranges, list);
        }
        Bands::new(self.domain, ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::BandsRange;

    fn range(lower: f64, upper: f64, region: Region) -> BandsRange {
        BandsRange {
            lower,
            upper,
            region,
        }
    }

    #[test]
    fn wrapping_interval_matches_split_insertions() {
        let mut wrapped = BandsMerger::new(AxisDomain::circular(360.0));
        wrapped
            .insert(Interval::new(350.0, 10.0), Region::Mid, Region::Mid)
            .unwrap();

        let mut split = BandsMerger::new(AxisDomain::circular(360.0));
        split
            .insert(Interval::new(350.0, 360.0), Region::Mid, Region::Mid)
            .unwrap();
        split
            .insert(Interval::new(0.0, 10.0), Region::Mid, Region::Mid)
            .unwrap();

        let wrapped = wrapped.finish();
        assert_eq!(wrapped, split.finish());
        assert_eq!(
            wrapped.ranges(),
            &[
                range(0.0, 10.0, Region::Mid),
                range(10.0, 350.0, Region::None),
                range(350.0, 360.0, Region::Mid),
            ]
        );
    }

    #[test]
    fn unwrapped_values_are_normalized() {
        let mut merger = BandsMerger::new(AxisDomain::circular(360.0));
        merger
            .insert(Interval::new(-5.0, 5.0), Region::Near, Region::Near)
            .unwrap();
        merger
            .insert(Interval::new(400.0, 410.0), Region::Far, Region::Far)
            .unwrap();
        let bands = merger.finish();
        assert_eq!(bands.region_of(0.0), Region::Near);
        assert_eq!(bands.region_of(357.0), Region::Near);
        assert_eq!(bands.region_of(45.0), Region::Far);
    }

    #[test]
    fn full_turn_saturates_track() {
        let mut merger = BandsMerger::new(AxisDomain::circular(360.0));
        merger
            .insert(Interval::new(10.0, 400.0), Region::Far, Region::Far)
            .unwrap();
        let bands = merger.finish();
        assert_eq!(bands.ranges(), &[range(0.0, 360.0, Region::Far)]);
        assert!(bands.is_saturated());
    }

    #[test]
    fn track_window_uses_two_lists() {
        let domain = AxisDomain::circular_window(300.0, 60.0, 360.0);
        assert!((domain.span() - 120.0).abs() < 1e-12);
        let mut merger = BandsMerger::new(domain);
        merger
            .insert(Interval::new(350.0, 10.0), Region::Near, Region::Near)
            .unwrap();
        merger
            .insert(Interval::new(100.0, 200.0), Region::Far, Region::Far)
            .unwrap();
        let bands = merger.finish();
        assert_eq!(
            bands.ranges(),
            &[
                range(0.0, 10.0, Region::Near),
                range(10.0, 60.0, Region::None),
                range(300.0, 350.0, Region::None),
                range(350.0, 360.0, Region::Near),
            ]
        );
        assert!(!domain.contains(180.0));
        assert!(domain.contains(330.0));
    }

    #[test]
    fn window_ending_on_seam_keeps_upper_bound() {
        let domain = AxisDomain::circular_window(270.0, 360.0, 360.0);
        assert_eq!((domain.min, domain.max), (270.0, 360.0));
        assert_eq!(AxisDomain::circular_window(-90.0, 0.0, 360.0).max, 360.0);
        assert_eq!(AxisDomain::circular_window(360.0, 450.0, 360.0).min, 0.0);
        assert!(domain.validate("trk").is_ok());
        assert!(domain.contains(0.0));
        assert!(!domain.contains(10.0));

        let mut merger = BandsMerger::new(domain);
        merger
            .insert(Interval::new(350.0, 360.0), Region::Near, Region::Near)
            .unwrap();
        let bands = merger.finish();
        assert_eq!(
            bands.ranges(),
            &[range(270.0, 350.0, Region::None), range(350.0, 360.0, Region::Near)]
        );
        assert_eq!(bands.region_of(0.0), Region::Near);
    }

    #[test]
    fn saturate_covers_window_ending_on_seam() {
        let mut merger = BandsMerger::new(AxisDomain::circular_window(270.0, 360.0, 360.0));
        merger.saturate(Region::Unknown);
        assert_eq!(merger.finish().ranges(), &[range(270.0, 360.0, Region::Unknown)]);
    }

    #[test]
    fn linear_axis_rejects_reversed_interval() {
        let mut merger = BandsMerger::new(AxisDomain::linear(0.0, 30.0));
        assert!(matches!(
            merger.insert(Interval::new(20.0, 10.0), Region::Far, Region::Far),
            Err(MergeError::ReversedBounds { .. })
        ));
        assert!(matches!(
            merger.insert(Interval::new(f64::INFINITY, 10.0), Region::Far, Region::Far),
            Err(MergeError::NonFiniteBound { .. })
        ));
        assert_eq!(merger.finish().ranges(), &[range(0.0, 30.0, Region::None)]);
    }

    #[test]
    fn saturate_paints_every_list() {
        let mut merger = BandsMerger::new(AxisDomain::circular_window(300.0, 60.0, 360.0));
        merger.saturate(Region::Unknown);
        let bands = merger.finish();
        assert!(bands.ranges().iter().all(|r| r.region == Region::Unknown));
        assert_eq!(bands.len(), 2);
    }

    #[test]
    fn domain_validation() {
        assert!(AxisDomain::linear(0.0, 30.0).validate("gs").is_ok());
        assert!(AxisDomain::linear(30.0, 0.0).validate("gs").is_err());
        assert!(AxisDomain::linear(f64::NAN, 0.0).validate("gs").is_err());
        assert!(AxisDomain::circular(360.0).validate("trk").is_ok());
        assert!(AxisDomain::circular_window(300.0, 60.0, 360.0).validate("trk").is_ok());
        assert!(AxisDomain {
            min: 10.0,
            max: 10.0,
            modulo: 360.0
        }
        .validate("trk")
        .is_err());
    }
}
