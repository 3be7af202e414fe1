//! Colored breakpoints: the working representation of one axis while
//! hazard intervals are being merged.

use serde::{Deserialize, Serialize};

use super::{BandsRange, Interval, Region};
use crate::error::MergeError;

/// Breakpoint on an axis. `region` colors the span that ends at `value`;
/// the region of the first breakpoint of a list is not used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColoredValue {
    pub value: f64,
    pub region: Region,
}

impl ColoredValue {
    pub fn new(value: f64, region: Region) -> Self {
        Self { value, region }
    }

    /// Working list for the range `[min, max]`, all `None`.
    pub fn init(min: f64, max: f64) -> Vec<ColoredValue> {
        vec![
            ColoredValue::new(min, Region::None),
            ColoredValue::new(max, Region::None),
        ]
    }

    /// Paint the closed interval `ii` into `list`.
    ///
    /// The interval is colored with the more severe of its two boundary
    /// colors, and every span it covers keeps the more severe of its current
    /// region and that color. Parts of `ii` outside the list's range are
    /// ignored, as are zero-width intervals.
    pub fn insert(
        list: &mut Vec<ColoredValue>,
        ii: Interval,
        lb_color: Region,
        ub_color: Region,
    ) -> Result<(), MergeError> {
        if !ii.low.is_finite() || !ii.up.is_finite() {
            return Err(MergeError::NonFiniteBound {
                lower: ii.low,
                upper: ii.up,
            });
        }
        if ii.low > ii.up {
            return Err(MergeError::ReversedBounds {
                lower: ii.low,
                upper: ii.up,
            });
        }
        let (first, last) = match (list.first(), list.last()) {
            (Some(first), Some(last)) if list.len() >= 2 => (first.value, last.value),
            _ => return Err(MergeError::DegenerateList(list.len())),
        };

        let low = ii.low.max(first);
        let up = ii.up.min(last);
        if low >= up {
            return Ok(());
        }

        let color = lb_color.max(ub_color);
        let lo_idx = split_at(list, low);
        let up_idx = split_at(list, up);
        for cv in &mut list[lo_idx + 1..=up_idx] {
            cv.region = cv.region.max(color);
        }
        coalesce(list);
        Ok(())
    }

    /// Append the ranges described by `list` to `ranges`, merging adjacent
    /// spans of the same region.
    pub fn to_bands(ranges: &mut Vec<BandsRange>, list: &[ColoredValue]) {
        let Some(first) = list.first() else {
            return;
        };
        let mut lower = first.value;
        for (i, cv) in list.iter().enumerate().skip(1) {
            let next_differs = list.get(i + 1).map(|next| next.region != cv.region).unwrap_or(true);
            if next_differs {
                ranges.push(BandsRange {
                    lower,
                    upper: cv.value,
                    region: cv.region,
                });
                lower = cv.value;
            }
        }
    }
}

/// Make sure a breakpoint exists at `value` and return its index. A new
/// breakpoint inherits the region of the span it splits.
/// Requires `list[0].value <= value <= list[last].value`.
fn split_at(list: &mut Vec<ColoredValue>, value: f64) -> usize {
    let idx = list.partition_point(|cv| cv.value < value);
    if idx < list.len() && list[idx].value == value {
        return idx;
    }
    let region = list.get(idx).map(|cv| cv.region).unwrap_or(Region::None);
    list.insert(idx, ColoredValue::new(value, region));
    idx
}

/// Drop interior breakpoints that separate two spans of the same region.
fn coalesce(list: &mut Vec<ColoredValue>) {
    if list.len() <= 2 {
        return;
    }
    let last = list.len() - 1;
    let mut kept = Vec::with_capacity(list.len());
    for (i, cv) in list.iter().enumerate() {
        let redundant = i > 0 && i < last && list[i + 1].region == cv.region;
        if !redundant {
            kept.push(*cv);
        }
    }
    *list = kept;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands(list: &[ColoredValue]) -> Vec<BandsRange> {
        let mut ranges = Vec::new();
        ColoredValue::to_bands(&mut ranges, list);
        ranges
    }

    fn range(lower: f64, upper: f64, region: Region) -> BandsRange {
        BandsRange {
            lower,
            upper,
            region,
        }
    }

    #[test]
    fn untouched_axis_is_none() {
        let list = ColoredValue::init(0.0, 30.0);
        assert_eq!(bands(&list), vec![range(0.0, 30.0, Region::None)]);
    }

    #[test]
    fn insert_splits_and_paints() {
        let mut list = ColoredValue::init(0.0, 30.0);
        ColoredValue::insert(&mut list, Interval::new(10.0, 20.0), Region::Mid, Region::Mid).unwrap();
        assert_eq!(
            bands(&list),
            vec![
                range(0.0, 10.0, Region::None),
                range(10.0, 20.0, Region::Mid),
                range(20.0, 30.0, Region::None),
            ]
        );
    }

    #[test]
    fn more_severe_wins_on_overlap() {
        let mut list = ColoredValue::init(0.0, 30.0);
        ColoredValue::insert(&mut list, Interval::new(5.0, 20.0), Region::Near, Region::Near).unwrap();
        ColoredValue::insert(&mut list, Interval::new(10.0, 25.0), Region::Far, Region::Far).unwrap();
        assert_eq!(
            bands(&list),
            vec![
                range(0.0, 5.0, Region::None),
                range(5.0, 20.0, Region::Near),
                range(20.0, 25.0, Region::Far),
                range(25.0, 30.0, Region::None),
            ]
        );
    }

    #[test]
    fn covering_interval_subsumes_breakpoints() {
        let mut list = ColoredValue::init(0.0, 30.0);
        ColoredValue::insert(&mut list, Interval::new(10.0, 12.0), Region::Far, Region::Far).unwrap();
        ColoredValue::insert(&mut list, Interval::new(14.0, 16.0), Region::Mid, Region::Mid).unwrap();
        ColoredValue::insert(&mut list, Interval::new(5.0, 25.0), Region::Near, Region::Near).unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(
            bands(&list),
            vec![
                range(0.0, 5.0, Region::None),
                range(5.0, 25.0, Region::Near),
                range(25.0, 30.0, Region::None),
            ]
        );
    }

    #[test]
    fn boundary_colors_resolve_to_more_severe() {
        let mut list = ColoredValue::init(0.0, 30.0);
        ColoredValue::insert(&mut list, Interval::new(10.0, 20.0), Region::Near, Region::Far).unwrap();
        assert_eq!(bands(&list)[1], range(10.0, 20.0, Region::Near));
    }

    #[test]
    fn interval_is_clipped_to_list() {
        let mut list = ColoredValue::init(0.0, 30.0);
        ColoredValue::insert(&mut list, Interval::new(-10.0, 5.0), Region::Far, Region::Far).unwrap();
        ColoredValue::insert(&mut list, Interval::new(40.0, 50.0), Region::Near, Region::Near).unwrap();
        assert_eq!(
            bands(&list),
            vec![range(0.0, 5.0, Region::Far), range(5.0, 30.0, Region::None)]
        );
    }

    #[test]
    fn malformed_input_is_rejected() {
        let mut list = ColoredValue::init(0.0, 30.0);
        assert_eq!(
            ColoredValue::insert(&mut list, Interval::new(20.0, 10.0), Region::Far, Region::Far),
            Err(MergeError::ReversedBounds {
                lower: 20.0,
                upper: 10.0
            })
        );
        assert!(matches!(
            ColoredValue::insert(&mut list, Interval::new(f64::NAN, 10.0), Region::Far, Region::Far),
            Err(MergeError::NonFiniteBound { .. })
        ));
        let mut empty = Vec::new();
        assert_eq!(
            ColoredValue::insert(&mut empty, Interval::new(0.0, 1.0), Region::Far, Region::Far),
            Err(MergeError::DegenerateList(0))
        );
        // Rejected inserts leave the list untouched
        assert_eq!(list, ColoredValue::init(0.0, 30.0));
    }

    #[test]
    fn to_bands_appends() {
        let mut ranges = vec![range(0.0, 10.0, Region::Mid)];
        ColoredValue::to_bands(&mut ranges, &ColoredValue::init(300.0, 360.0));
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1], range(300.0, 360.0, Region::None));
    }
}
