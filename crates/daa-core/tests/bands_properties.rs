//! Property tests for the colored-interval merger.

use daa_core::{AxisDomain, Bands, BandsMerger, Interval, Region};
use proptest::prelude::*;

type Hazard = (f64, f64, Region);

fn hazards() -> impl Strategy<Value = Vec<Hazard>> {
    prop::collection::vec((0u32..=100, 0u32..=100, 1usize..6), 0..12).prop_map(|raw| {
        raw.into_iter()
            .map(|(a, b, c)| (a.min(b) as f64, a.max(b) as f64, Region::ALL[c]))
            .collect()
    })
}

fn merge(domain: AxisDomain, hazards: &[Hazard]) -> Bands {
    let mut merger = BandsMerger::new(domain);
    for (low, up, region) in hazards {
        merger
            .insert(Interval::new(*low, *up), *region, *region)
            .expect("generated intervals are well formed");
    }
    merger.finish()
}

/// Most severe region among hazards of non-zero width covering `point`.
fn oracle(hazards: &[Hazard], point: f64) -> Region {
    hazards
        .iter()
        .filter(|(low, up, _)| low < up && *low <= point && point <= *up)
        .map(|(_, _, region)| *region)
        .max()
        .unwrap_or(Region::None)
}

fn assert_canonical(bands: &Bands, min: f64, max: f64) -> Result<(), TestCaseError> {
    let ranges = bands.ranges();
    prop_assert!(!ranges.is_empty());
    prop_assert_eq!(ranges[0].lower, min);
    prop_assert_eq!(ranges[ranges.len() - 1].upper, max);
    for range in ranges {
        prop_assert!(range.lower < range.upper, "empty range {}", range);
    }
    for pair in ranges.windows(2) {
        prop_assert_eq!(pair[0].upper, pair[1].lower);
        prop_assert!(pair[0].region != pair[1].region, "uncoalesced {} {}", pair[0], pair[1]);
    }
    Ok(())
}

proptest! {
    #[test]
    fn merged_bands_cover_axis_in_order(hazards in hazards()) {
        let bands = merge(AxisDomain::linear(0.0, 100.0), &hazards);
        assert_canonical(&bands, 0.0, 100.0)?;
    }

    #[test]
    fn merged_region_is_worst_contribution(hazards in hazards()) {
        let bands = merge(AxisDomain::linear(0.0, 100.0), &hazards);
        for k in 0..=200 {
            let point = k as f64 * 0.5;
            prop_assert_eq!(bands.region_of(point), oracle(&hazards, point), "at {}", point);
        }
    }

    #[test]
    fn insertion_order_does_not_matter(hazards in hazards(), rotate in 0usize..12) {
        let forward = merge(AxisDomain::linear(0.0, 100.0), &hazards);

        let mut reversed = hazards.clone();
        reversed.reverse();
        prop_assert_eq!(&merge(AxisDomain::linear(0.0, 100.0), &reversed), &forward);

        let mut rotated = hazards.clone();
        if !rotated.is_empty() {
            let by = rotate % rotated.len();
            rotated.rotate_left(by);
        }
        prop_assert_eq!(&merge(AxisDomain::linear(0.0, 100.0), &rotated), &forward);
    }

    #[test]
    fn wrapping_interval_equals_split_pair(low in 1u32..360, width in 1u32..359, c in 1usize..6) {
        let region = Region::ALL[c];
        let low = low as f64;
        let up = low + width as f64;

        let mut wrapped = BandsMerger::new(AxisDomain::circular(360.0));
        let written_up = if up > 360.0 { up - 360.0 } else { up };
        wrapped.insert(Interval::new(low, written_up), region, region).unwrap();

        let mut split = BandsMerger::new(AxisDomain::circular(360.0));
        if up > 360.0 {
            split.insert(Interval::new(low, 360.0), region, region).unwrap();
            split.insert(Interval::new(0.0, up - 360.0), region, region).unwrap();
        } else {
            split.insert(Interval::new(low, up), region, region).unwrap();
        }

        let wrapped = wrapped.finish();
        assert_canonical(&wrapped, 0.0, 360.0)?;
        prop_assert_eq!(&wrapped, &split.finish());
        prop_assert_eq!(wrapped.region_of(low + width as f64 / 2.0), region);
    }

    #[test]
    fn track_window_matches_unwrapped_oracle(
        (lo, width) in track_window(),
        raw in prop::collection::vec((0u32..=359, 0u32..=359, 1usize..6), 0..8),
    ) {
        let hi = lo + width as i32;
        let domain = AxisDomain::circular_window(lo as f64, hi as f64, 360.0);
        prop_assert!((domain.span() - width as f64).abs() < 1e-9);

        // Hazards in unwrapped coordinates inside [lo, hi]
        let hazards: Vec<Hazard> = raw
            .into_iter()
            .map(|(a, b, c)| {
                let (a, b) = (a.min(b).min(width), a.max(b).min(width));
                ((lo + a as i32) as f64, (lo + b as i32) as f64, Region::ALL[c])
            })
            .collect();
        let bands = merge(domain, &hazards);

        let ranges = bands.ranges();
        let total: f64 = ranges.iter().map(|r| r.upper - r.lower).sum();
        prop_assert!((total - width as f64).abs() < 1e-9);
        for range in ranges {
            prop_assert!(range.lower < range.upper, "empty range {}", range);
        }

        // Every integer and half point, including both window ends and the seam
        for k in 0..=(2 * width) {
            let point = lo as f64 + k as f64 * 0.5;
            prop_assert_eq!(bands.region_of(point), oracle(&hazards, point), "at {}", point);
        }
    }
}

/// Window start and width in degrees, biased towards bounds on the 0/360 seam.
fn track_window() -> impl Strategy<Value = (i32, u32)> {
    (1u32..360).prop_flat_map(|width| {
        let w = width as i32;
        (
            prop_oneof![
                -180i32..360,
                Just(0),
                Just(360),
                Just(360 - w),
                Just(-w),
                Just(720 - w),
            ],
            Just(width),
        )
    })
}

#[test]
fn empty_input_is_all_none() {
    let bands = merge(AxisDomain::linear(-10.0, 10.0), &[]);
    assert_eq!(bands.len(), 1);
    assert_eq!(bands.ranges()[0].region, Region::None);
}
