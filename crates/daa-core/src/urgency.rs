//! Urgency strategies: which intruder dominates resolution guidance.
//!
//! A strategy never changes the bands, which always aggregate over every
//! intruder. It only selects the intruder highlighted to the guidance layer.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::conflict::{ConflictData, Detection};
use crate::models::{AircraftId, KinematicState};

/// Closed set of urgency strategies. Values are `Copy`, so duplicating the
/// active strategy never shares state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "aircraft", rename_all = "snake_case")]
pub enum UrgencyStrategy {
    /// No preference: every intruder is treated alike.
    #[default]
    None,
    /// Always the given aircraft, while it is in conflict.
    Fixed(AircraftId),
    /// Earliest predicted loss of well-clear, then closest horizontal
    /// approach, then lowest index.
    MostUrgent,
}

impl UrgencyStrategy {
    /// Index into `intruders` of the most urgent aircraft within `[0, t]`,
    /// or `None` when the strategy expresses no preference. A returned
    /// index always refers to an intruder in conflict per `detector`.
    pub fn most_urgent(
        &self,
        ownship: &KinematicState,
        intruders: &[KinematicState],
        detector: &Detection,
        t: f64,
    ) -> Option<usize> {
        match self {
            UrgencyStrategy::None => None,
            UrgencyStrategy::Fixed(id) => intruders
                .iter()
                .position(|intruder| intruder.id == Some(*id))
                .filter(|&index| {
                    detect(detector, ownship, &intruders[index], t)
                        .is_some_and(|data| data.conflict())
                }),
            UrgencyStrategy::MostUrgent => intruders
                .iter()
                .enumerate()
                .filter_map(|(index, intruder)| {
                    detect(detector, ownship, intruder, t)
                        .filter(|data| data.conflict())
                        .map(|data| (index, data))
                })
                .min_by(|(ia, a), (ib, b)| rank(a, b).then(ia.cmp(ib)))
                .map(|(index, _)| index),
        }
    }
}

fn detect(detector: &Detection, ownship: &KinematicState, intruder: &KinematicState, t: f64) -> Option<ConflictData> {
    detector.conflict_detection(ownship, intruder, 0.0, t).ok()
}

fn rank(a: &ConflictData, b: &ConflictData) -> Ordering {
    a.interval
        .time_in
        .total_cmp(&b.interval.time_in)
        .then(a.horizontal_miss_m.total_cmp(&b.horizontal_miss_m))
}
