//! Per-cycle DAA engine.
//!
//! The engine owns the active configuration and everything derived from it.
//! A cycle reads one traffic frame and produces a report with per-intruder
//! conflict data, the urgency pick and bands for the three maneuver axes.

use serde::Serialize;
use std::fmt;

use crate::bands::{compute_axis, Axis, Bands, Region, SearchContext};
use crate::config::DaaConfig;
use crate::conflict::{ConflictInterval, Detection};
use crate::diagnostics::Diagnostics;
use crate::error::ConfigError;
use crate::models::{AircraftId, TrafficFrame};
use crate::urgency::UrgencyStrategy;

/// Conflict summary for one intruder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntruderReport {
    /// Position among the frame's intruders
    pub index: usize,
    pub id: Option<AircraftId>,
    pub interval: ConflictInterval,
    pub violation: bool,
    pub horizontal_miss_m: f64,
    /// Most severe alert level in conflict, `None` when clear
    pub alert: Region,
}

/// Output of one monitoring cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaaReport {
    pub cycle: u64,
    pub ownship: Option<AircraftId>,
    pub intruders: Vec<IntruderReport>,
    pub most_urgent: Option<usize>,
    pub track: Bands,
    pub ground_speed: Bands,
    pub vertical_speed: Bands,
}

impl DaaReport {
    pub fn bands(&self, axis: Axis) -> &Bands {
        match axis {
            Axis::Track => &self.track,
            Axis::GroundSpeed => &self.ground_speed,
            Axis::VerticalSpeed => &self.vertical_speed,
        }
    }

    /// Most severe alert over all intruders.
    pub fn max_alert(&self) -> Region {
        self.intruders
            .iter()
            .map(|intruder| intruder.alert)
            .max()
            .unwrap_or(Region::None)
    }

    pub fn most_urgent_intruder(&self) -> Option<&IntruderReport> {
        self.most_urgent.and_then(|index| self.intruders.get(index))
    }
}

fn fmt_id(id: Option<AircraftId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for DaaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cycle {} ownship {}", self.cycle, fmt_id(self.ownship))?;
        match self.most_urgent_intruder() {
            Some(intruder) => writeln!(f, "Most urgent: {} (#{})", fmt_id(intruder.id), intruder.index)?,
            None => writeln!(f, "Most urgent: none")?,
        }
        for intruder in &self.intruders {
            write!(f, "Intruder {} (#{}): ", fmt_id(intruder.id), intruder.index)?;
            if intruder.interval.conflict() {
                write!(
                    f,
                    "conflict [{:.2}, {:.2}] s",
                    intruder.interval.time_in, intruder.interval.time_out
                )?;
            } else {
                write!(f, "clear")?;
            }
            if intruder.violation {
                write!(f, ", violation")?;
            }
            writeln!(f, ", alert {}", intruder.alert)?;
        }
        for axis in Axis::ALL {
            writeln!(f, "{axis}:")?;
            write!(f, "{}", self.bands(axis))?;
        }
        Ok(())
    }
}

/// DAA decision engine. Configuration changes take `&mut self`, so they
/// can only land between cycles.
#[derive(Debug, Clone)]
pub struct DaaEngine {
    config: DaaConfig,
    detector: Detection,
    context: SearchContext,
    urgency: UrgencyStrategy,
    diagnostics: Diagnostics,
    cycles: u64,
}

impl DaaEngine {
    pub fn new(config: DaaConfig, diagnostics: Diagnostics) -> Result<Self, ConfigError> {
        config.validate()?;
        let detector = config.detector()?;
        let context = config.search_context(diagnostics.clone())?;
        let urgency = config.urgency()?;
        tracing::info!(
            "[{}] DAA engine configured: lookahead {}s, {} alert levels, urgency {:?}",
            diagnostics.label(),
            config.lookahead_time,
            context.levels.len(),
            urgency
        );
        Ok(Self {
            config,
            detector,
            context,
            urgency,
            diagnostics,
            cycles: 0,
        })
    }

    /// Replace the active configuration. On error the previous
    /// configuration stays active.
    pub fn reload(&mut self, config: DaaConfig) -> Result<(), ConfigError> {
        match DaaEngine::new(config, self.diagnostics.clone()) {
            Ok(next) => {
                *self = Self {
                    cycles: self.cycles,
                    ..next
                };
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[{}] Rejected configuration reload: {}", self.diagnostics.label(), err);
                Err(err)
            }
        }
    }

    pub fn config(&self) -> &DaaConfig {
        &self.config
    }

    pub fn detector(&self) -> &Detection {
        &self.detector
    }

    pub fn urgency(&self) -> UrgencyStrategy {
        self.urgency
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Urgency pick for `frame` over the lookahead time.
    pub fn most_urgent(&self, frame: &TrafficFrame) -> Option<usize> {
        self.urgency.most_urgent(
            frame.ownship(),
            frame.intruders(),
            &self.detector,
            self.config.lookahead_time,
        )
    }

    /// Run one monitoring cycle.
    pub fn run_cycle(&mut self, frame: &TrafficFrame) -> DaaReport {
        self.cycles += 1;
        let span = self.diagnostics.cycle_span(self.cycles);
        let _enter = span.enter();

        let ownship = frame.ownship();
        let b = self.config.activation_time;
        let t = self.config.lookahead_time;

        let intruders: Vec<IntruderReport> = frame
            .intruders()
            .iter()
            .enumerate()
            .map(|(index, intruder)| {
                let alert = self.context.alert_region(ownship, intruder);
                let report = match self.detector.conflict_detection(ownship, intruder, b, t) {
                    Ok(data) => IntruderReport {
                        index,
                        id: intruder.id,
                        interval: data.interval,
                        violation: data.violation,
                        horizontal_miss_m: data.horizontal_miss_m,
                        alert,
                    },
                    Err(err) => {
                        tracing::warn!("Conflict detection failed for intruder #{}: {}", index, err);
                        IntruderReport {
                            index,
                            id: intruder.id,
                            interval: ConflictInterval::empty(),
                            violation: false,
                            horizontal_miss_m: f64::NAN,
                            alert: Region::Unknown,
                        }
                    }
                };
                if self.diagnostics.is_verbose() {
                    tracing::debug!(
                        "Intruder {} (#{}): interval [{:.2}, {:.2}], alert {}",
                        fmt_id(report.id),
                        index,
                        report.interval.time_in,
                        report.interval.time_out,
                        report.alert
                    );
                }
                report
            })
            .collect();

        let most_urgent = self.most_urgent(frame);
        let bands = |axis: Axis| {
            compute_axis(
                axis,
                &self.config.axis(axis),
                &self.context,
                ownship,
                frame.intruders(),
            )
        };

        let report = DaaReport {
            cycle: self.cycles,
            ownship: ownship.id,
            most_urgent,
            track: bands(Axis::Track),
            ground_speed: bands(Axis::GroundSpeed),
            vertical_speed: bands(Axis::VerticalSpeed),
            intruders,
        };

        let alert = report.max_alert();
        if alert.is_conflict_band() {
            tracing::warn!(
                "[{}] Cycle {}: {} alert, most urgent {:?}",
                self.diagnostics.label(),
                self.cycles,
                alert,
                report.most_urgent_intruder().and_then(|i| i.id)
            );
        } else {
            tracing::debug!(
                "[{}] Cycle {}: {} intruder(s), clear",
                self.diagnostics.label(),
                self.cycles,
                report.intruders.len()
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KinematicState, Vect3, Velocity};

    fn head_on_frame() -> TrafficFrame {
        TrafficFrame::new(vec![
            KinematicState::ownship(1, Vect3::ZERO, Velocity::from_trk_gs_vs(0.0, 10.0, 0.0)),
            KinematicState::intruder(
                2,
                Vect3::new(0.0, 1000.0, 0.0),
                Velocity::from_trk_gs_vs(180.0, 10.0, 0.0),
            ),
            KinematicState::intruder(
                3,
                Vect3::new(5000.0, 0.0, 0.0),
                Velocity::from_trk_gs_vs(0.0, 10.0, 0.0),
            ),
        ])
        .unwrap()
    }

    fn engine(config: DaaConfig) -> DaaEngine {
        DaaEngine::new(config, Diagnostics::new("test", true)).unwrap()
    }

    #[test]
    fn cycle_reports_conflicts_and_bands() {
        let mut engine = engine(DaaConfig {
            urgency: crate::config::UrgencyKind::MostUrgent,
            ..DaaConfig::default()
        });
        let report = engine.run_cycle(&head_on_frame());

        assert_eq!(report.cycle, 1);
        assert_eq!(report.ownship, Some(AircraftId(1)));
        assert_eq!(report.intruders.len(), 2);
        assert!(report.intruders[0].interval.conflict());
        assert!(report.intruders[0].alert.is_conflict_band());
        assert!(!report.intruders[1].interval.conflict());
        assert_eq!(report.intruders[1].alert, Region::None);
        assert_eq!(report.most_urgent, Some(0));

        assert_eq!(report.track.region_of(180.0), Region::None);
        assert!(report.track.region_of(0.0).is_conflict_band());
        for axis in Axis::ALL {
            assert!(!report.bands(axis).is_empty());
        }
    }

    #[test]
    fn alert_region_follows_levels() {
        // Nominal entry is about 29.7 s, just inside the 30 s NEAR alerting time
        let mut engine = engine(DaaConfig::default());
        let report = engine.run_cycle(&head_on_frame());
        assert_eq!(report.intruders[0].alert, Region::Near);
        assert_eq!(report.max_alert(), Region::Near);

        let mut engine = engine_with_near_time(25.0);
        let report = engine.run_cycle(&head_on_frame());
        assert_eq!(report.intruders[0].alert, Region::Mid);
    }

    fn engine_with_near_time(near_alerting_time: f64) -> DaaEngine {
        engine(DaaConfig {
            near_alerting_time,
            ..DaaConfig::default()
        })
    }

    #[test]
    fn null_urgency_by_default() {
        let engine = engine(DaaConfig::default());
        assert_eq!(engine.most_urgent(&head_on_frame()), None);
    }

    #[test]
    fn text_report_lists_ranges() {
        let mut engine = engine(DaaConfig::default());
        let text = engine.run_cycle(&head_on_frame()).to_string();
        assert!(text.starts_with("Cycle 1 ownship AC0001"));
        assert!(text.contains("Most urgent: none"));
        assert!(text.contains("Intruder AC0003 (#1): clear, alert NONE"));
        assert!(text.contains("track:\n  [0.00, "));
        assert!(text.contains("ground_speed:"));
        assert!(text.contains("vertical_speed:"));
        assert!(text.contains("] -> NONE"));
    }

    #[test]
    fn report_serializes() {
        let mut engine = engine(DaaConfig::default());
        let report = engine.run_cycle(&head_on_frame());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ownship"], 1);
        assert_eq!(json["track"]["ranges"][0]["lower"], 0.0);
        assert!(json["intruders"].as_array().is_some_and(|a| a.len() == 2));
    }

    #[test]
    fn reload_keeps_previous_config_on_error() {
        let mut engine = engine(DaaConfig::default());
        engine.run_cycle(&head_on_frame());

        let bad = DaaConfig {
            activation_time: 90.0,
            ..DaaConfig::default()
        };
        assert!(engine.reload(bad).is_err());
        assert_eq!(engine.config(), &DaaConfig::default());

        let good = DaaConfig {
            dthr: 80.0,
            ..DaaConfig::default()
        };
        engine.reload(good.clone()).unwrap();
        assert_eq!(engine.config(), &good);
        assert_eq!(engine.cycles(), 1);
        assert_eq!(engine.run_cycle(&head_on_frame()).cycle, 2);
    }

    #[test]
    fn invalid_config_refuses_to_start() {
        let config = DaaConfig {
            zthr: -5.0,
            ..DaaConfig::default()
        };
        assert!(DaaEngine::new(config, Diagnostics::default()).is_err());
    }
}
