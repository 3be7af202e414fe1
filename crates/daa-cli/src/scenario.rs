//! Traffic scenarios: JSON snapshots and a few built-in encounters.

use anyhow::Context;
use daa_core::{FrameError, KinematicState, Role, TrafficFrame, Vect3, Velocity};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Names accepted by [`builtin`].
pub const BUILTIN_SCENARIOS: [&str; 4] = ["head-on", "crossing", "converging", "vertical"];

/// One aircraft as written in a scenario file. Positions are local
/// east/north/up meters; velocity is given as track, ground speed and
/// vertical speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficRecord {
    pub id: u32,
    #[serde(default)]
    pub ownship: bool,
    pub east_m: f64,
    pub north_m: f64,
    pub alt_m: f64,
    pub track_deg: f64,
    pub gs_mps: f64,
    #[serde(default)]
    pub vs_mps: f64,
}

impl TrafficRecord {
    pub fn state(&self) -> KinematicState {
        KinematicState {
            id: Some(daa_core::AircraftId(self.id)),
            role: if self.ownship {
                Role::Ownship
            } else {
                Role::Intruder
            },
            position: Vect3::new(self.east_m, self.north_m, self.alt_m),
            velocity: Velocity::from_trk_gs_vs(self.track_deg, self.gs_mps, self.vs_mps),
        }
    }
}

/// A named traffic snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub traffic: Vec<TrafficRecord>,
}

impl Scenario {
    /// Read a scenario from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    /// Built-in scenario name or path to a JSON file.
    pub fn resolve(name_or_path: &str) -> anyhow::Result<Self> {
        match builtin(name_or_path) {
            Some(scenario) => Ok(scenario),
            None => Self::load(Path::new(name_or_path)),
        }
    }

    pub fn frame(&self) -> Result<TrafficFrame, FrameError> {
        TrafficFrame::new(self.traffic.iter().map(TrafficRecord::state).collect())
    }
}

fn record(id: u32, ownship: bool, east_m: f64, north_m: f64, alt_m: f64, track_deg: f64, gs_mps: f64, vs_mps: f64) -> TrafficRecord {
    TrafficRecord {
        id,
        ownship,
        east_m,
        north_m,
        alt_m,
        track_deg,
        gs_mps,
        vs_mps,
    }
}

/// Look up a built-in scenario by name.
pub fn builtin(name: &str) -> Option<Scenario> {
    match name {
        "head-on" => Some(create_head_on_scenario()),
        "crossing" => Some(create_crossing_scenario()),
        "converging" => Some(create_converging_scenario()),
        "vertical" => Some(create_vertical_scenario()),
        _ => None,
    }
}

/// Ownship flying north, one intruder 1 km ahead flying south.
pub fn create_head_on_scenario() -> Scenario {
    Scenario {
        name: "head-on".to_string(),
        traffic: vec![
            record(1, true, 0.0, 0.0, 50.0, 0.0, 10.0, 0.0),
            record(2, false, 0.0, 1000.0, 50.0, 180.0, 10.0, 0.0),
        ],
    }
}

/// Ownship flying north, intruder crossing west to east through its path.
pub fn create_crossing_scenario() -> Scenario {
    Scenario {
        name: "crossing".to_string(),
        traffic: vec![
            record(1, true, 0.0, -300.0, 50.0, 0.0, 10.0, 0.0),
            record(2, false, -300.0, 0.0, 50.0, 90.0, 10.0, 0.0),
        ],
    }
}

/// Four intruders converging on the ownship from the cardinal directions.
pub fn create_converging_scenario() -> Scenario {
    let offset_m = 600.0;
    let mut traffic = vec![record(1, true, 0.0, 0.0, 50.0, 0.0, 5.0, 0.0)];
    traffic.extend([0.0_f64, 90.0, 180.0, 270.0].iter().enumerate().map(|(i, bearing)| {
        let rad = bearing.to_radians();
        record(
            i as u32 + 2,
            false,
            offset_m * rad.sin(),
            offset_m * rad.cos(),
            50.0,
            (bearing + 180.0) % 360.0,
            8.0,
            0.0,
        )
    }));
    Scenario {
        name: "converging".to_string(),
        traffic,
    }
}

/// Ownship climbing at 2 m/s under a level intruder 50 m above, both
/// hovering in place.
pub fn create_vertical_scenario() -> Scenario {
    Scenario {
        name: "vertical".to_string(),
        traffic: vec![
            record(1, true, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0),
            record(2, false, 0.0, 0.0, 50.0, 0.0, 0.0, 0.0),
        ],
    }
}
