//! Core data models for the DAA decision core.
//!
//! Positions are local east/north/up coordinates in meters and velocities
//! are east/north/up components in meters per second. Track angles are in
//! degrees, clockwise from true north.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

use crate::error::FrameError;

/// Planar vector (east, north).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vect2 {
    pub x: f64,
    pub y: f64,
}

impl Vect2 {
    pub const ZERO: Vect2 = Vect2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(&self, other: &Vect2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (determinant of the two vectors).
    pub fn det(&self, other: &Vect2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Squared norm.
    pub fn sqv(&self) -> f64 {
        self.dot(self)
    }

    pub fn norm(&self) -> f64 {
        self.sqv().sqrt()
    }

    pub fn scal(&self, k: f64) -> Vect2 {
        Vect2::new(self.x * k, self.y * k)
    }

    /// Returns `self + k * v`.
    pub fn scal_add(&self, k: f64, v: &Vect2) -> Vect2 {
        Vect2::new(self.x + k * v.x, self.y + k * v.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vect2 {
    type Output = Vect2;

    fn add(self, rhs: Vect2) -> Vect2 {
        Vect2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vect2 {
    type Output = Vect2;

    fn sub(self, rhs: Vect2) -> Vect2 {
        Vect2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vect2 {
    type Output = Vect2;

    fn neg(self) -> Vect2 {
        Vect2::new(-self.x, -self.y)
    }
}

/// Position or displacement (east, north, up) in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vect3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vect3 {
    pub const ZERO: Vect3 = Vect3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Horizontal projection.
    pub fn vect2(&self) -> Vect2 {
        Vect2::new(self.x, self.y)
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Position after moving along `v` for `t` seconds.
    pub fn linear(&self, v: &Velocity, t: f64) -> Vect3 {
        Vect3::new(self.x + v.x * t, self.y + v.y * t, self.z + v.z * t)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Sub for Vect3 {
    type Output = Vect3;

    fn sub(self, rhs: Vect3) -> Vect3 {
        Vect3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Velocity (east, north, up) in meters per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Build from track (degrees clockwise from north), ground speed and
    /// vertical speed.
    pub fn from_trk_gs_vs(track_deg: f64, gs_mps: f64, vs_mps: f64) -> Self {
        let trk = track_deg.to_radians();
        Self {
            x: gs_mps * trk.sin(),
            y: gs_mps * trk.cos(),
            z: vs_mps,
        }
    }

    /// Track in degrees, normalized to [0, 360). Zero when not moving.
    pub fn track_deg(&self) -> f64 {
        if self.x == 0.0 && self.y == 0.0 {
            return 0.0;
        }
        let deg = self.x.atan2(self.y).to_degrees();
        let wrapped = deg.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negative angles
        if wrapped >= 360.0 {
            0.0
        } else {
            wrapped
        }
    }

    pub fn gs(&self) -> f64 {
        self.vect2().norm()
    }

    pub fn vs(&self) -> f64 {
        self.z
    }

    pub fn vect2(&self) -> Vect2 {
        Vect2::new(self.x, self.y)
    }

    pub fn with_track(&self, track_deg: f64) -> Velocity {
        Velocity::from_trk_gs_vs(track_deg, self.gs(), self.z)
    }

    pub fn with_gs(&self, gs_mps: f64) -> Velocity {
        Velocity::from_trk_gs_vs(self.track_deg(), gs_mps, self.z)
    }

    pub fn with_vs(&self, vs_mps: f64) -> Velocity {
        Velocity::new(self.x, self.y, vs_mps)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Sub for Velocity {
    type Output = Velocity;

    fn sub(self, rhs: Velocity) -> Velocity {
        Velocity::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Aircraft identity. Absence of an identity is `Option::<AircraftId>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AircraftId(pub u32);

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AC{:04}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Ownship,
    #[default]
    Intruder,
}

/// Immutable kinematic snapshot of one aircraft for one monitoring cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicState {
    #[serde(default)]
    pub id: Option<AircraftId>,
    #[serde(default)]
    pub role: Role,
    pub position: Vect3,
    pub velocity: Velocity,
}

impl KinematicState {
    pub fn ownship(id: u32, position: Vect3, velocity: Velocity) -> Self {
        Self {
            id: Some(AircraftId(id)),
            role: Role::Ownship,
            position,
            velocity,
        }
    }

    pub fn intruder(id: u32, position: Vect3, velocity: Velocity) -> Self {
        Self {
            id: Some(AircraftId(id)),
            role: Role::Intruder,
            position,
            velocity,
        }
    }

    pub fn is_ownship(&self) -> bool {
        self.role == Role::Ownship
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }

    /// Same aircraft flying a different velocity.
    pub fn with_velocity(&self, velocity: Velocity) -> Self {
        Self { velocity, ..*self }
    }

    /// Position extrapolated `t` seconds ahead along the current velocity.
    pub fn predict(&self, t: f64) -> Vect3 {
        self.position.linear(&self.velocity, t)
    }

    /// Relative position of `other` with respect to `self` (other - self).
    pub fn relative_position(&self, other: &KinematicState) -> Vect3 {
        other.position - self.position
    }

    /// Relative velocity of `other` with respect to `self` (other - self).
    pub fn relative_velocity(&self, other: &KinematicState) -> Velocity {
        other.velocity - self.velocity
    }
}

/// One cycle's traffic picture: exactly one ownship plus its intruders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficFrame {
    ownship: KinematicState,
    intruders: Vec<KinematicState>,
}

impl TrafficFrame {
    /// Build a frame from an ordered list of states. Intruder order is kept,
    /// so indices returned by urgency strategies refer to this order.
    pub fn new(states: Vec<KinematicState>) -> Result<Self, FrameError> {
        let ownship_count = states.iter().filter(|s| s.is_ownship()).count();
        if ownship_count != 1 {
            return Err(FrameError::OwnshipCount(ownship_count));
        }
        if let Some(index) = states.iter().position(|s| !s.is_finite()) {
            return Err(FrameError::NonFiniteState { index });
        }

        let mut ownship = None;
        let mut intruders = Vec::with_capacity(states.len().saturating_sub(1));
        for state in states {
            if state.is_ownship() {
                ownship = Some(state);
            } else {
                intruders.push(state);
            }
        }

        match ownship {
            Some(ownship) => Ok(Self { ownship, intruders }),
            None => Err(FrameError::OwnshipCount(0)),
        }
    }

    pub fn ownship(&self) -> &KinematicState {
        &self.ownship
    }

    pub fn intruders(&self) -> &[KinematicState] {
        &self.intruders
    }
}
