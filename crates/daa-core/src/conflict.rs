//! Conflict geometry models for detect-and-avoid.
//!
//! A model classifies the relative geometry of the ownship and one intruder
//! into the time interval, within a lookahead horizon `[B, T]`, during which
//! the well-clear volume is violated. Positions and velocities are
//! extrapolated linearly.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{KinematicState, Vect2};
use crate::rules::{check_threshold, validate_horizon, WcvTable};
use crate::spatial::{almost_equals, almost_zero, dcpa, delta, root, tcpa, theta_d, theta_h, time_coalt};

/// Closed time interval `[time_in, time_out]` (seconds from now) of a
/// predicted violation. Empty when `time_in > time_out`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConflictInterval {
    pub time_in: f64,
    pub time_out: f64,
}

impl ConflictInterval {
    pub fn new(time_in: f64, time_out: f64) -> Self {
        Self { time_in, time_out }
    }

    /// The "no conflict" marker.
    pub fn empty() -> Self {
        Self {
            time_in: f64::INFINITY,
            time_out: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.time_in <= self.time_out)
    }

    pub fn conflict(&self) -> bool {
        !self.is_empty()
    }

    pub fn duration(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.time_out - self.time_in
        }
    }

    /// Shift both bounds by `dt` seconds.
    fn shifted(&self, dt: f64) -> Self {
        if self.is_empty() {
            *self
        } else {
            Self::new(self.time_in + dt, self.time_out + dt)
        }
    }
}

/// Vertical well-clear criterion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VerticalCriterion {
    /// Inside ZTHR, or closing with time to co-altitude below TCOA.
    Tcoa,
    /// Like `Tcoa`, except that aircraft already diverging vertically with
    /// more than `znhz` meters of separation are in the non-hazard zone.
    Vmod { znhz: f64 },
}

impl VerticalCriterion {
    fn validate(&self, table: &WcvTable) -> Result<(), ConfigError> {
        match *self {
            VerticalCriterion::Tcoa => Ok(()),
            VerticalCriterion::Vmod { znhz } => {
                check_threshold("znhz", znhz)?;
                if znhz > table.zthr {
                    return Err(ConfigError::NonHazardZoneTooTall {
                        znhz,
                        zthr: table.zthr,
                    });
                }
                Ok(())
            }
        }
    }

    /// Current vertical violation for relative altitude `sz` and rate `vz`.
    pub fn violation(&self, table: &WcvTable, sz: f64, vz: f64) -> bool {
        let closing_soon = vz != 0.0 && sz * vz <= 0.0 && time_coalt(sz, vz) <= table.tcoa;
        let base = sz.abs() <= table.zthr || closing_soon;
        match *self {
            VerticalCriterion::Tcoa => base,
            VerticalCriterion::Vmod { znhz } => {
                let diverging = !almost_zero(vz) && sz * vz > 0.0;
                base && !(diverging && sz.abs() > znhz)
            }
        }
    }

    /// Interval within `[b, t]` of vertical violation.
    pub fn interval(&self, table: &WcvTable, b: f64, t: f64, sz: f64, vz: f64) -> ConflictInterval {
        let base = tcoa_interval(table, b, t, sz, vz);
        match *self {
            VerticalCriterion::Tcoa => base,
            VerticalCriterion::Vmod { znhz } => {
                if base.is_empty() || almost_zero(vz) {
                    return base;
                }
                // Past this time the aircraft diverge with more than znhz between them
                let leave_nhz = theta_h(sz, vz, 1.0, znhz);
                let time_out = base.time_out.min(leave_nhz);
                if time_out < base.time_in {
                    ConflictInterval::empty()
                } else {
                    ConflictInterval::new(base.time_in, time_out)
                }
            }
        }
    }
}

fn tcoa_interval(table: &WcvTable, b: f64, t: f64, sz: f64, vz: f64) -> ConflictInterval {
    if almost_zero(vz) {
        // Constant separation over the whole horizon
        return if sz.abs() <= table.zthr {
            ConflictInterval::new(b, t)
        } else {
            ConflictInterval::empty()
        };
    }
    let act_h = table.zthr.max(vz.abs() * table.tcoa);
    let entry = theta_h(sz, vz, -1.0, act_h);
    let exit = theta_h(sz, vz, 1.0, table.zthr);
    if t < entry || exit < b {
        return ConflictInterval::empty();
    }
    ConflictInterval::new(b.max(entry), t.min(exit))
}

/// Horizontal well-clear criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalCriterion {
    /// Modified tau: `(DTHR^2 - |s|^2) / (s . v)`.
    TauMod,
    /// Time to horizontal closest point of approach.
    Tcpa,
}

impl HorizontalCriterion {
    /// Time variable of the criterion; negative when not applicable.
    fn tvar(&self, table: &WcvTable, s: &Vect2, v: &Vect2) -> f64 {
        let sdotv = s.dot(v);
        match self {
            HorizontalCriterion::TauMod => {
                if sdotv < 0.0 {
                    (table.dthr * table.dthr - s.sqv()) / sdotv
                } else {
                    -1.0
                }
            }
            HorizontalCriterion::Tcpa => {
                if sdotv < 0.0 {
                    tcpa(s, v)
                } else {
                    -1.0
                }
            }
        }
    }

    pub fn violation(&self, table: &WcvTable, s: &Vect2, v: &Vect2) -> bool {
        if s.sqv() <= table.dthr * table.dthr {
            return true;
        }
        if dcpa(s, v) <= table.dthr {
            let tvar = self.tvar(table, s, v);
            return 0.0 <= tvar && tvar <= table.tthr;
        }
        false
    }

    /// Interval within `[0, t]` of horizontal violation.
    pub fn interval(&self, table: &WcvTable, t: f64, s: &Vect2, v: &Vect2) -> ConflictInterval {
        let sqs = s.sqv();
        let sqd = table.dthr * table.dthr;
        let a = v.sqv();

        if almost_zero(a) && sqs <= sqd {
            return ConflictInterval::new(0.0, t);
        }
        if sqs <= sqd {
            return ConflictInterval::new(0.0, t.min(theta_d(s, v, 1.0, table.dthr)));
        }
        let sdotv = s.dot(v);
        if sdotv >= 0.0 || delta(s, v, table.dthr) < 0.0 {
            return ConflictInterval::empty();
        }

        let entry = match self {
            HorizontalCriterion::TauMod => {
                // First time with |s + tv|^2 - D^2 <= -TTHR * (s + tv).v
                let entry = root(a, 2.0 * sdotv + table.tthr * a, sqs + table.tthr * sdotv - sqd, -1.0);
                if entry.is_nan() {
                    return ConflictInterval::empty();
                }
                entry
            }
            HorizontalCriterion::Tcpa => {
                let entry_d = theta_d(s, v, -1.0, table.dthr);
                entry_d.min(tcpa(s, v) - table.tthr)
            }
        };
        let exit = theta_d(s, v, 1.0, table.dthr);
        if entry > t || exit < 0.0 {
            return ConflictInterval::empty();
        }
        ConflictInterval::new(entry.max(0.0), t.min(exit))
    }
}

/// Well-clear volume: a horizontal and a vertical criterion over one
/// threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WellClear {
    table: WcvTable,
    horizontal: HorizontalCriterion,
    vertical: VerticalCriterion,
}

impl WellClear {
    pub fn new(
        table: WcvTable,
        horizontal: HorizontalCriterion,
        vertical: VerticalCriterion,
    ) -> Result<Self, ConfigError> {
        table.validate()?;
        vertical.validate(&table)?;
        Ok(Self {
            table,
            horizontal,
            vertical,
        })
    }

    pub fn table(&self) -> &WcvTable {
        &self.table
    }

    pub fn horizontal(&self) -> HorizontalCriterion {
        self.horizontal
    }

    pub fn vertical(&self) -> VerticalCriterion {
        self.vertical
    }

    pub fn vertical_interval(&self, b: f64, t: f64, sz: f64, vz: f64) -> ConflictInterval {
        self.vertical.interval(&self.table, b, t, sz, vz)
    }

    pub fn horizontal_interval(&self, t: f64, s: &Vect2, v: &Vect2) -> ConflictInterval {
        self.horizontal.interval(&self.table, t, s, v)
    }

    pub fn violation(&self, ownship: &KinematicState, intruder: &KinematicState) -> bool {
        let s = ownship.relative_position(intruder);
        let v = ownship.relative_velocity(intruder);
        self.horizontal.violation(&self.table, &s.vect2(), &v.vect2())
            && self.vertical.violation(&self.table, s.z, v.z)
    }

    /// Combined interval: the horizontal criterion evaluated within the
    /// vertical violation interval.
    fn interval(&self, ownship: &KinematicState, intruder: &KinematicState, b: f64, t: f64) -> ConflictInterval {
        let s = ownship.relative_position(intruder);
        let v = ownship.relative_velocity(intruder);
        let vint = self.vertical_interval(b, t, s.z, v.z);
        if vint.is_empty() {
            return vint;
        }
        let s2 = s.vect2();
        let v2 = v.vect2();
        let step = s2.scal_add(vint.time_in, &v2);
        if almost_equals(vint.time_in, vint.time_out) {
            return if self.horizontal.violation(&self.table, &step, &v2) {
                vint
            } else {
                ConflictInterval::empty()
            };
        }
        self.horizontal_interval(vint.time_out - vint.time_in, &step, &v2)
            .shifted(vint.time_in)
    }

    fn scaled(&self, factor: f64) -> Self {
        let table = self.table.scaled(factor);
        let vertical = match self.vertical {
            VerticalCriterion::Vmod { znhz } => VerticalCriterion::Vmod { znhz: znhz * factor },
            other => other,
        };
        Self {
            table,
            horizontal: self.horizontal,
            vertical,
        }
    }
}

/// Protected cylinder without time thresholds, used for near-mid-air
/// collision checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cylinder {
    d: f64,
    h: f64,
}

impl Cylinder {
    pub fn new(d: f64, h: f64) -> Result<Self, ConfigError> {
        check_threshold("nmac_d", d)?;
        check_threshold("nmac_h", h)?;
        Ok(Self { d, h })
    }

    pub fn radius(&self) -> f64 {
        self.d
    }

    pub fn half_height(&self) -> f64 {
        self.h
    }

    pub fn vertical_interval(&self, b: f64, t: f64, sz: f64, vz: f64) -> ConflictInterval {
        if almost_zero(vz) {
            return if sz.abs() <= self.h {
                ConflictInterval::new(b, t)
            } else {
                ConflictInterval::empty()
            };
        }
        let entry = theta_h(sz, vz, -1.0, self.h);
        let exit = theta_h(sz, vz, 1.0, self.h);
        if t < entry || exit < b {
            return ConflictInterval::empty();
        }
        ConflictInterval::new(b.max(entry), t.min(exit))
    }

    pub fn horizontal_interval(&self, t: f64, s: &Vect2, v: &Vect2) -> ConflictInterval {
        if almost_zero(v.sqv()) {
            return if s.sqv() <= self.d * self.d {
                ConflictInterval::new(0.0, t)
            } else {
                ConflictInterval::empty()
            };
        }
        if delta(s, v, self.d) < 0.0 {
            return ConflictInterval::empty();
        }
        let entry = theta_d(s, v, -1.0, self.d);
        let exit = theta_d(s, v, 1.0, self.d);
        if entry > t || exit < 0.0 {
            return ConflictInterval::empty();
        }
        ConflictInterval::new(entry.max(0.0), t.min(exit))
    }

    pub fn violation(&self, ownship: &KinematicState, intruder: &KinematicState) -> bool {
        let s = ownship.relative_position(intruder);
        s.vect2().sqv() <= self.d * self.d && s.z.abs() <= self.h
    }

    fn interval(&self, ownship: &KinematicState, intruder: &KinematicState, b: f64, t: f64) -> ConflictInterval {
        let s = ownship.relative_position(intruder);
        let v = ownship.relative_velocity(intruder);
        let vint = self.vertical_interval(b, t, s.z, v.z);
        if vint.is_empty() {
            return vint;
        }
        let hint = self.horizontal_interval(t, &s.vect2(), &v.vect2());
        let time_in = vint.time_in.max(hint.time_in);
        let time_out = vint.time_out.min(hint.time_out);
        if hint.is_empty() || time_in > time_out {
            ConflictInterval::empty()
        } else {
            ConflictInterval::new(time_in, time_out)
        }
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            d: self.d * factor,
            h: self.h * factor,
        }
    }
}

/// Result of one pairwise detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConflictData {
    pub interval: ConflictInterval,
    /// Violation at the current time
    pub violation: bool,
    /// Horizontal distance at closest approach within `[0, T]` (meters)
    pub horizontal_miss_m: f64,
}

impl ConflictData {
    pub fn conflict(&self) -> bool {
        self.interval.conflict()
    }
}

/// Conflict detection model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum Detection {
    WellClear(WellClear),
    Cylinder(Cylinder),
}

impl Detection {
    /// Conflict interval within `[b, t]` for the pair.
    pub fn conflict(
        &self,
        ownship: &KinematicState,
        intruder: &KinematicState,
        b: f64,
        t: f64,
    ) -> Result<ConflictInterval, ConfigError> {
        validate_horizon(b, t)?;
        Ok(match self {
            Detection::WellClear(wcv) => wcv.interval(ownship, intruder, b, t),
            Detection::Cylinder(cyl) => cyl.interval(ownship, intruder, b, t),
        })
    }

    pub fn violation(&self, ownship: &KinematicState, intruder: &KinematicState) -> bool {
        match self {
            Detection::WellClear(wcv) => wcv.violation(ownship, intruder),
            Detection::Cylinder(cyl) => cyl.violation(ownship, intruder),
        }
    }

    pub fn vertical_interval(&self, b: f64, t: f64, sz: f64, vz: f64) -> ConflictInterval {
        match self {
            Detection::WellClear(wcv) => wcv.vertical_interval(b, t, sz, vz),
            Detection::Cylinder(cyl) => cyl.vertical_interval(b, t, sz, vz),
        }
    }

    pub fn horizontal_interval(&self, t: f64, s: &Vect2, v: &Vect2) -> ConflictInterval {
        match self {
            Detection::WellClear(wcv) => wcv.horizontal_interval(t, s, v),
            Detection::Cylinder(cyl) => cyl.horizontal_interval(t, s, v),
        }
    }

    /// Interval, current violation and horizontal miss distance in one pass.
    pub fn conflict_detection(
        &self,
        ownship: &KinematicState,
        intruder: &KinematicState,
        b: f64,
        t: f64,
    ) -> Result<ConflictData, ConfigError> {
        let interval = self.conflict(ownship, intruder, b, t)?;
        let s = ownship.relative_position(intruder).vect2();
        let v = ownship.relative_velocity(intruder).vect2();
        let t_cpa = tcpa(&s, &v).clamp(0.0, t);
        Ok(ConflictData {
            interval,
            violation: self.violation(ownship, intruder),
            horizontal_miss_m: s.scal_add(t_cpa, &v).norm(),
        })
    }

    /// Same model with distance thresholds multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        match self {
            Detection::WellClear(wcv) => Detection::WellClear(wcv.scaled(factor)),
            Detection::Cylinder(cyl) => Detection::Cylinder(cyl.scaled(factor)),
        }
    }
}
