//! Relative-motion math shared by the conflict geometry models.
//!
//! All functions take the relative position `s` and relative velocity `v`
//! of an intruder with respect to the ownship; they are symmetric under
//! swapping the two aircraft.

use crate::models::Vect2;

/// Absolute tolerance used for zero-rate and boundary comparisons.
pub const EPSILON: f64 = 1e-9;

/// True when `a` and `b` are equal up to [`EPSILON`], scaled by magnitude.
pub fn almost_equals(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= EPSILON * scale
}

/// `almost_equals(a, 0.0)`.
pub fn almost_zero(a: f64) -> bool {
    a.abs() <= EPSILON
}

/// Sign with `sign(0) == 1`.
pub fn sign(x: f64) -> f64 {
    if x >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Root of `a*t^2 + b*t + c = 0` selected by `eps` (-1 smaller, +1 larger
/// when `a > 0`). NaN when there is no real root.
pub fn root(a: f64, b: f64, c: f64, eps: f64) -> f64 {
    if a == 0.0 && b == 0.0 {
        return f64::NAN;
    }
    if a == 0.0 {
        return -c / b;
    }
    let discr = b * b - 4.0 * a * c;
    if discr < 0.0 {
        return f64::NAN;
    }
    (-b + eps * discr.sqrt()) / (2.0 * a)
}

/// Time when the horizontal distance equals `d`: entry for `eps = -1`,
/// exit for `eps = 1`. NaN when the trajectory never reaches distance `d`.
pub fn theta_d(s: &Vect2, v: &Vect2, eps: f64, d: f64) -> f64 {
    let a = v.sqv();
    if a == 0.0 {
        return f64::NAN;
    }
    let b = s.dot(v);
    let c = s.sqv() - d * d;
    let discr = b * b - a * c;
    if discr < 0.0 {
        return f64::NAN;
    }
    (-b + eps * discr.sqrt()) / a
}

/// Non-negative iff the relative trajectory line intersects the circle of
/// radius `d` (i.e. `dcpa <= d`, ignoring time).
pub fn delta(s: &Vect2, v: &Vect2, d: f64) -> f64 {
    d * d * v.sqv() - s.det(v).powi(2)
}

/// Time of horizontal closest point of approach (zero for no relative motion).
pub fn tcpa(s: &Vect2, v: &Vect2) -> f64 {
    let sqv = v.sqv();
    if sqv == 0.0 {
        return 0.0;
    }
    -s.dot(v) / sqv
}

/// Horizontal distance at closest point of approach.
pub fn dcpa(s: &Vect2, v: &Vect2) -> f64 {
    s.scal_add(tcpa(s, v), v).norm()
}

/// Time when the vertical separation crosses `h`: entry for `eps = -1`,
/// exit for `eps = 1`. Requires `vz != 0`.
pub fn theta_h(sz: f64, vz: f64, eps: f64, h: f64) -> f64 {
    (eps * sign(vz) * h - sz) / vz
}

/// Time to co-altitude. NaN when the aircraft are not vertically closing
/// and not already co-altitude.
pub fn time_coalt(sz: f64, vz: f64) -> f64 {
    if sz == 0.0 {
        return 0.0;
    }
    if vz == 0.0 {
        return f64::NAN;
    }
    -sz / vz
}
