//! Compass angle helpers
//!
//! Absolute angles live in `[0, 2π)`, relative angles in `(-π, π]`.

use std::f64::consts::{PI, TAU};

use crate::error::{CoreError, CoreResult};
use crate::util::vec2::Vec2;

/// Bearing used when the two points of a bearing computation coincide
pub const FALLBACK_BEARING: f64 = 0.0;

/// Normalize to `[0, 2π)`
#[inline]
pub fn normal_absolute(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// Normalize to `(-π, π]`
#[inline]
pub fn normal_relative(angle: f64) -> f64 {
    let a = normal_absolute(angle);
    if a > PI {
        a - TAU
    } else {
        a
    }
}

/// Absolute compass bearing from one point to another
pub fn try_bearing(from: Vec2, to: Vec2) -> CoreResult<f64> {
    (to - from).heading().ok_or_else(|| CoreError::degenerate(from))
}

/// Absolute bearing, falling back to [`FALLBACK_BEARING`] for coincident points
pub fn bearing(from: Vec2, to: Vec2) -> f64 {
    try_bearing(from, to).unwrap_or(FALLBACK_BEARING)
}

/// Sign that never returns zero; zero counts as positive
#[inline]
pub fn sign(value: f64) -> f64 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_normal_absolute() {
        assert!((normal_absolute(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < EPSILON);
        assert!((normal_absolute(TAU + 1.0) - 1.0).abs() < EPSILON);
        assert_eq!(normal_absolute(0.0), 0.0);
        assert!(normal_absolute(-1e-18) < TAU);
    }

    #[test]
    fn test_normal_relative() {
        assert!((normal_relative(3.0 * FRAC_PI_2) + FRAC_PI_2).abs() < EPSILON);
        assert!((normal_relative(PI) - PI).abs() < EPSILON);
        assert!((normal_relative(-PI) - PI).abs() < EPSILON);
        assert!((normal_relative(359f64.to_radians() - 1f64.to_radians()) + 2f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_cardinal() {
        let o = Vec2::new(100.0, 100.0);
        assert!((bearing(o, Vec2::new(100.0, 200.0)) - 0.0).abs() < EPSILON);
        assert!((bearing(o, Vec2::new(200.0, 100.0)) - FRAC_PI_2).abs() < EPSILON);
        assert!((bearing(o, Vec2::new(100.0, 0.0)) - PI).abs() < EPSILON);
        assert!((bearing(o, Vec2::new(0.0, 100.0)) - 3.0 * FRAC_PI_2).abs() < EPSILON);
    }

    #[test]
    fn test_bearing_degenerate_falls_back() {
        let p = Vec2::new(5.0, 5.0);
        assert!(matches!(try_bearing(p, p), Err(CoreError::GeometryDegenerate { .. })));
        assert_eq!(bearing(p, p), FALLBACK_BEARING);
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign(0.0), 1.0);
        assert_eq!(sign(-0.1), -1.0);
    }
}
