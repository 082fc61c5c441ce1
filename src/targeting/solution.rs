use serde::{Deserialize, Serialize};

use crate::util::vec2::Vec2;

/// How the firing bearing was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AimMethod {
    /// Straight from the converged intercept point
    Intercept,
    /// Head-on bearing corrected by the learned guess factor
    GuessFactor,
}

/// A committed aiming decision for one shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiringSolution {
    /// Where the agent will be when the shot leaves the gun
    pub shooter: Vec2,
    /// Predicted target position at impact
    pub target_point: Vec2,
    /// Shooter to target point
    pub distance: f64,
    /// Absolute gun bearing to fire along
    pub bearing: f64,
    pub power: f64,
    pub target: String,
    pub fire_tick: u64,
    pub method: AimMethod,
}

impl FiringSolution {
    /// Gun turn needed from `gun_heading`, in (-π, π]
    pub fn gun_turn(&self, gun_heading: f64) -> f64 {
        crate::util::angle::normal_relative(self.bearing - gun_heading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_gun_turn_takes_short_way() {
        let solution = FiringSolution {
            shooter: Vec2::ZERO,
            target_point: Vec2::new(0.0, 100.0),
            distance: 100.0,
            bearing: 0.1,
            power: 2.0,
            target: "Walls".to_string(),
            fire_tick: 3,
            method: AimMethod::Intercept,
        };
        assert!((solution.gun_turn(2.0 * PI - 0.1) - 0.2).abs() < 1e-12);
        assert!((solution.gun_turn(FRAC_PI_2) - (0.1 - FRAC_PI_2)).abs() < 1e-12);
    }
}
