//! Projectile intercept by fixed-point iteration
//!
//! Each step advances the candidate flight time by one tick, re-predicts the
//! target and compares the shooter-to-target distance with how far the bullet
//! has flown. The loop is bounded by the arena diagonal: once the bullet has
//! travelled further than any two points in the arena can be apart, there is
//! no intercept.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{CoreError, CoreResult};
use crate::game::arena::Arena;
use crate::game::constants::rules::{bullet_speed, HALF_BODY};
use crate::tracking::recording::Recording;
use crate::util::angle::bearing;
use crate::util::vec2::Vec2;

/// A converged intercept
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intercept {
    /// Predicted target position at impact
    pub point: Vec2,
    /// Absolute bearing from the shooter to `point`
    pub bearing: f64,
    /// Flight time in ticks
    pub ticks: u64,
    /// Bullet travel at impact
    pub travelled: f64,
    /// Whether the aim point was frozen at the arena edge
    pub frozen: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct InterceptSolver {
    arena: Arena,
    tolerance: f64,
    freeze_at_walls: bool,
}

impl InterceptSolver {
    pub fn new(arena: Arena) -> Self {
        Self {
            arena,
            tolerance: HALF_BODY,
            freeze_at_walls: true,
        }
    }

    /// Keep extrapolating past the walls instead of freezing the aim point
    pub fn unbounded(mut self) -> Self {
        self.freeze_at_walls = false;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Solve for a shot fired from `shooter` at `fire_tick` with `power`
    pub fn solve(
        &self,
        shooter: Vec2,
        fire_tick: u64,
        target: &Recording,
        power: f64,
    ) -> CoreResult<Intercept> {
        let speed = bullet_speed(power);
        if !(speed > 0.0 && speed.is_finite()) {
            return Err(CoreError::InvalidBulletPower { power, speed });
        }
        let limit = self.arena.diagonal();

        let mut last_in_bounds = self.arena.clamp(target.advance(fire_tick));
        let mut frozen = false;
        let mut delta: u64 = 0;

        loop {
            delta += 1;
            let travelled = delta as f64 * speed;
            if travelled > limit {
                debug!(
                    ticks = delta,
                    travelled,
                    power,
                    "No intercept inside the arena diagonal"
                );
                return Err(CoreError::NoInterceptSolution {
                    ticks: delta,
                    travelled,
                });
            }

            let predicted = if frozen {
                last_in_bounds
            } else {
                let candidate = target.advance(fire_tick + delta);
                match self.arena.check(candidate) {
                    Ok(point) => {
                        last_in_bounds = point;
                        point
                    }
                    Err(err) if self.freeze_at_walls => {
                        trace!(%err, ticks = delta, "Freezing aim point at arena edge");
                        frozen = true;
                        last_in_bounds
                    }
                    Err(_) => candidate,
                }
            };

            let remaining = shooter.distance_to(predicted) - travelled;
            if remaining <= self.tolerance {
                return Ok(Intercept {
                    point: predicted,
                    bearing: bearing(shooter, predicted),
                    ticks: delta,
                    travelled,
                    frozen,
                });
            }
        }
    }
}

impl Default for InterceptSolver {
    fn default() -> Self {
        Self::new(Arena::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn target(position: Vec2, heading: f64, velocity: f64) -> Recording {
        Recording {
            tick: 0,
            position,
            heading,
            velocity,
            turn_rate: 0.0,
            energy: 100.0,
            bearing: 0.0,
            lateral_direction: 1.0,
        }
    }

    #[test]
    fn test_stationary_target_head_on() {
        let solver = InterceptSolver::default();
        let shooter = Vec2::new(100.0, 100.0);
        let rec = target(Vec2::new(100.0, 400.0), 0.0, 0.0);
        let intercept = solver.solve(shooter, 0, &rec, 3.0).unwrap();
        assert_eq!(intercept.point, rec.position);
        assert!(intercept.bearing.abs() < 1e-12);
        // (300 - 18) / 11 rounds up to 26
        assert_eq!(intercept.ticks, 26);
    }

    #[test]
    fn test_perpendicular_target_leads() {
        let solver = InterceptSolver::default();
        let shooter = Vec2::ZERO;
        let rec = target(Vec2::new(0.0, 400.0), FRAC_PI_2, 8.0);
        let intercept = solver.solve(shooter, 0, &rec, 3.0).unwrap();

        assert!(intercept.bearing > 0.1, "expected lead, got {}", intercept.bearing);
        assert!(!intercept.frozen);
        let direct = bearing(shooter, intercept.point);
        assert!((intercept.bearing - direct).abs() < 1e-9);
        // Bullet and target meet within half a body width
        let gap = shooter.distance_to(intercept.point) - intercept.travelled;
        assert!(gap <= HALF_BODY);
    }

    #[test]
    fn test_deterministic() {
        let solver = InterceptSolver::default();
        let shooter = Vec2::new(200.0, 150.0);
        let mut rec = target(Vec2::new(500.0, 420.0), 2.0, 6.0);
        rec.turn_rate = 0.05;
        let first = solver.solve(shooter, 7, &rec, 1.7).unwrap();
        for _ in 0..10 {
            assert_eq!(solver.solve(shooter, 7, &rec, 1.7).unwrap(), first);
        }
    }

    #[test]
    fn test_retreating_target_has_no_solution() {
        let solver = InterceptSolver::default().unbounded();
        let shooter = Vec2::new(400.0, 300.0);
        // Faster than a power 3 bullet, heading straight away
        let rec = target(Vec2::new(400.0, 350.0), 0.0, 15.0);
        match solver.solve(shooter, 0, &rec, 3.0) {
            Err(CoreError::NoInterceptSolution { ticks, travelled }) => {
                assert!(travelled > solver.arena().diagonal());
                assert!(ticks <= (solver.arena().diagonal() / 11.0) as u64 + 1);
            }
            other => panic!("expected no solution, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_power_without_bullet_speed() {
        let solver = InterceptSolver::default();
        let rec = target(Vec2::new(400.0, 500.0), 0.0, 0.0);
        for power in [20.0 / 3.0, 9.0, f64::NAN] {
            assert!(matches!(
                solver.solve(Vec2::new(400.0, 100.0), 0, &rec, power),
                Err(CoreError::InvalidBulletPower { .. })
            ));
        }
    }

    #[test]
    fn test_solutions_never_exceed_diagonal() {
        let solver = InterceptSolver::default();
        let diagonal = solver.arena().diagonal();
        for (i, power) in [0.1, 1.0, 2.0, 3.0].iter().enumerate() {
            for heading in [0.0, FRAC_PI_2, PI, 4.0] {
                let rec = target(Vec2::new(700.0, 500.0 - 50.0 * i as f64), heading, 8.0);
                if let Ok(intercept) = solver.solve(Vec2::new(50.0, 50.0), 0, &rec, *power) {
                    assert!(intercept.travelled <= diagonal);
                }
            }
        }
    }

    #[test]
    fn test_frozen_at_wall() {
        let solver = InterceptSolver::default();
        let shooter = Vec2::new(100.0, 300.0);
        // Running into the east wall
        let rec = target(Vec2::new(760.0, 300.0), FRAC_PI_2, 8.0);
        let intercept = solver.solve(shooter, 0, &rec, 1.0).unwrap();
        assert!(intercept.frozen);
        assert!(solver.arena().contains(intercept.point));
        assert!(intercept.point.x <= 800.0 && intercept.point.x > 790.0);
    }

    #[test]
    fn test_coincident_target_uses_fallback_bearing() {
        let solver = InterceptSolver::default();
        let p = Vec2::new(300.0, 300.0);
        let intercept = solver.solve(p, 0, &target(p, 0.0, 0.0), 3.0).unwrap();
        assert_eq!(intercept.bearing, crate::util::angle::FALLBACK_BEARING);
        assert_eq!(intercept.ticks, 1);
    }
}
