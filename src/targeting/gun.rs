//! Gun control: when to shoot, from where, and along which bearing
//!
//! The shot is planned for the first tick the gun is both cool and turned
//! onto the target, from where the body will be at that tick.

use tracing::debug;

use crate::config::AgentConfig;
use crate::error::CoreResult;
use crate::game::constants::rules::{DEFAULT_GUN_COOLING_RATE, GUN_TURN_RATE_DEG};
use crate::game::constants::targeting::FIRE_ALIGNMENT_DEG;
use crate::game::events::SelfState;
use crate::learning::guess_factor::GuessFactorContext;
use crate::targeting::power::PowerSelector;
use crate::targeting::solution::{AimMethod, FiringSolution};
use crate::targeting::solver::InterceptSolver;
use crate::tracking::recording::Recording;
use crate::util::angle::{bearing, normal_absolute, normal_relative};
use crate::util::vec2::Vec2;

/// Ticks until the gun has shed `gun_heat`
pub fn cool_ticks(gun_heat: f64, cooling_rate: f64) -> u64 {
    if gun_heat <= 0.0 || cooling_rate <= 0.0 {
        return 0;
    }
    // Heat is reported with float noise, e.g. 1.6 / 0.1 = 16.000000000000004
    (gun_heat / cooling_rate - 1e-9).ceil().max(0.0) as u64
}

/// Ticks until the turret is within firing alignment after turning `turn`
pub fn gun_turn_ticks(turn: f64) -> u64 {
    let excess = turn.abs() - FIRE_ALIGNMENT_DEG.to_radians();
    if excess <= 0.0 {
        return 0;
    }
    (excess / GUN_TURN_RATE_DEG.to_radians()).ceil() as u64
}

/// Turret turn still outstanding toward `aimed_at`, the bearing last commanded
pub fn remaining_gun_turn(me: &SelfState, aimed_at: f64) -> f64 {
    normal_relative(aimed_at - me.gun_heading)
}

/// Whether the gun is cool and has all but finished turning onto `aimed_at`
pub fn ready_to_fire(me: &SelfState, aimed_at: f64) -> bool {
    me.gun_heat <= 1e-9
        && remaining_gun_turn(me, aimed_at).abs() <= FIRE_ALIGNMENT_DEG.to_radians() + 1e-12
}

pub struct GunControl {
    solver: InterceptSolver,
    power: PowerSelector,
    min_samples: u32,
    cooling_rate: f64,
}

impl GunControl {
    pub fn new(solver: InterceptSolver, power: PowerSelector, min_samples: u32) -> Self {
        Self {
            solver,
            power,
            min_samples,
            cooling_rate: DEFAULT_GUN_COOLING_RATE,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(
            InterceptSolver::new(config.arena),
            PowerSelector::new(config.power_table.clone(), config.energy_reserve),
            config.min_samples,
        )
    }

    pub fn solver(&self) -> &InterceptSolver {
        &self.solver
    }

    /// Earliest tick the gun can be cool and aligned with the target
    pub fn fire_tick(&self, me: &SelfState, target: &Recording) -> u64 {
        let head_on = bearing(me.position, target.advance(me.tick));
        let turn = normal_relative(head_on - me.gun_heading);
        me.tick + cool_ticks(me.gun_heat, self.cooling_rate).max(gun_turn_ticks(turn))
    }

    /// Solve a shot from `shooter` at `fire_tick`; `Ok(None)` means hold fire
    pub fn aim(
        &self,
        me: &SelfState,
        shooter: Vec2,
        fire_tick: u64,
        name: &str,
        target: &Recording,
        context: &GuessFactorContext,
    ) -> CoreResult<Option<FiringSolution>> {
        let head_on_point = target.advance(fire_tick);
        let Some(power) = self.power.select(
            shooter.distance_to(head_on_point),
            me.energy,
            target.energy,
        ) else {
            debug!(energy = me.energy, "Holding fire, shot not affordable");
            return Ok(None);
        };

        let intercept = self.solver.solve(shooter, fire_tick, target, power)?;

        let learned = context.aim_offset(
            name,
            target.velocity,
            power,
            target.lateral_direction,
            self.min_samples,
        );
        let (firing_bearing, method) = match learned {
            Some(offset) => (
                normal_absolute(bearing(shooter, head_on_point) + offset),
                AimMethod::GuessFactor,
            ),
            None => (intercept.bearing, AimMethod::Intercept),
        };

        Ok(Some(FiringSolution {
            shooter,
            target_point: intercept.point,
            distance: shooter.distance_to(intercept.point),
            bearing: firing_bearing,
            power,
            target: name.to_string(),
            fire_tick,
            method,
        }))
    }
}

impl Default for GunControl {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::learning::guess_factor::{bucket_factor, max_escape_angle};
    use std::f64::consts::FRAC_PI_2;

    fn target(position: Vec2, heading: f64, velocity: f64, energy: f64) -> Recording {
        Recording {
            tick: 0,
            position,
            heading,
            velocity,
            turn_rate: 0.0,
            energy,
            bearing: 0.0,
            lateral_direction: 1.0,
        }
    }

    #[test]
    fn test_cool_ticks() {
        assert_eq!(cool_ticks(0.0, 0.1), 0);
        assert_eq!(cool_ticks(1.6, 0.1), 16);
        assert_eq!(cool_ticks(0.05, 0.1), 1);
    }

    #[test]
    fn test_gun_turn_ticks() {
        assert_eq!(gun_turn_ticks(1f64.to_radians()), 0);
        assert_eq!(gun_turn_ticks(21f64.to_radians()), 1);
        assert_eq!(gun_turn_ticks(-23f64.to_radians()), 2);
    }

    #[test]
    fn test_fire_tick_waits_for_heat_and_turn() {
        let gun = GunControl::default();
        let rec = target(Vec2::new(400.0, 500.0), 0.0, 0.0, 100.0);
        let mut me = SelfState {
            tick: 50,
            position: Vec2::new(400.0, 100.0),
            gun_heading: FRAC_PI_2,
            ..Default::default()
        };
        // 90 degrees of turret turn
        assert_eq!(gun.fire_tick(&me, &rec), 55);
        me.gun_heat = 1.0;
        assert_eq!(gun.fire_tick(&me, &rec), 60);
        me.gun_heading = 0.0;
        me.gun_heat = 0.0;
        assert_eq!(gun.fire_tick(&me, &rec), 50);
    }

    #[test]
    fn test_end_to_end_lead() {
        let gun = GunControl::default();
        let context = GuessFactorContext::default();
        let me = SelfState::default();
        // 400 away, crossing at full speed
        let rec = target(Vec2::new(0.0, 400.0), FRAC_PI_2, 8.0, 100.0);

        let solution = gun.aim(&me, Vec2::ZERO, 0, "Crazy", &rec, &context).unwrap().unwrap();
        assert_eq!(solution.method, AimMethod::Intercept);
        assert!(solution.bearing > 0.0);
        assert!((solution.bearing - bearing(Vec2::ZERO, solution.target_point)).abs() < 1e-9);
        // Power table gives 1.5 at 400 units
        assert_eq!(solution.power, 1.5);
    }

    #[test]
    fn test_end_to_end_full_power() {
        // Power 3 bullets fly at 11 per tick
        let solver = InterceptSolver::default();
        let gun = GunControl::new(solver, PowerSelector::new(vec![(f64::INFINITY, 3.0)], 0.5), 5);
        let context = GuessFactorContext::default();
        let me = SelfState::default();
        let rec = target(Vec2::new(0.0, 400.0), FRAC_PI_2, 8.0, 100.0);

        let solution = gun.aim(&me, Vec2::ZERO, 0, "Crazy", &rec, &context).unwrap().unwrap();
        assert_eq!(solution.power, 3.0);
        let lead = solution.bearing;
        assert!(lead > 0.1 && lead < FRAC_PI_2);
        assert!((lead - bearing(Vec2::ZERO, solution.target_point)).abs() < 1e-9);
    }

    #[test]
    fn test_hold_fire_when_broke() {
        let gun = GunControl::default();
        let context = GuessFactorContext::default();
        let me = SelfState {
            energy: 0.3,
            ..Default::default()
        };
        let rec = target(Vec2::new(100.0, 300.0), 0.0, 0.0, 100.0);
        assert_eq!(gun.aim(&me, Vec2::new(100.0, 100.0), 0, "a", &rec, &context), Ok(None));
    }

    #[test]
    fn test_no_solution_propagates() {
        let gun = GunControl::new(InterceptSolver::default().unbounded(), PowerSelector::default(), 5);
        let context = GuessFactorContext::default();
        let me = SelfState::default();
        let rec = target(Vec2::new(400.0, 350.0), 0.0, 19.0, 100.0);
        assert!(matches!(
            gun.aim(&me, Vec2::new(400.0, 300.0), 0, "a", &rec, &context),
            Err(CoreError::NoInterceptSolution { .. })
        ));
    }

    #[test]
    fn test_guess_factor_bias_applied_after_min_samples() {
        let gun = GunControl::default();
        let context = GuessFactorContext::default();
        let me = SelfState::default();
        let shooter = Vec2::new(400.0, 100.0);
        let rec = target(Vec2::new(400.0, 400.0), FRAC_PI_2, 8.0, 100.0);
        // 300 away: power 2
        let key = context.key(8.0, 2.0);
        for _ in 0..5 {
            context.record("a", key, 24);
        }

        let solution = gun.aim(&me, shooter, 0, "a", &rec, &context).unwrap().unwrap();
        assert_eq!(solution.method, AimMethod::GuessFactor);
        let expected = bucket_factor(24, 31) * max_escape_angle(14.0);
        assert!((normal_relative(solution.bearing - 0.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_ready_to_fire() {
        let mut me = SelfState {
            gun_heading: 1.0,
            ..Default::default()
        };
        assert!(ready_to_fire(&me, 1.0 + 1f64.to_radians()));
        assert!(!ready_to_fire(&me, 1.0 + 3f64.to_radians()));
        me.gun_heat = 0.2;
        assert!(!ready_to_fire(&me, 1.0));
    }

    #[test]
    fn test_remaining_gun_turn_wraps() {
        let me = SelfState {
            gun_heading: 359f64.to_radians(),
            ..Default::default()
        };
        assert!((remaining_gun_turn(&me, 1f64.to_radians()) - 2f64.to_radians()).abs() < 1e-9);
        assert!(ready_to_fire(&me, 0.5f64.to_radians()));
    }
}
