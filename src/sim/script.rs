//! Scripted opponents for the headless host

use serde::{Deserialize, Serialize};

use crate::game::arena::Arena;
use crate::game::constants::rules::{
    bullet_speed, gun_heat, max_turn_rate, ACCELERATION, DECELERATION, DEFAULT_GUN_COOLING_RATE, HALF_BODY,
};
use crate::util::angle::{bearing, normal_absolute, normal_relative};
use crate::util::vec2::Vec2;

/// Movement pattern an opponent repeats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OpponentScript {
    /// Never moves
    Sitting,
    /// Straight line, bouncing off walls
    Linear { speed: f64 },
    /// Constant turn rate (radians per tick)
    Circling { speed: f64, turn_rate: f64 },
    /// Drives `period` ticks forward, then `period` ticks back
    Oscillating { speed: f64, period: u64 },
}

/// Who fired a bullet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shooter {
    Agent,
    Opponent(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub shooter: Shooter,
    pub position: Vec2,
    pub heading: f64,
    pub speed: f64,
    pub power: f64,
}

impl Bullet {
    pub fn step(&mut self) {
        self.position = self.position.project(self.heading, self.speed);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opponent {
    pub name: String,
    pub script: OpponentScript,
    pub position: Vec2,
    pub heading: f64,
    pub velocity: f64,
    pub energy: f64,
    /// Head-on shot power whenever the gun is cool; `None` never fires
    pub fire_power: Option<f64>,
    gun_heat: f64,
}

impl Opponent {
    pub fn new(name: impl Into<String>, script: OpponentScript, position: Vec2, heading: f64) -> Self {
        Self {
            name: name.into(),
            script,
            position,
            heading,
            velocity: 0.0,
            energy: 100.0,
            fire_power: None,
            // Everyone starts with a hot gun
            gun_heat: 3.0,
        }
    }

    pub fn with_gun(mut self, power: f64) -> Self {
        self.fire_power = Some(power);
        self
    }

    pub fn is_alive(&self) -> bool {
        self.energy > 0.0
    }

    /// Advance one tick along the script
    pub fn step(&mut self, tick: u64, arena: &Arena) {
        let target_velocity = match self.script {
            OpponentScript::Sitting => 0.0,
            OpponentScript::Linear { speed } => speed,
            OpponentScript::Circling { speed, turn_rate } => {
                let limit = max_turn_rate(self.velocity);
                self.heading = normal_absolute(self.heading + turn_rate.clamp(-limit, limit));
                speed
            }
            OpponentScript::Oscillating { speed, period } => {
                if (tick / period.max(1)) % 2 == 0 {
                    speed
                } else {
                    -speed
                }
            }
        };
        self.velocity = if target_velocity.abs() >= self.velocity.abs()
            && target_velocity * self.velocity >= 0.0
        {
            self.velocity + (target_velocity - self.velocity).clamp(-ACCELERATION, ACCELERATION)
        } else {
            self.velocity + (target_velocity - self.velocity).clamp(-DECELERATION, DECELERATION)
        };

        let next = self.position.project(self.heading, self.velocity);
        if !arena.contains_inset(next, HALF_BODY) {
            self.heading = normal_absolute(self.heading + std::f64::consts::PI);
            self.velocity = 0.0;
        }
        self.position = arena.clamp_inset(self.position.project(self.heading, self.velocity), HALF_BODY);
    }

    /// Cool the gun and fire head-on at `at` when ready
    pub fn fire(&mut self, at: Vec2) -> Option<Bullet> {
        self.gun_heat = (self.gun_heat - DEFAULT_GUN_COOLING_RATE).max(0.0);
        let power = self.fire_power?;
        if self.gun_heat > 1e-9 || self.energy <= power {
            return None;
        }
        self.gun_heat = gun_heat(power);
        self.energy -= power;
        Some(Bullet {
            shooter: Shooter::Opponent(self.name.clone()),
            position: self.position,
            heading: bearing(self.position, at),
            speed: bullet_speed(power),
            power,
        })
    }

    /// Body-relative bearing from this opponent to `point`
    pub fn relative_bearing(&self, point: Vec2) -> f64 {
        normal_relative(bearing(self.position, point) - self.heading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_linear_bounces() {
        let arena = Arena::default();
        let mut opponent = Opponent::new("l", OpponentScript::Linear { speed: 8.0 }, Vec2::new(700.0, 300.0), FRAC_PI_2);
        for tick in 0..60 {
            opponent.step(tick, &arena);
            assert!(arena.contains_inset(opponent.position, HALF_BODY));
        }
        // Turned around at the east wall
        assert!(opponent.heading > FRAC_PI_2);
    }

    #[test]
    fn test_oscillating_returns() {
        let arena = Arena::default();
        let start = Vec2::new(400.0, 300.0);
        let mut opponent = Opponent::new("o", OpponentScript::Oscillating { speed: 4.0, period: 20 }, start, 0.0);
        for tick in 0..40 {
            opponent.step(tick, &arena);
        }
        assert!(opponent.position.distance_to(start) < 20.0);
    }

    #[test]
    fn test_fires_when_cool() {
        let mut opponent = Opponent::new("g", OpponentScript::Sitting, Vec2::new(100.0, 100.0), 0.0).with_gun(2.0);
        let shots: Vec<Bullet> = (0..60).filter_map(|_| opponent.fire(Vec2::new(100.0, 500.0))).collect();
        // 30 ticks to cool from the start, then 14 between shots
        assert_eq!(shots.len(), 3);
        assert_eq!(opponent.energy, 94.0);
        assert_eq!(shots[0].heading, 0.0);
        assert_eq!(shots[0].speed, 14.0);
    }
}
