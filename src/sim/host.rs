//! Deterministic headless arena
//!
//! Drives an [`Agent`] through a match against scripted opponents. The agent's
//! body moves under the same actuation limits the motion projection assumes;
//! bullets, collisions and radar sweeps produce the host events a real arena
//! would deliver.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::Agent;
use crate::game::arena::Arena;
use crate::game::constants::rules::{
    bullet_damage, bullet_speed, gun_heat, BODY_SIZE, DEFAULT_GUN_COOLING_RATE,
    GUN_TURN_RATE_DEG, HALF_BODY, MAX_BULLET_POWER, MAX_TURN_RATE_DEG, MIN_BULLET_POWER,
    RADAR_TURN_RATE_DEG,
};
use crate::game::events::{HostEvent, SelfState, Sighting, TickCommands};
use crate::nav::motion::BodyState;
use crate::sim::script::{Bullet, Opponent, OpponentScript, Shooter};
use crate::util::angle::{bearing, normal_absolute, normal_relative};
use crate::util::vec2::Vec2;

/// Energy lost by each party when two bodies collide
const RAM_DAMAGE: f64 = 0.6;
/// Distance kept from walls when placing bodies at the start
const SPAWN_MARGIN: f64 = 4.0 * HALF_BODY;

/// Outcome of one scripted match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub ticks: u64,
    pub shots_fired: u64,
    pub shots_hit: u64,
    pub damage_dealt: f64,
    pub damage_taken: f64,
    pub wall_hits: u64,
    pub robot_hits: u64,
    pub opponents_destroyed: u64,
    pub survived: bool,
    pub energy: f64,
}

impl MatchSummary {
    pub fn hit_rate(&self) -> f64 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.shots_hit as f64 / self.shots_fired as f64
        }
    }
}

pub struct ScriptedHost {
    arena: Arena,
    tick: u64,
    body: BodyState,
    energy: f64,
    gun_heat: f64,
    gun_heading: f64,
    gun_turn: f64,
    radar_heading: f64,
    radar_turn: f64,
    opponents: Vec<Opponent>,
    bullets: Vec<Bullet>,
    pending: Vec<HostEvent>,
    summary: MatchSummary,
}

impl ScriptedHost {
    /// Host with the agent placed at a seeded random spot
    pub fn new(arena: Arena, seed: u64, opponents: Vec<Opponent>) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let position = random_spot(&arena, &mut rng);
        let heading = rng.gen_range(0.0..std::f64::consts::TAU);
        Self::with_agent_at(arena, position, heading, opponents)
    }

    pub fn with_agent_at(arena: Arena, position: Vec2, heading: f64, opponents: Vec<Opponent>) -> Self {
        Self {
            arena,
            tick: 0,
            body: BodyState {
                position,
                heading,
                velocity: 0.0,
                remaining_distance: 0.0,
                remaining_turn: 0.0,
                turn_cap: MAX_TURN_RATE_DEG.to_radians(),
            },
            energy: 100.0,
            // Guns start hot
            gun_heat: 3.0,
            gun_heading: heading,
            gun_turn: 0.0,
            radar_heading: heading,
            radar_turn: 0.0,
            opponents,
            bullets: Vec::new(),
            pending: Vec::new(),
            summary: MatchSummary::default(),
        }
    }

    /// One circling gunner
    pub fn duel(arena: Arena, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed ^ 0xd0e1);
        let opponents = vec![Opponent::new(
            "Circler",
            OpponentScript::Circling { speed: 8.0, turn_rate: 4f64.to_radians() },
            random_spot(&arena, &mut rng),
            rng.gen_range(0.0..std::f64::consts::TAU),
        )
        .with_gun(1.5)];
        Self::new(arena, seed, opponents)
    }

    /// Three opponents with different movement
    pub fn melee(arena: Arena, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed ^ 0x3e1e);
        let scripts = [
            ("Circler", OpponentScript::Circling { speed: 8.0, turn_rate: 4f64.to_radians() }, Some(1.5)),
            ("Walker", OpponentScript::Linear { speed: 6.0 }, Some(2.0)),
            ("Swayer", OpponentScript::Oscillating { speed: 8.0, period: 24 }, None),
        ];
        let opponents = scripts
            .into_iter()
            .map(|(name, script, power)| {
                let opponent = Opponent::new(
                    name,
                    script,
                    random_spot(&arena, &mut rng),
                    rng.gen_range(0.0..std::f64::consts::TAU),
                );
                match power {
                    Some(power) => opponent.with_gun(power),
                    None => opponent,
                }
            })
            .collect();
        Self::new(arena, seed, opponents)
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn body(&self) -> &BodyState {
        &self.body
    }

    pub fn opponents(&self) -> &[Opponent] {
        &self.opponents
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn summary(&self) -> &MatchSummary {
        &self.summary
    }

    pub fn is_over(&self) -> bool {
        self.energy <= 0.0 || self.opponents.is_empty()
    }

    /// What the agent is told about itself this tick
    pub fn status(&self) -> SelfState {
        SelfState {
            tick: self.tick,
            position: self.body.position,
            heading: self.body.heading,
            velocity: self.body.velocity,
            energy: self.energy,
            gun_heat: self.gun_heat,
            gun_heading: self.gun_heading,
            radar_heading: self.radar_heading,
            others: self.opponents.len(),
        }
    }

    /// Run one tick; returns whether the match goes on
    pub fn step(&mut self, agent: &mut Agent) -> bool {
        let events = std::mem::take(&mut self.pending);
        let commands = agent.step(self.status(), events);
        self.apply(&commands);
        self.advance();
        !self.is_over()
    }

    /// Run until the match ends or `max_ticks` pass, then close the round
    pub fn run(&mut self, agent: &mut Agent, max_ticks: u64) -> MatchSummary {
        while self.tick < max_ticks && self.step(agent) {}

        for event in std::mem::take(&mut self.pending) {
            agent.handle(event);
        }
        agent.handle(HostEvent::RoundEnded);

        self.summary.ticks = self.tick;
        self.summary.survived = self.energy > 0.0;
        self.summary.energy = self.energy.max(0.0);
        info!(
            ticks = self.summary.ticks,
            shots = self.summary.shots_fired,
            hits = self.summary.shots_hit,
            destroyed = self.summary.opponents_destroyed,
            survived = self.summary.survived,
            "Match finished"
        );
        self.summary.clone()
    }

    fn apply(&mut self, commands: &TickCommands) {
        if let Some(nav) = commands.nav {
            self.body.remaining_turn = nav.turn;
            self.body.remaining_distance = nav.distance;
            if let Some(rate) = nav.max_turn_rate {
                self.body.turn_cap = rate;
            }
        }
        if let Some(gun) = commands.gun {
            // The shot leaves along the current gun heading, before this tick's turn
            if let Some(power) = gun.fire {
                self.fire(power);
            }
            self.gun_turn = gun.turn;
        }
        if let Some(turn) = commands.radar {
            self.radar_turn = turn;
        }
    }

    fn fire(&mut self, power: f64) {
        let power = power.clamp(MIN_BULLET_POWER, MAX_BULLET_POWER);
        if self.gun_heat > 1e-9 || self.energy <= power {
            debug!(gun_heat = self.gun_heat, energy = self.energy, "Fire ignored");
            return;
        }
        self.gun_heat = gun_heat(power);
        self.energy -= power;
        self.bullets.push(Bullet {
            shooter: Shooter::Agent,
            position: self.body.position,
            heading: self.gun_heading,
            speed: bullet_speed(power),
            power,
        });
        self.summary.shots_fired += 1;
    }

    fn advance(&mut self) {
        self.tick += 1;
        self.gun_heat = (self.gun_heat - DEFAULT_GUN_COOLING_RATE).max(0.0);

        let limit = GUN_TURN_RATE_DEG.to_radians();
        let dg = self.gun_turn.clamp(-limit, limit);
        self.gun_heading = normal_absolute(self.gun_heading + dg);
        self.gun_turn -= dg;

        let before = self.body.position;
        self.body.step();
        self.collide_walls();

        for opponent in &mut self.opponents {
            opponent.step(self.tick, &self.arena);
            if let Some(bullet) = opponent.fire(self.body.position) {
                self.bullets.push(bullet);
            }
        }
        self.collide_robots(before);
        self.move_bullets();
        self.remove_dead();
        self.sweep_radar();
    }

    fn collide_walls(&mut self) {
        if self.arena.contains_inset(self.body.position, HALF_BODY) {
            return;
        }
        let clamped = self.arena.clamp_inset(self.body.position, HALF_BODY);
        let outward = bearing(clamped, self.body.position);
        let damage = (self.body.velocity.abs() * 0.5 - 1.0).max(0.0);
        self.energy -= damage;
        self.summary.damage_taken += damage;
        self.summary.wall_hits += 1;
        self.body.position = clamped;
        self.body.velocity = 0.0;
        self.body.remaining_distance = 0.0;
        self.pending.push(HostEvent::HitWall {
            bearing: normal_relative(outward - self.body.heading),
        });
    }

    fn collide_robots(&mut self, before: Vec2) {
        let position = self.body.position;
        let mut rammed = false;
        for opponent in &mut self.opponents {
            if opponent.position.distance_to(position) >= BODY_SIZE {
                continue;
            }
            rammed = true;
            opponent.energy -= RAM_DAMAGE;
            self.energy -= RAM_DAMAGE;
            self.summary.damage_taken += RAM_DAMAGE;
            self.summary.robot_hits += 1;
            self.pending.push(HostEvent::HitRobot {
                name: opponent.name.clone(),
                bearing: normal_relative(bearing(position, opponent.position) - self.body.heading),
            });
        }
        if rammed {
            self.body.position = before;
            self.body.velocity = 0.0;
            self.body.remaining_distance = 0.0;
        }
    }

    fn move_bullets(&mut self) {
        let mut bullets = std::mem::take(&mut self.bullets);
        bullets.retain_mut(|bullet| {
            bullet.step();
            if !self.arena.contains(bullet.position) {
                return false;
            }
            match bullet.shooter.clone() {
                Shooter::Agent => {
                    let Some(victim) = self
                        .opponents
                        .iter_mut()
                        .find(|o| o.is_alive() && hits(bullet.position, o.position))
                    else {
                        return true;
                    };
                    let damage = bullet_damage(bullet.power);
                    victim.energy -= damage;
                    self.energy += 3.0 * bullet.power;
                    self.summary.shots_hit += 1;
                    self.summary.damage_dealt += damage;
                    false
                }
                Shooter::Opponent(name) => {
                    if !hits(bullet.position, self.body.position) {
                        return true;
                    }
                    let damage = bullet_damage(bullet.power);
                    self.energy -= damage;
                    self.summary.damage_taken += damage;
                    if let Some(shooter) = self.opponents.iter_mut().find(|o| o.name == name) {
                        shooter.energy += 3.0 * bullet.power;
                    }
                    self.pending.push(HostEvent::HitByBullet {
                        name,
                        bearing: normal_relative(bullet.heading + PI - self.body.heading),
                        heading: bullet.heading,
                        power: bullet.power,
                    });
                    false
                }
            }
        });
        self.bullets = bullets;
    }

    fn remove_dead(&mut self) {
        let pending = &mut self.pending;
        let summary = &mut self.summary;
        self.opponents.retain(|opponent| {
            if opponent.is_alive() {
                return true;
            }
            pending.push(HostEvent::RobotDeath {
                name: opponent.name.clone(),
            });
            summary.opponents_destroyed += 1;
            false
        });
    }

    /// Scan every opponent inside the arc the radar sweeps this tick
    fn sweep_radar(&mut self) {
        let limit = RADAR_TURN_RATE_DEG.to_radians();
        let dr = self.radar_turn.clamp(-limit, limit);
        if dr != 0.0 {
            for opponent in &self.opponents {
                let distance = self.body.position.distance_to(opponent.position);
                let absolute = bearing(self.body.position, opponent.position);
                let offset = normal_relative(absolute - self.radar_heading);
                let width = (HALF_BODY / distance.max(HALF_BODY)).atan();
                let (low, high) = if dr > 0.0 { (-width, dr + width) } else { (dr - width, width) };
                if offset < low || offset > high {
                    continue;
                }
                self.pending.push(HostEvent::Scanned(Sighting {
                    name: opponent.name.clone(),
                    tick: self.tick,
                    bearing: normal_relative(absolute - self.body.heading),
                    distance,
                    heading: opponent.heading,
                    velocity: opponent.velocity,
                    energy: opponent.energy,
                }));
            }
        }
        self.radar_heading = normal_absolute(self.radar_heading + dr);
        self.radar_turn -= dr;
    }
}

/// Square body hit test
fn hits(bullet: Vec2, body: Vec2) -> bool {
    (bullet.x - body.x).abs() <= HALF_BODY && (bullet.y - body.y).abs() <= HALF_BODY
}

fn random_spot(arena: &Arena, rng: &mut StdRng) -> Vec2 {
    Vec2::new(
        rng.gen_range(SPAWN_MARGIN..(arena.width - SPAWN_MARGIN).max(SPAWN_MARGIN + 1.0)),
        rng.gen_range(SPAWN_MARGIN..(arena.height - SPAWN_MARGIN).max(SPAWN_MARGIN + 1.0)),
    )
}
