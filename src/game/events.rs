//! Host interface: inbound events and outbound commands
//!
//! Everything the host reports arrives as one [`HostEvent`] variant and is
//! dispatched by exhaustive match. Per tick the core answers with one
//! [`TickCommands`], which holds at most one navigation and one gun command.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::util::angle::normal_absolute;
use crate::util::vec2::Vec2;

/// The agent's own kinematics as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelfState {
    pub tick: u64,
    pub position: Vec2,
    /// Absolute compass heading (radians)
    pub heading: f64,
    /// Signed speed along the heading
    pub velocity: f64,
    pub energy: f64,
    pub gun_heat: f64,
    pub gun_heading: f64,
    pub radar_heading: f64,
    /// Opponents still alive
    pub others: usize,
}

impl Default for SelfState {
    fn default() -> Self {
        Self {
            tick: 0,
            position: Vec2::ZERO,
            heading: 0.0,
            velocity: 0.0,
            energy: 100.0,
            gun_heat: 0.0,
            gun_heading: 0.0,
            radar_heading: 0.0,
            others: 1,
        }
    }
}

/// A radar contact with an opponent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub name: String,
    pub tick: u64,
    /// Bearing relative to the observer's body heading (radians)
    pub bearing: f64,
    pub distance: f64,
    pub heading: f64,
    pub velocity: f64,
    pub energy: f64,
}

impl Sighting {
    /// Absolute bearing from the observer to the contact
    pub fn absolute_bearing(&self, observer: &SelfState) -> f64 {
        normal_absolute(observer.heading + self.bearing)
    }

    /// World position of the contact
    pub fn position(&self, observer: &SelfState) -> Vec2 {
        observer
            .position
            .project(self.absolute_bearing(observer), self.distance)
    }
}

/// Inbound host events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostEvent {
    /// Own kinematics, delivered once per tick
    Status(SelfState),
    /// Opponent sighted by the radar
    Scanned(Sighting),
    /// Drove into a wall; bearing is relative to the body heading
    HitWall { bearing: f64 },
    /// Collided with an opponent
    HitRobot { name: String, bearing: f64 },
    /// Struck by a projectile travelling along `heading`
    HitByBullet { name: String, bearing: f64, heading: f64, power: f64 },
    /// An opponent was destroyed
    RobotDeath { name: String },
    /// The match is over; per-match state must be dropped
    RoundEnded,
}

impl HostEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            HostEvent::Status(_) => "status",
            HostEvent::Scanned(_) => "scanned",
            HostEvent::HitWall { .. } => "hit_wall",
            HostEvent::HitRobot { .. } => "hit_robot",
            HostEvent::HitByBullet { .. } => "hit_by_bullet",
            HostEvent::RobotDeath { .. } => "robot_death",
            HostEvent::RoundEnded => "round_ended",
        }
    }
}

/// Flat outbound command set understood by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HostCommand {
    /// Turn the body right by this many radians (negative turns left)
    SetTurn(f64),
    /// Drive forward by this many units (negative drives backwards)
    SetAhead(f64),
    /// Cap the body turn rate (radians per tick)
    SetMaxTurnRate(f64),
    SetGunTurn(f64),
    SetRadarTurn(f64),
    Fire(f64),
}

/// One movement primitive
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NavCommand {
    pub turn: f64,
    pub distance: f64,
    pub max_turn_rate: Option<f64>,
}

impl NavCommand {
    pub const STOP: NavCommand = NavCommand {
        turn: 0.0,
        distance: 0.0,
        max_turn_rate: None,
    };

    pub fn new(turn: f64, distance: f64) -> Self {
        Self {
            turn,
            distance,
            max_turn_rate: None,
        }
    }

    pub fn with_turn_rate(mut self, rate: f64) -> Self {
        self.max_turn_rate = Some(rate);
        self
    }

    pub fn is_finite(&self) -> bool {
        self.turn.is_finite()
            && self.distance.is_finite()
            && self.max_turn_rate.map_or(true, f64::is_finite)
    }
}

/// One gun primitive: turret turn plus an optional shot
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GunCommand {
    pub turn: f64,
    pub fire: Option<f64>,
}

/// Everything decided for a single tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TickCommands {
    pub nav: Option<NavCommand>,
    pub gun: Option<GunCommand>,
    pub radar: Option<f64>,
}

impl TickCommands {
    pub fn is_empty(&self) -> bool {
        self.nav.is_none() && self.gun.is_none() && self.radar.is_none()
    }

    /// Shot power issued this tick, if any
    pub fn fired(&self) -> Option<f64> {
        self.gun.and_then(|g| g.fire)
    }

    /// Flatten into the host's command vocabulary
    pub fn to_host_commands(&self) -> SmallVec<[HostCommand; 6]> {
        let mut out = SmallVec::new();
        if let Some(nav) = self.nav {
            if let Some(rate) = nav.max_turn_rate {
                out.push(HostCommand::SetMaxTurnRate(rate));
            }
            out.push(HostCommand::SetTurn(nav.turn));
            out.push(HostCommand::SetAhead(nav.distance));
        }
        if let Some(gun) = self.gun {
            out.push(HostCommand::SetGunTurn(gun.turn));
            if let Some(power) = gun.fire {
                out.push(HostCommand::Fire(power));
            }
        }
        if let Some(radar) = self.radar {
            out.push(HostCommand::SetRadarTurn(radar));
        }
        out
    }
}
