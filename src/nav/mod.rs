//! Navigation: two interchangeable movement strategies over shared motion tracking

pub mod arc;
pub mod field;
pub mod motion;
pub mod threats;

pub use arc::{ArcPursuit, LegPhase, NavData};
pub use field::{ForceSource, PotentialField, SourceKind};
pub use motion::MotionTracker;
pub use threats::{InferredShot, ThreatTracker};

use crate::config::{AgentConfig, NavMode};
use crate::game::events::{NavCommand, SelfState};
use crate::tracking::recording::Recording;
use crate::util::vec2::Vec2;

/// What the navigation strategies can see of the world this tick
pub struct NavInputs<'a> {
    pub me: &'a SelfState,
    pub motion: &'a MotionTracker,
    pub opponents: &'a [Recording],
    /// (position, weight) of live inferred enemy shots
    pub projectiles: &'a [(Vec2, f64)],
}

pub enum NavigationEngine {
    ArcPursuit(ArcPursuit),
    PotentialField(PotentialField),
}

impl NavigationEngine {
    pub fn from_config(config: &AgentConfig) -> Self {
        match config.nav_mode {
            NavMode::ArcPursuit => {
                NavigationEngine::ArcPursuit(ArcPursuit::new(config.arena, config.rng_seed))
            }
            NavMode::PotentialField => NavigationEngine::PotentialField(PotentialField::new(
                config.arena,
                config.force_falloff,
            )),
        }
    }

    pub fn mode(&self) -> NavMode {
        match self {
            NavigationEngine::ArcPursuit(_) => NavMode::ArcPursuit,
            NavigationEngine::PotentialField(_) => NavMode::PotentialField,
        }
    }

    /// Movement command for this tick; `None` keeps the running primitive
    pub fn decide(&mut self, inputs: &NavInputs<'_>) -> Option<NavCommand> {
        match self {
            NavigationEngine::ArcPursuit(arc) => arc.next_command(inputs.me, inputs.motion),
            NavigationEngine::PotentialField(field) => {
                let sources = field.sources(inputs.me, inputs.opponents, inputs.projectiles);
                Some(field.steer(inputs.me, &sources))
            }
        }
    }

    /// The field re-steers every tick, so only arc legs need collision handling
    pub fn on_hit_robot(&mut self, bearing: f64) -> Option<NavCommand> {
        match self {
            NavigationEngine::ArcPursuit(arc) => arc.on_hit_robot(bearing),
            NavigationEngine::PotentialField(_) => None,
        }
    }

    pub fn on_hit_wall(&mut self, bearing: f64) -> Option<NavCommand> {
        match self {
            NavigationEngine::ArcPursuit(arc) => arc.on_hit_wall(bearing),
            NavigationEngine::PotentialField(_) => None,
        }
    }

    pub fn on_hit_by_bullet(&mut self, motion: &MotionTracker) -> Option<NavCommand> {
        match self {
            NavigationEngine::ArcPursuit(arc) => arc.on_hit_by_bullet(motion),
            NavigationEngine::PotentialField(_) => None,
        }
    }

    pub fn reset(&mut self) {
        if let NavigationEngine::ArcPursuit(arc) = self {
            arc.reset();
        }
    }
}
