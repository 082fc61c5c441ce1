//! Potential field steering
//!
//! Every hazard repels the agent with a force that falls off with distance.
//! The summed force picks the heading; its magnitude picks how far to drive.

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::ForceFalloff;
use crate::game::arena::Arena;
use crate::game::constants::field::{
    CENTER_WEIGHT, DISTANCE_GAIN, MAX_STEP, MIN_STEP, MIN_WALL_WEIGHT, OPPONENT_BASE_WEIGHT,
};
use crate::game::events::{NavCommand, SelfState};
use crate::tracking::recording::Recording;
use crate::util::angle::{normal_relative, try_bearing};
use crate::util::vec2::Vec2;

/// What a repulsive source stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Center,
    Wall,
    Opponent,
    Projectile,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceSource {
    pub kind: SourceKind,
    pub position: Vec2,
    pub weight: f64,
}

pub type Sources = SmallVec<[ForceSource; 16]>;

pub struct PotentialField {
    arena: Arena,
    falloff: ForceFalloff,
}

impl PotentialField {
    pub fn new(arena: Arena, falloff: ForceFalloff) -> Self {
        Self { arena, falloff }
    }

    /// Collect this tick's sources
    ///
    /// Opponents are placed one tick ahead. Walls grow heavier as the field
    /// gets crowded so the agent is not pushed into them.
    pub fn sources(
        &self,
        me: &SelfState,
        opponents: &[Recording],
        projectiles: &[(Vec2, f64)],
    ) -> Sources {
        let mut sources = Sources::new();
        sources.push(ForceSource {
            kind: SourceKind::Center,
            position: self.arena.center(),
            weight: CENTER_WEIGHT,
        });

        let density = me.others as f64 / 2.0 + projectiles.len() as f64 / 8.0;
        let wall_weight = MIN_WALL_WEIGHT.max(density);
        for position in self.arena.wall_projections(me.position) {
            sources.push(ForceSource {
                kind: SourceKind::Wall,
                position,
                weight: wall_weight,
            });
        }

        for opponent in opponents {
            sources.push(ForceSource {
                kind: SourceKind::Opponent,
                position: opponent.advance(me.tick + 1),
                weight: OPPONENT_BASE_WEIGHT + opponent.energy / 10.0,
            });
        }

        for &(position, weight) in projectiles {
            sources.push(ForceSource {
                kind: SourceKind::Projectile,
                position,
                weight,
            });
        }
        sources
    }

    /// Push exerted by one source on an agent at `at`, directed source to agent
    pub fn force(&self, source: &ForceSource, at: Vec2) -> Vec2 {
        let Ok(direction) = try_bearing(source.position, at) else {
            // Standing on the source gives it no direction
            return Vec2::ZERO;
        };
        let magnitude = self.falloff.magnitude(source.weight, source.position.distance_to(at));
        if !magnitude.is_finite() {
            return Vec2::ZERO;
        }
        Vec2::from_heading(direction) * magnitude
    }

    pub fn resultant(&self, sources: &[ForceSource], at: Vec2) -> Vec2 {
        sources
            .iter()
            .fold(Vec2::ZERO, |sum, source| sum + self.force(source, at))
    }

    /// Steering command along the resultant force
    pub fn steer(&self, me: &SelfState, sources: &[ForceSource]) -> NavCommand {
        let total = self.resultant(sources, me.position);
        if !total.is_finite() {
            return NavCommand::STOP;
        }
        let Some(desired) = total.heading() else {
            return NavCommand::STOP;
        };

        let mut turn = normal_relative(desired - me.heading);
        let mut distance = (total.length() * DISTANCE_GAIN).clamp(MIN_STEP, MAX_STEP);
        if turn.abs() > FRAC_PI_2 {
            turn = normal_relative(turn + PI);
            distance = -distance;
        }
        NavCommand::new(turn, distance)
    }
}

impl Default for PotentialField {
    fn default() -> Self {
        Self::new(Arena::default(), ForceFalloff::InverseSquare)
    }
}
