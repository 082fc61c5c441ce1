//! Arc pursuit: one circular leg between random waypoints per planning cycle
//!
//! The arc centre lies on the perpendicular bisector of the chord, where it
//! meets the wall nearest to the chord midpoint. A leg is driven in two
//! primitives: turn on the spot to the tangent heading, then drive the arc
//! length with the turn rate capped so heading and distance finish together.

use std::f64::consts::{FRAC_PI_2, PI};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::game::arena::{Arena, Quadrant};
use crate::game::constants::nav::{DODGE_MAX, DODGE_MIN, ROBOT_RECOIL, WALL_BUFFER, WALL_RECOIL};
use crate::game::constants::rules::MAX_TURN_RATE_DEG;
use crate::game::events::{NavCommand, SelfState};
use crate::nav::motion::{time_to_travel, MotionTracker};
use crate::util::angle::{bearing, normal_absolute, normal_relative, sign, try_bearing};
use crate::util::vec2::Vec2;

/// Bisector components smaller than this are treated as parallel to a wall
const PARALLEL_EPSILON: f64 = 1e-9;

/// One planned leg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavData {
    pub from: Vec2,
    pub to: Vec2,
    pub center: Vec2,
    pub radius: f64,
    /// Arc length; negative when the leg is driven in reverse
    pub distance: f64,
    pub start_heading: f64,
    pub end_heading: f64,
}

impl NavData {
    /// Body turn across the whole leg
    pub fn turn(&self) -> f64 {
        normal_relative(self.end_heading - self.start_heading)
    }

    /// Turn rate that spreads the turn over the leg's travel time
    pub fn max_turn_rate(&self) -> f64 {
        let cap = MAX_TURN_RATE_DEG.to_radians();
        let time = time_to_travel(self.distance);
        if time <= 0.0 {
            return cap;
        }
        (self.turn().abs() / time).min(cap)
    }
}

/// Arc centre: where the chord's perpendicular bisector meets the nearer wall
pub fn arc_center(arena: &Arena, from: Vec2, to: Vec2) -> CoreResult<Vec2> {
    let chord = try_bearing(from, to)?;
    let mid = from.lerp(to, 0.5);
    let bisector = Vec2::from_heading(chord + FRAC_PI_2);

    let x_wall = arena.nearer_x_wall(mid);
    let y_wall = arena.nearer_y_wall(mid);

    let mut best: Option<(f64, Vec2)> = None;
    if bisector.x.abs() > PARALLEL_EPSILON {
        let s = (x_wall - mid.x) / bisector.x;
        best = Some((s.abs(), Vec2::new(x_wall, mid.y + s * bisector.y)));
    }
    if bisector.y.abs() > PARALLEL_EPSILON {
        let s = (y_wall - mid.y) / bisector.y;
        let candidate = Vec2::new(mid.x + s * bisector.x, y_wall);
        if best.map_or(true, |(d, _)| s.abs() < d) {
            best = Some((s.abs(), candidate));
        }
    }
    best.map(|(_, c)| c).ok_or_else(|| CoreError::degenerate(mid))
}

/// Plan a leg from `from` to `to` for a body currently facing `heading`
pub fn plan_arc(arena: &Arena, from: Vec2, to: Vec2, heading: f64) -> CoreResult<NavData> {
    let chord = try_bearing(from, to)?;
    let center = arc_center(arena, from, to)?;
    let radius = center.distance_to(from);

    let swept = normal_relative(bearing(center, to) - bearing(center, from)).abs();
    let mut distance = swept * radius;

    let tangent = |p: Vec2| {
        let inward = bearing(p, center);
        normal_absolute(inward + sign(normal_relative(chord - inward)) * FRAC_PI_2)
    };
    let mut start_heading = tangent(from);
    let mut end_heading = tangent(to);

    // Backing up is cheaper than a turn past 90 degrees
    if normal_relative(start_heading - heading).abs() > FRAC_PI_2 {
        start_heading = normal_absolute(start_heading + PI);
        end_heading = normal_absolute(end_heading + PI);
        distance = -distance;
    }

    Ok(NavData {
        from,
        to,
        center,
        radius,
        distance,
        start_heading,
        end_heading,
    })
}

/// Where the current leg stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegPhase {
    Idle,
    /// Turning on the spot to the leg's start heading
    Aligning,
    /// Driving the arc
    Traversing,
    /// Backing off after a collision or dodging a hit
    Recoil,
}

pub struct ArcPursuit {
    arena: Arena,
    rng: StdRng,
    phase: LegPhase,
    leg: Option<NavData>,
    recoiling: bool,
}

impl ArcPursuit {
    pub fn new(arena: Arena, seed: u64) -> Self {
        Self {
            arena,
            rng: StdRng::seed_from_u64(seed),
            phase: LegPhase::Idle,
            leg: None,
            recoiling: false,
        }
    }

    pub fn phase(&self) -> LegPhase {
        self.phase
    }

    pub fn leg(&self) -> Option<&NavData> {
        self.leg.as_ref()
    }

    pub fn is_recoiling(&self) -> bool {
        self.recoiling
    }

    /// Random point in a quadrant other than the one `position` is in
    pub fn next_waypoint(&mut self, position: Vec2) -> Vec2 {
        let current = self.arena.quadrant(position);
        let others: Vec<Quadrant> = Quadrant::ALL.into_iter().filter(|q| *q != current).collect();
        let quadrant = others[self.rng.gen_range(0..others.len())];
        let (col, row) = quadrant.cell();

        let half_w = self.arena.width / 2.0;
        let half_h = self.arena.height / 2.0;
        let raw = Vec2::new(
            self.rng.gen_range(0.0..half_w) + col as f64 * half_w,
            self.rng.gen_range(0.0..half_h) + row as f64 * half_h,
        );
        self.arena.clamp_inset(raw, WALL_BUFFER)
    }

    /// Command for this tick, or `None` while the current primitive is running
    pub fn next_command(&mut self, me: &SelfState, motion: &MotionTracker) -> Option<NavCommand> {
        if !motion.is_finished() {
            return None;
        }
        self.recoiling = false;

        match (self.phase, self.leg) {
            (LegPhase::Aligning, Some(leg)) => {
                self.phase = LegPhase::Traversing;
                Some(NavCommand::new(leg.turn(), leg.distance).with_turn_rate(leg.max_turn_rate()))
            }
            _ => {
                let to = self.next_waypoint(me.position);
                match plan_arc(&self.arena, me.position, to, me.heading) {
                    Ok(leg) => {
                        debug!(
                            from = ?leg.from,
                            to = ?leg.to,
                            center = ?leg.center,
                            distance = leg.distance,
                            "Planned arc leg"
                        );
                        self.leg = Some(leg);
                        self.phase = LegPhase::Aligning;
                        let align = normal_relative(leg.start_heading - me.heading);
                        Some(NavCommand::new(align, 0.0).with_turn_rate(MAX_TURN_RATE_DEG.to_radians()))
                    }
                    Err(err) => {
                        warn!(%err, "Could not plan arc leg");
                        self.phase = LegPhase::Idle;
                        None
                    }
                }
            }
        }
    }

    fn recoil(&mut self, distance: f64) -> Option<NavCommand> {
        if self.recoiling {
            return None;
        }
        self.recoiling = true;
        self.phase = LegPhase::Recoil;
        debug!(distance, "Recoil");
        Some(NavCommand::new(0.0, distance).with_turn_rate(MAX_TURN_RATE_DEG.to_radians()))
    }

    /// Back away from an opponent we ran into; `bearing` is body-relative
    pub fn on_hit_robot(&mut self, bearing: f64) -> Option<NavCommand> {
        let ahead = normal_relative(bearing).abs() <= FRAC_PI_2;
        self.recoil(if ahead { -ROBOT_RECOIL } else { ROBOT_RECOIL })
    }

    /// Back away from a wall; `bearing` is body-relative
    pub fn on_hit_wall(&mut self, bearing: f64) -> Option<NavCommand> {
        let ahead = normal_relative(bearing).abs() <= FRAC_PI_2;
        self.recoil(if ahead { -WALL_RECOIL } else { WALL_RECOIL })
    }

    /// Random dodge against the current travel direction
    pub fn on_hit_by_bullet(&mut self, motion: &MotionTracker) -> Option<NavCommand> {
        if self.recoiling {
            return None;
        }
        let dodge = self.rng.gen_range(DODGE_MIN..=DODGE_MAX);
        let remaining = motion.remaining_distance();
        let distance = if remaining.abs() > 0.0 {
            -sign(remaining) * dodge
        } else {
            dodge
        };
        self.recoil(distance)
    }

    pub fn reset(&mut self) {
        self.phase = LegPhase::Idle;
        self.leg = None;
        self.recoiling = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_leg_scenario() {
        let arena = Arena::new(800.0, 600.0);
        let from = Vec2::new(100.0, 300.0);
        let to = Vec2::new(700.0, 300.0);

        let center = arc_center(&arena, from, to).unwrap();
        // The bisector is vertical, so the centre sits on the nearer horizontal wall
        assert!(arena.on_boundary(center, 1e-9));
        assert!((center.x - 400.0).abs() < 1e-9);
        assert!((center.distance_to(from) - center.distance_to(to)).abs() < 1e-9);

        for heading in [0.0, 0.3, FRAC_PI_2] {
            let leg = plan_arc(&arena, from, to, heading).unwrap();
            assert!(leg.distance > 0.0, "heading {} gave {}", heading, leg.distance);
            assert!((leg.distance - FRAC_PI_2 * 500.0).abs() < 1e-6);
            assert!((leg.start_heading - PI / 4.0).abs() < 1e-9);
            assert!((leg.end_heading - 3.0 * PI / 4.0).abs() < 1e-9);
            assert!((leg.turn() - FRAC_PI_2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reverse_when_facing_away() {
        let arena = Arena::default();
        let from = Vec2::new(100.0, 300.0);
        let to = Vec2::new(700.0, 300.0);
        let forward = plan_arc(&arena, from, to, PI / 4.0).unwrap();
        let reverse = plan_arc(&arena, from, to, PI + PI / 4.0).unwrap();
        assert_eq!(reverse.distance, -forward.distance);
        assert!((normal_relative(reverse.start_heading - forward.start_heading).abs() - PI).abs() < 1e-9);
        assert!((reverse.turn() - forward.turn()).abs() < 1e-9);
    }

    #[test]
    fn test_center_on_wall_and_equidistant() {
        let arena = Arena::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let from = Vec2::new(rng.gen_range(46.0..754.0), rng.gen_range(46.0..554.0));
            let to = Vec2::new(rng.gen_range(46.0..754.0), rng.gen_range(46.0..554.0));
            if from.distance_to(to) < 1.0 {
                continue;
            }
            let center = arc_center(&arena, from, to).unwrap();
            let on_x = center.x == 0.0 || center.x == 800.0;
            let on_y = center.y == 0.0 || center.y == 600.0;
            assert!(on_x || on_y, "{:?}", center);
            let gap = (center.distance_to(from) - center.distance_to(to)).abs();
            assert!(gap < 1e-6 * center.distance_to(from).max(1.0));

            let leg = plan_arc(&arena, from, to, rng.gen_range(0.0..6.28)).unwrap();
            assert!(leg.distance.abs() > 0.0);
            assert!(leg.max_turn_rate() <= MAX_TURN_RATE_DEG.to_radians() + 1e-12);
        }
    }

    #[test]
    fn test_coincident_points_degenerate() {
        let arena = Arena::default();
        let p = Vec2::new(200.0, 200.0);
        assert!(matches!(
            plan_arc(&arena, p, p, 0.0),
            Err(CoreError::GeometryDegenerate { .. })
        ));
    }

    #[test]
    fn test_turn_rate_spreads_turn_over_leg() {
        let leg = NavData {
            from: Vec2::ZERO,
            to: Vec2::ZERO,
            center: Vec2::ZERO,
            radius: 100.0,
            distance: 128.0,
            start_heading: 0.0,
            end_heading: 1.1,
        };
        assert!((leg.max_turn_rate() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_waypoints_leave_quadrant_and_respect_buffer() {
        let arena = Arena::default();
        let mut nav = ArcPursuit::new(arena, 42);
        let here = Vec2::new(100.0, 100.0);
        for _ in 0..100 {
            let p = nav.next_waypoint(here);
            assert_ne!(arena.quadrant(p), Quadrant::BottomLeft);
            assert!(arena.contains_inset(p, WALL_BUFFER));
        }
    }

    #[test]
    fn test_seeded_waypoints_repeat() {
        let mut a = ArcPursuit::new(Arena::default(), 9);
        let mut b = ArcPursuit::new(Arena::default(), 9);
        let here = Vec2::new(600.0, 400.0);
        for _ in 0..10 {
            assert_eq!(a.next_waypoint(here), b.next_waypoint(here));
        }
    }

    #[test]
    fn test_align_then_traverse() {
        let mut nav = ArcPursuit::new(Arena::default(), 1);
        let mut motion = MotionTracker::new();
        let me = SelfState {
            position: Vec2::new(150.0, 150.0),
            ..Default::default()
        };
        motion.observe(&me);

        let align = nav.next_command(&me, &motion).unwrap();
        assert_eq!(nav.phase(), LegPhase::Aligning);
        assert_eq!(align.distance, 0.0);
        motion.begin(&align);

        // Still turning: nothing new
        if align.turn.abs() > 1e-3 {
            assert!(nav.next_command(&me, &motion).is_none());
        }

        motion.abort();
        let traverse = nav.next_command(&me, &motion).unwrap();
        assert_eq!(nav.phase(), LegPhase::Traversing);
        let leg = *nav.leg().unwrap();
        assert_eq!(traverse.distance, leg.distance);
        assert_eq!(traverse.max_turn_rate, Some(leg.max_turn_rate()));
    }

    #[test]
    fn test_recoil_guarded_against_reentry() {
        let mut nav = ArcPursuit::new(Arena::default(), 1);
        let motion = MotionTracker::new();

        let first = nav.on_hit_robot(0.1).unwrap();
        assert_eq!(first.distance, -ROBOT_RECOIL);
        assert_eq!(nav.phase(), LegPhase::Recoil);
        assert!(nav.on_hit_robot(0.1).is_none());
        assert!(nav.on_hit_wall(0.0).is_none());
        assert!(nav.on_hit_by_bullet(&motion).is_none());

        // A finished primitive clears the guard
        let me = SelfState::default();
        nav.next_command(&me, &motion);
        assert!(!nav.is_recoiling());
        let behind = nav.on_hit_robot(PI).unwrap();
        assert_eq!(behind.distance, ROBOT_RECOIL);
    }

    #[test]
    fn test_wall_recoil_backs_away() {
        let mut nav = ArcPursuit::new(Arena::default(), 1);
        assert_eq!(nav.on_hit_wall(0.2).map(|c| c.distance), Some(-WALL_RECOIL));
    }

    #[test]
    fn test_dodge_reverses_travel() {
        let mut nav = ArcPursuit::new(Arena::default(), 3);
        let mut motion = MotionTracker::new();
        motion.begin(&NavCommand::new(0.0, 200.0));
        let dodge = nav.on_hit_by_bullet(&motion).unwrap();
        assert!(dodge.distance <= -DODGE_MIN && dodge.distance >= -DODGE_MAX);
    }
}
