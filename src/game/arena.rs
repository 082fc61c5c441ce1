//! Arena geometry
//!
//! The arena is the rectangle `[0, width] x [0, height]`, origin bottom-left.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::util::vec2::Vec2;

/// One of the four arena quarters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    BottomLeft,
    BottomRight,
    TopRight,
    TopLeft,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
        Quadrant::TopRight,
        Quadrant::TopLeft,
    ];

    /// (column, row) of the quarter, each 0 or 1
    pub fn cell(self) -> (u8, u8) {
        match self {
            Quadrant::BottomLeft => (0, 0),
            Quadrant::BottomRight => (1, 0),
            Quadrant::TopRight => (1, 1),
            Quadrant::TopLeft => (0, 1),
        }
    }
}

/// Arena dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl Arena {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Longest straight line inside the arena
    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }

    /// Inclusive bounds check
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Bounds check with every wall pulled in by `margin`
    pub fn contains_inset(&self, p: Vec2, margin: f64) -> bool {
        p.x >= margin && p.x <= self.width - margin && p.y >= margin && p.y <= self.height - margin
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        self.clamp_inset(p, 0.0)
    }

    pub fn clamp_inset(&self, p: Vec2, margin: f64) -> Vec2 {
        Vec2::new(
            p.x.clamp(margin, (self.width - margin).max(margin)),
            p.y.clamp(margin, (self.height - margin).max(margin)),
        )
    }

    /// Returns the point unchanged when inside, otherwise `OutOfBoundsPrediction`
    pub fn check(&self, p: Vec2) -> CoreResult<Vec2> {
        if self.contains(p) {
            Ok(p)
        } else {
            Err(CoreError::out_of_bounds(p))
        }
    }

    pub fn quadrant(&self, p: Vec2) -> Quadrant {
        let left = p.x < self.width / 2.0;
        let bottom = p.y < self.height / 2.0;
        match (left, bottom) {
            (true, true) => Quadrant::BottomLeft,
            (false, true) => Quadrant::BottomRight,
            (false, false) => Quadrant::TopRight,
            (true, false) => Quadrant::TopLeft,
        }
    }

    /// x of the vertical wall nearer to `p`
    pub fn nearer_x_wall(&self, p: Vec2) -> f64 {
        if p.x > self.width / 2.0 {
            self.width
        } else {
            0.0
        }
    }

    /// y of the horizontal wall nearer to `p`
    pub fn nearer_y_wall(&self, p: Vec2) -> f64 {
        if p.y > self.height / 2.0 {
            self.height
        } else {
            0.0
        }
    }

    /// Projections of `p` onto the nearer horizontal and vertical walls
    pub fn wall_projections(&self, p: Vec2) -> [Vec2; 2] {
        [
            Vec2::new(p.x, self.nearer_y_wall(p)),
            Vec2::new(self.nearer_x_wall(p), p.y),
        ]
    }

    /// Whether `p` lies on any wall within `epsilon`
    pub fn on_boundary(&self, p: Vec2, epsilon: f64) -> bool {
        let on_x = p.x.abs() < epsilon || (p.x - self.width).abs() < epsilon;
        let on_y = p.y.abs() < epsilon || (p.y - self.height).abs() < epsilon;
        on_x || on_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_arena() {
        let arena = Arena::default();
        assert_eq!(arena.center(), Vec2::new(400.0, 300.0));
        assert!((arena.diagonal() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_contains_inclusive() {
        let arena = Arena::default();
        assert!(arena.contains(Vec2::new(0.0, 0.0)));
        assert!(arena.contains(Vec2::new(800.0, 600.0)));
        assert!(!arena.contains(Vec2::new(800.1, 300.0)));
        assert!(!arena.contains_inset(Vec2::new(10.0, 300.0), 18.0));
    }

    #[test]
    fn test_check_reports_out_of_bounds() {
        let arena = Arena::default();
        assert!(arena.check(Vec2::new(10.0, 10.0)).is_ok());
        assert!(matches!(
            arena.check(Vec2::new(-1.0, 10.0)),
            Err(CoreError::OutOfBoundsPrediction { .. })
        ));
    }

    #[test]
    fn test_quadrants() {
        let arena = Arena::default();
        assert_eq!(arena.quadrant(Vec2::new(100.0, 100.0)), Quadrant::BottomLeft);
        assert_eq!(arena.quadrant(Vec2::new(700.0, 100.0)), Quadrant::BottomRight);
        assert_eq!(arena.quadrant(Vec2::new(700.0, 500.0)), Quadrant::TopRight);
        assert_eq!(arena.quadrant(Vec2::new(100.0, 500.0)), Quadrant::TopLeft);
    }

    #[test]
    fn test_wall_projections() {
        let arena = Arena::default();
        let [horizontal, vertical] = arena.wall_projections(Vec2::new(700.0, 100.0));
        assert_eq!(horizontal, Vec2::new(700.0, 0.0));
        assert_eq!(vertical, Vec2::new(800.0, 100.0));
    }

    #[test]
    fn test_clamp_inset() {
        let arena = Arena::default();
        let p = arena.clamp_inset(Vec2::new(-20.0, 900.0), 46.0);
        assert_eq!(p, Vec2::new(46.0, 554.0));
    }
}
