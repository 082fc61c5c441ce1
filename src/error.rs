//! Error taxonomy for the decision core
//!
//! Every variant is recovered locally by the caller. None of them stops the
//! decision loop; the worst outcome is a skipped shot or a suboptimal move.

use crate::util::vec2::Vec2;

/// Recoverable failures raised by geometry, prediction and targeting
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// Bearing requested between coincident points
    #[error("degenerate geometry: coincident points at ({x:.2}, {y:.2})")]
    GeometryDegenerate { x: f64, y: f64 },

    /// Intercept iteration ran past the arena diagonal without converging
    #[error("no intercept solution after {ticks} ticks ({travelled:.1} units travelled)")]
    NoInterceptSolution { ticks: u64, travelled: f64 },

    /// Bullet power outside what the gun can fire
    #[error("bullet power {power} gives non-positive speed {speed}")]
    InvalidBulletPower { power: f64, speed: f64 },

    /// No track exists yet for the requested opponent
    #[error("no prediction available for '{0}'")]
    PredictionUnavailable(String),

    /// A predicted point fell outside the arena
    #[error("prediction ({x:.1}, {y:.1}) is outside the arena")]
    OutOfBoundsPrediction { x: f64, y: f64 },
}

impl CoreError {
    pub fn degenerate(at: Vec2) -> Self {
        CoreError::GeometryDegenerate { x: at.x, y: at.y }
    }

    pub fn out_of_bounds(at: Vec2) -> Self {
        CoreError::OutOfBoundsPrediction { x: at.x, y: at.y }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
