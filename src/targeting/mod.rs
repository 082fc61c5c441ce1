//! Aiming: target choice, bullet power, intercept solving and gun timing

pub mod gun;
pub mod power;
pub mod selection;
pub mod solution;
pub mod solver;

pub use gun::GunControl;
pub use power::PowerSelector;
pub use selection::TargetSelector;
pub use solution::{AimMethod, FiringSolution};
pub use solver::{Intercept, InterceptSolver};
