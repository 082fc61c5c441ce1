//! Headless arena used to exercise the agent end to end

pub mod host;
pub mod script;

pub use host::{MatchSummary, ScriptedHost};
pub use script::{Bullet, Opponent, OpponentScript, Shooter};
