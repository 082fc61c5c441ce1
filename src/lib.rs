//! Arena Duelist decision core
//!
//! The aiming, firing and movement brain of a combat agent in a tick-based 2D
//! arena. A host reports the agent's own kinematics and radar sightings; the
//! core answers each tick with at most one movement, gun and radar command.
//!
//! # Layout
//!
//! - `tracking` - per-opponent kinematic history and closed-form prediction
//! - `targeting` - intercept solving, bullet power, target choice and gun timing
//! - `learning` - guess-factor histograms fed by waves
//! - `nav` - arc pursuit and potential field movement over shared motion tracking
//! - `agent` - the per-tick decision loop tying it together
//! - `sim` - a deterministic headless arena for end-to-end runs

pub mod config;
pub mod error;
pub mod util;
pub mod game;
pub mod tracking;
pub mod targeting;
pub mod learning;
pub mod nav;
pub mod radar;
pub mod scheduler;
pub mod stats;
pub mod agent;
pub mod sim;

pub use agent::Agent;
pub use config::AgentConfig;
pub use error::{CoreError, CoreResult};
