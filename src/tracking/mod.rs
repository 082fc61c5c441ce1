//! Opponent tracking and kinematic prediction

pub mod recording;
pub mod store;
pub mod track;

pub use recording::Recording;
pub use store::TrackStore;
pub use track::Track;
