pub mod arena;
pub mod constants;
pub mod events;
pub mod inbox;
