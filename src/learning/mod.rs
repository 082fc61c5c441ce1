//! Statistical aim correction learned from wave outcomes

pub mod guess_factor;
pub mod wave;

pub use guess_factor::{CellKey, GuessFactorContext, GuessFactorTable};
pub use wave::{Wave, WaveReport, WaveSet, WaveState};
