//! Radar sweep
//!
//! Spin until every live opponent has a track, then keep turning toward the
//! opponent whose last sighting is oldest so no track goes stale.

use std::f64::consts::TAU;

use crate::game::events::SelfState;
use crate::tracking::recording::Recording;
use crate::util::angle::{bearing, normal_relative, sign};

#[derive(Debug, Clone, Copy, Default)]
pub struct RadarControl;

impl RadarControl {
    /// Radar turn for this tick; always a full turn so the host caps it at its rate
    pub fn turn(me: &SelfState, tracks: &[(String, Recording)]) -> f64 {
        if tracks.len() < me.others.max(1) {
            return TAU;
        }
        let Some((_, oldest)) = tracks.iter().min_by_key(|(_, r)| r.tick) else {
            return TAU;
        };
        let towards = bearing(me.position, oldest.advance(me.tick));
        // Zero offset still turns, otherwise the radar would stop dead on the target
        sign(normal_relative(towards - me.radar_heading)) * TAU
    }
}
