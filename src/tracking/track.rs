use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::game::events::{SelfState, Sighting};
use crate::tracking::recording::Recording;
use crate::util::angle::{normal_relative, sign};

/// Bounded kinematic history of one opponent, most recent first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    name: String,
    capacity: usize,
    recordings: VecDeque<Recording>,
}

impl Track {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name: name.into(),
            capacity,
            recordings: VecDeque::with_capacity(capacity),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    /// Most recent recording
    pub fn top(&self) -> Option<&Recording> {
        self.recordings.front()
    }

    /// Recordings from newest to oldest
    pub fn iter(&self) -> impl Iterator<Item = &Recording> {
        self.recordings.iter()
    }

    /// Append, evicting the oldest recording when full
    pub fn push(&mut self, recording: Recording) {
        if self.recordings.len() == self.capacity {
            self.recordings.pop_back();
        }
        self.recordings.push_front(recording);
    }

    /// Build the recording a sighting implies, relative to this track's history
    ///
    /// Turn rate is the heading change since the previous sample divided by the
    /// elapsed ticks, and zero on first sighting. The lateral direction keeps its
    /// previous value while the opponent moves straight along the line of sight.
    pub fn derive(&self, sighting: &Sighting, observer: &SelfState) -> Recording {
        let bearing = sighting.absolute_bearing(observer);
        let previous = self.top();

        let turn_rate = match previous {
            Some(prev) if sighting.tick > prev.tick => {
                normal_relative(sighting.heading - prev.heading) / (sighting.tick - prev.tick) as f64
            }
            Some(prev) => prev.turn_rate,
            None => 0.0,
        };

        let lateral = sighting.velocity * (sighting.heading - bearing).sin();
        let lateral_direction = if lateral.abs() > f64::EPSILON {
            sign(lateral)
        } else {
            previous.map_or(1.0, |prev| prev.lateral_direction)
        };

        Recording {
            tick: sighting.tick,
            position: sighting.position(observer),
            heading: sighting.heading,
            velocity: sighting.velocity,
            turn_rate,
            energy: sighting.energy,
            bearing,
            lateral_direction,
        }
    }
}
