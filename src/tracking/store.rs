//! Shared per-opponent track map
//!
//! Callbacks and the decision tick can interleave, so the map sits behind a
//! read-write lock. Readers get copies of recordings, never references.

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::game::events::{SelfState, Sighting};
use crate::tracking::recording::Recording;
use crate::tracking::track::Track;
use crate::util::vec2::Vec2;

pub struct TrackStore {
    tracks: RwLock<HashMap<String, Track>>,
    capacity: usize,
}

impl TrackStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            tracks: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Derive a recording from a sighting and append it, creating the track if needed
    pub fn observe(&self, sighting: &Sighting, observer: &SelfState) -> Recording {
        let mut tracks = self.tracks.write();
        let track = tracks
            .entry(sighting.name.clone())
            .or_insert_with(|| Track::new(sighting.name.as_str(), self.capacity));
        let recording = track.derive(sighting, observer);
        track.push(recording);
        recording
    }

    /// Append a prepared recording
    pub fn record(&self, name: &str, recording: Recording) {
        let mut tracks = self.tracks.write();
        match tracks.get_mut(name) {
            Some(track) => track.push(recording),
            None => {
                let mut track = Track::new(name, self.capacity);
                track.push(recording);
                tracks.insert(name.to_string(), track);
            }
        }
    }

    /// Drop a track, returning whether it existed
    pub fn remove(&self, name: &str) -> bool {
        self.tracks.write().remove(name).is_some()
    }

    pub fn top(&self, name: &str) -> Option<Recording> {
        self.tracks.read().get(name).and_then(|t| t.top().copied())
    }

    /// Latest recording of every tracked opponent, ordered by name
    pub fn tops(&self) -> Vec<(String, Recording)> {
        let mut tops: Vec<(String, Recording)> = self
            .tracks
            .read()
            .iter()
            .filter_map(|(name, track)| track.top().map(|r| (name.clone(), *r)))
            .collect();
        // Map iteration order is seeded per map; decisions must not depend on it
        tops.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
        tops
    }

    /// Extrapolated position of `name` at `tick`
    pub fn predict(&self, name: &str, tick: u64) -> CoreResult<Vec2> {
        self.top(name)
            .map(|recording| recording.advance(tick))
            .ok_or_else(|| CoreError::PredictionUnavailable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tracks.read().contains_key(name)
    }

    pub fn snapshot(&self, name: &str) -> Option<Track> {
        self.tracks.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tracks.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tracks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.read().is_empty()
    }

    pub fn clear(&self) {
        self.tracks.write().clear();
    }
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new(crate::game::constants::tracking::TRACK_CAPACITY)
    }
}
