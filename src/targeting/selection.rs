use crate::game::constants::targeting::RETARGET_GUN_HEAT;
use crate::game::constants::tracking::WEAK_ENERGY;
use crate::game::events::SelfState;
use crate::tracking::recording::Recording;

/// Picks which opponent the gun works on
///
/// A finishable opponent (low energy) beats a near one. The choice sticks
/// while the gun cools down and is revisited right after a shot.
#[derive(Debug, Clone, Default)]
pub struct TargetSelector {
    current: Option<String>,
}

impl TargetSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn select(&mut self, me: &SelfState, candidates: &[(String, Recording)]) -> Option<String> {
        let still_tracked = self
            .current
            .as_ref()
            .is_some_and(|name| candidates.iter().any(|(n, _)| n == name));

        if !still_tracked || me.gun_heat > RETARGET_GUN_HEAT {
            self.current = Self::best(me, candidates);
        }
        self.current.clone()
    }

    fn best(me: &SelfState, candidates: &[(String, Recording)]) -> Option<String> {
        let distance = |r: &Recording| r.advance(me.tick).distance_to(me.position);

        let weakest = candidates
            .iter()
            .filter(|(_, r)| r.energy <= WEAK_ENERGY)
            .min_by(|(_, a), (_, b)| {
                a.energy
                    .total_cmp(&b.energy)
                    .then_with(|| distance(a).total_cmp(&distance(b)))
            });
        if let Some((name, _)) = weakest {
            return Some(name.clone());
        }

        candidates
            .iter()
            .min_by(|(_, a), (_, b)| distance(a).total_cmp(&distance(b)))
            .map(|(name, _)| name.clone())
    }

    /// Drop the current target if it is `name`
    pub fn forget(&mut self, name: &str) {
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
