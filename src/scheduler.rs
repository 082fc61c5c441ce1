//! Priority-ordered predicate tasks
//!
//! Each task pairs a predicate over the agent's current state with an action.
//! Every tick the scheduler walks tasks from highest to lowest priority, runs
//! the action of each task whose predicate holds, and drops one-shot tasks
//! once they have run.

use smallvec::SmallVec;

use crate::game::events::SelfState;
use crate::targeting::solution::FiringSolution;

/// What a task asks the agent to do this tick
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEffect {
    Fire(FiringSolution),
    /// Radar turn in radians
    Radar(f64),
}

type Predicate = Box<dyn Fn(&SelfState) -> bool + Send>;
type Action = Box<dyn FnMut(&SelfState) -> Option<TaskEffect> + Send>;

pub struct ScheduledTask {
    name: &'static str,
    priority: u8,
    repeat: bool,
    predicate: Predicate,
    action: Action,
}

impl ScheduledTask {
    /// A task removed after its action runs once
    pub fn once(
        name: &'static str,
        priority: u8,
        predicate: impl Fn(&SelfState) -> bool + Send + 'static,
        action: impl FnMut(&SelfState) -> Option<TaskEffect> + Send + 'static,
    ) -> Self {
        Self {
            name,
            priority,
            repeat: false,
            predicate: Box::new(predicate),
            action: Box::new(action),
        }
    }

    /// A task that stays scheduled after running
    pub fn repeating(
        name: &'static str,
        priority: u8,
        predicate: impl Fn(&SelfState) -> bool + Send + 'static,
        action: impl FnMut(&SelfState) -> Option<TaskEffect> + Send + 'static,
    ) -> Self {
        Self {
            repeat: true,
            ..Self::once(name, priority, predicate, action)
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("repeat", &self.repeat)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    /// Highest priority first; equal priorities keep insertion order
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, task: ScheduledTask) {
        let at = self
            .tasks
            .iter()
            .position(|t| t.priority < task.priority)
            .unwrap_or(self.tasks.len());
        self.tasks.insert(at, task);
    }

    /// Remove every task named `name`, returning how many were removed
    pub fn cancel(&mut self, name: &str) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.name != name);
        before - self.tasks.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.iter().any(|t| t.name == name)
    }

    /// Run every task whose predicate holds, in priority order
    pub fn run(&mut self, state: &SelfState) -> SmallVec<[TaskEffect; 4]> {
        let mut effects = SmallVec::new();
        self.tasks.retain_mut(|task| {
            if !(task.predicate)(state) {
                return true;
            }
            if let Some(effect) = (task.action)(state) {
                effects.push(effect);
            }
            task.repeat
        });
        effects
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ScheduledTask::repeating("low", 1, |_| true, |_| Some(TaskEffect::Radar(1.0))));
        scheduler.schedule(ScheduledTask::repeating("high", 9, |_| true, |_| Some(TaskEffect::Radar(9.0))));
        scheduler.schedule(ScheduledTask::repeating("mid", 5, |_| true, |_| Some(TaskEffect::Radar(5.0))));

        let effects = scheduler.run(&SelfState::default());
        assert_eq!(
            effects.as_slice(),
            &[TaskEffect::Radar(9.0), TaskEffect::Radar(5.0), TaskEffect::Radar(1.0)]
        );
    }

    #[test]
    fn test_one_shot_waits_for_predicate() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ScheduledTask::once(
            "fire",
            99,
            |s| s.tick >= 10,
            |_| Some(TaskEffect::Radar(0.0)),
        ));

        let mut state = SelfState::default();
        for tick in 0..10 {
            state.tick = tick;
            assert!(scheduler.run(&state).is_empty());
            assert!(scheduler.contains("fire"));
        }
        state.tick = 10;
        assert_eq!(scheduler.run(&state).len(), 1);
        assert!(scheduler.is_empty());
        assert!(scheduler.run(&state).is_empty());
    }

    #[test]
    fn test_repeating_stays() {
        let mut scheduler = Scheduler::new();
        let mut count = 0u32;
        scheduler.schedule(ScheduledTask::repeating("radar", 1, |_| true, move |_| {
            count += 1;
            Some(TaskEffect::Radar(count as f64))
        }));
        let state = SelfState::default();
        scheduler.run(&state);
        let effects = scheduler.run(&state);
        assert_eq!(effects.as_slice(), &[TaskEffect::Radar(2.0)]);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ScheduledTask::once("fire", 99, |_| false, |_| None));
        scheduler.schedule(ScheduledTask::once("fire", 99, |_| false, |_| None));
        scheduler.schedule(ScheduledTask::repeating("radar", 1, |_| false, |_| None));
        assert_eq!(scheduler.cancel("fire"), 2);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.tasks[0].name(), "radar");
    }
}
