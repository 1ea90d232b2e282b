//! Cancellable timed tasks, keyed so they can be enumerated.
//!
//! Nothing here runs on its own: the host polls [`TaskScheduler::pop_due`]
//! with the current time and acts on what comes back. Cancelling a key is
//! therefore final, a cancelled task can never fire late.

use crate::spawner::TargetId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKey {
    /// next one-second tick of the round clock
    Countdown,
    /// next spawn attempt
    Spawn,
    /// removal of a target once its dwell runs out
    Expire(TargetId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Deadline {
    Armed { at: f64 },
    Suspended { remaining: f64 },
}

#[derive(Debug, Default)]
pub struct TaskScheduler {
    tasks: HashMap<TaskKey, Deadline>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `key` to fire `delay` ms after `now`, replacing any earlier entry.
    pub fn schedule(&mut self, key: TaskKey, now: f64, delay: f64) {
        self.schedule_at(key, now + delay.max(0.0));
    }

    pub fn schedule_at(&mut self, key: TaskKey, at: f64) {
        self.tasks.insert(key, Deadline::Armed { at });
    }

    pub fn cancel(&mut self, key: TaskKey) -> bool {
        self.tasks.remove(&key).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn contains(&self, key: TaskKey) -> bool {
        self.tasks.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Deadline of an armed task.
    pub fn deadline(&self, key: TaskKey) -> Option<f64> {
        match self.tasks.get(&key) {
            Some(Deadline::Armed { at }) => Some(*at),
            _ => None,
        }
    }

    /// Time left on a suspended task.
    pub fn remaining(&self, key: TaskKey) -> Option<f64> {
        match self.tasks.get(&key) {
            Some(Deadline::Suspended { remaining }) => Some(*remaining),
            _ => None,
        }
    }

    /// Freeze every armed task, keeping what was left of its delay.
    /// Overdue tasks keep zero and fire on the first poll after resuming.
    pub fn suspend_all(&mut self, now: f64) {
        for deadline in self.tasks.values_mut() {
            if let Deadline::Armed { at } = *deadline {
                *deadline = Deadline::Suspended {
                    remaining: (at - now).max(0.0),
                };
            }
        }
    }

    /// Re-arm every suspended task from `now` with its kept remainder.
    pub fn resume_all(&mut self, now: f64) {
        for deadline in self.tasks.values_mut() {
            if let Deadline::Suspended { remaining } = *deadline {
                *deadline = Deadline::Armed { at: now + remaining };
            }
        }
    }

    /// Remove and return the earliest armed task due at `now`, with the
    /// deadline it was due at. Ties break on key order.
    pub fn pop_due(&mut self, now: f64) -> Option<(TaskKey, f64)> {
        let (key, at) = self
            .tasks
            .iter()
            .filter_map(|(key, deadline)| match deadline {
                Deadline::Armed { at } if *at <= now => Some((*key, *at)),
                _ => None,
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))?;
        self.tasks.remove(&key);
        Some((key, at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nothing_fires_early() {
        let mut scheduler = TaskScheduler::new();
        scheduler.schedule(TaskKey::Spawn, 0.0, 500.0);
        assert_eq!(scheduler.pop_due(499.9), None);
        assert_eq!(scheduler.pop_due(500.0), Some((TaskKey::Spawn, 500.0)));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn due_tasks_come_out_in_deadline_order() {
        let mut scheduler = TaskScheduler::new();
        scheduler.schedule(TaskKey::Expire(2), 0.0, 300.0);
        scheduler.schedule(TaskKey::Expire(1), 0.0, 100.0);
        scheduler.schedule(TaskKey::Countdown, 0.0, 300.0);
        scheduler.schedule(TaskKey::Spawn, 0.0, 5000.0);

        let order: Vec<TaskKey> = std::iter::from_fn(|| scheduler.pop_due(1000.0))
            .map(|(key, _)| key)
            .collect();
        assert_eq!(
            order,
            vec![TaskKey::Expire(1), TaskKey::Countdown, TaskKey::Expire(2)]
        );
        assert!(scheduler.contains(TaskKey::Spawn));
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut scheduler = TaskScheduler::new();
        scheduler.schedule(TaskKey::Expire(9), 0.0, 10.0);
        assert!(scheduler.cancel(TaskKey::Expire(9)));
        assert!(!scheduler.cancel(TaskKey::Expire(9)));
        assert_eq!(scheduler.pop_due(1_000.0), None);
    }

    #[test]
    fn rescheduling_replaces_the_deadline() {
        let mut scheduler = TaskScheduler::new();
        scheduler.schedule(TaskKey::Spawn, 0.0, 100.0);
        scheduler.schedule(TaskKey::Spawn, 0.0, 900.0);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.deadline(TaskKey::Spawn), Some(900.0));
    }

    #[test]
    fn suspend_keeps_remaining_and_resume_shifts_deadline() {
        let mut scheduler = TaskScheduler::new();
        scheduler.schedule(TaskKey::Expire(1), 0.0, 2000.0);
        scheduler.suspend_all(1500.0);

        assert_eq!(scheduler.deadline(TaskKey::Expire(1)), None);
        assert_relative_eq!(scheduler.remaining(TaskKey::Expire(1)).unwrap(), 500.0);
        // suspended tasks never come due
        assert_eq!(scheduler.pop_due(1_000_000.0), None);

        scheduler.resume_all(10_000.0);
        assert_eq!(scheduler.pop_due(10_499.0), None);
        assert_eq!(
            scheduler.pop_due(10_500.0),
            Some((TaskKey::Expire(1), 10_500.0))
        );
    }

    #[test]
    fn overdue_task_suspends_with_zero_remaining() {
        let mut scheduler = TaskScheduler::new();
        scheduler.schedule(TaskKey::Expire(3), 0.0, 100.0);
        scheduler.suspend_all(250.0);
        assert_relative_eq!(scheduler.remaining(TaskKey::Expire(3)).unwrap(), 0.0);
        scheduler.resume_all(400.0);
        assert_eq!(scheduler.pop_due(400.0), Some((TaskKey::Expire(3), 400.0)));
    }

    #[test]
    fn negative_delay_fires_immediately() {
        let mut scheduler = TaskScheduler::new();
        scheduler.schedule(TaskKey::Countdown, 50.0, -20.0);
        assert_eq!(scheduler.pop_due(50.0), Some((TaskKey::Countdown, 50.0)));
    }
}
