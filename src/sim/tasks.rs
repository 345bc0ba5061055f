//! Delayed and repeating work owned by the game state
//!
//! Tasks count down in frame time. They run only when a tick drains them,
//! and teardown cancels whatever is still pending.

use glam::Vec2;

use super::ball::BallKind;
use crate::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u32);

/// Work a task performs when it fires
#[derive(Debug, Clone, PartialEq)]
pub enum TaskAction {
    /// One shot from the paddle on `side`
    FireProjectile { side: Side },
    /// One burst of firework particles
    Firework { origin: Vec2, burst: u32 },
    SpawnFakeBall {
        kind: BallKind,
        origin: Vec2,
        velocity: Vec2,
        last_hit: Option<Side>,
    },
    /// Put a new ball in play heading toward `toward`
    Serve { toward: Side },
    /// Drop a random pickup into the arena
    SpawnPickup,
}

#[derive(Debug, Clone)]
struct Task {
    id: TaskId,
    remaining: f32,
    interval: f32,
    /// `None` repeats until cancelled
    runs_left: Option<u32>,
    action: TaskAction,
}

#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    tasks: Vec<Task>,
    next_id: u32,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once after `delay` frames
    pub fn schedule(&mut self, delay: f32, action: TaskAction) -> TaskId {
        self.push(delay, 0.0, Some(1), action)
    }

    /// Run `action` after `delay`, then every `interval`, `count` times in total
    pub fn schedule_repeating(
        &mut self,
        delay: f32,
        interval: f32,
        count: Option<u32>,
        action: TaskAction,
    ) -> TaskId {
        self.push(delay, interval, count, action)
    }

    fn push(&mut self, delay: f32, interval: f32, runs_left: Option<u32>, action: TaskAction) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        log::trace!("Scheduled {:?} in {} frames", action, delay);
        self.tasks.push(Task {
            id,
            remaining: delay,
            interval,
            runs_left,
            action,
        });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Drop every pending task, returning how many were cancelled
    pub fn cancel_all(&mut self) -> usize {
        let count = self.tasks.len();
        if count > 0 {
            log::debug!("Cancelled {} pending tasks", count);
        }
        self.tasks.clear();
        count
    }

    /// Advance every task by `dt`, returning the actions that came due
    ///
    /// A repeating task can fire several times in one call when `dt` spans
    /// more than one interval.
    pub fn advance(&mut self, dt: f32) -> Vec<TaskAction> {
        let mut due = Vec::new();
        for task in &mut self.tasks {
            task.remaining -= dt;
            while task.remaining <= 0.0 && task.runs_left != Some(0) {
                due.push(task.action.clone());
                if let Some(runs) = task.runs_left.as_mut() {
                    *runs -= 1;
                }
                if task.interval <= 0.0 {
                    // Non-repeating, or a zero interval that would spin forever
                    if task.runs_left.is_none() {
                        task.runs_left = Some(0);
                    }
                    break;
                }
                task.remaining += task.interval;
            }
        }
        self.tasks.retain(|t| t.runs_left != Some(0));
        due
    }

    pub fn has_pending(&self, pred: impl Fn(&TaskAction) -> bool) -> bool {
        self.tasks.iter().any(|t| pred(&t.action))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
