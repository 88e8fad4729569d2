//! Tick-based task scheduler
//!
//! All deferred work (waits, repeats, duration reverts, landing watches)
//! lives here as plain data. The engine drains due tasks each tick and
//! interprets them; nothing runs off the simulation thread. Every scheduled
//! task has a handle so shutdown can cancel the lot.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::core::types::{BlockPos, EntityId, Tick, Vec3};
use crate::scripts::action::ScriptAction;
use crate::scripts::data::ScriptActionData;
use crate::world::{BossBarId, Material};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(pub u64);

/// Per-task state of a repeating action.
#[derive(Debug, Clone, Default)]
pub struct BeatState {
    /// Runs attempted so far, incremented before the gate check.
    pub counter: i64,
}

/// Deferred work, interpreted by the engine when due
#[derive(Clone)]
pub enum TaskWork {
    /// One beat of a (possibly repeating) action.
    ActionBeat {
        action: Rc<ScriptAction>,
        data: ScriptActionData,
        state: BeatState,
    },
    /// Velocity change applied the tick after the PUSH action ran.
    ApplyPush {
        targets: Vec<EntityId>,
        velocities: Vec<Vec3>,
        additive: bool,
    },
    RevertInvulnerable {
        entity: EntityId,
        invulnerable: bool,
    },
    /// Undo a TAG or UNTAG after its duration: remove when `reapply` is
    /// false, re-add when true.
    RevertTags {
        entity: EntityId,
        tags: Vec<String>,
        reapply: bool,
    },
    RevertAi {
        entity: EntityId,
        enabled: bool,
    },
    RevertAware {
        entity: EntityId,
        aware: bool,
    },
    RevertScale {
        entity: EntityId,
    },
    RemoveBossBar {
        bar: BossBarId,
    },
    RevertBlock {
        world: String,
        pos: BlockPos,
        material: Material,
    },
    DespawnReinforcement {
        entity: EntityId,
    },
    /// Poll a summoned entity until it grounds, then run its landing
    /// scripts there. Gives up at `deadline`.
    LandingWatch {
        entity: EntityId,
        scripts: Vec<String>,
        data: ScriptActionData,
        deadline: Tick,
    },
    RevertWeather {
        world: String,
    },
}

impl std::fmt::Debug for TaskWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskWork::ActionBeat { state, .. } => {
                f.debug_struct("ActionBeat").field("counter", &state.counter).finish()
            }
            TaskWork::ApplyPush { targets, .. } => {
                f.debug_struct("ApplyPush").field("targets", &targets.len()).finish()
            }
            TaskWork::RevertInvulnerable { entity, .. } => {
                f.debug_tuple("RevertInvulnerable").field(entity).finish()
            }
            TaskWork::RevertTags { entity, .. } => {
                f.debug_tuple("RevertTags").field(entity).finish()
            }
            TaskWork::RevertAi { entity, .. } => f.debug_tuple("RevertAi").field(entity).finish(),
            TaskWork::RevertAware { entity, .. } => {
                f.debug_tuple("RevertAware").field(entity).finish()
            }
            TaskWork::RevertScale { entity } => {
                f.debug_tuple("RevertScale").field(entity).finish()
            }
            TaskWork::RemoveBossBar { bar } => f.debug_tuple("RemoveBossBar").field(bar).finish(),
            TaskWork::RevertBlock { world, pos, .. } => {
                f.debug_struct("RevertBlock").field("world", world).field("pos", pos).finish()
            }
            TaskWork::DespawnReinforcement { entity } => {
                f.debug_tuple("DespawnReinforcement").field(entity).finish()
            }
            TaskWork::LandingWatch { entity, deadline, .. } => f
                .debug_struct("LandingWatch")
                .field("entity", entity)
                .field("deadline", deadline)
                .finish(),
            TaskWork::RevertWeather { world } => {
                f.debug_tuple("RevertWeather").field(world).finish()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub handle: TaskHandle,
    pub run_at: Tick,
    pub work: TaskWork,
}

/// Min-ordered task queue keyed by (run_at, enqueue order)
#[derive(Debug, Default)]
pub struct TickScheduler {
    tasks: BTreeMap<(Tick, u64), ScheduledTask>,
    next_seq: u64,
    next_handle: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule work `delay` ticks from `now`. Zero delay runs on the next
    /// drain of `now` itself, so callers wanting immediate effect should act
    /// directly instead.
    pub fn run_after(&mut self, now: Tick, delay: u32, work: TaskWork) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.enqueue(handle, now + u64::from(delay), work);
        handle
    }

    /// Re-arm an existing handle (repeating beats keep their handle so a
    /// cancel reaches every future beat).
    pub fn requeue(&mut self, handle: TaskHandle, run_at: Tick, work: TaskWork) {
        self.enqueue(handle, run_at, work);
    }

    fn enqueue(&mut self, handle: TaskHandle, run_at: Tick, work: TaskWork) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.insert((run_at, seq), ScheduledTask { handle, run_at, work });
    }

    /// Remove and return every task due at or before `now`, in (run_at,
    /// enqueue) order.
    pub fn take_due(&mut self, now: Tick) -> Vec<ScheduledTask> {
        let mut due = Vec::new();
        let keys: Vec<(Tick, u64)> = self
            .tasks
            .range(..=(now, u64::MAX))
            .map(|(key, _)| *key)
            .collect();
        for key in keys {
            if let Some(task) = self.tasks.remove(&key) {
                due.push(task);
            }
        }
        due
    }

    pub fn cancel(&mut self, handle: TaskHandle) {
        self.tasks.retain(|_, task| task.handle != handle);
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(entity: EntityId) -> TaskWork {
        TaskWork::RevertScale { entity }
    }

    #[test]
    fn test_due_tasks_drain_in_time_then_enqueue_order() {
        let mut scheduler = TickScheduler::new();
        let a = EntityId::new();
        let b = EntityId::new();
        let c = EntityId::new();
        scheduler.run_after(0, 5, noop(a));
        scheduler.run_after(0, 2, noop(b));
        scheduler.run_after(0, 2, noop(c));

        assert!(scheduler.take_due(1).is_empty());
        let due = scheduler.take_due(2);
        assert_eq!(due.len(), 2);
        match (&due[0].work, &due[1].work) {
            (TaskWork::RevertScale { entity: first }, TaskWork::RevertScale { entity: second }) => {
                assert_eq!(*first, b);
                assert_eq!(*second, c);
            }
            _ => panic!("unexpected work"),
        }
        assert_eq!(scheduler.take_due(5).len(), 1);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_cancel_removes_requeued_task() {
        let mut scheduler = TickScheduler::new();
        let id = EntityId::new();
        let handle = scheduler.run_after(0, 1, noop(id));
        let due = scheduler.take_due(1);
        scheduler.requeue(handle, 3, due[0].work.clone());
        scheduler.cancel(handle);
        assert!(scheduler.take_due(10).is_empty());
    }

    #[test]
    fn test_cancel_all_empties_queue() {
        let mut scheduler = TickScheduler::new();
        let id = EntityId::new();
        for delay in 1..=4 {
            scheduler.run_after(0, delay, noop(id));
        }
        assert_eq!(scheduler.len(), 4);
        scheduler.cancel_all();
        assert!(scheduler.is_empty());
    }

    // Landing watch metadata survives a requeue round trip.
    #[test]
    fn test_requeue_preserves_run_order_against_new_tasks() {
        let mut scheduler = TickScheduler::new();
        let id = EntityId::new();
        let handle = scheduler.run_after(0, 1, noop(id));
        let task = scheduler.take_due(1).remove(0);
        scheduler.requeue(handle, 2, task.work);
        scheduler.run_after(1, 1, TaskWork::RemoveBossBar { bar: BossBarId(1) });
        let due = scheduler.take_due(2);
        assert_eq!(due.len(), 2);
        assert!(matches!(due[0].work, TaskWork::RevertScale { .. }));
        assert!(matches!(due[1].work, TaskWork::RemoveBossBar { .. }));
    }
}
