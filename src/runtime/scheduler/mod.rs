//! Cooperative task scheduler
//!
//! A [`Scheduler`] owns an ordered set of [`Task`]s and advances each of them
//! by exactly one step every time [`Scheduler::run`] is called. Nothing is
//! preempted and nothing runs on its own: how often work happens is decided
//! entirely by how often the owning thread calls `run`.
//!
//! # Threads
//!
//! One thread drives `run` and, eventually, [`Scheduler::free`]. Any thread
//! may call [`Scheduler::start`] and [`Scheduler::stop`], including task
//! callbacks running inside a pass.
//!
//! # Lifecycle
//!
//! ```text
//! start ─▶ Starting ─run─▶ Running ─run (is_done)─▶ Stopped ─run─▶ removed
//!                              │                       ▲
//!                            stop                      │
//!                              ▼                       │
//!                         Interrupted ─run (interrupt)─┘
//! ```
//!
//! `destroy` fires on removal, but only for tasks that left `Starting`.

pub mod error;
mod guard;
pub mod slot_list;
pub mod task;

pub use error::{SpecViolation, TaskError, TaskResult};
pub use slot_list::SlotList;
pub use task::{Cancellable, Job, Task, TaskBuilder, TaskId, TaskIdGenerator, TaskState};

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info, trace, warn};

use guard::{ControlGuard, SchedulerLocks};
use task::Body;

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Name attached to every log event of this scheduler.
    pub name: String,
    /// Number of task slots reserved up front.
    pub capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            name: "scheduler".to_string(),
            capacity: 64,
        }
    }
}

/// Reference to a task registered with a scheduler.
///
/// Handles are cheap to copy and safe to keep after the task is gone: a
/// handle never matches a later task that happens to reuse the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    key: usize,
    id: TaskId,
}

impl TaskHandle {
    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }
}

/// What [`Scheduler::stop`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The task was running and is now marked interrupted.
    Requested,
    /// An interruption was already pending.
    AlreadyRequested,
    /// The task has not been advanced yet; nothing to interrupt.
    NotStarted,
    /// The task already finished and is waiting for removal.
    Finished,
    /// No such task on this scheduler.
    NotFound,
}

/// A started task as seen by the scheduler.
struct TaskSlot {
    id: TaskId,
    name: String,
    /// Read without locks; written only under the control lock.
    state: AtomicU8,
    body: Mutex<Body>,
}

type Control<'a> = ControlGuard<'a, Arc<TaskSlot>>;

impl TaskSlot {
    fn new(
        id: TaskId,
        name: String,
        body: Body,
    ) -> Self {
        Self {
            id,
            name,
            state: AtomicU8::new(TaskState::Starting.as_u8()),
            body: Mutex::new(body),
        }
    }

    #[inline]
    fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    fn transition(
        &self,
        _control: &Control<'_>,
        to: TaskState,
    ) {
        self.state.store(to.as_u8(), Ordering::Release);
    }
}

/// Marks a pass as in progress and clears the mark on exit, unwinding
/// included.
struct PassGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PassGuard<'a> {
    /// `None` if a pass is already running on this scheduler.
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self { flag })
        }
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Cooperative scheduler driving tasks one step per [`run`](Self::run).
pub struct Scheduler {
    config: SchedulerConfig,
    locks: SchedulerLocks<Arc<TaskSlot>>,
    in_pass: AtomicBool,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.config.name)
            .field("tasks", &self.len())
            .field("locks", &self.locks)
            .finish()
    }
}

impl Scheduler {
    /// Create a scheduler with the default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        debug!(scheduler = %config.name, capacity = config.capacity, "scheduler created");
        Self {
            locks: SchedulerLocks::with_capacity(config.capacity),
            config,
            in_pass: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Register a task at the back of the sequence.
    ///
    /// Never calls into the task; `init` fires on its first advance. Safe to
    /// call from any thread, including from inside a task callback.
    pub fn start(
        &self,
        task: Task,
    ) -> TaskHandle {
        let (id, name, body) = task.into_parts();
        debug!(scheduler = %self.config.name, task = %name, %id, "task started");

        let slot = Arc::new(TaskSlot::new(id, name, body));
        let key = self.locks.structural(|tasks| tasks.push_back(slot));

        TaskHandle { key, id }
    }

    /// Ask a running task to wind down.
    ///
    /// Returns as soon as the task is marked; `interrupt` runs on the task's
    /// next advance. Waits for an in-progress pass on another thread to end,
    /// but never for the task itself.
    pub fn stop(
        &self,
        handle: TaskHandle,
    ) -> StopOutcome {
        let control = self.locks.control();
        let Some(slot) = control.structural(|tasks| Self::lookup(tasks, handle)) else {
            debug!(scheduler = %self.config.name, id = %handle.id, "stop: no such task");
            return StopOutcome::NotFound;
        };

        let outcome = match slot.state() {
            TaskState::Starting => StopOutcome::NotStarted,
            TaskState::Running => {
                slot.transition(&control, TaskState::Interrupted);
                StopOutcome::Requested
            }
            TaskState::Interrupted => StopOutcome::AlreadyRequested,
            TaskState::Stopped => StopOutcome::Finished,
        };

        debug!(scheduler = %self.config.name, task = %slot.name, ?outcome, "stop");
        outcome
    }

    /// Advance every registered task by one step, front to back.
    ///
    /// Tasks found `Stopped` are detached and finalised. Tasks started
    /// during the pass may or may not be visited before it ends. Calling
    /// `run` from inside a task callback is ignored.
    pub fn run(&self) {
        let control = self.locks.control();
        let Some(_pass) = PassGuard::enter(&self.in_pass) else {
            warn!(scheduler = %self.config.name, "run called from inside a pass; ignored");
            return;
        };
        let _span = debug_span!("run", scheduler = %self.config.name).entered();

        let mut cursor = control.structural(|tasks| tasks.front());
        while let Some(key) = cursor {
            let (slot, next) =
                control.structural(|tasks| (tasks.get(key).cloned(), tasks.next(key)));
            cursor = next;

            if let Some(slot) = slot {
                self.advance(&control, key, &slot);
            }
        }
    }

    /// Tear the scheduler down, finishing every remaining task.
    ///
    /// Equivalent to dropping it.
    pub fn free(self) {
        debug!(scheduler = %self.config.name, tasks = self.len(), "freeing scheduler");
    }

    /// Number of registered tasks, including finished ones awaiting removal.
    pub fn len(&self) -> usize {
        self.locks.structural(|tasks| tasks.len())
    }

    pub fn is_empty(&self) -> bool {
        self.locks.structural(|tasks| tasks.is_empty())
    }

    /// Whether `handle` still refers to a registered task.
    pub fn contains(
        &self,
        handle: TaskHandle,
    ) -> bool {
        self.locks
            .structural(|tasks| Self::lookup(tasks, handle).is_some())
    }

    /// Current state of a registered task, `None` once it has been removed.
    pub fn state(
        &self,
        handle: TaskHandle,
    ) -> Option<TaskState> {
        self.locks
            .structural(|tasks| Self::lookup(tasks, handle).map(|slot| slot.state()))
    }

    /// Handles of all registered tasks in scheduling order.
    pub fn handles(&self) -> Vec<TaskHandle> {
        self.locks.structural(|tasks| {
            tasks
                .iter()
                .map(|(key, slot)| TaskHandle { key, id: slot.id })
                .collect()
        })
    }

    fn lookup(
        tasks: &SlotList<Arc<TaskSlot>>,
        handle: TaskHandle,
    ) -> Option<Arc<TaskSlot>> {
        tasks
            .get(handle.key)
            .filter(|slot| slot.id == handle.id)
            .cloned()
    }

    /// One step of the task state machine.
    fn advance(
        &self,
        control: &Control<'_>,
        key: usize,
        slot: &Arc<TaskSlot>,
    ) {
        let state = slot.state();
        trace!(task = %slot.name, %state, "advance");

        match state {
            TaskState::Starting => {
                let mut body = slot.body.lock();
                body.init();
                slot.transition(control, TaskState::Running);
                Self::run_once(control, slot, &mut body);
            }
            TaskState::Running => {
                let mut body = slot.body.lock();
                Self::run_once(control, slot, &mut body);
            }
            TaskState::Interrupted => {
                slot.body.lock().interrupt();
                slot.transition(control, TaskState::Stopped);
            }
            TaskState::Stopped => {
                control.structural(|tasks| tasks.remove(key));
                self.finalize(slot);
            }
        }
    }

    /// `run`, then check for completion. A `stop` issued from inside `run`
    /// survives unless the predicate already holds.
    fn run_once(
        control: &Control<'_>,
        slot: &TaskSlot,
        body: &mut Body,
    ) {
        body.run();
        if body.is_done() {
            slot.transition(control, TaskState::Stopped);
        }
    }

    /// Bring a detached task to `Stopped` without running it again.
    fn force_stop(
        control: &Control<'_>,
        slot: &TaskSlot,
    ) {
        match slot.state() {
            TaskState::Starting | TaskState::Stopped => {}
            TaskState::Running => {
                let mut body = slot.body.lock();
                if !body.is_done() {
                    body.interrupt();
                }
                slot.transition(control, TaskState::Stopped);
            }
            TaskState::Interrupted => {
                slot.body.lock().interrupt();
                slot.transition(control, TaskState::Stopped);
            }
        }
    }

    /// Run `destroy` for a detached task that got past `Starting`.
    fn finalize(
        &self,
        slot: &TaskSlot,
    ) {
        let destroyed = slot.state().has_started();
        if destroyed {
            slot.body.lock().destroy();
        }
        debug!(
            scheduler = %self.config.name,
            task = %slot.name,
            destroyed,
            "task removed"
        );
    }

    fn drain(&self) {
        let control = self.locks.control();
        let _pass = PassGuard::enter(&self.in_pass);
        let _span = debug_span!("drain", scheduler = %self.config.name).entered();

        let mut removed = 0usize;
        while let Some(slot) = control.structural(|tasks| tasks.pop_front()) {
            Self::force_stop(&control, &slot);
            self.finalize(&slot);
            removed += 1;
        }

        info!(scheduler = %self.config.name, removed, "scheduler drained");
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.drain();
    }
}

#[cfg(test)]
mod tests;
