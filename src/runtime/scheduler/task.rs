//! Task definitions for the scheduler.
//!
//! A task is a unit of cooperative work. Its behaviour is expressed through
//! two capability traits:
//!
//! - [`Job`]: `init`, `run` and `destroy` hooks. A task built from a bare
//!   `Job` is a one-shot: it runs once and is then finished.
//! - [`Cancellable`]: adds the `interrupt` hook and the `is_done` predicate.
//!   A cancellable task is advanced until its predicate holds.
//!
//! Since a one-shot task has no `interrupt` method to call, the pairing of
//! `interrupt` and `is_done` holds by construction. [`TaskBuilder`] offers the
//! closure form of the same API and checks that pairing at `build` time.

use std::sync::atomic::{AtomicU64, Ordering};

use super::error::{SpecViolation, TaskError, TaskResult};

/// Unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Get the inner value.
    #[inline]
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(val: u64) -> Self {
        Self(val)
    }
}

impl From<TaskId> for u64 {
    fn from(val: TaskId) -> Self {
        val.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

/// Thread-safe generator of process-unique task IDs.
#[derive(Debug)]
pub struct TaskIdGenerator {
    next_id: AtomicU64,
}

impl TaskIdGenerator {
    /// Create a new task ID generator.
    #[inline]
    pub const fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
        }
    }

    /// Generate the next task ID.
    #[inline]
    pub fn generate(&self) -> TaskId {
        TaskId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TaskIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

static TASK_IDS: TaskIdGenerator = TaskIdGenerator::new();

/// Task lifecycle state.
///
/// ```text
/// Starting ──advance──▶ Running ──is_done──▶ Stopped ──advance──▶ (removed)
///                          │                    ▲
///                        stop()                 │
///                          ▼                    │
///                     Interrupted ──advance─────┘  (calls interrupt)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Registered, never advanced.
    Starting,
    /// Initialised and advancing once per pass.
    Running,
    /// Interruption requested; `interrupt` runs on the next advance.
    Interrupted,
    /// Finished; removed on the next advance or drain.
    Stopped,
}

impl TaskState {
    /// Convert from u8 (for atomic storage).
    #[inline]
    pub fn from_u8(val: u8) -> Self {
        match val {
            0 => TaskState::Starting,
            1 => TaskState::Running,
            2 => TaskState::Interrupted,
            _ => TaskState::Stopped,
        }
    }

    /// Convert to u8 (for atomic storage).
    #[inline]
    pub fn as_u8(&self) -> u8 {
        match self {
            TaskState::Starting => 0,
            TaskState::Running => 1,
            TaskState::Interrupted => 2,
            TaskState::Stopped => 3,
        }
    }

    /// Whether the task ever left `Starting`, i.e. `init` already ran.
    #[inline]
    pub fn has_started(&self) -> bool {
        !matches!(self, TaskState::Starting)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            TaskState::Starting => write!(f, "starting"),
            TaskState::Running => write!(f, "running"),
            TaskState::Interrupted => write!(f, "interrupted"),
            TaskState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Work driven by the scheduler.
///
/// Hooks are only ever called from the thread that drives
/// [`Scheduler::run`](super::Scheduler::run), one at a time.
pub trait Job: Send {
    /// Called once, on the first advance, right before the first `run`.
    fn init(&mut self) {}

    /// Called once per advance while the task is running.
    fn run(&mut self);

    /// Called once on removal, only if `init` ran.
    fn destroy(&mut self) {}
}

/// A [`Job`] that keeps running until its predicate holds and can be asked
/// to wind down.
pub trait Cancellable: Job {
    /// Push the task toward completion. After this returns, the task is
    /// treated as finished.
    fn interrupt(&mut self);

    /// Checked after every `run`; `true` finishes the task.
    fn is_done(&mut self) -> bool;
}

/// The capability set a task was built with.
pub(crate) enum Body {
    OneShot(Box<dyn Job>),
    UntilDone(Box<dyn Cancellable>),
}

impl Body {
    pub(crate) fn init(&mut self) {
        match self {
            Body::OneShot(job) => job.init(),
            Body::UntilDone(job) => job.init(),
        }
    }

    pub(crate) fn run(&mut self) {
        match self {
            Body::OneShot(job) => job.run(),
            Body::UntilDone(job) => job.run(),
        }
    }

    pub(crate) fn destroy(&mut self) {
        match self {
            Body::OneShot(job) => job.destroy(),
            Body::UntilDone(job) => job.destroy(),
        }
    }

    /// One-shot tasks have nothing to interrupt.
    pub(crate) fn interrupt(&mut self) {
        if let Body::UntilDone(job) = self {
            job.interrupt();
        }
    }

    pub(crate) fn is_done(&mut self) -> bool {
        match self {
            Body::OneShot(_) => true,
            Body::UntilDone(job) => job.is_done(),
        }
    }
}

/// A unit of cooperative work, not yet handed to a scheduler.
///
/// Ownership moves into the scheduler on
/// [`start`](super::Scheduler::start); the scheduler drops the task once it
/// has been removed and its `destroy` hook has run.
pub struct Task {
    id: TaskId,
    name: String,
    body: Body,
}

impl std::fmt::Debug for Task {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("one_shot", &self.is_one_shot())
            .finish()
    }
}

impl Task {
    /// Create a task that runs once and then finishes.
    pub fn one_shot<J>(job: J) -> Self
    where
        J: Job + 'static,
    {
        Self::from_body(Body::OneShot(Box::new(job)))
    }

    /// Create a task that runs until [`Cancellable::is_done`] returns `true`.
    pub fn until_done<C>(job: C) -> Self
    where
        C: Cancellable + 'static,
    {
        Self::from_body(Body::UntilDone(Box::new(job)))
    }

    /// Start building a task from closures sharing `data`.
    #[inline]
    pub fn builder<D>(data: D) -> TaskBuilder<D>
    where
        D: Send + 'static,
    {
        TaskBuilder::new(data)
    }

    fn from_body(body: Body) -> Self {
        let id = TASK_IDS.generate();
        Self {
            id,
            name: format!("task-{}", id.inner()),
            body,
        }
    }

    /// Replace the display name used in logs.
    pub fn with_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A task that has not been started is always `Starting`.
    #[inline]
    pub fn state(&self) -> TaskState {
        TaskState::Starting
    }

    /// Whether the task finishes after a single advance.
    #[inline]
    pub fn is_one_shot(&self) -> bool {
        matches!(self.body, Body::OneShot(_))
    }

    pub(crate) fn into_parts(self) -> (TaskId, String, Body) {
        (self.id, self.name, self.body)
    }
}

type Hook<D> = Box<dyn FnMut(&mut D) + Send>;
type Predicate<D> = Box<dyn FnMut(&mut D) -> bool + Send>;

/// Closure-backed job. Every hook receives the task's payload.
struct FnJob<D> {
    data: D,
    init: Option<Hook<D>>,
    run: Hook<D>,
    destroy: Option<Hook<D>>,
    interrupt: Option<Hook<D>>,
    is_done: Option<Predicate<D>>,
}

impl<D: Send> Job for FnJob<D> {
    fn init(&mut self) {
        if let Some(init) = self.init.as_mut() {
            init(&mut self.data);
        }
    }

    fn run(&mut self) {
        (self.run)(&mut self.data);
    }

    fn destroy(&mut self) {
        if let Some(destroy) = self.destroy.as_mut() {
            destroy(&mut self.data);
        }
    }
}

impl<D: Send> Cancellable for FnJob<D> {
    fn interrupt(&mut self) {
        if let Some(interrupt) = self.interrupt.as_mut() {
            interrupt(&mut self.data);
        }
    }

    fn is_done(&mut self) -> bool {
        match self.is_done.as_mut() {
            Some(is_done) => is_done(&mut self.data),
            None => true,
        }
    }
}

/// Builds a [`Task`] from optional closure hooks and a payload.
///
/// ```
/// use cosched::Task;
///
/// let task = Task::builder(0u32)
///     .run(|n| *n += 1)
///     .build()
///     .unwrap();
/// assert!(task.is_one_shot());
/// ```
pub struct TaskBuilder<D> {
    data: D,
    name: Option<String>,
    init: Option<Hook<D>>,
    run: Option<Hook<D>>,
    destroy: Option<Hook<D>>,
    interrupt: Option<Hook<D>>,
    is_done: Option<Predicate<D>>,
}

impl<D> std::fmt::Debug for TaskBuilder<D> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TaskBuilder")
            .field("name", &self.name)
            .field("init", &self.init.is_some())
            .field("run", &self.run.is_some())
            .field("destroy", &self.destroy.is_some())
            .field("interrupt", &self.interrupt.is_some())
            .field("is_done", &self.is_done.is_some())
            .finish()
    }
}

impl<D> TaskBuilder<D>
where
    D: Send + 'static,
{
    /// Create a builder with no hooks.
    #[inline]
    pub fn new(data: D) -> Self {
        Self {
            data,
            name: None,
            init: None,
            run: None,
            destroy: None,
            interrupt: None,
            is_done: None,
        }
    }

    #[inline]
    pub fn name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn init(
        mut self,
        hook: impl FnMut(&mut D) + Send + 'static,
    ) -> Self {
        self.init = Some(Box::new(hook));
        self
    }

    #[inline]
    pub fn run(
        mut self,
        hook: impl FnMut(&mut D) + Send + 'static,
    ) -> Self {
        self.run = Some(Box::new(hook));
        self
    }

    #[inline]
    pub fn destroy(
        mut self,
        hook: impl FnMut(&mut D) + Send + 'static,
    ) -> Self {
        self.destroy = Some(Box::new(hook));
        self
    }

    #[inline]
    pub fn interrupt(
        mut self,
        hook: impl FnMut(&mut D) + Send + 'static,
    ) -> Self {
        self.interrupt = Some(Box::new(hook));
        self
    }

    #[inline]
    pub fn is_done(
        mut self,
        predicate: impl FnMut(&mut D) -> bool + Send + 'static,
    ) -> Self {
        self.is_done = Some(Box::new(predicate));
        self
    }

    /// Validate the hook set and build the task.
    ///
    /// Fails if `run` is missing, or if only one of `interrupt` and
    /// `is_done` was supplied.
    pub fn build(self) -> TaskResult<Task> {
        let run = self
            .run
            .ok_or(TaskError::InvalidTaskSpec(SpecViolation::MissingRun))?;

        let until_done = match (self.interrupt.is_some(), self.is_done.is_some()) {
            (true, true) => true,
            (false, false) => false,
            (true, false) => {
                return Err(TaskError::InvalidTaskSpec(
                    SpecViolation::InterruptWithoutIsDone,
                ))
            }
            (false, true) => {
                return Err(TaskError::InvalidTaskSpec(
                    SpecViolation::IsDoneWithoutInterrupt,
                ))
            }
        };

        let job = FnJob {
            data: self.data,
            init: self.init,
            run,
            destroy: self.destroy,
            interrupt: self.interrupt,
            is_done: self.is_done,
        };

        let task = if until_done {
            Task::until_done(job)
        } else {
            Task::one_shot(job)
        };

        Ok(match self.name {
            Some(name) => task.with_name(name),
            None => task,
        })
    }
}
