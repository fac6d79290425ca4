//! cosched - cooperative task scheduler
//!
//! Tasks are registered with a [`Scheduler`] and advanced one step each time
//! the owning thread calls [`Scheduler::run`]. Other threads may start new
//! tasks and request cooperative interruption of running ones.
//!
//! # Example
//!
//! ```
//! use cosched::{Scheduler, Task};
//!
//! let scheduler = Scheduler::new();
//! let frames = Task::builder(0u32)
//!     .name("frames")
//!     .run(|n| *n += 1)
//!     .interrupt(|_| {})
//!     .is_done(|n| *n == 3)
//!     .build()?;
//!
//! let handle = scheduler.start(frames);
//! while scheduler.contains(handle) {
//!     scheduler.run();
//! }
//! scheduler.free();
//! # Ok::<(), cosched::TaskError>(())
//! ```

#![warn(rust_2018_idioms)]

pub mod runtime;
pub mod util;

// Re-exports
pub use runtime::scheduler::{
    Cancellable, Job, Scheduler, SchedulerConfig, SpecViolation, StopOutcome, Task, TaskBuilder,
    TaskError, TaskHandle, TaskId, TaskResult, TaskState,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "cosched";
