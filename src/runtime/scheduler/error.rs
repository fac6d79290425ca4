//! Scheduler errors

use thiserror::Error;

/// Task construction result
pub type TaskResult<T> = Result<T, TaskError>;

/// Which construction rule a hook set broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecViolation {
    /// No `run` hook was supplied.
    MissingRun,
    /// An `interrupt` hook was supplied without an `is_done` predicate.
    InterruptWithoutIsDone,
    /// An `is_done` predicate was supplied without an `interrupt` hook.
    IsDoneWithoutInterrupt,
}

impl std::fmt::Display for SpecViolation {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            SpecViolation::MissingRun => write!(f, "run hook is required"),
            SpecViolation::InterruptWithoutIsDone => {
                write!(f, "interrupt hook requires an is_done predicate")
            }
            SpecViolation::IsDoneWithoutInterrupt => {
                write!(f, "is_done predicate requires an interrupt hook")
            }
        }
    }
}

/// Task construction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("Invalid task spec: {0}")]
    InvalidTaskSpec(SpecViolation),
}
