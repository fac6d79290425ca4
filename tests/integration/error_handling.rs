//! Error handling integration tests
//!
//! Malformed tasks are rejected at construction and never reach a scheduler.

use cosched::util::config::{Config, ConfigError};
use cosched::{SpecViolation, Task, TaskError};

#[test]
fn test_task_without_run_is_rejected() {
    let result = Task::builder(()).init(|_| {}).destroy(|_| {}).build();
    assert!(matches!(
        result,
        Err(TaskError::InvalidTaskSpec(SpecViolation::MissingRun))
    ));
}

#[test]
fn test_unpaired_completion_hooks_are_rejected() {
    let only_interrupt = Task::builder(()).run(|_| {}).interrupt(|_| {}).build();
    let only_is_done = Task::builder(()).run(|_| {}).is_done(|_| false).build();

    assert!(only_interrupt.is_err());
    assert!(only_is_done.is_err());
}

#[test]
fn test_invalid_config_is_reported() {
    let result = Config::from_ron_str("(scheduler: (capacity: \"many\"))");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}
