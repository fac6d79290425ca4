//! Scheduler 单元测试
//!
//! 测试任务构造、有序槽列表、任务状态机和并发控制


use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::runtime::scheduler::Task;

/// Hook counters shared between a test and the task it observes.
#[derive(Debug, Default)]
pub(super) struct Probe {
    one_shot: bool,
    init: AtomicUsize,
    run: AtomicUsize,
    destroy: AtomicUsize,
    interrupt: AtomicUsize,
    is_done: AtomicUsize,
}

impl Probe {
    pub(super) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A probe whose predicate holds from the first check.
    pub(super) fn one_shot() -> Arc<Self> {
        Arc::new(Self {
            one_shot: true,
            ..Self::default()
        })
    }

    /// `[init, run, destroy, interrupt, is_done]`
    pub(super) fn counts(&self) -> [usize; 5] {
        [
            self.init.load(Ordering::SeqCst),
            self.run.load(Ordering::SeqCst),
            self.destroy.load(Ordering::SeqCst),
            self.interrupt.load(Ordering::SeqCst),
            self.is_done.load(Ordering::SeqCst),
        ]
    }
}

/// Task with all five hooks; done once interrupted (or immediately for a
/// one-shot probe).
pub(super) fn full_task(probe: &Arc<Probe>) -> Task {
    Task::builder(probe.clone())
        .init(|p| {
            p.init.fetch_add(1, Ordering::SeqCst);
        })
        .run(|p| {
            p.run.fetch_add(1, Ordering::SeqCst);
        })
        .destroy(|p| {
            p.destroy.fetch_add(1, Ordering::SeqCst);
        })
        .interrupt(|p| {
            p.interrupt.fetch_add(1, Ordering::SeqCst);
        })
        .is_done(|p| {
            p.is_done.fetch_add(1, Ordering::SeqCst);
            p.interrupt.load(Ordering::SeqCst) > 0 || p.one_shot
        })
        .build()
        .unwrap()
}

/// Task with only a `run` hook.
pub(super) fn run_only_task(probe: &Arc<Probe>) -> Task {
    Task::builder(probe.clone())
        .run(|p| {
            p.run.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap()
}
