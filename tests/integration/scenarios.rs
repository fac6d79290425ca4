//! Scheduler scenario tests
//!
//! End-to-end lifecycle scenarios driven through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cosched::{Cancellable, Job, Scheduler, StopOutcome, Task, TaskState};

#[derive(Debug, Default)]
struct Counters {
    init: AtomicUsize,
    run: AtomicUsize,
    destroy: AtomicUsize,
    interrupt: AtomicUsize,
    done: AtomicUsize,
}

impl Counters {
    fn snapshot(&self) -> [usize; 5] {
        [
            self.init.load(Ordering::SeqCst),
            self.run.load(Ordering::SeqCst),
            self.destroy.load(Ordering::SeqCst),
            self.interrupt.load(Ordering::SeqCst),
            self.done.load(Ordering::SeqCst),
        ]
    }
}

/// Finishes only once it has been interrupted.
struct UntilInterrupted(Arc<Counters>);

impl Job for UntilInterrupted {
    fn init(&mut self) {
        self.0.init.fetch_add(1, Ordering::SeqCst);
    }

    fn run(&mut self) {
        self.0.run.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(&mut self) {
        self.0.destroy.fetch_add(1, Ordering::SeqCst);
    }
}

impl Cancellable for UntilInterrupted {
    fn interrupt(&mut self) {
        self.0.interrupt.fetch_add(1, Ordering::SeqCst);
    }

    fn is_done(&mut self) -> bool {
        self.0.done.fetch_add(1, Ordering::SeqCst);
        self.0.interrupt.load(Ordering::SeqCst) > 0
    }
}

#[test]
fn test_interrupt_then_remove_scenario() {
    let counters = Arc::new(Counters::default());
    let scheduler = Scheduler::new();

    let handle = scheduler.start(Task::until_done(UntilInterrupted(counters.clone())));
    assert_eq!(counters.snapshot(), [0, 0, 0, 0, 0]);

    scheduler.run();
    assert_eq!(counters.snapshot(), [1, 1, 0, 0, 1]);

    assert_eq!(scheduler.stop(handle), StopOutcome::Requested);
    assert_eq!(counters.snapshot(), [1, 1, 0, 0, 1]);

    scheduler.run();
    assert_eq!(counters.snapshot(), [1, 1, 0, 1, 1]);

    scheduler.run();
    assert_eq!(counters.snapshot(), [1, 1, 1, 1, 1]);
    assert!(scheduler.is_empty());
}

#[test]
fn test_two_one_shots_in_order() {
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let scheduler = Scheduler::new();

    let a = scheduler.start(
        Task::builder(order.clone())
            .run(|order| order.lock().push('A'))
            .build()
            .unwrap(),
    );
    let b = scheduler.start(
        Task::builder(order.clone())
            .run(|order| order.lock().push('B'))
            .build()
            .unwrap(),
    );

    scheduler.run();
    assert_eq!(*order.lock(), vec!['A', 'B']);
    assert_eq!(scheduler.state(a), Some(TaskState::Stopped));
    assert_eq!(scheduler.state(b), Some(TaskState::Stopped));

    scheduler.run();
    assert_eq!(*order.lock(), vec!['A', 'B']);
    assert!(!scheduler.contains(a));
    assert!(!scheduler.contains(b));
}

#[test]
fn test_one_shot_destroy_fires_once_at_removal() {
    struct Once(Arc<Counters>);

    impl Job for Once {
        fn init(&mut self) {
            self.0.init.fetch_add(1, Ordering::SeqCst);
        }

        fn run(&mut self) {
            self.0.run.fetch_add(1, Ordering::SeqCst);
        }

        fn destroy(&mut self) {
            self.0.destroy.fetch_add(1, Ordering::SeqCst);
        }
    }

    let counters = Arc::new(Counters::default());
    let scheduler = Scheduler::new();
    scheduler.start(Task::one_shot(Once(counters.clone())));

    scheduler.run();
    assert_eq!(counters.snapshot(), [1, 1, 0, 0, 0]);

    scheduler.run();
    assert_eq!(counters.snapshot(), [1, 1, 1, 0, 0]);

    for _ in 0..3 {
        scheduler.run();
    }
    scheduler.free();
    assert_eq!(counters.snapshot(), [1, 1, 1, 0, 0]);
}

#[test]
fn test_free_force_finishes_every_task() {
    let fresh = Arc::new(Counters::default());
    let running = Arc::new(Counters::default());
    let scheduler = Scheduler::new();

    scheduler.start(Task::until_done(UntilInterrupted(running.clone())));
    scheduler.run();
    scheduler.start(Task::until_done(UntilInterrupted(fresh.clone())));

    scheduler.free();
    assert_eq!(fresh.snapshot(), [0, 0, 0, 0, 0]);
    assert_eq!(running.snapshot(), [1, 1, 1, 1, 2]);
}
