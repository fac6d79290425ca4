//! Render loop consumer tests
//!
//! A frame loop modelled as a repeating task, driven by one thread and
//! interrupted from another.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use cosched::util::config::Config;
use cosched::{Cancellable, Job, Scheduler, StopOutcome, Task};

struct Frames {
    rendered: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    quit: bool,
}

impl Job for Frames {
    fn run(&mut self) {
        self.rendered.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl Cancellable for Frames {
    fn interrupt(&mut self) {
        self.quit = true;
    }

    fn is_done(&mut self) -> bool {
        self.quit
    }
}

#[test]
fn test_frame_loop_runs_until_interrupted() {
    let config = Config::from_ron_str("(scheduler: (name: \"render\", capacity: 4))").unwrap();
    let scheduler = Arc::new(Scheduler::with_config(config.scheduler));
    let rendered = Arc::new(AtomicUsize::new(0));
    let closed = Arc::new(AtomicBool::new(false));

    let frames = scheduler.start(
        Task::until_done(Frames {
            rendered: rendered.clone(),
            closed: closed.clone(),
            quit: false,
        })
        .with_name("frames"),
    );

    let input = {
        let scheduler = scheduler.clone();
        let rendered = rendered.clone();
        thread::spawn(move || {
            while rendered.load(Ordering::SeqCst) < 10 {
                thread::yield_now();
            }
            scheduler.stop(frames)
        })
    };

    while scheduler.contains(frames) {
        scheduler.run();
    }

    assert_eq!(input.join().unwrap(), StopOutcome::Requested);
    assert!(rendered.load(Ordering::SeqCst) >= 10);
    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(scheduler.name(), "render");
}
