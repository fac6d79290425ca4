//! cosched - CLI
//!
//! Drives a small simulated render loop on top of the scheduler: a one-shot
//! resource loader, a repeating frame task, and optionally a second thread
//! that interrupts the frame task part-way through.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

use cosched::util::config::Config;
use cosched::util::logger::{self, LogLevel};
use cosched::{Cancellable, Job, Scheduler, StopOutcome, Task, NAME, VERSION};

/// Cooperative task scheduler demo
#[derive(Parser, Debug)]
#[command(name = "cosched")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (RON)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the simulated render loop
    Demo {
        /// Frames to render before the frame task finishes on its own
        #[arg(long, default_value_t = 60)]
        frames: usize,

        /// Interrupt the frame task from another thread after this many frames
        #[arg(long, value_name = "FRAMES")]
        stop_after: Option<usize>,

        /// Sleep between run passes, in milliseconds
        #[arg(long, default_value_t = 16)]
        frame_ms: u64,
    },

    /// Print version information
    Version,
}

#[derive(Debug, Default)]
struct DemoStats {
    loads: AtomicUsize,
    frames: AtomicUsize,
    interrupts: AtomicUsize,
    destroyed: AtomicUsize,
    checkpoints: AtomicUsize,
}

struct LoadResources {
    stats: Arc<DemoStats>,
}

impl Job for LoadResources {
    fn run(&mut self) {
        self.stats.loads.fetch_add(1, Ordering::SeqCst);
        info!("resources loaded");
    }
}

struct FrameLoop {
    frame: usize,
    limit: usize,
    interrupted: bool,
    stats: Arc<DemoStats>,
}

impl Job for FrameLoop {
    fn init(&mut self) {
        info!(limit = self.limit, "frame loop starting");
    }

    fn run(&mut self) {
        self.frame += 1;
        self.stats.frames.fetch_add(1, Ordering::SeqCst);
        debug!(frame = self.frame, "frame rendered");
    }

    fn destroy(&mut self) {
        self.stats.destroyed.fetch_add(1, Ordering::SeqCst);
        info!(frames = self.frame, "frame loop torn down");
    }
}

impl Cancellable for FrameLoop {
    fn interrupt(&mut self) {
        self.interrupted = true;
        self.stats.interrupts.fetch_add(1, Ordering::SeqCst);
        info!(frame = self.frame, "frame loop interrupted");
    }

    fn is_done(&mut self) -> bool {
        self.interrupted || self.frame >= self.limit
    }
}

fn demo(
    config: Config,
    frames: usize,
    stop_after: Option<usize>,
    frame_ms: u64,
) -> Result<()> {
    let stats = Arc::new(DemoStats::default());
    let scheduler = Arc::new(Scheduler::with_config(config.scheduler));

    scheduler.start(
        Task::one_shot(LoadResources {
            stats: stats.clone(),
        })
        .with_name("load-resources"),
    );
    let frame_task = scheduler.start(
        Task::until_done(FrameLoop {
            frame: 0,
            limit: frames,
            interrupted: false,
            stats: stats.clone(),
        })
        .with_name("frame-loop"),
    );

    let producer = stop_after.map(|after| {
        let scheduler = scheduler.clone();
        let stats = stats.clone();
        thread::Builder::new()
            .name("cosched-producer".to_string())
            .spawn(move || {
                while stats.frames.load(Ordering::SeqCst) < after && scheduler.contains(frame_task)
                {
                    thread::sleep(Duration::from_millis(1));
                }
                let checkpoint_stats = stats.clone();
                let checkpoint = Task::builder(checkpoint_stats)
                    .name("checkpoint")
                    .run(|stats| {
                        stats.checkpoints.fetch_add(1, Ordering::SeqCst);
                    })
                    .build();
                if let Ok(task) = checkpoint {
                    scheduler.start(task);
                }
                scheduler.stop(frame_task)
            })
    });
    let producer = producer
        .transpose()
        .context("Failed to spawn producer thread")?;

    while scheduler.contains(frame_task) {
        scheduler.run();
        thread::sleep(Duration::from_millis(frame_ms));
    }
    // Let tasks started late by the producer finish.
    while !scheduler.is_empty() {
        scheduler.run();
    }

    if let Some(producer) = producer {
        let outcome = producer
            .join()
            .map_err(|_| anyhow::anyhow!("Producer thread panicked"))?;
        if outcome != StopOutcome::Requested {
            info!(?outcome, "stop request arrived late");
        }
    }

    match Arc::try_unwrap(scheduler) {
        Ok(scheduler) => scheduler.free(),
        Err(_) => anyhow::bail!("Scheduler still shared after demo"),
    }

    println!("loads:       {}", stats.loads.load(Ordering::SeqCst));
    println!("frames:      {}", stats.frames.load(Ordering::SeqCst));
    println!("interrupts:  {}", stats.interrupts.load(Ordering::SeqCst));
    println!("destroyed:   {}", stats.destroyed.load(Ordering::SeqCst));
    println!("checkpoints: {}", stats.checkpoints.load(Ordering::SeqCst));

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load_or_default(args.config.as_deref()).with_context(|| {
        format!(
            "Failed to load config: {}",
            args.config
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        )
    })?;

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        config.log_level
    };
    logger::init_with_level(level);

    match args.command {
        Commands::Demo {
            frames,
            stop_after,
            frame_ms,
        } => demo(config, frames, stop_after, frame_ms),
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
            Ok(())
        }
    }
}
