//! The scheduler's two locks.
//!
//! - The **control** lock serialises run and drain passes against `stop`. It
//!   is held for a whole pass and is re-entrant, so a task callback may call
//!   `stop` on the scheduler that is currently running it.
//! - The **structural** lock guards the shape of the task list. It is only
//!   reachable through a closure taking `&mut SlotList`, which keeps it from
//!   being held across a task callback.
//!
//! Acquisition order is control, then structural. The closure form makes the
//! reverse order impossible to write without smuggling a scheduler reference
//! into the closure.

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};

use super::slot_list::SlotList;

pub(crate) struct SchedulerLocks<T> {
    control: ReentrantMutex<()>,
    tasks: Mutex<SlotList<T>>,
}

impl<T> SchedulerLocks<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            control: ReentrantMutex::new(()),
            tasks: Mutex::new(SlotList::with_capacity(capacity)),
        }
    }

    /// Take the control lock. Blocks while another thread is inside a pass.
    pub(crate) fn control(&self) -> ControlGuard<'_, T> {
        ControlGuard {
            locks: self,
            _held: self.control.lock(),
        }
    }

    /// Run `f` with the structural lock held.
    #[inline]
    pub(crate) fn structural<R>(
        &self,
        f: impl FnOnce(&mut SlotList<T>) -> R,
    ) -> R {
        let mut tasks = self.tasks.lock();
        f(&mut tasks)
    }
}

impl<T> std::fmt::Debug for SchedulerLocks<T> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SchedulerLocks")
            .field("control_locked", &self.control.is_locked())
            .field("structural_locked", &self.tasks.is_locked())
            .finish()
    }
}

/// Proof that the control lock is held by the current thread.
///
/// Task state may only be changed while one of these is alive.
pub(crate) struct ControlGuard<'a, T> {
    locks: &'a SchedulerLocks<T>,
    _held: ReentrantMutexGuard<'a, ()>,
}

impl<T> ControlGuard<'_, T> {
    /// Run `f` with the structural lock held, nested inside the control lock.
    #[inline]
    pub(crate) fn structural<R>(
        &self,
        f: impl FnOnce(&mut SlotList<T>) -> R,
    ) -> R {
        self.locks.structural(f)
    }
}
