//! Timer abstraction used by the spin lifecycle.
//!
//! The engine only needs "run this callback after `delay_ms`, unless
//! cancelled". [`ManualScheduler`] drives a virtual clock for tests and
//! simulations; `TokioScheduler` (feature `async`) uses real timers.
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

/// Deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// Handle to a scheduled task.
pub trait TimerHandle {
    /// Release the task so it never runs. Cancelling a task that already
    /// ran is a no-op.
    fn cancel(self);
}

/// Single-threaded timer primitive.
pub trait Scheduler {
    type Handle: TimerHandle + 'static;

    /// Run `task` once `delay_ms` has elapsed. A delay of zero means the next
    /// scheduling opportunity, never synchronously.
    fn schedule(&self, delay_ms: u64, task: Task) -> Self::Handle;
}

type TaskKey = (u64, u64);

#[derive(Default)]
struct ManualQueue {
    now_ms: u64,
    next_seq: u64,
    tasks: BTreeMap<TaskKey, Task>,
}

impl ManualQueue {
    fn pop_due(&mut self, until_ms: Option<u64>) -> Option<(u64, Task)> {
        let (&(due, _), _) = self.tasks.first_key_value()?;
        if until_ms.is_some_and(|limit| due > limit) {
            return None;
        }
        let ((due, _), task) = self.tasks.pop_first()?;
        Some((due, task))
    }
}

/// Virtual-clock scheduler. Tasks run only when the clock is advanced, in
/// due-time order and FIFO among equal due times.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<ManualQueue>>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.queue.borrow().now_ms
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().tasks.len()
    }

    /// Due time of the earliest waiting task.
    #[must_use]
    pub fn next_due_ms(&self) -> Option<u64> {
        self.queue
            .borrow()
            .tasks
            .first_key_value()
            .map(|(&(due, _), _)| due)
    }

    /// Move the clock forward by `ms`, running every task that falls due,
    /// including tasks scheduled by tasks run along the way. Returns the
    /// number of tasks run.
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.now_ms().saturating_add(ms);
        let mut ran = 0;
        loop {
            // The borrow must end before the task runs; tasks may schedule.
            let next = self.queue.borrow_mut().pop_due(Some(target));
            let Some((due, task)) = next else {
                break;
            };
            self.set_now(due);
            task();
            ran += 1;
        }
        self.set_now(target);
        ran
    }

    /// Run tasks until the queue is empty, jumping the clock to each due
    /// time. Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.queue.borrow_mut().pop_due(None);
            let Some((due, task)) = next else {
                break;
            };
            self.set_now(due);
            task();
            ran += 1;
        }
        ran
    }

    fn set_now(&self, now_ms: u64) {
        let mut queue = self.queue.borrow_mut();
        queue.now_ms = queue.now_ms.max(now_ms);
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.queue.borrow();
        f.debug_struct("ManualScheduler")
            .field("now_ms", &queue.now_ms)
            .field("pending", &queue.tasks.len())
            .finish()
    }
}

/// Cancellation handle for [`ManualScheduler`] tasks.
#[derive(Debug)]
pub struct ManualHandle {
    key: TaskKey,
    queue: Weak<RefCell<ManualQueue>>,
}

impl TimerHandle for ManualHandle {
    fn cancel(self) {
        if let Some(queue) = self.queue.upgrade() {
            queue.borrow_mut().tasks.remove(&self.key);
        }
    }
}

impl Scheduler for ManualScheduler {
    type Handle = ManualHandle;

    fn schedule(&self, delay_ms: u64, task: Task) -> Self::Handle {
        let mut queue = self.queue.borrow_mut();
        let due = queue.now_ms.saturating_add(delay_ms);
        let key = (due, queue.next_seq);
        queue.next_seq = queue.next_seq.wrapping_add(1);
        queue.tasks.insert(key, task);
        ManualHandle {
            key,
            queue: Rc::downgrade(&self.queue),
        }
    }
}

/// Scheduler backed by tokio timers on the current `LocalSet`.
#[cfg(feature = "async")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[cfg(feature = "async")]
impl Scheduler for TokioScheduler {
    type Handle = tokio::task::JoinHandle<()>;

    fn schedule(&self, delay_ms: u64, task: Task) -> Self::Handle {
        tokio::task::spawn_local(async move {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            task();
        })
    }
}

#[cfg(feature = "async")]
impl TimerHandle for tokio::task::JoinHandle<()> {
    fn cancel(self) {
        self.abort();
    }
}
