//! Thread-safe FIFO of deferred work.
//!
//! `pop` never blocks on an empty queue; it returns `None` straight away so a
//! thread can move on to the next queue or back to its own spin loop. FIFO holds
//! among tasks pushed by one thread; pushes from different threads interleave.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use parking_lot::Mutex;

use crate::error::ParseError;

/// A unit of work that runs at most once, on whichever thread pops it.
pub type Task<'a> = Box<dyn FnOnce() + Send + 'a>;

pub trait ConcurrentTaskQueue<'a>: Send + Sync {
    fn push(&self, task: Task<'a>);

    fn pop(&self) -> Option<Task<'a>>;

    /// Pops and runs tasks until the queue is observed empty.
    fn drain(&self) -> usize {
        let mut executed = 0;
        while let Some(task) = self.pop() {
            task();
            executed += 1;
        }
        executed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueKind {
    /// Mutex around a deque.
    #[default]
    Locked,
}

impl QueueKind {
    pub const ALL: [QueueKind; 1] = [QueueKind::Locked];

    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(QueueKind::Locked),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QueueKind::Locked => "locked",
        }
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QueueKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueueKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::unknown("task queue", s))
    }
}

pub fn create<'a>(kind: QueueKind) -> Box<dyn ConcurrentTaskQueue<'a> + 'a> {
    match kind {
        QueueKind::Locked => Box::new(LockedTaskQueue::new()),
    }
}

/// Returns `None` for a tag that names no queue.
pub fn create_from_tag<'a>(tag: u32) -> Option<Box<dyn ConcurrentTaskQueue<'a> + 'a>> {
    QueueKind::from_tag(tag).map(create)
}

/// The lock is held only for the deque operation, never while a task runs.
pub struct LockedTaskQueue<'a> {
    tasks: Mutex<VecDeque<Task<'a>>>,
}

impl<'a> LockedTaskQueue<'a> {
    pub fn new() -> Self {
        Self { tasks: Mutex::new(VecDeque::new()) }
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

impl Default for LockedTaskQueue<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ConcurrentTaskQueue<'a> for LockedTaskQueue<'a> {
    fn push(&self, task: Task<'a>) {
        self.tasks.lock().push_back(task);
    }

    fn pop(&self) -> Option<Task<'a>> {
        self.tasks.lock().pop_front()
    }
}
