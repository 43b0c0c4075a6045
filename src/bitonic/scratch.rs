//! Merge buffers for queued tasks.
//!
//! A queued merge may run on any worker, so it cannot own a buffer the way an
//! inline merge loop does. Instead each worker thread registers its index for
//! the duration of a sort, and a task borrows the buffer of whichever worker
//! runs it. Only worker `i` ever locks slot `i`, so the locks never contend.

use std::cell::Cell;

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;

thread_local! {
    static WORKER: Cell<Option<usize>> = const { Cell::new(None) };
}

pub struct ScratchBuffers<T> {
    buffers: Box<[CachePadded<Mutex<Vec<T>>>]>,
}

/// Registers the current thread as a worker until dropped.
pub struct WorkerGuard {
    previous: Option<usize>,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        WORKER.with(|worker| worker.set(self.previous));
    }
}

impl<T> ScratchBuffers<T> {
    pub fn new(num_threads: usize, segment_size: usize) -> Self {
        Self {
            buffers: (0..num_threads)
                .map(|_| CachePadded::new(Mutex::new(Vec::with_capacity(2 * segment_size))))
                .collect(),
        }
    }

    /// Makes the calling thread worker `index` for buffer lookups.
    pub fn enter(&self, index: usize) -> WorkerGuard {
        assert!(index < self.buffers.len());
        WorkerGuard { previous: WORKER.with(|worker| worker.replace(Some(index))) }
    }

    /// Runs `f` with the calling worker's buffer. A thread that never entered
    /// gets a fresh one.
    pub fn with<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        match WORKER.with(Cell::get).and_then(|index| self.buffers.get(index)) {
            Some(buffer) => f(&mut buffer.lock()),
            None => f(&mut Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn a_worker_keeps_reusing_its_buffer() {
        let scratch = ScratchBuffers::<u32>::new(2, 8);
        let _worker = scratch.enter(1);
        let first = scratch.with(|buffer| {
            buffer.extend(0..16);
            buffer.as_ptr()
        });
        let second = scratch.with(|buffer| {
            assert_eq!(buffer.len(), 16);
            buffer.as_ptr()
        });
        assert_eq!(first, second);
        assert!(scratch.buffers[0].lock().is_empty());
    }

    #[test]
    fn threads_outside_the_sort_get_a_fresh_buffer() {
        let scratch = ScratchBuffers::<u8>::new(1, 4);
        thread::scope(|s| {
            s.spawn(|| scratch.with(|buffer| buffer.push(1)));
        });
        assert!(scratch.buffers[0].lock().is_empty());
    }

    #[test]
    fn guard_restores_the_previous_worker() {
        let outer = ScratchBuffers::<u8>::new(2, 1);
        let inner = ScratchBuffers::<u8>::new(2, 1);
        let _outer = outer.enter(0);
        {
            let _inner = inner.enter(1);
            inner.with(|buffer| buffer.push(7));
        }
        outer.with(|buffer| buffer.push(3));
        assert_eq!(*outer.buffers[0].lock(), [3]);
        assert_eq!(*inner.buffers[1].lock(), [7]);
    }
}
