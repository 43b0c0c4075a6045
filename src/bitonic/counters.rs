use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// One monotonically increasing stage count per segment (or per thread).
///
/// Each count sits on its own cache line. A count is advanced with release
/// ordering once the writes of the stage it records are done, and read with
/// acquire ordering by whoever is about to touch that data next, which gives a
/// happens-before edge per segment instead of a global one.
pub struct StageCounters {
    counts: Box<[CachePadded<AtomicUsize>]>,
}

impl StageCounters {
    pub fn new(len: usize) -> Self {
        Self { counts: (0..len).map(|_| CachePadded::new(AtomicUsize::new(0))).collect() }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[inline]
    pub fn load(&self, index: usize) -> usize {
        self.counts[index].load(Ordering::Acquire)
    }

    /// A read that carries no synchronization, for counts that only steer
    /// scheduling decisions.
    #[inline]
    pub fn peek(&self, index: usize) -> usize {
        self.counts[index].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn advance(&self, index: usize) {
        self.counts[index].fetch_add(1, Ordering::Release);
    }

    /// Polls until `index` has completed exactly `stage` stages.
    #[inline]
    pub fn wait_for(&self, index: usize, stage: usize, mut relax: impl FnMut()) {
        while self.load(index) != stage {
            relax();
        }
    }

    pub fn snapshot(&self) -> Vec<usize> {
        (0..self.len()).map(|i| self.load(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn counts_start_at_zero_and_advance_by_one() {
        let counters = StageCounters::new(4);
        assert_eq!(counters.snapshot(), [0, 0, 0, 0]);
        counters.advance(2);
        counters.advance(2);
        counters.advance(0);
        assert_eq!(counters.snapshot(), [1, 0, 2, 0]);
        assert_eq!(counters.peek(2), 2);
    }

    #[test]
    fn counters_do_not_share_cache_lines() {
        let counters = StageCounters::new(2);
        let first = &*counters.counts[0] as *const AtomicUsize as usize;
        let second = &*counters.counts[1] as *const AtomicUsize as usize;
        assert!(second - first >= 64);
    }

    #[test]
    fn wait_for_sees_other_threads_progress() {
        let counters = StageCounters::new(1);
        thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..3 {
                    counters.advance(0);
                }
            });
            counters.wait_for(0, 3, thread::yield_now);
        });
        assert_eq!(counters.load(0), 3);
    }
}
