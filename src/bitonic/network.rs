//! Shape of the bitonic merging network over segments.

use std::ops::Range;

use crate::merge::Direction;

/// One `(k, j)` pass of the network. Every segment takes part in exactly one
/// pair per stage, and the pairs of a stage are disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stage {
    pub k: usize,
    pub j: usize,
}

impl Stage {
    /// The partner of segment `i`, if `i` is the lower index of its pair.
    #[inline]
    pub fn partner(self, i: usize) -> Option<usize> {
        let ij = i ^ self.j;
        (i < ij).then_some(ij)
    }

    #[inline]
    pub fn direction(self, i: usize) -> Direction {
        if i & self.k == 0 { Direction::Ascending } else { Direction::Descending }
    }
}

/// All stages for `num_segments` segments, in execution order.
pub fn stages(num_segments: usize) -> impl Iterator<Item = Stage> {
    std::iter::successors(Some(2usize), |k| k.checked_mul(2))
        .take_while(move |&k| k <= num_segments)
        .flat_map(|k| {
            std::iter::successors(Some(k >> 1), |&j| (j > 1).then_some(j >> 1)).map(move |j| Stage { k, j })
        })
}

/// `m(m+1)/2` for `num_segments = 2^m`.
pub fn stage_count(num_segments: usize) -> usize {
    if num_segments < 2 {
        return 0;
    }
    let m = num_segments.ilog2() as usize;
    m * (m + 1) / 2
}

/// The contiguous run of segments a worker thread owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub thread_index: usize,
    pub low: usize,
    pub high: usize,
}

impl Partition {
    pub fn new(thread_index: usize, num_threads: usize, num_segments: usize) -> Self {
        let per_thread = num_segments / num_threads;
        let low = thread_index * per_thread;
        Self { thread_index, low, high: low + per_thread }
    }

    pub fn segments(self) -> Range<usize> {
        self.low..self.high
    }

    /// The pairs this partition is responsible for in `stage`: those whose lower
    /// segment it owns. The upper segment may belong to another thread.
    pub fn pairs(self, stage: Stage) -> impl Iterator<Item = (usize, usize, Direction)> {
        self.segments().filter_map(move |i| stage.partner(i).map(|ij| (i, ij, stage.direction(i))))
    }
}
