//! Barrier-separated stages with task stealing.
//!
//! Workers queue their segment sorts and merges instead of running them inline,
//! drain their own queue, then wait at the barrier. While waiting they drain
//! everyone else's queue, so a slow thread's leftover work gets spread around.
//!
//! A stolen task may still be running when the barrier it was stolen under
//! releases, so every stage is bracketed by two barriers: the first one
//! cannot release until all stealers from the previous stage are back.

use std::thread;

use tracing::{debug, trace};

use super::network::{Partition, stage_count, stages};
use super::scratch::ScratchBuffers;
use super::segments::Segments;
use crate::barrier::{self, Barrier};
use crate::config::SortConfig;
use crate::task_queue::{self, ConcurrentTaskQueue};
use crate::wait_policy::WaitPolicy;

struct Worker<'w, 'a, T> {
    segments: Segments<'a, T>,
    partition: Partition,
    num_threads: usize,
    barrier: &'w dyn Barrier,
    queues: &'w [Box<dyn ConcurrentTaskQueue<'a> + 'a>],
    scratch: &'a ScratchBuffers<T>,
    wait_policy: WaitPolicy,
}

impl<'a, T: Copy + Ord + Send + 'a> Worker<'_, 'a, T> {
    fn run(self) {
        let own = &*self.queues[self.partition.thread_index];
        let segments = self.segments;
        let scratch = self.scratch;
        let _worker = scratch.enter(self.partition.thread_index);
        let mut steal = || self.steal();

        for id in self.partition.segments() {
            // SAFETY: until the first barrier, only the sort task of a segment touches it.
            own.push(Box::new(move || unsafe { segments.sort_segment(id) }));
        }
        own.drain();
        self.barrier.wait_with(self.num_threads, &mut steal);

        for stage in stages(segments.num_segments()) {
            // Every task of the previous stage, stolen or not, has finished.
            self.barrier.wait_with(self.num_threads, &mut steal);

            for (a, b, direction) in self.partition.pairs(stage) {
                own.push(Box::new(move || {
                    // SAFETY: pairs within a stage are disjoint, each is queued once,
                    // and the barriers keep stages apart.
                    scratch.with(|buffer| unsafe { segments.merge_pair(a, b, direction, buffer) });
                }));
            }
            own.drain();

            self.barrier.wait_with(self.num_threads, &mut steal);
        }
        trace!(thread = self.partition.thread_index, "worker finished");
    }

    /// Round-robin over the other threads' queues, starting with the next one.
    fn steal(&self) {
        let me = self.partition.thread_index;
        for offset in 1..self.num_threads {
            self.queues[(me + offset) % self.num_threads].drain();
        }
        self.wait_policy.relax();
    }
}

pub(super) fn sort<T: Copy + Ord + Send>(data: &mut [T], config: &SortConfig) {
    let segments = Segments::new(data, config.segment_size);
    let num_segments = segments.num_segments();
    let barrier = barrier::create(config.barrier);
    let scratch = ScratchBuffers::new(config.num_threads, config.segment_size);
    let queues: Vec<_> = (0..config.num_threads).map(|_| task_queue::create(config.queue)).collect();
    debug!(
        num_segments,
        stages = stage_count(num_segments),
        barrier = %config.barrier,
        queue = %config.queue,
        "work-stealing bitonic sort"
    );

    let worker = |thread_index| Worker {
        segments,
        partition: Partition::new(thread_index, config.num_threads, num_segments),
        num_threads: config.num_threads,
        barrier: &*barrier,
        queues: &queues,
        scratch: &scratch,
        wait_policy: config.wait_policy,
    };

    thread::scope(|scope| {
        for thread_index in 1..config.num_threads {
            let worker = worker(thread_index);
            scope.spawn(move || worker.run());
        }
        worker(0).run();
    });
}
