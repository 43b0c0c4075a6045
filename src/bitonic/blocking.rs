use std::thread;

use tracing::{debug, trace};

use super::network::{Partition, stage_count, stages};
use super::segments::Segments;
use crate::barrier::{self, Barrier};
use crate::config::SortConfig;
use crate::wait_policy::WaitPolicy;

struct Worker<'w, 'a, T> {
    segments: Segments<'a, T>,
    partition: Partition,
    num_threads: usize,
    barrier: &'w dyn Barrier,
    wait_policy: WaitPolicy,
}

impl<T: Copy + Ord + Send> Worker<'_, '_, T> {
    fn run(self) {
        let mut buffer = Vec::with_capacity(2 * self.segments.segment_size());

        for id in self.partition.segments() {
            // SAFETY: until the first barrier, each thread touches only its own partition.
            unsafe { self.segments.sort_segment(id) };
        }
        self.barrier.wait(self.num_threads, self.wait_policy);

        for stage in stages(self.segments.num_segments()) {
            for (a, b, direction) in self.partition.pairs(stage) {
                // SAFETY: pairs within a stage are disjoint, each is merged only by
                // the owner of its lower segment, and the barrier separates stages.
                unsafe { self.segments.merge_pair(a, b, direction, &mut buffer) };
            }
            self.barrier.wait(self.num_threads, self.wait_policy);
        }
        trace!(thread = self.partition.thread_index, "worker finished");
    }
}

pub(super) fn sort<T: Copy + Ord + Send>(data: &mut [T], config: &SortConfig) {
    let segments = Segments::new(data, config.segment_size);
    let num_segments = segments.num_segments();
    let barrier = barrier::create(config.barrier);
    debug!(num_segments, stages = stage_count(num_segments), barrier = %config.barrier, "blocking bitonic sort");

    let worker = |thread_index| Worker {
        segments,
        partition: Partition::new(thread_index, config.num_threads, num_segments),
        num_threads: config.num_threads,
        barrier: &*barrier,
        wait_policy: config.wait_policy,
    };

    // The caller is thread 0.
    thread::scope(|scope| {
        for thread_index in 1..config.num_threads {
            let worker = worker(thread_index);
            scope.spawn(move || worker.run());
        }
        worker(0).run();
    });
}
