//! Segmented bitonic sort without a barrier.
//!
//! The network's dependency graph is fixed: in stage `s` a segment is touched
//! by exactly one merge, and that merge only needs both inputs to have finished
//! stage `s - 1`. So instead of waiting for every thread, a worker waits only
//! for the two segments it is about to merge to reach its own stage. The
//! thread that finishes a segment's sort or merge advances that segment's
//! counter (release); the next user of the segment observes it (acquire).

use std::thread;

use tracing::{debug, trace};

use super::counters::StageCounters;
use super::network::{Partition, stage_count, stages};
use super::segments::Segments;
use crate::config::SortConfig;
use crate::wait_policy::WaitPolicy;

struct Worker<'w, 'a, T> {
    segments: Segments<'a, T>,
    partition: Partition,
    counters: &'w StageCounters,
    wait_policy: WaitPolicy,
}

impl<T: Copy + Ord + Send> Worker<'_, '_, T> {
    fn run(self) {
        let mut buffer = Vec::with_capacity(2 * self.segments.segment_size());
        let relax = || self.wait_policy.relax();

        for id in self.partition.segments() {
            // SAFETY: a segment at stage 0 is only ever touched by its owner.
            unsafe { self.segments.sort_segment(id) };
            self.counters.advance(id);
        }
        let mut my_stage = 1;

        for stage in stages(self.segments.num_segments()) {
            for (a, b, direction) in self.partition.pairs(stage) {
                self.counters.wait_for(a, my_stage, relax);
                self.counters.wait_for(b, my_stage, relax);
                // SAFETY: both segments have published stage `my_stage - 1` and
                // this pair is the only one that touches them in this stage.
                // Neither counter moves again until we advance it below.
                unsafe { self.segments.merge_pair(a, b, direction, &mut buffer) };
                self.counters.advance(a);
                self.counters.advance(b);
            }
            my_stage += 1;
        }
        trace!(thread = self.partition.thread_index, my_stage, "worker finished");
    }
}

pub(super) fn sort<T: Copy + Ord + Send>(data: &mut [T], config: &SortConfig) {
    let counters = StageCounters::new(data.len() / config.segment_size);
    run(data, config, &counters);
}

/// Runs the sort against caller-provided segment counters, which end at
/// `1 + stage_count(num_segments)` each.
pub(super) fn run<T: Copy + Ord + Send>(data: &mut [T], config: &SortConfig, counters: &StageCounters) {
    let segments = Segments::new(data, config.segment_size);
    let num_segments = segments.num_segments();
    debug_assert_eq!(counters.len(), num_segments);
    debug!(num_segments, stages = stage_count(num_segments), "lock-free bitonic sort");

    let worker = |thread_index| Worker {
        segments,
        partition: Partition::new(thread_index, config.num_threads, num_segments),
        counters,
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
