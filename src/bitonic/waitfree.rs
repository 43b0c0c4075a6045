//! Stage counters plus task stealing, with no blocking primitive at all.
//!
//! Like the lock-free variant, a worker only waits for the two segments it is
//! about to merge. Unlike it, the merge is queued rather than run inline, and
//! while a worker waits it runs queued tasks of any peer whose own stage is
//! behind. A peer being behind means its queue may hold exactly the work the
//! waiting thread depends on, so the waits always make progress.

use std::sync::atomic::{Ordering, fence};
use std::thread;

use tracing::{debug, trace};

use super::counters::StageCounters;
use super::network::{Partition, stage_count, stages};
use super::scratch::ScratchBuffers;
use super::segments::Segments;
use crate::config::SortConfig;
use crate::task_queue::{self, ConcurrentTaskQueue};
use crate::wait_policy::WaitPolicy;

struct Worker<'w, 'a, T> {
    segments: Segments<'a, T>,
    partition: Partition,
    num_threads: usize,
    segment_stages: &'a StageCounters,
    thread_stages: &'w StageCounters,
    queues: &'w [Box<dyn ConcurrentTaskQueue<'a> + 'a>],
    scratch: &'a ScratchBuffers<T>,
    wait_policy: WaitPolicy,
}

impl<'a, T: Copy + Ord + Send + 'a> Worker<'_, 'a, T> {
    fn run(self) {
        let me = self.partition.thread_index;
        let own = &*self.queues[me];
        let segments = self.segments;
        let segment_stages = self.segment_stages;
        let scratch = self.scratch;
        let _worker = scratch.enter(me);

        for id in self.partition.segments() {
            own.push(Box::new(move || {
                // SAFETY: nobody else touches a segment before its counter leaves 0.
                unsafe { segments.sort_segment(id) };
                segment_stages.advance(id);
            }));
        }
        self.finish_stage();

        for stage in stages(segments.num_segments()) {
            for (a, b, direction) in self.partition.pairs(stage) {
                let my_stage = self.thread_stages.peek(me);
                let mut relax = || {
                    self.steal();
                    self.wait_policy.relax();
                };
                segment_stages.wait_for(a, my_stage, &mut relax);
                segment_stages.wait_for(b, my_stage, &mut relax);

                own.push(Box::new(move || {
                    // Order this thread's view of the segments after the pusher's
                    // observation of their counters.
                    fence(Ordering::Acquire);
                    // SAFETY: both segments reached this stage before the task was
                    // queued, the task runs once, and no other pair of this stage
                    // touches them.
                    scratch.with(|buffer| unsafe { segments.merge_pair(a, b, direction, buffer) });
                    segment_stages.advance(a);
                    segment_stages.advance(b);
                }));
            }
            self.finish_stage();
        }
        trace!(thread = me, stage = self.thread_stages.peek(me), "worker finished");
    }

    fn finish_stage(&self) {
        self.queues[self.partition.thread_index].drain();
        self.steal();
        self.thread_stages.advance(self.partition.thread_index);
    }

    /// Runs the queued tasks of every peer that is behind this thread.
    fn steal(&self) {
        let me = self.partition.thread_index;
        let my_stage = self.thread_stages.peek(me);
        for offset in 1..self.num_threads {
            let peer = (me + offset) % self.num_threads;
            if my_stage > self.thread_stages.peek(peer) {
                self.queues[peer].drain();
            }
        }
    }
}

pub(super) fn sort<T: Copy + Ord + Send>(data: &mut [T], config: &SortConfig) {
    let segment_stages = StageCounters::new(data.len() / config.segment_size);
    run(data, config, &segment_stages);
}

/// Runs the sort against caller-provided segment counters, which end at
/// `1 + stage_count(num_segments)` each.
pub(super) fn run<T: Copy + Ord + Send>(data: &mut [T], config: &SortConfig, segment_stages: &StageCounters) {
    let segments = Segments::new(data, config.segment_size);
    let num_segments = segments.num_segments();
    debug_assert_eq!(segment_stages.len(), num_segments);
    let thread_stages = StageCounters::new(config.num_threads);
    let scratch = ScratchBuffers::new(config.num_threads, config.segment_size);
    let queues: Vec<_> = (0..config.num_threads).map(|_| task_queue::create(config.queue)).collect();
    debug!(num_segments, stages = stage_count(num_segments), queue = %config.queue, "wait-free bitonic sort");

    let worker = |thread_index| Worker {
        segments,
        partition: Partition::new(thread_index, config.num_threads, num_segments),
        num_threads: config.num_threads,
        segment_stages,
        thread_stages: &thread_stages,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SortType;
    use crate::task_queue::QueueKind;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    #[test]
    fn segment_counters_only_move_forward() {
        let mut rng = fastrand::Rng::with_seed(13);
        let mut data: Vec<u64> = (0..4096).collect();
        rng.shuffle(&mut data);
        let config = SortConfig::new(SortType::WaitFree).with_threads(4).with_segment_size(64);
        let num_segments = data.len() / config.segment_size;
        let counters = StageCounters::new(num_segments);
        let done = AtomicBool::new(false);
        let final_stage = 1 + stage_count(num_segments);

        thread::scope(|s| {
            let observer = s.spawn(|| {
                let mut last = vec![0; num_segments];
                loop {
                    let finished = done.load(Ordering::Acquire);
                    for (id, previous) in last.iter_mut().enumerate() {
                        let now = counters.load(id);
                        assert!(now >= *previous, "segment {id} went from {previous} to {now}");
                        assert!(now <= final_stage);
                        *previous = now;
                    }
                    if finished {
                        return last;
                    }
                }
            });
            run(&mut data, &config, &counters);
            done.store(true, Ordering::Release);
            let last_seen = observer.join().unwrap();
            assert!(last_seen.iter().all(|&count| count == final_stage));
        });

        assert!(data.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn steals_only_from_peers_that_are_behind() {
        let mut data = vec![0u32; 16];
        let ran = AtomicUsize::new(0);
        let segment_stages = StageCounters::new(4);
        let thread_stages = StageCounters::new(2);
        let scratch = ScratchBuffers::new(2, 4);
        let queues: Vec<_> = (0..2).map(|_| task_queue::create(QueueKind::Locked)).collect();
        for _ in 0..3 {
            let ran = &ran;
            queues[1].push(Box::new(move || {
                ran.fetch_add(1, Ordering::Relaxed);
            }));
        }
        let worker = Worker {
            segments: Segments::new(&mut data, 4),
            partition: Partition::new(0, 2, 4),
            num_threads: 2,
            segment_stages: &segment_stages,
            thread_stages: &thread_stages,
            queues: &queues,
            scratch: &scratch,
            wait_policy: WaitPolicy::Spin,
        };

        // Peer ahead.
        thread_stages.advance(1);
        thread_stages.advance(1);
        worker.steal();
        assert_eq!(ran.load(Ordering::Relaxed), 0);

        // Level with the peer.
        thread_stages.advance(0);
        thread_stages.advance(0);
        worker.steal();
        assert_eq!(ran.load(Ordering::Relaxed), 0);

        // Peer behind.
        thread_stages.advance(0);
        worker.steal();
        assert_eq!(ran.load(Ordering::Relaxed), 3);
        assert_eq!(queues[1].drain(), 0);
    }

    #[test]
    fn more_segments_than_threads_with_busy_spin() {
        let mut data: Vec<i32> = (0..2048).rev().collect();
        let config = SortConfig::new(SortType::WaitFree)
            .with_threads(2)
            .with_segment_size(8)
            .with_wait_policy(WaitPolicy::Spin);
        sort(&mut data, &config);
        assert_eq!(data, (0..2048).collect::<Vec<_>>());
    }
}
