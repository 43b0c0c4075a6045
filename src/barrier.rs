//! Reusable spinning barriers.
//!
//! A thread calling [`Barrier::wait`] does not return until `num_threads` calls
//! have been made since the previous release. Both implementations share the
//! same shape: snapshot a generation marker, bump a central arrival counter,
//! and either spin on the marker or, as the last arrival, reset the counter and
//! move the marker on. Only equality with the snapshot matters, so the marker
//! may wrap.
//!
//! Writes made before `wait` are visible to every participant after it returns:
//! the arrival counter is an acquire-release RMW chain that ends in the last
//! arrival's release store to the marker, which spinners read with acquire.
//!
//! Passing different `num_threads` to the same release cycle is a caller bug
//! and ends in a deadlock or an early release. [`SenseBarrier`] is stricter:
//! the participant set must stay the same from one cycle to the next.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

use crate::error::ParseError;
use crate::wait_policy::WaitPolicy;

pub trait Barrier: Send + Sync {
    /// Blocks until `num_threads` threads have arrived, calling `relax` between
    /// polls. `relax` may do useful work, such as running other threads' tasks.
    fn wait_with(&self, num_threads: usize, relax: &mut dyn FnMut());

    fn wait(&self, num_threads: usize, policy: WaitPolicy) {
        self.wait_with(num_threads, &mut || policy.relax());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BarrierKind {
    /// Generation marker is a single flag, complemented on release.
    #[default]
    SenseReversal,
    /// Generation marker is a wrapping step count, incremented on release.
    StepCounter,
}

impl BarrierKind {
    pub const ALL: [BarrierKind; 2] = [BarrierKind::SenseReversal, BarrierKind::StepCounter];

    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(BarrierKind::SenseReversal),
            1 => Some(BarrierKind::StepCounter),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BarrierKind::SenseReversal => "sense",
            BarrierKind::StepCounter => "step",
        }
    }
}

impl fmt::Display for BarrierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BarrierKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BarrierKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::unknown("barrier", s))
    }
}

pub fn create(kind: BarrierKind) -> Box<dyn Barrier> {
    match kind {
        BarrierKind::SenseReversal => Box::new(SenseBarrier::new()),
        BarrierKind::StepCounter => Box::new(StepBarrier::new()),
    }
}

/// Returns `None` for a tag that names no barrier.
pub fn create_from_tag(tag: u32) -> Option<Box<dyn Barrier>> {
    BarrierKind::from_tag(tag).map(create)
}

/// Central counter, central sense flag.
///
/// The flag only has two values. If the participants shrink right after a
/// release, the remaining threads can complete the next cycle and flip the
/// flag back before a thread from the previous cycle has polled it, leaving
/// that thread spinning for good. Use it with a fixed participant set, or
/// use [`StepBarrier`].
#[derive(Debug, Default)]
pub struct SenseBarrier {
    spinning: CachePadded<AtomicUsize>,
    sense: CachePadded<AtomicU32>,
}

impl SenseBarrier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Barrier for SenseBarrier {
    fn wait_with(&self, num_threads: usize, relax: &mut dyn FnMut()) {
        let my_sense = self.sense.load(Ordering::Relaxed);
        if self.spinning.fetch_add(1, Ordering::AcqRel) < num_threads.saturating_sub(1) {
            while self.sense.load(Ordering::Acquire) == my_sense {
                relax();
            }
        } else {
            // Last arrival.
            self.spinning.store(0, Ordering::Relaxed);
            self.sense.store(!my_sense, Ordering::Release);
        }
    }
}

/// Central counter, central step count.
///
/// A release only ever moves the step forward, so a thread still polling for
/// an earlier cycle sees it change even when the participant count varies
/// between cycles.
#[derive(Debug, Default)]
pub struct StepBarrier {
    spinning: CachePadded<AtomicUsize>,
    step: CachePadded<AtomicU32>,
}

impl StepBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn starting_at(step: u32) -> Self {
        Self {
            spinning: CachePadded::new(AtomicUsize::new(0)),
            step: CachePadded::new(AtomicU32::new(step)),
        }
    }
}

impl Barrier for StepBarrier {
    fn wait_with(&self, num_threads: usize, relax: &mut dyn FnMut()) {
        let current_step = self.step.load(Ordering::Relaxed);
        if self.spinning.fetch_add(1, Ordering::AcqRel) < num_threads.saturating_sub(1) {
            while self.step.load(Ordering::Acquire) == current_step {
                relax();
            }
        } else {
            // Last arrival. fetch_add wraps on overflow.
            self.spinning.store(0, Ordering::Relaxed);
            self.step.fetch_add(1, Ordering::Release);
        }
    }
}
