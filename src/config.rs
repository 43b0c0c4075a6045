use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::barrier::BarrierKind;
use crate::error::{ParseError, SortError};
use crate::task_queue::QueueKind;
use crate::wait_policy::WaitPolicy;

pub const DEFAULT_SEGMENT_SIZE: usize = 256;

/// How the segmented network is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortType {
    /// Element-wise compare-exchange network, one thread.
    Original,
    /// Segmented network, one thread.
    Sequential,
    /// Segmented network on a rayon pool; each stage is a parallel pass.
    Delegated,
    /// Static partitions, a barrier between stages.
    #[default]
    Blocking,
    /// Static partitions, per-segment stage counters instead of barriers.
    LockFree,
    /// Barriers between stages; waiting threads run peers' queued work.
    Stealing,
    /// Stage counters; waiting threads run queued work of threads behind them.
    WaitFree,
}

impl SortType {
    pub const ALL: [SortType; 7] = [
        SortType::Original,
        SortType::Sequential,
        SortType::Delegated,
        SortType::Blocking,
        SortType::LockFree,
        SortType::Stealing,
        SortType::WaitFree,
    ];

    /// The strategies that run on more than one thread.
    pub const PARALLEL: [SortType; 5] =
        [SortType::Delegated, SortType::Blocking, SortType::LockFree, SortType::Stealing, SortType::WaitFree];

    pub fn name(self) -> &'static str {
        match self {
            SortType::Original => "original",
            SortType::Sequential => "sequential",
            SortType::Delegated => "delegated",
            SortType::Blocking => "blocking",
            SortType::LockFree => "lockfree",
            SortType::Stealing => "stealing",
            SortType::WaitFree => "waitfree",
        }
    }

    /// Whether segments are statically split across `num_threads` workers.
    fn partitions_segments(self) -> bool {
        matches!(self, SortType::Blocking | SortType::LockFree | SortType::Stealing | SortType::WaitFree)
    }
}

impl fmt::Display for SortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortType::ALL
            .into_iter()
            .find(|sort_type| sort_type.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::unknown("sort type", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortConfig {
    pub sort_type: SortType,
    pub num_threads: usize,
    /// Elements per segment.
    pub segment_size: usize,
    pub wait_policy: WaitPolicy,
    /// Used by the strategies that synchronize stages with a barrier.
    pub barrier: BarrierKind,
    /// Used by the strategies that queue segment work.
    pub queue: QueueKind,
}

/// The default thread count is the machine's parallelism rounded down to a
/// power of two, so it divides any power-of-two segment count at least as
/// large. On a 12-thread machine that is 8. Inputs with fewer segments than
/// threads still need [`SortConfig::with_threads`] for the partitioning
/// strategies.
impl Default for SortConfig {
    fn default() -> Self {
        let available = std::thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1);
        Self {
            sort_type: SortType::default(),
            num_threads: 1 << available.ilog2(),
            segment_size: DEFAULT_SEGMENT_SIZE,
            wait_policy: WaitPolicy::default(),
            barrier: BarrierKind::default(),
            queue: QueueKind::default(),
        }
    }
}

impl SortConfig {
    pub fn new(sort_type: SortType) -> Self {
        Self { sort_type, ..Self::default() }
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_segment_size(mut self, segment_size: usize) -> Self {
        self.segment_size = segment_size;
        self
    }

    pub fn with_wait_policy(mut self, wait_policy: WaitPolicy) -> Self {
        self.wait_policy = wait_policy;
        self
    }

    pub fn with_barrier(mut self, barrier: BarrierKind) -> Self {
        self.barrier = barrier;
        self
    }

    pub fn with_queue(mut self, queue: QueueKind) -> Self {
        self.queue = queue;
        self
    }

    /// Checks that `len` elements can be sorted with this configuration.
    ///
    /// `Original` works on single elements and ignores the segment size and
    /// thread count; `Sequential` ignores the thread count.
    pub fn validate(&self, len: usize) -> Result<(), SortError> {
        let (segment_size, num_threads) = match self.sort_type {
            SortType::Original => (1, 1),
            SortType::Sequential => (self.segment_size, 1),
            _ => (self.segment_size, self.num_threads),
        };
        if segment_size == 0 {
            return Err(SortError::ZeroSegmentSize);
        }
        if num_threads == 0 {
            return Err(SortError::ZeroThreads);
        }
        if len % segment_size != 0 {
            return Err(SortError::IndivisibleLength { len, segment_size });
        }
        let num_segments = len / segment_size;
        if !num_segments.is_power_of_two() {
            return Err(SortError::SegmentCountNotPowerOfTwo { num_segments });
        }
        if self.sort_type.partitions_segments() && num_segments % num_threads != 0 {
            return Err(SortError::UnevenPartition { num_segments, num_threads });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SortConfig::default();
        assert_eq!(config.sort_type, SortType::Blocking);
        assert_eq!(config.segment_size, DEFAULT_SEGMENT_SIZE);
        assert_eq!(config.wait_policy, WaitPolicy::Yield);
        assert!(config.num_threads >= 1);
        assert!(config.num_threads.is_power_of_two());
        assert!(config.segment_size.is_power_of_two());
    }

    #[test]
    fn parses_sort_types() {
        for sort_type in SortType::ALL {
            assert_eq!(sort_type.name().parse::<SortType>().unwrap(), sort_type);
        }
        assert!("gnu".parse::<SortType>().is_err());
    }

    #[test]
    fn accepts_well_formed_layouts() {
        let config = SortConfig::new(SortType::WaitFree).with_threads(4).with_segment_size(16);
        assert!(config.validate(1024).is_ok());
        assert!(config.validate(64).is_ok());
    }

    #[test]
    fn rejects_bad_layouts() {
        let config = SortConfig::new(SortType::Blocking).with_threads(2).with_segment_size(4);
        assert!(matches!(config.validate(30), Err(SortError::IndivisibleLength { len: 30, segment_size: 4 })));
        assert!(matches!(config.validate(24), Err(SortError::SegmentCountNotPowerOfTwo { num_segments: 6 })));
        assert!(matches!(config.clone().with_threads(3).validate(32), Err(SortError::UnevenPartition { .. })));
        assert!(matches!(config.clone().with_threads(0).validate(32), Err(SortError::ZeroThreads)));
        assert!(matches!(config.clone().with_segment_size(0).validate(32), Err(SortError::ZeroSegmentSize)));
    }

    #[test]
    fn default_threads_divide_large_power_of_two_inputs() {
        let config = SortConfig::new(SortType::WaitFree);
        let num_segments = config.num_threads * 4;
        assert!(config.validate(num_segments * config.segment_size).is_ok());
        let available = std::thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1);
        assert!(config.num_threads <= available && available < 2 * config.num_threads);
    }

    #[test]
    fn delegated_and_sequential_do_not_need_even_partitions() {
        let delegated = SortConfig::new(SortType::Delegated).with_threads(3).with_segment_size(4);
        assert!(delegated.validate(32).is_ok());
        let sequential = SortConfig::new(SortType::Sequential).with_threads(3).with_segment_size(4);
        assert!(sequential.validate(32).is_ok());
        let original = SortConfig::new(SortType::Original).with_segment_size(0);
        assert!(original.validate(32).is_ok());
        assert!(original.validate(24).is_err());
    }
}
