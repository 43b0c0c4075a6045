//! Segmented bitonic sort.
//!
//! The input is cut into `len / segment_size` segments, each segment is sorted
//! on its own, and then the bitonic merging network runs over whole segments:
//! for `k = 2, 4, .., num_segments` and `j = k/2, .., 1`, every pair
//! `(i, i ^ j)` with `i < i ^ j` is merged ascending when `i & k == 0` and
//! descending otherwise. The strategies differ only in who runs which merge
//! and how a merge learns that its inputs are ready.

mod blocking;
mod counters;
mod delegated;
mod lockfree;
mod network;
mod scratch;
mod segments;
mod sequential;
mod stealing;
mod waitfree;

use tracing::warn;

use crate::config::{SortConfig, SortType};
use crate::error::SortError;

pub use counters::StageCounters;
pub use network::{Partition, Stage, stage_count, stages};

/// Sorts `data` in place, ascending.
///
/// `data.len()` must be a power-of-two multiple of `config.segment_size`, and
/// the strategies that partition segments across threads need `num_threads`
/// to divide the segment count. Inputs of length 0 or 1 are returned as is.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(
        len = data.len(),
        sort_type = %config.sort_type,
        num_threads = config.num_threads,
        segment_size = config.segment_size
    )
)]
pub fn sort<T: Copy + Ord + Send>(data: &mut [T], config: &SortConfig) -> Result<(), SortError> {
    if data.len() <= 1 {
        return Ok(());
    }
    if let Err(err) = config.validate(data.len()) {
        warn!(%err, "rejected sort configuration");
        return Err(err);
    }

    match config.sort_type {
        SortType::Original => sequential::original(data),
        SortType::Sequential => sequential::segmented(data, config.segment_size),
        SortType::Delegated => delegated::sort(data, config)?,
        SortType::Blocking => blocking::sort(data, config),
        SortType::LockFree => lockfree::sort(data, config),
        SortType::Stealing => stealing::sort(data, config),
        SortType::WaitFree => waitfree::sort(data, config),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barrier::BarrierKind;
    use crate::wait_policy::WaitPolicy;

    const UNSORTED: [i32; 8] = [5, 7, 1, 4, 8, 2, 3, 6];

    #[test]
    fn every_strategy_sorts_the_small_example() {
        for sort_type in SortType::ALL {
            let mut data = UNSORTED;
            let config = SortConfig::new(sort_type).with_threads(2).with_segment_size(2);
            sort(&mut data, &config).unwrap();
            assert_eq!(data, [1, 2, 3, 4, 5, 6, 7, 8], "{sort_type}");
        }
    }

    #[test]
    fn trivial_inputs_skip_validation() {
        let config = SortConfig::new(SortType::Blocking).with_threads(0).with_segment_size(0);
        let mut empty: [u8; 0] = [];
        assert!(sort(&mut empty, &config).is_ok());
        let mut one = [9u8];
        assert!(sort(&mut one, &config).is_ok());
        assert_eq!(one, [9]);
    }

    #[test]
    fn rejected_configurations_leave_data_untouched() {
        let mut data = UNSORTED;
        let config = SortConfig::new(SortType::LockFree).with_threads(3).with_segment_size(2);
        assert!(matches!(sort(&mut data, &config), Err(SortError::UnevenPartition { num_segments: 4, num_threads: 3 })));
        assert_eq!(data, UNSORTED);
    }

    #[test]
    fn barrier_strategies_work_with_either_barrier() {
        for sort_type in [SortType::Blocking, SortType::Stealing] {
            for barrier in BarrierKind::ALL {
                for wait_policy in WaitPolicy::ALL {
                    let mut data: Vec<u32> = (0..512).rev().collect();
                    let config = SortConfig::new(sort_type)
                        .with_threads(4)
                        .with_segment_size(16)
                        .with_barrier(barrier)
                        .with_wait_policy(wait_policy);
                    sort(&mut data, &config).unwrap();
                    assert_eq!(data, (0..512).collect::<Vec<_>>(), "{sort_type}/{barrier}/{wait_policy}");
                }
            }
        }
    }

    #[test]
    fn one_segment_per_thread() {
        for sort_type in SortType::PARALLEL {
            let mut data: Vec<u16> = (0..64).map(|i| (i * 37 % 64) as u16).collect();
            let config = SortConfig::new(sort_type).with_threads(8).with_segment_size(8);
            sort(&mut data, &config).unwrap();
            assert_eq!(data, (0..64).collect::<Vec<u16>>(), "{sort_type}");
        }
    }
}
