//! In-place parallel segmented bitonic sort.
//!
//! The input is split into equal power-of-two segment counts, each segment is
//! sorted locally, and the bitonic merging network then runs over whole
//! segments. [`SortType`] picks how that network is scheduled across threads:
//! with barriers, with per-segment stage counters, with work stealing, or on a
//! rayon pool.
//!
//! ```
//! use segmented_bitonic::{SortConfig, SortType, sort};
//!
//! let mut data = [5, 7, 1, 4, 8, 2, 3, 6];
//! let config = SortConfig::new(SortType::LockFree).with_threads(2).with_segment_size(2);
//! sort(&mut data, &config).unwrap();
//! assert_eq!(data, [1, 2, 3, 4, 5, 6, 7, 8]);
//! ```

pub mod barrier;
pub mod bitonic;
pub mod config;
pub mod error;
pub mod merge;
pub mod task_queue;
pub mod wait_policy;

pub use barrier::BarrierKind;
pub use bitonic::sort;
pub use config::{DEFAULT_SEGMENT_SIZE, SortConfig, SortType};
pub use error::{ParseError, SortError};
pub use task_queue::QueueKind;
pub use wait_policy::WaitPolicy;
