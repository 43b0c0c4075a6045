use thiserror::Error;

/// Why a sort call refused to run.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("segment size must be at least 1")]
    ZeroSegmentSize,

    #[error("at least one thread is required")]
    ZeroThreads,

    #[error("input length {len} is not a multiple of the segment size {segment_size}")]
    IndivisibleLength { len: usize, segment_size: usize },

    #[error("segment count {num_segments} is not a power of two")]
    SegmentCountNotPowerOfTwo { num_segments: usize },

    #[error("{num_segments} segments cannot be split evenly across {num_threads} threads")]
    UnevenPartition { num_segments: usize, num_threads: usize },

    #[error("failed to start the delegated thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown {kind}: {name:?}")]
    UnknownVariant { kind: &'static str, name: String },
}

impl ParseError {
    pub(crate) fn unknown(kind: &'static str, name: &str) -> Self {
        ParseError::UnknownVariant { kind, name: name.to_owned() }
    }
}
