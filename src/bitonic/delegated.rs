use rayon::prelude::*;
use tracing::debug;

use super::network::{stage_count, stages};
use crate::config::SortConfig;
use crate::error::SortError;
use crate::merge;

/// Hands scheduling to a dedicated rayon pool of `num_threads` workers. Each
/// stage is one parallel pass over its segment pairs; the pass joining is the
/// stage barrier.
pub(super) fn sort<T: Copy + Ord + Send>(data: &mut [T], config: &SortConfig) -> Result<(), SortError> {
    let segment_size = config.segment_size;
    let num_segments = data.len() / segment_size;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .thread_name(|i| format!("bitonic-{i}"))
        .build()?;
    debug!(num_segments, stages = stage_count(num_segments), "delegated bitonic sort");

    pool.install(|| {
        data.par_chunks_mut(segment_size).for_each(|segment| segment.sort_unstable());

        for stage in stages(num_segments) {
            // Stage (k, j) pairs segment i with i + j inside blocks of 2j segments.
            let lower_len = stage.j * segment_size;
            data.par_chunks_mut(2 * lower_len).enumerate().for_each(|(block, chunk)| {
                let (lower, upper) = chunk.split_at_mut(lower_len);
                lower
                    .par_chunks_mut(segment_size)
                    .zip(upper.par_chunks_mut(segment_size))
                    .enumerate()
                    .for_each_init(
                        || Vec::with_capacity(2 * segment_size),
                        |buffer, (offset, (segment1, segment2))| {
                            let i = block * 2 * stage.j + offset;
                            merge::merge(segment1, segment2, buffer, stage.direction(i));
                        },
                    );
            });
        }
    });
    Ok(())
}
