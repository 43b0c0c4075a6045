//! Single-threaded references: the textbook element-wise network, and the
//! segmented network every parallel strategy distributes.

use super::network::stages;
use crate::merge::{self, Direction};

/// Compare-exchange bitonic network over individual elements. `data.len()` must
/// be a power of two.
pub(super) fn original<T: Ord>(data: &mut [T]) {
    let n = data.len();
    for stage in stages(n) {
        for i in 0..n {
            let Some(ij) = stage.partner(i) else { continue };
            let out_of_order = match stage.direction(i) {
                Direction::Ascending => data[i] > data[ij],
                Direction::Descending => data[i] < data[ij],
            };
            if out_of_order {
                data.swap(i, ij);
            }
        }
    }
}

pub(super) fn segmented<T: Copy + Ord>(data: &mut [T], segment_size: usize) {
    let num_segments = data.len() / segment_size;
    let mut buffer = Vec::with_capacity(2 * segment_size);

    for segment in data.chunks_exact_mut(segment_size) {
        segment.sort_unstable();
    }

    for stage in stages(num_segments) {
        for i in 0..num_segments {
            let Some(ij) = stage.partner(i) else { continue };
            let (lower, upper) = data.split_at_mut(ij * segment_size);
            let segment1 = &mut lower[i * segment_size..(i + 1) * segment_size];
            let segment2 = &mut upper[..segment_size];
            merge::merge(segment1, segment2, &mut buffer, stage.direction(i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_sorts_small_vector() {
        let mut data = [5, 7, 1, 4, 8, 2, 3, 6];
        original(&mut data);
        assert_eq!(data, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn segmented_sorts_reversed_input() {
        let mut data: Vec<i32> = (0..1024).rev().collect();
        segmented(&mut data, 16);
        assert_eq!(data, (0..1024).collect::<Vec<_>>());
    }

    #[test]
    fn single_segment_is_just_a_local_sort() {
        let mut data = [3, 1, 2, 0];
        segmented(&mut data, 4);
        assert_eq!(data, [0, 1, 2, 3]);
    }
}
