use std::marker::PhantomData;

use crate::merge::{self, Direction};

/// A shareable view of a slice cut into equal segments.
///
/// Worker threads receive copies of this and carve out `&mut` segments on
/// demand. The borrow checker cannot see that the bitonic schedule hands each
/// segment to one thread at a time, so the accessors are `unsafe` and every
/// caller states which synchronization makes its access exclusive.
pub struct Segments<'a, T> {
    ptr: *mut T,
    segment_size: usize,
    num_segments: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: a `Segments` only ever yields `&mut [T]` to disjoint segments, which
// is what sending `&mut [T]` pieces to other threads requires.
unsafe impl<T: Send> Send for Segments<'_, T> {}
unsafe impl<T: Send> Sync for Segments<'_, T> {}

impl<T> Clone for Segments<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Segments<'_, T> {}

impl<'a, T> Segments<'a, T> {
    /// Trailing elements that do not fill a whole segment are not reachable.
    pub fn new(data: &'a mut [T], segment_size: usize) -> Self {
        assert!(segment_size > 0, "segment size must be at least 1");
        Self {
            ptr: data.as_mut_ptr(),
            segment_size,
            num_segments: data.len() / segment_size,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    #[inline]
    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    /// # Safety
    ///
    /// No other reference to segment `id` may be alive while the returned one is.
    #[inline]
    pub unsafe fn segment(&self, id: usize) -> &'a mut [T] {
        assert!(id < self.num_segments);
        // SAFETY: in bounds by the assert; exclusivity is the caller's contract.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.add(id * self.segment_size), self.segment_size) }
    }
}

impl<T: Copy + Ord> Segments<'_, T> {
    /// # Safety
    ///
    /// The calling thread must have exclusive access to segment `id`.
    #[inline]
    pub unsafe fn sort_segment(&self, id: usize) {
        // SAFETY: forwarded to the caller.
        unsafe { self.segment(id) }.sort_unstable();
    }

    /// Merges segments `a` and `b`, leaving the lower half of the result in `a`.
    ///
    /// # Safety
    ///
    /// The calling thread must have exclusive access to both segments.
    #[inline]
    pub unsafe fn merge_pair(&self, a: usize, b: usize, direction: Direction, buffer: &mut Vec<T>) {
        assert_ne!(a, b);
        // SAFETY: distinct segments never overlap; exclusivity is forwarded to the caller.
        let (segment1, segment2) = unsafe { (self.segment(a), self.segment(b)) };
        merge::merge(segment1, segment2, buffer, direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_cover_the_slice_in_order() {
        let mut data: Vec<u32> = (0..12).collect();
        let segments = Segments::new(&mut data, 4);
        assert_eq!(segments.num_segments(), 3);
        unsafe {
            assert_eq!(segments.segment(0), &[0, 1, 2, 3]);
            assert_eq!(segments.segment(2), &[8, 9, 10, 11]);
        }
    }

    #[test]
    fn merge_pair_writes_lower_half_first() {
        let mut data = vec![7, 3, 9, 1, 4, 8, 2, 6];
        let segments = Segments::new(&mut data, 2);
        let mut buffer = Vec::new();
        unsafe {
            for id in 0..4 {
                segments.sort_segment(id);
            }
            segments.merge_pair(1, 3, Direction::Ascending, &mut buffer);
            segments.merge_pair(0, 2, Direction::Descending, &mut buffer);
        }
        assert_eq!(data, [8, 7, 1, 2, 4, 3, 6, 9]);
    }

    #[test]
    #[should_panic]
    fn out_of_range_segment_panics() {
        let mut data = vec![0u8; 8];
        let segments = Segments::new(&mut data, 4);
        let _ = unsafe { segments.segment(2) };
    }
}
