//! In-place merge of two equal-length sorted segments.
//!
//! Each input may be sorted either way. The dispatchers ([`up`], [`down`])
//! read the orientation of each segment off its endpoints and pick one of eight
//! specialized routines, so the inner loop never has to ask which end of a
//! segment to read from. The merge goes into a scratch buffer in linear time
//! and the two halves are copied back: the lower half into `segment1`, the
//! upper half into `segment2`.
//!
//! Segments that are not actually sorted produce garbage. Nothing checks.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// Orientation of a sorted run. A run with equal endpoints is constant,
    /// which counts as ascending.
    #[inline(always)]
    pub fn of_run<T: Ord>(run: &[T]) -> Direction {
        match (run.first(), run.last()) {
            (Some(first), Some(last)) if first > last => Direction::Descending,
            _ => Direction::Ascending,
        }
    }

    pub fn is_sorted<T: Ord>(self, data: &[T]) -> bool {
        match self {
            Direction::Ascending => data.windows(2).all(|w| w[0] <= w[1]),
            Direction::Descending => data.windows(2).all(|w| w[0] >= w[1]),
        }
    }
}

/// Two-pointer merge of two runs that are already in output order.
#[inline(always)]
fn merge_runs<T, A, B, F>(mut a: A, mut b: B, buffer: &mut Vec<T>, first_wins: F)
where
    T: Copy,
    A: Iterator<Item = T>,
    B: Iterator<Item = T>,
    F: Fn(&T, &T) -> bool,
{
    buffer.clear();
    let mut x = a.next();
    let mut y = b.next();
    loop {
        match (x, y) {
            (Some(l), Some(r)) => {
                if first_wins(&l, &r) {
                    buffer.push(l);
                    x = a.next();
                } else {
                    buffer.push(r);
                    y = b.next();
                }
            }
            (Some(l), None) => {
                buffer.push(l);
                buffer.extend(a);
                return;
            }
            (None, Some(r)) => {
                buffer.push(r);
                buffer.extend(b);
                return;
            }
            (None, None) => return,
        }
    }
}

#[inline(always)]
fn scatter<T: Copy>(buffer: &[T], segment1: &mut [T], segment2: &mut [T]) {
    let (lower, upper) = buffer.split_at(segment1.len());
    segment1.copy_from_slice(lower);
    segment2.copy_from_slice(upper);
}

pub fn up_from_up_up<T: Copy + Ord>(segment1: &mut [T], segment2: &mut [T], buffer: &mut Vec<T>) {
    merge_runs(segment1.iter().copied(), segment2.iter().copied(), buffer, |a, b| a < b);
    scatter(buffer, segment1, segment2);
}

pub fn up_from_up_down<T: Copy + Ord>(segment1: &mut [T], segment2: &mut [T], buffer: &mut Vec<T>) {
    merge_runs(segment1.iter().copied(), segment2.iter().rev().copied(), buffer, |a, b| a < b);
    scatter(buffer, segment1, segment2);
}

pub fn up_from_down_up<T: Copy + Ord>(segment1: &mut [T], segment2: &mut [T], buffer: &mut Vec<T>) {
    merge_runs(segment1.iter().rev().copied(), segment2.iter().copied(), buffer, |a, b| a < b);
    scatter(buffer, segment1, segment2);
}

pub fn up_from_down_down<T: Copy + Ord>(segment1: &mut [T], segment2: &mut [T], buffer: &mut Vec<T>) {
    merge_runs(segment1.iter().rev().copied(), segment2.iter().rev().copied(), buffer, |a, b| a < b);
    scatter(buffer, segment1, segment2);
}

pub fn down_from_up_up<T: Copy + Ord>(segment1: &mut [T], segment2: &mut [T], buffer: &mut Vec<T>) {
    merge_runs(segment1.iter().rev().copied(), segment2.iter().rev().copied(), buffer, |a, b| a > b);
    scatter(buffer, segment1, segment2);
}

pub fn down_from_up_down<T: Copy + Ord>(segment1: &mut [T], segment2: &mut [T], buffer: &mut Vec<T>) {
    merge_runs(segment1.iter().rev().copied(), segment2.iter().copied(), buffer, |a, b| a > b);
    scatter(buffer, segment1, segment2);
}

pub fn down_from_down_up<T: Copy + Ord>(segment1: &mut [T], segment2: &mut [T], buffer: &mut Vec<T>) {
    merge_runs(segment1.iter().copied(), segment2.iter().rev().copied(), buffer, |a, b| a > b);
    scatter(buffer, segment1, segment2);
}

pub fn down_from_down_down<T: Copy + Ord>(segment1: &mut [T], segment2: &mut [T], buffer: &mut Vec<T>) {
    merge_runs(segment1.iter().copied(), segment2.iter().copied(), buffer, |a, b| a > b);
    scatter(buffer, segment1, segment2);
}

/// Merges into non-decreasing order.
pub fn up<T: Copy + Ord>(segment1: &mut [T], segment2: &mut [T], buffer: &mut Vec<T>) {
    debug_assert_eq!(segment1.len(), segment2.len());
    if segment1.is_empty() {
        return;
    }
    use Direction::{Ascending as Up, Descending as Down};
    match (Direction::of_run(segment1), Direction::of_run(segment2)) {
        (Up, Up) => up_from_up_up(segment1, segment2, buffer),
        (Up, Down) => up_from_up_down(segment1, segment2, buffer),
        (Down, Up) => up_from_down_up(segment1, segment2, buffer),
        (Down, Down) => up_from_down_down(segment1, segment2, buffer),
    }
}

/// Merges into non-increasing order.
pub fn down<T: Copy + Ord>(segment1: &mut [T], segment2: &mut [T], buffer: &mut Vec<T>) {
    debug_assert_eq!(segment1.len(), segment2.len());
    if segment1.is_empty() {
        return;
    }
    use Direction::{Ascending as Up, Descending as Down};
    match (Direction::of_run(segment1), Direction::of_run(segment2)) {
        (Up, Up) => down_from_up_up(segment1, segment2, buffer),
        (Up, Down) => down_from_up_down(segment1, segment2, buffer),
        (Down, Up) => down_from_down_up(segment1, segment2, buffer),
        (Down, Down) => down_from_down_down(segment1, segment2, buffer),
    }
}

#[inline]
pub fn merge<T: Copy + Ord>(segment1: &mut [T], segment2: &mut [T], buffer: &mut Vec<T>, direction: Direction) {
    match direction {
        Direction::Ascending => up(segment1, segment2, buffer),
        Direction::Descending => down(segment1, segment2, buffer),
    }
}
