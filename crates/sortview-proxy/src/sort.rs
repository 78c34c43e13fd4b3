//! Row-order sorts that tolerate inconsistent comparators.
//!
//! The comparator is user code. If it is not a total order the standard
//! library sorts may panic; these routines only ever swap or copy elements,
//! so the output is always a permutation of the input whatever the
//! comparator answers. Both run in O(n log n) comparisons.

use std::cmp::Ordering;

/// In-place heapsort. Not stable.
pub fn heap_sort_by<T>(items: &mut [T], mut compare: impl FnMut(&T, &T) -> Ordering) {
    let len = items.len();
    for start in (0..len / 2).rev() {
        sift_down(items, start, len, &mut compare);
    }
    for end in (1..len).rev() {
        items.swap(0, end);
        sift_down(items, 0, end, &mut compare);
    }
}

fn sift_down<T>(
    items: &mut [T],
    mut node: usize,
    end: usize,
    compare: &mut impl FnMut(&T, &T) -> Ordering,
) {
    loop {
        let mut child = 2 * node + 1;
        if child >= end {
            return;
        }
        if child + 1 < end && compare(&items[child], &items[child + 1]) == Ordering::Less {
            child += 1;
        }
        if compare(&items[node], &items[child]) != Ordering::Less {
            return;
        }
        items.swap(node, child);
        node = child;
    }
}

/// Bottom-up merge sort. Stable: an element from the right run is taken
/// only when it compares strictly less.
pub fn merge_sort_by<T: Copy>(items: &mut [T], mut compare: impl FnMut(&T, &T) -> Ordering) {
    let len = items.len();
    if len < 2 {
        return;
    }
    let mut buffer = items.to_vec();
    let mut width = 1usize;
    while width < len {
        let mut start = 0;
        while start < len {
            let mid = start.saturating_add(width).min(len);
            let end = start.saturating_add(width.saturating_mul(2)).min(len);
            merge(
                &items[start..mid],
                &items[mid..end],
                &mut buffer[start..end],
                &mut compare,
            );
            start = end;
        }
        items.copy_from_slice(&buffer);
        width = width.saturating_mul(2);
    }
}

fn merge<T: Copy>(
    left: &[T],
    right: &[T],
    out: &mut [T],
    compare: &mut impl FnMut(&T, &T) -> Ordering,
) {
    let (mut i, mut j) = (0, 0);
    for slot in out.iter_mut() {
        let take_right = j < right.len()
            && (i == left.len() || compare(&right[j], &left[i]) == Ordering::Less);
        if take_right {
            *slot = right[j];
            j += 1;
        } else {
            *slot = left[i];
            i += 1;
        }
    }
}
