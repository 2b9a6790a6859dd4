//! The sort engine: an introspective sort over an index-permutation array,
//! plus a k-way merge that combines independently sorted chunks.
//!
//! The data span is never reordered — only the `usize` index array is. Table
//! sorts need one permutation computed from a key column and applied to every
//! column, so the indirection is load-bearing, not an optimization.
//!
//! Shape of the hybrid: median-of-three quicksort, falling back to heapsort
//! once recursion depth exceeds `2 * (floor(log2 n) + 1)`, and to insertion
//! sort (or direct 2/3-element sorts) for partitions of 16 or fewer elements.
//! A comparator that reports non-monotonic results is detected by partition
//! boundary overrun and surfaces as `BadComparator` instead of corrupting the
//! permutation or looping forever.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::TabularError;
use crate::traits::NativeType;

//==================================================================================
// 1. Sort-key ordering
//==================================================================================

/// Total order used for sort keys. Numeric types go through
/// `NativeType::total_cmp`; strings use their natural order.
pub trait SortKey: Clone {
    fn key_cmp(&self, other: &Self) -> Ordering;
}

impl<T: NativeType> SortKey for T {
    fn key_cmp(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl SortKey for String {
    fn key_cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(self, other)
    }
}

impl SortKey for bool {
    fn key_cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(self, other)
    }
}

/// Wrapper giving `Ord` to a `SortKey` so values can key a `BTreeMap`.
#[derive(Clone, Debug)]
struct Sortable<V: SortKey>(V);

impl<V: SortKey> PartialEq for Sortable<V> {
    fn eq(&self, other: &Self) -> bool {
        self.0.key_cmp(&other.0) == Ordering::Equal
    }
}
impl<V: SortKey> Eq for Sortable<V> {}
impl<V: SortKey> PartialOrd for Sortable<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<V: SortKey> Ord for Sortable<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.key_cmp(&other.0)
    }
}

//==================================================================================
// 2. Introspective index sort
//==================================================================================

fn floor_log2_plus_one(n: usize) -> usize {
    debug_assert!(n >= 2);
    let mut result = 2;
    let mut n = n >> 2;
    while n > 0 {
        result += 1;
        n >>= 1;
    }
    result
}

/// Sort `sort_indices` so that `values[sort_indices[i]]` is ascending under
/// `cmp`. `values` itself is never moved.
pub fn introspective_sort<V>(
    values: &[V],
    sort_indices: &mut [usize],
    cmp: &impl Fn(&V, &V) -> Ordering,
) -> Result<(), TabularError> {
    let length = sort_indices.len();
    if length < 2 {
        return Ok(());
    }
    let depth_limit = 2 * floor_log2_plus_one(length);
    intro_sort_recursive(values, 0, length - 1, depth_limit, sort_indices, cmp)
}

fn intro_sort_recursive<V>(
    values: &[V],
    lo: usize,
    mut hi: usize,
    mut depth_limit: usize,
    sort_indices: &mut [usize],
    cmp: &impl Fn(&V, &V) -> Ordering,
) -> Result<(), TabularError> {
    while hi > lo {
        let partition_size = hi - lo + 1;
        if partition_size <= 16 {
            match partition_size {
                1 => {}
                2 => sort2(values, lo, hi, sort_indices, cmp),
                3 => sort3(values, lo, hi - 1, hi, sort_indices, cmp),
                _ => insertion_sort(values, lo, hi, sort_indices, cmp),
            }
            return Ok(());
        }

        if depth_limit == 0 {
            heap_sort(values, lo, hi, sort_indices, cmp);
            return Ok(());
        }
        depth_limit -= 1;

        let p = pick_pivot_and_partition(values, lo, hi, sort_indices, cmp)?;
        // The pivot is already in place; recurse right, iterate left.
        intro_sort_recursive(values, p + 1, hi, depth_limit, sort_indices, cmp)?;
        if p == 0 {
            return Ok(());
        }
        hi = p - 1;
    }
    Ok(())
}

fn pick_pivot_and_partition<V>(
    values: &[V],
    lo: usize,
    hi: usize,
    sort_indices: &mut [usize],
    cmp: &impl Fn(&V, &V) -> Ordering,
) -> Result<usize, TabularError> {
    debug_assert!(hi > lo);

    // median-of-three
    let middle = (hi + lo) >> 1;
    sort3(values, lo, middle, hi, sort_indices, cmp);

    let pivot_index = sort_indices[middle];
    let pivot = &values[pivot_index];

    let mut left = lo;
    let mut right = hi - 1;
    // lo and hi are partitioned already; park the pivot at hi - 1.
    sort_indices.swap(middle, right);

    while left < right {
        loop {
            left += 1;
            if left >= hi - 1 || cmp(&values[sort_indices[left]], pivot) != Ordering::Less {
                break;
            }
        }
        if left == hi - 1 && cmp(&values[sort_indices[left]], pivot) == Ordering::Less {
            return Err(TabularError::BadComparator);
        }

        loop {
            right -= 1;
            if right <= lo || cmp(pivot, &values[sort_indices[right]]) != Ordering::Less {
                break;
            }
        }
        if right == lo && cmp(pivot, &values[sort_indices[right]]) == Ordering::Less {
            return Err(TabularError::BadComparator);
        }

        if left >= right {
            break;
        }
        sort_indices.swap(left, right);
    }
    // Put the pivot in its final location.
    let right = hi - 1;
    if left != right {
        sort_indices.swap(left, right);
    }
    Ok(left)
}

fn heap_sort<V>(
    values: &[V],
    lo: usize,
    hi: usize,
    sort_indices: &mut [usize],
    cmp: &impl Fn(&V, &V) -> Ordering,
) {
    let n = hi - lo + 1;
    for i in (1..=n / 2).rev() {
        down_heap(values, i, n, lo, sort_indices, cmp);
    }
    for i in (2..=n).rev() {
        sort_indices.swap(lo, lo + i - 1);
        down_heap(values, 1, i - 1, lo, sort_indices, cmp);
    }
}

fn down_heap<V>(
    values: &[V],
    mut i: usize,
    n: usize,
    lo: usize,
    sort_indices: &mut [usize],
    cmp: &impl Fn(&V, &V) -> Ordering,
) {
    // Max heap over the index window [lo, lo + n).
    let di = sort_indices[lo + i - 1];
    let n_half = n / 2;
    while i <= n_half {
        let mut child = i << 1;
        if child < n
            && cmp(
                &values[sort_indices[lo + child - 1]],
                &values[sort_indices[lo + child]],
            ) == Ordering::Less
        {
            child += 1;
        }
        if cmp(&values[di], &values[sort_indices[lo + child - 1]]) != Ordering::Less {
            break;
        }
        sort_indices[lo + i - 1] = sort_indices[lo + child - 1];
        i = child;
    }
    sort_indices[lo + i - 1] = di;
}

fn insertion_sort<V>(
    values: &[V],
    lo: usize,
    hi: usize,
    sort_indices: &mut [usize],
    cmp: &impl Fn(&V, &V) -> Ordering,
) {
    for i in lo..hi {
        let ti = sort_indices[i + 1];
        let mut j = i + 1;
        while j > lo && cmp(&values[ti], &values[sort_indices[j - 1]]) == Ordering::Less {
            sort_indices[j] = sort_indices[j - 1];
            j -= 1;
        }
        sort_indices[j] = ti;
    }
}

fn sort3<V>(
    values: &[V],
    i: usize,
    j: usize,
    k: usize,
    sort_indices: &mut [usize],
    cmp: &impl Fn(&V, &V) -> Ordering,
) {
    sort2(values, i, j, sort_indices, cmp);
    sort2(values, i, k, sort_indices, cmp);
    sort2(values, j, k, sort_indices, cmp);
}

fn sort2<V>(
    values: &[V],
    i: usize,
    j: usize,
    sort_indices: &mut [usize],
    cmp: &impl Fn(&V, &V) -> Ordering,
) {
    debug_assert!(i != j);
    if cmp(&values[sort_indices[i]], &values[sort_indices[j]]) == Ordering::Greater {
        sort_indices.swap(i, j);
    }
}

//==================================================================================
// 3. Multi-chunk merge
//==================================================================================

/// One chunk's materialized sort input: values (including the zero-filled
/// slots of null entries), per-slot validity, and the chunk's global base row.
pub struct ChunkSortData<V> {
    pub values: Vec<V>,
    pub validity: Vec<bool>,
    pub base: usize,
}

/// Scan a chunk's local sorted order from `start` for the next non-null entry.
fn first_non_null_from<V: SortKey>(
    chunk: &ChunkSortData<V>,
    local_order: &[usize],
    mut start: usize,
) -> Option<(V, usize)> {
    while start < local_order.len() {
        let slot = local_order[start];
        if chunk.validity[slot] {
            return Some((chunk.values[slot].clone(), start));
        }
        start += 1;
    }
    None
}

/// Compute a full-length ascending permutation of global row indices across
/// all chunks: non-null rows in ascending value order first, null rows last
/// (in global row order). Applying the reversed permutation therefore yields
/// descending order with nulls first.
pub fn chunked_ascending_indices<V: SortKey>(
    chunks: &[ChunkSortData<V>],
) -> Result<Vec<usize>, TabularError> {
    // Sort each chunk independently, nulls included (their slots carry
    // default values and are skipped during the merge scan).
    let mut local_orders: Vec<Vec<usize>> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let mut order: Vec<usize> = (0..chunk.values.len()).collect();
        introspective_sort(&chunk.values, &mut order, &|a, b| a.key_cmp(b))?;
        local_orders.push(order);
    }

    if chunks.len() > 1 {
        log::debug!("k-way merging sort indices across {} chunks", chunks.len());
    }

    // Sorted multimap: value -> list of (local-sort-position, chunk-index).
    let mut heap: BTreeMap<Sortable<V>, Vec<(usize, usize)>> = BTreeMap::new();
    for (chunk_index, chunk) in chunks.iter().enumerate() {
        if let Some((value, position)) = first_non_null_from(chunk, &local_orders[chunk_index], 0)
        {
            heap.entry(Sortable(value))
                .or_default()
                .push((position, chunk_index));
        }
    }

    let total: usize = chunks.iter().map(|c| c.values.len()).sum();
    let mut result: Vec<usize> = Vec::with_capacity(total);

    // Repeatedly extract the global minimum, advancing that chunk's cursor to
    // its next non-null entry.
    while let Some((value, mut cursors)) = heap.pop_first() {
        let Some((position, chunk_index)) = cursors.pop() else {
            continue;
        };
        if !cursors.is_empty() {
            heap.insert(value, cursors);
        }
        let chunk = &chunks[chunk_index];
        result.push(chunk.base + local_orders[chunk_index][position]);

        if let Some((next_value, next_position)) =
            first_non_null_from(chunk, &local_orders[chunk_index], position + 1)
        {
            heap.entry(Sortable(next_value))
                .or_default()
                .push((next_position, chunk_index));
        }
    }

    // Nulls are conceptually greater than all non-null values: emit their row
    // indices at the end, in global row order.
    for chunk in chunks {
        for (slot, valid) in chunk.validity.iter().enumerate() {
            if !valid {
                result.push(chunk.base + slot);
            }
        }
    }
    Ok(result)
}
