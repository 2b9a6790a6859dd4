//! The per-type column container: an ordered list of chunks (value buffer +
//! validity bitmap pairs) with a running length and null count.
//!
//! Index translation is arithmetic (`row / chunk_capacity`) because every
//! chunk except the last is kept at exactly the chunk capacity. Null counts
//! are maintained incrementally from the prior/new bit comparison in
//! `set_validity`; the bulk-append path applies one net delta instead.

use arrow::buffer::{NullBuffer, ScalarBuffer};

use crate::error::TabularError;
use crate::null_handling::Bitmap;
use crate::storage::buffer::ValueBuffer;
use crate::traits::NativeType;

/// The fixed per-chunk element ceiling. Not derived from data.
pub const MAX_CHUNK_LEN: usize = i32::MAX as usize;

#[derive(Debug, Clone)]
struct Chunk<T: NativeType> {
    values: ValueBuffer<T>,
    validity: Bitmap,
}

impl<T: NativeType> Chunk<T> {
    fn empty() -> Self {
        Self {
            values: ValueBuffer::new(),
            validity: Bitmap::new(),
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug, Clone)]
pub struct PrimitiveContainer<T: NativeType> {
    chunks: Vec<Chunk<T>>,
    length: usize,
    null_count: usize,
    chunk_capacity: usize,
}

impl<T: NativeType> PrimitiveContainer<T> {
    pub fn new() -> Self {
        Self::with_chunk_capacity(MAX_CHUNK_LEN)
    }

    /// A container whose chunks roll over at `capacity` elements. The default
    /// ceiling is far beyond test sizes, so multi-chunk paths are exercised
    /// through this constructor.
    pub(crate) fn with_chunk_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "chunk capacity must be non-zero");
        Self {
            chunks: Vec::new(),
            length: 0,
            null_count: 0,
            chunk_capacity: capacity,
        }
    }

    /// A container of `length` zero-filled entries, either all-valid or
    /// all-null depending on the constructor path taken.
    pub fn with_len(length: usize, valid: bool) -> Self {
        let mut container = Self::new();
        container.append_many(if valid { Some(T::default()) } else { None }, length);
        container
    }

    /// Wrap externally-supplied Arrow buffers as a single read-only chunk
    /// (zero-copy; copied on first write).
    pub fn from_arrow_parts(
        values: ScalarBuffer<T>,
        nulls: Option<NullBuffer>,
        length: usize,
    ) -> Result<Self, TabularError> {
        if values.len() != length {
            return Err(TabularError::InvalidBuffer(format!(
                "value buffer holds {} elements but declared length is {}",
                values.len(),
                length
            )));
        }
        if let Some(nulls) = &nulls {
            if nulls.len() != length {
                return Err(TabularError::InvalidBuffer(format!(
                    "null bitmap covers {} rows but declared length is {}",
                    nulls.len(),
                    length
                )));
            }
        }
        let (validity, null_count) = match nulls {
            Some(nulls) => {
                let null_count = nulls.null_count();
                (Bitmap::from_null_buffer(nulls), null_count)
            }
            None => (Bitmap::with_len(length, true), 0),
        };
        Ok(Self {
            chunks: vec![Chunk {
                values: ValueBuffer::from_scalar_buffer(values),
                validity,
            }],
            length,
            null_count,
            chunk_capacity: MAX_CHUNK_LEN,
        })
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn null_count(&self) -> usize {
        self.null_count
    }

    pub(crate) fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Per-chunk `(values, validity)` views for the sort and aggregate kernels.
    pub(crate) fn chunk_views(&self) -> impl Iterator<Item = (&[T], &Bitmap)> {
        self.chunks
            .iter()
            .map(|chunk| (chunk.values.as_slice(), &chunk.validity))
    }

    fn locate(&self, index: usize) -> Result<(usize, usize), TabularError> {
        if index >= self.length {
            return Err(TabularError::IndexOutOfBounds {
                index,
                length: self.length,
            });
        }
        Ok((index / self.chunk_capacity, index % self.chunk_capacity))
    }

    fn writable_chunk(&mut self) -> &mut Chunk<T> {
        let needs_new = match self.chunks.last() {
            Some(chunk) => chunk.len() >= self.chunk_capacity,
            None => true,
        };
        if needs_new {
            self.chunks.push(Chunk::empty());
        }
        let last = self.chunks.len() - 1;
        &mut self.chunks[last]
    }

    pub fn append(&mut self, value: Option<T>) {
        let chunk = self.writable_chunk();
        chunk.values.push(value.unwrap_or_default());
        chunk.validity.push(value.is_some());
        self.length += 1;
        if value.is_none() {
            self.null_count += 1;
        }
    }

    /// Append `count` copies of `value`. Skips the per-bit counting logic and
    /// applies the net null-count delta once.
    pub fn append_many(&mut self, value: Option<T>, count: usize) {
        let mut remaining = count;
        while remaining > 0 {
            let chunk_capacity = self.chunk_capacity;
            let chunk = self.writable_chunk();
            let room = chunk_capacity - chunk.len();
            let take = room.min(remaining);
            chunk.values.extend_fill(value.unwrap_or_default(), take);
            chunk.validity.extend_fill(value.is_some(), take);
            remaining -= take;
        }
        self.length += count;
        if value.is_none() {
            self.null_count += count;
        }
    }

    pub fn is_valid(&self, index: usize) -> Result<bool, TabularError> {
        let (chunk, offset) = self.locate(index)?;
        Ok(self.chunks[chunk].validity.get(offset))
    }

    pub fn get(&self, index: usize) -> Result<Option<T>, TabularError> {
        let (chunk, offset) = self.locate(index)?;
        let chunk = &self.chunks[chunk];
        Ok(if chunk.validity.get(offset) {
            Some(chunk.values.get(offset))
        } else {
            None
        })
    }

    pub fn set(&mut self, index: usize, value: Option<T>) -> Result<(), TabularError> {
        let (chunk_index, offset) = self.locate(index)?;
        let chunk = &mut self.chunks[chunk_index];
        chunk.values.set(offset, value.unwrap_or_default());
        let previously_valid = chunk.validity.set(offset, value.is_some());
        match (previously_valid, value.is_some()) {
            (true, false) => self.null_count += 1,
            (false, true) => self.null_count -= 1,
            _ => {}
        }
        Ok(())
    }

    /// Flip only the validity bit, leaving the stored value in place.
    pub fn set_validity(&mut self, index: usize, valid: bool) -> Result<(), TabularError> {
        let (chunk_index, offset) = self.locate(index)?;
        let previously_valid = self.chunks[chunk_index].validity.set(offset, valid);
        match (previously_valid, valid) {
            (true, false) => self.null_count += 1,
            (false, true) => self.null_count -= 1,
            _ => {}
        }
        Ok(())
    }

    /// Grow to `new_length`, filling with nulls. Shrinking is a hard error.
    pub fn resize(&mut self, new_length: usize) -> Result<(), TabularError> {
        if new_length < self.length {
            return Err(TabularError::ShrinkNotAllowed {
                current: self.length,
                requested: new_length,
            });
        }
        self.append_many(None, new_length - self.length);
        Ok(())
    }

    /// Logical rows in order, `None` for null entries.
    pub fn iter(&self) -> impl Iterator<Item = Option<T>> + '_ {
        self.chunks.iter().flat_map(|chunk| {
            let values = chunk.values.as_slice();
            (0..chunk.len()).map(move |i| {
                if chunk.validity.get(i) {
                    Some(values[i])
                } else {
                    None
                }
            })
        })
    }
}

impl<T: NativeType> Default for PrimitiveContainer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NativeType> FromIterator<Option<T>> for PrimitiveContainer<T> {
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Self {
        let mut container = Self::new();
        for value in iter {
            container.append(value);
        }
        container
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_null_count<T: NativeType>(container: &PrimitiveContainer<T>) -> usize {
        (0..container.len())
            .filter(|&i| !container.is_valid(i).unwrap())
            .count()
    }

    #[test]
    fn null_count_invariant_over_appends_and_sets() {
        let mut container = PrimitiveContainer::<i32>::new();
        container.append(Some(1));
        container.append(None);
        container.append(Some(3));
        assert_eq!(container.null_count(), 1);

        container.set(0, None).unwrap();
        container.set(1, Some(7)).unwrap();
        container.set(1, Some(8)).unwrap(); // valid -> valid, no delta
        container.set(0, None).unwrap(); // null -> null, no delta
        assert_eq!(container.null_count(), scan_null_count(&container));
        assert_eq!(container.null_count(), 1);
    }

    #[test]
    fn bulk_append_counts_once() {
        let mut container = PrimitiveContainer::<u16>::new();
        container.append_many(None, 100);
        container.append_many(Some(5), 50);
        assert_eq!(container.len(), 150);
        assert_eq!(container.null_count(), 100);
        assert_eq!(container.null_count(), scan_null_count(&container));
    }

    #[test]
    fn chunks_roll_over_at_capacity() {
        let mut container = PrimitiveContainer::<i64>::with_chunk_capacity(4);
        for i in 0..10 {
            container.append(Some(i));
        }
        assert_eq!(container.chunk_count(), 3);
        assert_eq!(container.get(0).unwrap(), Some(0));
        assert_eq!(container.get(5).unwrap(), Some(5));
        assert_eq!(container.get(9).unwrap(), Some(9));
    }

    #[test]
    fn bulk_append_spans_chunk_boundaries() {
        let mut container = PrimitiveContainer::<u8>::with_chunk_capacity(3);
        container.append_many(Some(9), 8);
        assert_eq!(container.chunk_count(), 3);
        assert_eq!(container.iter().flatten().count(), 8);
    }

    #[test]
    fn out_of_range_access_errors() {
        let container: PrimitiveContainer<i32> = [Some(1), Some(2)].into_iter().collect();
        assert!(matches!(
            container.get(2),
            Err(TabularError::IndexOutOfBounds { index: 2, length: 2 })
        ));
    }

    #[test]
    fn resize_grows_with_nulls_and_never_shrinks() {
        let mut container: PrimitiveContainer<f64> = [Some(1.5)].into_iter().collect();
        container.resize(3).unwrap();
        assert_eq!(container.len(), 3);
        assert_eq!(container.get(2).unwrap(), None);
        assert!(matches!(
            container.resize(1),
            Err(TabularError::ShrinkNotAllowed { .. })
        ));
    }

    #[test]
    fn from_arrow_parts_validates_geometry() {
        let values = ScalarBuffer::<i32>::from(vec![1, 2, 3]);
        let bad = PrimitiveContainer::from_arrow_parts(values.clone(), None, 4);
        assert!(matches!(bad, Err(TabularError::InvalidBuffer(_))));

        let nulls = NullBuffer::from(vec![true, false, true]);
        let container = PrimitiveContainer::from_arrow_parts(values, Some(nulls), 3).unwrap();
        assert_eq!(container.null_count(), 1);
        assert_eq!(container.get(1).unwrap(), None);
    }

    #[test]
    fn borrowed_chunk_copies_before_mutation() {
        let values = ScalarBuffer::<i32>::from(vec![10, 20]);
        let mut container =
            PrimitiveContainer::from_arrow_parts(values.clone(), None, 2).unwrap();
        container.set(0, Some(99)).unwrap();
        assert_eq!(container.get(0).unwrap(), Some(99));
        assert_eq!(values.as_ref(), &[10, 20]);
    }
}
