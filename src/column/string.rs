//! Owned string columns.
//!
//! Unlike primitive containers, string chunks are capped by cumulative byte
//! size rather than row count, so index translation walks the chunk lengths
//! instead of dividing by a fixed capacity.

use crate::column::BooleanColumn;
use crate::error::TabularError;
use crate::kernels::sort::{chunked_ascending_indices, ChunkSortData};

/// Byte budget per chunk. A single oversized string still gets a chunk of its
/// own rather than being rejected.
pub(crate) const MAX_CHUNK_BYTES: usize = i32::MAX as usize;

#[derive(Debug, Clone, Default)]
struct StringChunk {
    values: Vec<Option<String>>,
    bytes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StringColumn {
    name: String,
    chunks: Vec<StringChunk>,
    length: usize,
    null_count: usize,
    byte_budget: usize,
}

impl StringColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chunks: Vec::new(),
            length: 0,
            null_count: 0,
            byte_budget: MAX_CHUNK_BYTES,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_byte_budget(name: impl Into<String>, byte_budget: usize) -> Self {
        let mut column = Self::new(name);
        column.byte_budget = byte_budget;
        column
    }

    pub fn from_values<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        let mut column = Self::new(name);
        for value in values {
            column.append(value.map(Into::into));
        }
        column
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
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

    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Translate a global row index to (chunk, offset) by walking cumulative
    /// chunk lengths.
    fn locate(&self, index: usize) -> Result<(usize, usize), TabularError> {
        let mut remaining = index;
        for (chunk_index, chunk) in self.chunks.iter().enumerate() {
            if remaining < chunk.values.len() {
                return Ok((chunk_index, remaining));
            }
            remaining -= chunk.values.len();
        }
        Err(TabularError::IndexOutOfBounds {
            index,
            length: self.length,
        })
    }

    fn writable_chunk(&mut self, incoming_bytes: usize) -> &mut StringChunk {
        let needs_new = match self.chunks.last() {
            None => true,
            Some(chunk) => {
                !chunk.values.is_empty() && chunk.bytes + incoming_bytes > self.byte_budget
            }
        };
        if needs_new {
            self.chunks.push(StringChunk::default());
        }
        let last = self.chunks.len() - 1;
        &mut self.chunks[last]
    }

    pub fn append(&mut self, value: Option<String>) {
        let incoming_bytes = value.as_ref().map_or(0, |s| s.len());
        if value.is_none() {
            self.null_count += 1;
        }
        let chunk = self.writable_chunk(incoming_bytes);
        chunk.bytes += incoming_bytes;
        chunk.values.push(value);
        self.length += 1;
    }

    /// Bulk null append; nulls cost no bytes so they never split a chunk.
    pub fn append_nulls(&mut self, count: usize) {
        let chunk = self.writable_chunk(0);
        chunk.values.extend(std::iter::repeat_with(|| None).take(count));
        self.length += count;
        self.null_count += count;
    }

    /// Grow to `new_length`, filling with nulls. Shrinking is rejected.
    pub fn resize(&mut self, new_length: usize) -> Result<(), TabularError> {
        if new_length < self.length {
            return Err(TabularError::ShrinkNotAllowed {
                current: self.length,
                requested: new_length,
            });
        }
        self.append_nulls(new_length - self.length);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<Option<&str>, TabularError> {
        let (chunk, offset) = self.locate(index)?;
        Ok(self.chunks[chunk].values[offset].as_deref())
    }

    pub fn set(&mut self, index: usize, value: Option<String>) -> Result<(), TabularError> {
        let (chunk_index, offset) = self.locate(index)?;
        let chunk = &mut self.chunks[chunk_index];
        let slot = &mut chunk.values[offset];
        match (slot.is_some(), value.is_some()) {
            (true, false) => self.null_count += 1,
            (false, true) => self.null_count -= 1,
            _ => {}
        }
        chunk.bytes -= slot.as_ref().map_or(0, |s| s.len());
        chunk.bytes += value.as_ref().map_or(0, |s| s.len());
        *slot = value;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.values.iter().map(|v| v.as_deref()))
    }

    pub fn fill_nulls(&mut self, value: &str) {
        for chunk in &mut self.chunks {
            for slot in &mut chunk.values {
                if slot.is_none() {
                    chunk.bytes += value.len();
                    *slot = Some(value.to_owned());
                }
            }
        }
        self.null_count = 0;
    }

    //==============================================================================
    // Clone paths
    //==============================================================================

    pub fn clone_indexed(
        &self,
        indices: &[usize],
        invert: bool,
    ) -> Result<StringColumn, TabularError> {
        let mut result = StringColumn::new(self.name.clone());
        for position in 0..indices.len() {
            let index = if invert {
                indices[indices.len() - 1 - position]
            } else {
                indices[position]
            };
            result.append(self.get(index)?.map(str::to_owned));
        }
        Ok(result)
    }

    /// Like `clone_indexed` but a null map entry yields a null output row.
    pub fn clone_mapped(
        &self,
        map: &[Option<usize>],
        invert: bool,
    ) -> Result<StringColumn, TabularError> {
        let mut result = StringColumn::new(self.name.clone());
        for position in 0..map.len() {
            let entry = if invert {
                map[map.len() - 1 - position]
            } else {
                map[position]
            };
            match entry {
                Some(index) => result.append(self.get(index)?.map(str::to_owned)),
                None => result.append(None),
            }
        }
        Ok(result)
    }

    /// Keep rows where the mask is `true`; null mask entries drop the row.
    pub fn filter(&self, mask: &BooleanColumn) -> Result<StringColumn, TabularError> {
        if mask.len() != self.length {
            return Err(TabularError::LengthMismatch {
                expected: self.length,
                actual: mask.len(),
            });
        }
        let mut result = StringColumn::new(self.name.clone());
        for (value, keep) in self.iter().zip(mask.iter()) {
            if keep == Some(true) {
                result.append(value.map(str::to_owned));
            }
        }
        Ok(result)
    }

    //==============================================================================
    // Sorting and comparison
    //==============================================================================

    /// Full-length ascending permutation: lexicographic order, nulls last.
    /// Each chunk sorts locally and the results k-way merge.
    pub fn ascending_indices(&self) -> Result<Vec<usize>, TabularError> {
        let mut base = 0;
        let mut chunk_data = Vec::with_capacity(self.chunks.len());
        for chunk in &self.chunks {
            chunk_data.push(ChunkSortData {
                values: chunk
                    .values
                    .iter()
                    .map(|v| v.clone().unwrap_or_default())
                    .collect(),
                validity: chunk.values.iter().map(|v| v.is_some()).collect(),
                base,
            });
            base += chunk.values.len();
        }
        chunked_ascending_indices(&chunk_data)
    }

    /// Elementwise equality against another string column; null when either
    /// side is null.
    pub fn eq(&self, other: &StringColumn) -> Result<BooleanColumn, TabularError> {
        if self.length != other.length {
            return Err(TabularError::LengthMismatch {
                expected: self.length,
                actual: other.length,
            });
        }
        let mut result = BooleanColumn::new(self.name.clone());
        for (lhs, rhs) in self.iter().zip(other.iter()) {
            result.append(match (lhs, rhs) {
                (Some(a), Some(b)) => Some(a == b),
                _ => None,
            });
        }
        Ok(result)
    }

    pub fn eq_scalar(&self, rhs: &str) -> BooleanColumn {
        let mut result = BooleanColumn::new(self.name.clone());
        for value in self.iter() {
            result.append(value.map(|v| v == rhs));
        }
        result
    }
}

impl<S: Into<String>> FromIterator<Option<S>> for StringColumn {
    fn from_iter<I: IntoIterator<Item = Option<S>>>(iter: I) -> Self {
        Self::from_values("", iter)
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn fruit_column() -> StringColumn {
        StringColumn::from_values(
            "fruit",
            [Some("pear"), None, Some("apple"), Some("fig"), None],
        )
    }

    #[test]
    fn byte_budget_splits_chunks() {
        let mut column = StringColumn::with_byte_budget("s", 8);
        column.append(Some("abcd".to_owned()));
        column.append(Some("efgh".to_owned())); // fills the first chunk exactly
        column.append(Some("i".to_owned()));
        assert_eq!(column.chunk_count(), 2);
        assert_eq!(column.get(2).unwrap(), Some("i"));
        // nulls are free and stay in the open chunk
        column.append_nulls(3);
        assert_eq!(column.chunk_count(), 2);
        assert_eq!(column.len(), 6);
        assert_eq!(column.null_count(), 3);
    }

    #[test]
    fn set_maintains_null_count_and_bytes() {
        let mut column = fruit_column();
        assert_eq!(column.null_count(), 2);
        column.set(1, Some("plum".to_owned())).unwrap();
        assert_eq!(column.null_count(), 1);
        column.set(0, None).unwrap();
        assert_eq!(column.null_count(), 2);
        assert_eq!(column.get(0).unwrap(), None);
    }

    #[test]
    fn sort_is_lexicographic_with_nulls_last() {
        let column = fruit_column();
        let order = column.ascending_indices().unwrap();
        assert_eq!(order, vec![2, 3, 0, 1, 4]);
    }

    #[test]
    fn sort_merges_across_chunks() {
        let mut column = StringColumn::with_byte_budget("s", 4);
        for value in ["dd", "aa", "cc", "bb"] {
            column.append(Some(value.to_owned()));
        }
        assert!(column.chunk_count() > 1);
        let order = column.ascending_indices().unwrap();
        assert_eq!(order, vec![1, 3, 2, 0]);
    }

    #[test]
    fn mapped_clone_inserts_nulls_and_inverts() {
        let column = fruit_column();
        let mapped = column
            .clone_mapped(&[Some(2), None, Some(0)], false)
            .unwrap();
        assert_eq!(mapped.get(0).unwrap(), Some("apple"));
        assert_eq!(mapped.get(1).unwrap(), None);

        let inverted = column
            .clone_mapped(&[Some(2), None, Some(0)], true)
            .unwrap();
        assert_eq!(inverted.get(0).unwrap(), Some("pear"));
        assert_eq!(inverted.get(2).unwrap(), Some("apple"));
    }

    #[test]
    fn equality_propagates_nulls() {
        let column = fruit_column();
        let eq = column.eq_scalar("fig");
        assert_eq!(eq.get(3).unwrap(), Some(true));
        assert_eq!(eq.get(0).unwrap(), Some(false));
        assert_eq!(eq.get(1).unwrap(), None);
    }

    #[test]
    fn fill_nulls_clears_all() {
        let mut column = fruit_column();
        column.fill_nulls("unknown");
        assert_eq!(column.null_count(), 0);
        assert_eq!(column.get(1).unwrap(), Some("unknown"));
    }
}
