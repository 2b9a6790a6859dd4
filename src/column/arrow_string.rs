//! Immutable string columns over the Arrow variable-length UTF-8 layout:
//! a contiguous byte buffer plus an `i32` offsets buffer of length rows + 1.
//!
//! These columns wrap foreign buffers without copying, so every mutating
//! entry point is an `UnsupportedOperation` error. Clone paths materialize
//! into an owned [`StringColumn`].

use arrow::array::{Array, StringArray};
use arrow::buffer::{Buffer, NullBuffer, ScalarBuffer};

use crate::column::{BooleanColumn, StringColumn};
use crate::error::TabularError;
use crate::kernels::sort::{chunked_ascending_indices, ChunkSortData};
use crate::null_handling::Bitmap;
use crate::types::Scalar;

#[derive(Debug, Clone)]
pub struct ArrowStringColumn {
    name: String,
    values: Buffer,
    offsets: ScalarBuffer<i32>,
    validity: Bitmap,
}

impl ArrowStringColumn {
    /// Wrap raw Arrow buffers. Offsets must be non-negative, non-decreasing,
    /// have exactly `length + 1` entries, and end within the value buffer;
    /// every value slice must be valid UTF-8.
    pub fn from_raw_parts(
        name: impl Into<String>,
        values: Buffer,
        offsets: ScalarBuffer<i32>,
        nulls: Option<NullBuffer>,
        length: usize,
    ) -> Result<Self, TabularError> {
        if offsets.len() != length + 1 {
            return Err(TabularError::InvalidBuffer(format!(
                "offsets buffer holds {} entries but {} rows require {}",
                offsets.len(),
                length,
                length + 1
            )));
        }
        if offsets.first().is_some_and(|&first| first < 0) {
            return Err(TabularError::InvalidBuffer(
                "offsets must be non-negative".into(),
            ));
        }
        if offsets.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(TabularError::InvalidBuffer(
                "offsets must be non-decreasing".into(),
            ));
        }
        if offsets.last().is_some_and(|&last| last as usize > values.len()) {
            return Err(TabularError::InvalidBuffer(format!(
                "final offset {} exceeds value buffer length {}",
                offsets.last().copied().unwrap_or_default(),
                values.len()
            )));
        }
        for pair in offsets.windows(2) {
            let slice = &values.as_slice()[pair[0] as usize..pair[1] as usize];
            if std::str::from_utf8(slice).is_err() {
                return Err(TabularError::InvalidBuffer(
                    "value buffer contains non-UTF-8 data".into(),
                ));
            }
        }
        let validity = match nulls {
            Some(nulls) => {
                if nulls.len() != length {
                    return Err(TabularError::InvalidBuffer(format!(
                        "null bitmap covers {} rows but declared length is {}",
                        nulls.len(),
                        length
                    )));
                }
                Bitmap::from_null_buffer(nulls)
            }
            None => Bitmap::with_len(length, true),
        };
        Ok(Self {
            name: name.into(),
            values,
            offsets,
            validity,
        })
    }

    /// Borrow the buffers of an Arrow `StringArray` without copying.
    pub fn from_arrow(name: impl Into<String>, array: &StringArray) -> Result<Self, TabularError> {
        let length = array.len();
        Self::from_raw_parts(
            name,
            array.values().clone(),
            array.offsets().inner().clone(),
            array.nulls().cloned(),
            length,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        self.validity.count_unset()
    }

    pub(crate) fn value_buffer(&self) -> &Buffer {
        &self.values
    }

    pub(crate) fn offset_buffer(&self) -> &ScalarBuffer<i32> {
        &self.offsets
    }

    pub(crate) fn validity(&self) -> &Bitmap {
        &self.validity
    }

    fn value_unchecked(&self, index: usize) -> Result<&str, TabularError> {
        let start = self.offsets[index] as usize;
        let end = self.offsets[index + 1] as usize;
        std::str::from_utf8(&self.values.as_slice()[start..end])
            .map_err(|e| TabularError::Internal(format!("corrupt UTF-8 value buffer: {e}")))
    }

    pub fn get(&self, index: usize) -> Result<Option<&str>, TabularError> {
        if index >= self.len() {
            return Err(TabularError::IndexOutOfBounds {
                index,
                length: self.len(),
            });
        }
        if !self.validity.get(index) {
            return Ok(None);
        }
        self.value_unchecked(index).map(Some)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        (0..self.len()).map(move |index| {
            // offsets were validated at construction
            self.get(index).ok().flatten()
        })
    }

    /// Any mutation of the shared buffers is refused.
    pub fn set(&mut self, _index: usize, _value: Option<String>) -> Result<(), TabularError> {
        Err(TabularError::UnsupportedOperation(
            "arrow-backed string columns are immutable".into(),
        ))
    }

    pub fn append(&mut self, _value: Option<String>) -> Result<(), TabularError> {
        Err(TabularError::UnsupportedOperation(
            "arrow-backed string columns are immutable".into(),
        ))
    }

    pub fn resize(&mut self, _new_length: usize) -> Result<(), TabularError> {
        Err(TabularError::UnsupportedOperation(
            "arrow-backed string columns are immutable".into(),
        ))
    }

    /// Copy out into an owned, mutable string column.
    pub fn materialize(&self) -> Result<StringColumn, TabularError> {
        let mut owned = StringColumn::new(self.name.clone());
        for index in 0..self.len() {
            owned.append(self.get(index)?.map(str::to_owned));
        }
        Ok(owned)
    }

    pub fn clone_indexed(
        &self,
        indices: &[usize],
        invert: bool,
    ) -> Result<StringColumn, TabularError> {
        self.materialize()?.clone_indexed(indices, invert)
    }

    pub fn clone_mapped(
        &self,
        map: &[Option<usize>],
        invert: bool,
    ) -> Result<StringColumn, TabularError> {
        self.materialize()?.clone_mapped(map, invert)
    }

    pub fn filter(&self, mask: &BooleanColumn) -> Result<StringColumn, TabularError> {
        self.materialize()?.filter(mask)
    }

    /// Full-length ascending permutation: lexicographic, nulls last.
    pub fn ascending_indices(&self) -> Result<Vec<usize>, TabularError> {
        let mut values = Vec::with_capacity(self.len());
        let mut validity = Vec::with_capacity(self.len());
        for index in 0..self.len() {
            let valid = self.validity.get(index);
            values.push(if valid {
                self.value_unchecked(index)?.to_owned()
            } else {
                String::new()
            });
            validity.push(valid);
        }
        chunked_ascending_indices(&[ChunkSortData {
            values,
            validity,
            base: 0,
        }])
    }

    pub fn get_scalar(&self, index: usize) -> Result<Scalar, TabularError> {
        Ok(match self.get(index)? {
            Some(value) => Scalar::Utf8(value.to_owned()),
            None => Scalar::Null,
        })
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ArrowStringColumn {
        let array = StringArray::from(vec![Some("kiwi"), None, Some("apple")]);
        ArrowStringColumn::from_arrow("fruit", &array).unwrap()
    }

    #[test]
    fn wraps_arrow_array_without_copy() {
        let column = sample();
        assert_eq!(column.len(), 3);
        assert_eq!(column.null_count(), 1);
        assert_eq!(column.get(0).unwrap(), Some("kiwi"));
        assert_eq!(column.get(1).unwrap(), None);
    }

    #[test]
    fn geometry_violations_are_rejected() {
        let values = Buffer::from(b"abcdef".as_slice());

        // wrong offset count for the declared row count
        let offsets = ScalarBuffer::<i32>::from(vec![0, 3, 6]);
        assert!(matches!(
            ArrowStringColumn::from_raw_parts("s", values.clone(), offsets, None, 3),
            Err(TabularError::InvalidBuffer(_))
        ));

        // decreasing offsets
        let offsets = ScalarBuffer::<i32>::from(vec![0, 4, 2]);
        assert!(matches!(
            ArrowStringColumn::from_raw_parts("s", values.clone(), offsets, None, 2),
            Err(TabularError::InvalidBuffer(_))
        ));

        // final offset past the byte buffer
        let offsets = ScalarBuffer::<i32>::from(vec![0, 3, 9]);
        assert!(matches!(
            ArrowStringColumn::from_raw_parts("s", values, offsets, None, 2),
            Err(TabularError::InvalidBuffer(_))
        ));
    }

    #[test]
    fn mutation_is_refused() {
        let mut column = sample();
        assert!(matches!(
            column.set(0, Some("x".to_owned())),
            Err(TabularError::UnsupportedOperation(_))
        ));
        assert!(column.append(None).is_err());
        assert!(column.resize(10).is_err());
    }

    #[test]
    fn clone_paths_materialize_owned_columns() {
        let column = sample();
        let cloned = column.clone_indexed(&[2, 0], false).unwrap();
        assert_eq!(cloned.get(0).unwrap(), Some("apple"));
        let mut cloned = cloned;
        cloned.set(0, Some("pear".to_owned())).unwrap(); // owned copy is mutable
        assert_eq!(cloned.get(0).unwrap(), Some("pear"));
        assert_eq!(column.get(2).unwrap(), Some("apple"));
    }

    #[test]
    fn sorts_with_nulls_last() {
        let column = sample();
        assert_eq!(column.ascending_indices().unwrap(), vec![2, 0, 1]);
    }
}
