//! Boolean columns: one bit per value plus a validity bitmap.

use bitvec::prelude::{BitVec, Lsb0};

use crate::error::TabularError;
use crate::kernels::sort::{chunked_ascending_indices, ChunkSortData};
use crate::null_handling::Bitmap;
use crate::types::Scalar;

#[derive(Debug, Clone, Default)]
pub struct BooleanColumn {
    name: String,
    values: BitVec<u8, Lsb0>,
    validity: Bitmap,
}

impl BooleanColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BitVec::new(),
            validity: Bitmap::new(),
        }
    }

    pub fn from_values(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<bool>>,
    ) -> Self {
        let mut column = Self::new(name);
        for value in values {
            column.append(value);
        }
        column
    }

    pub fn from_slice(name: impl Into<String>, values: &[bool]) -> Self {
        Self::from_values(name, values.iter().map(|&v| Some(v)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.validity.count_unset()
    }

    fn check_bounds(&self, index: usize) -> Result<(), TabularError> {
        if index >= self.len() {
            return Err(TabularError::IndexOutOfBounds {
                index,
                length: self.len(),
            });
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<Option<bool>, TabularError> {
        self.check_bounds(index)?;
        if self.validity.get(index) {
            Ok(Some(self.values[index]))
        } else {
            Ok(None)
        }
    }

    pub fn set(&mut self, index: usize, value: Option<bool>) -> Result<(), TabularError> {
        self.check_bounds(index)?;
        match value {
            Some(v) => {
                self.values.set(index, v);
                self.validity.set(index, true);
            }
            None => {
                self.values.set(index, false);
                self.validity.set(index, false);
            }
        }
        Ok(())
    }

    pub fn append(&mut self, value: Option<bool>) {
        self.values.push(value.unwrap_or(false));
        self.validity.push(value.is_some());
    }

    pub fn append_many(&mut self, value: Option<bool>, count: usize) {
        self.values
            .resize(self.values.len() + count, value.unwrap_or(false));
        self.validity.extend_fill(value.is_some(), count);
    }

    /// Grow to `new_length`, filling with nulls. Shrinking is rejected.
    pub fn resize(&mut self, new_length: usize) -> Result<(), TabularError> {
        if new_length < self.len() {
            return Err(TabularError::ShrinkNotAllowed {
                current: self.len(),
                requested: new_length,
            });
        }
        self.append_many(None, new_length - self.len());
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<bool>> + '_ {
        self.values
            .iter()
            .by_vals()
            .zip(self.validity.iter())
            .map(|(value, valid)| valid.then_some(value))
    }

    //==============================================================================
    // Logical operations
    //==============================================================================

    fn elementwise(
        &self,
        other: &BooleanColumn,
        op: impl Fn(bool, bool) -> bool,
    ) -> Result<BooleanColumn, TabularError> {
        if self.len() != other.len() {
            return Err(TabularError::LengthMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }
        let mut result = BooleanColumn::new(self.name.clone());
        for (lhs, rhs) in self.iter().zip(other.iter()) {
            result.append(match (lhs, rhs) {
                (Some(a), Some(b)) => Some(op(a, b)),
                _ => None,
            });
        }
        Ok(result)
    }

    pub fn and(&self, other: &BooleanColumn) -> Result<BooleanColumn, TabularError> {
        self.elementwise(other, |a, b| a & b)
    }

    pub fn or(&self, other: &BooleanColumn) -> Result<BooleanColumn, TabularError> {
        self.elementwise(other, |a, b| a | b)
    }

    pub fn xor(&self, other: &BooleanColumn) -> Result<BooleanColumn, TabularError> {
        self.elementwise(other, |a, b| a ^ b)
    }

    fn scalar_op(&self, rhs: bool, op: impl Fn(bool, bool) -> bool) -> BooleanColumn {
        let mut result = BooleanColumn::new(self.name.clone());
        for value in self.iter() {
            result.append(value.map(|v| op(v, rhs)));
        }
        result
    }

    pub fn and_scalar(&self, rhs: bool) -> BooleanColumn {
        self.scalar_op(rhs, |a, b| a & b)
    }

    pub fn or_scalar(&self, rhs: bool) -> BooleanColumn {
        self.scalar_op(rhs, |a, b| a | b)
    }

    pub fn xor_scalar(&self, rhs: bool) -> BooleanColumn {
        self.scalar_op(rhs, |a, b| a ^ b)
    }

    /// `true` when every non-null entry is `true`. Nulls are ignored.
    pub fn all(&self) -> bool {
        self.iter().flatten().all(|v| v)
    }

    /// `true` when any non-null entry is `true`. Nulls are ignored.
    pub fn any(&self) -> bool {
        self.iter().flatten().any(|v| v)
    }

    //==============================================================================
    // Clone paths and sorting
    //==============================================================================

    pub fn clone_indexed(
        &self,
        indices: &[usize],
        invert: bool,
    ) -> Result<BooleanColumn, TabularError> {
        let mut result = BooleanColumn::new(self.name.clone());
        for position in 0..indices.len() {
            let index = if invert {
                indices[indices.len() - 1 - position]
            } else {
                indices[position]
            };
            result.append(self.get(index)?);
        }
        Ok(result)
    }

    /// Like `clone_indexed` but a null map entry yields a null output row.
    pub fn clone_mapped(
        &self,
        map: &[Option<usize>],
        invert: bool,
    ) -> Result<BooleanColumn, TabularError> {
        let mut result = BooleanColumn::new(self.name.clone());
        for position in 0..map.len() {
            let entry = if invert {
                map[map.len() - 1 - position]
            } else {
                map[position]
            };
            match entry {
                Some(index) => result.append(self.get(index)?),
                None => result.append(None),
            }
        }
        Ok(result)
    }

    /// Keep rows where the mask is `true`; null mask entries drop the row.
    pub fn filter(&self, mask: &BooleanColumn) -> Result<BooleanColumn, TabularError> {
        if mask.len() != self.len() {
            return Err(TabularError::LengthMismatch {
                expected: self.len(),
                actual: mask.len(),
            });
        }
        let mut result = BooleanColumn::new(self.name.clone());
        for (value, keep) in self.iter().zip(mask.iter()) {
            if keep == Some(true) {
                result.append(value);
            }
        }
        Ok(result)
    }

    /// Full-length ascending permutation: `false` rows, `true` rows, nulls.
    pub fn ascending_indices(&self) -> Result<Vec<usize>, TabularError> {
        let chunk = ChunkSortData {
            values: self.values.iter().by_vals().collect::<Vec<bool>>(),
            validity: self.validity.iter().collect(),
            base: 0,
        };
        chunked_ascending_indices(&[chunk])
    }

    //==============================================================================
    // Dynamic cell access
    //==============================================================================

    pub fn get_scalar(&self, index: usize) -> Result<Scalar, TabularError> {
        Ok(Scalar::from(self.get(index)?))
    }

    pub fn set_scalar(&mut self, index: usize, value: &Scalar) -> Result<(), TabularError> {
        match value {
            Scalar::Null => self.set(index, None),
            Scalar::Boolean(v) => self.set(index, Some(*v)),
            other => Err(TabularError::UnsupportedOperation(format!(
                "cannot store {other} in a boolean column"
            ))),
        }
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_propagates_through_logic_ops() {
        let a = BooleanColumn::from_values("a", [Some(true), Some(false), None]);
        let b = BooleanColumn::from_values("b", [Some(true), None, Some(true)]);
        let and = a.and(&b).unwrap();
        assert_eq!(and.get(0).unwrap(), Some(true));
        assert_eq!(and.get(1).unwrap(), None);
        assert_eq!(and.get(2).unwrap(), None);
        let xor = a.xor(&b).unwrap();
        assert_eq!(xor.get(0).unwrap(), Some(false));
    }

    #[test]
    fn all_and_any_ignore_nulls() {
        let column = BooleanColumn::from_values("m", [Some(true), None, Some(true)]);
        assert!(column.all());
        assert!(column.any());

        let mixed = BooleanColumn::from_values("m", [Some(true), Some(false), None]);
        assert!(!mixed.all());
        assert!(mixed.any());

        let empty = BooleanColumn::new("m");
        assert!(empty.all());
        assert!(!empty.any());
    }

    #[test]
    fn sort_orders_false_true_null() {
        let column =
            BooleanColumn::from_values("m", [Some(true), None, Some(false), Some(true)]);
        let order = column.ascending_indices().unwrap();
        assert_eq!(order, vec![2, 0, 3, 1]);
    }

    #[test]
    fn filter_drops_null_mask_rows() {
        let column = BooleanColumn::from_values("m", [Some(true), Some(false), Some(true)]);
        let mask = BooleanColumn::from_values("k", [Some(true), None, Some(true)]);
        let kept = column.filter(&mask).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept.get(1).unwrap(), Some(true));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let a = BooleanColumn::from_slice("a", &[true, false]);
        let b = BooleanColumn::from_slice("b", &[true]);
        assert!(matches!(
            a.or(&b),
            Err(TabularError::LengthMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn scalar_cell_access_rejects_wrong_type() {
        let mut column = BooleanColumn::from_slice("m", &[true]);
        assert!(column.set_scalar(0, &Scalar::Int32(1)).is_err());
        column.set_scalar(0, &Scalar::Null).unwrap();
        assert_eq!(column.get_scalar(0).unwrap(), Scalar::Null);
    }
}
