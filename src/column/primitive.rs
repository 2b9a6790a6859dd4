//! Numeric columns: a named chunked container plus the typed operation
//! surface. All numeric compute flows through the generic kernels; nothing
//! here is specialized per element type.

use arrow::buffer::{NullBuffer, ScalarBuffer};

use crate::column::BooleanColumn;
use crate::error::TabularError;
use crate::kernels::{aggregate, sort};
use crate::storage::PrimitiveContainer;
use crate::traits::NativeType;
use crate::types::Scalar;

#[derive(Debug, Clone, Default)]
pub struct PrimitiveColumn<T: NativeType> {
    name: String,
    container: PrimitiveContainer<T>,
}

impl<T: NativeType> PrimitiveColumn<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            container: PrimitiveContainer::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_chunk_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            container: PrimitiveContainer::with_chunk_capacity(capacity),
        }
    }

    pub fn from_values(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<T>>,
    ) -> Self {
        Self {
            name: name.into(),
            container: values.into_iter().collect(),
        }
    }

    pub fn from_slice(name: impl Into<String>, values: &[T]) -> Self {
        Self::from_values(name, values.iter().copied().map(Some))
    }

    /// A column of `length` nulls.
    pub fn with_len(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            container: PrimitiveContainer::with_len(length, false),
        }
    }

    pub fn from_arrow_parts(
        name: impl Into<String>,
        values: ScalarBuffer<T>,
        nulls: Option<NullBuffer>,
        length: usize,
    ) -> Result<Self, TabularError> {
        Ok(Self {
            name: name.into(),
            container: PrimitiveContainer::from_arrow_parts(values, nulls, length)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn len(&self) -> usize {
        self.container.len()
    }

    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.container.null_count()
    }

    pub fn get(&self, index: usize) -> Result<Option<T>, TabularError> {
        self.container.get(index)
    }

    pub fn set(&mut self, index: usize, value: Option<T>) -> Result<(), TabularError> {
        self.container.set(index, value)
    }

    pub fn append(&mut self, value: Option<T>) {
        self.container.append(value);
    }

    pub fn append_many(&mut self, value: Option<T>, count: usize) {
        self.container.append_many(value, count);
    }

    pub fn resize(&mut self, new_length: usize) -> Result<(), TabularError> {
        self.container.resize(new_length)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<T>> + '_ {
        self.container.iter()
    }

    //==============================================================================
    // Aggregations
    //==============================================================================

    pub fn sum(&self) -> Option<T> {
        aggregate::sum(&self.container)
    }

    pub fn product(&self) -> Option<T> {
        aggregate::product(&self.container)
    }

    pub fn min(&self) -> Option<T> {
        aggregate::min(&self.container)
    }

    pub fn max(&self) -> Option<T> {
        aggregate::max(&self.container)
    }

    pub fn sum_at(
        &self,
        rows: impl IntoIterator<Item = usize>,
    ) -> Result<Option<T>, TabularError> {
        aggregate::sum_at(&self.container, rows)
    }

    pub fn product_at(
        &self,
        rows: impl IntoIterator<Item = usize>,
    ) -> Result<Option<T>, TabularError> {
        aggregate::product_at(&self.container, rows)
    }

    pub fn min_at(
        &self,
        rows: impl IntoIterator<Item = usize>,
    ) -> Result<Option<T>, TabularError> {
        aggregate::min_at(&self.container, rows)
    }

    pub fn max_at(
        &self,
        rows: impl IntoIterator<Item = usize>,
    ) -> Result<Option<T>, TabularError> {
        aggregate::max_at(&self.container, rows)
    }

    /// Mean of the non-null values, in `f64`.
    pub fn mean(&self) -> Option<f64> {
        let valid = self.len() - self.null_count();
        if valid == 0 {
            return None;
        }
        let total: f64 = self.iter().flatten().map(T::to_f64_lossy).sum();
        Some(total / valid as f64)
    }

    pub fn abs(&mut self) -> Result<(), TabularError> {
        aggregate::abs(&mut self.container)
    }

    pub fn round(&mut self) -> Result<(), TabularError> {
        aggregate::round(&mut self.container)
    }

    pub fn cumulative_sum(&mut self) -> Result<(), TabularError> {
        aggregate::cumulative_sum(&mut self.container)
    }

    pub fn cumulative_product(&mut self) -> Result<(), TabularError> {
        aggregate::cumulative_product(&mut self.container)
    }

    pub fn cumulative_min(&mut self) -> Result<(), TabularError> {
        aggregate::cumulative_min(&mut self.container)
    }

    pub fn cumulative_max(&mut self) -> Result<(), TabularError> {
        aggregate::cumulative_max(&mut self.container)
    }

    pub fn cumulative_sum_at(
        &mut self,
        rows: impl IntoIterator<Item = usize>,
    ) -> Result<(), TabularError> {
        aggregate::cumulative_sum_at(&mut self.container, rows)
    }

    pub fn cumulative_product_at(
        &mut self,
        rows: impl IntoIterator<Item = usize>,
    ) -> Result<(), TabularError> {
        aggregate::cumulative_product_at(&mut self.container, rows)
    }

    pub fn cumulative_min_at(
        &mut self,
        rows: impl IntoIterator<Item = usize>,
    ) -> Result<(), TabularError> {
        aggregate::cumulative_min_at(&mut self.container, rows)
    }

    pub fn cumulative_max_at(
        &mut self,
        rows: impl IntoIterator<Item = usize>,
    ) -> Result<(), TabularError> {
        aggregate::cumulative_max_at(&mut self.container, rows)
    }

    /// Replace values below `lower` with `lower` and above `upper` with
    /// `upper`. Nulls are untouched.
    pub fn clip(&mut self, lower: Option<T>, upper: Option<T>) -> Result<(), TabularError> {
        for index in 0..self.len() {
            if let Some(value) = self.container.get(index)? {
                let mut clipped = value;
                if let Some(lo) = lower {
                    if clipped.total_cmp(&lo).is_lt() {
                        clipped = lo;
                    }
                }
                if let Some(hi) = upper {
                    if clipped.total_cmp(&hi).is_gt() {
                        clipped = hi;
                    }
                }
                if clipped != value {
                    self.container.set(index, Some(clipped))?;
                }
            }
        }
        Ok(())
    }

    pub fn fill_nulls(&mut self, value: T) -> Result<(), TabularError> {
        for index in 0..self.len() {
            if !self.container.is_valid(index)? {
                self.container.set(index, Some(value))?;
            }
        }
        Ok(())
    }

    //==============================================================================
    // Elementwise arithmetic
    //==============================================================================

    fn zip_map(
        &self,
        other: &Self,
        op: impl Fn(usize, T, T) -> Result<T, TabularError>,
    ) -> Result<Self, TabularError> {
        if self.len() != other.len() {
            return Err(TabularError::LengthMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }
        let mut result = Self::new(self.name.clone());
        for (row, (lhs, rhs)) in self.iter().zip(other.iter()).enumerate() {
            match (lhs, rhs) {
                (Some(a), Some(b)) => result.append(Some(op(row, a, b)?)),
                _ => result.append(None),
            }
        }
        Ok(result)
    }

    fn map_scalar(
        &self,
        rhs: T,
        op: impl Fn(usize, T, T) -> Result<T, TabularError>,
    ) -> Result<Self, TabularError> {
        let mut result = Self::new(self.name.clone());
        for (row, value) in self.iter().enumerate() {
            match value {
                Some(a) => result.append(Some(op(row, a, rhs)?)),
                None => result.append(None),
            }
        }
        Ok(result)
    }

    pub fn add(&self, other: &Self) -> Result<Self, TabularError> {
        self.zip_map(other, |_, a, b| Ok(a.add_wrapped(b)))
    }

    pub fn sub(&self, other: &Self) -> Result<Self, TabularError> {
        self.zip_map(other, |_, a, b| Ok(a.sub_wrapped(b)))
    }

    pub fn mul(&self, other: &Self) -> Result<Self, TabularError> {
        self.zip_map(other, |_, a, b| Ok(a.mul_wrapped(b)))
    }

    pub fn div(&self, other: &Self) -> Result<Self, TabularError> {
        self.zip_map(other, |row, a, b| {
            a.div_checked(b).ok_or(TabularError::DivideByZero(row))
        })
    }

    pub fn rem(&self, other: &Self) -> Result<Self, TabularError> {
        self.zip_map(other, |row, a, b| {
            a.rem_checked(b).ok_or(TabularError::DivideByZero(row))
        })
    }

    pub fn add_scalar(&self, rhs: T) -> Result<Self, TabularError> {
        self.map_scalar(rhs, |_, a, b| Ok(a.add_wrapped(b)))
    }

    pub fn sub_scalar(&self, rhs: T) -> Result<Self, TabularError> {
        self.map_scalar(rhs, |_, a, b| Ok(a.sub_wrapped(b)))
    }

    pub fn mul_scalar(&self, rhs: T) -> Result<Self, TabularError> {
        self.map_scalar(rhs, |_, a, b| Ok(a.mul_wrapped(b)))
    }

    pub fn div_scalar(&self, rhs: T) -> Result<Self, TabularError> {
        self.map_scalar(rhs, |row, a, b| {
            a.div_checked(b).ok_or(TabularError::DivideByZero(row))
        })
    }

    pub fn rem_scalar(&self, rhs: T) -> Result<Self, TabularError> {
        self.map_scalar(rhs, |row, a, b| {
            a.rem_checked(b).ok_or(TabularError::DivideByZero(row))
        })
    }

    fn require_shift(&self) -> Result<(), TabularError> {
        if !T::SUPPORTS_SHIFT {
            return Err(TabularError::UnsupportedOperation(format!(
                "bit shifts are not defined for {}",
                T::DATA_TYPE
            )));
        }
        Ok(())
    }

    pub fn shl(&self, by: u32) -> Result<Self, TabularError> {
        self.require_shift()?;
        let mut result = Self::new(self.name.clone());
        for value in self.iter() {
            result.append(value.map(|v| v.shl_wrapped(by)));
        }
        Ok(result)
    }

    pub fn shr(&self, by: u32) -> Result<Self, TabularError> {
        self.require_shift()?;
        let mut result = Self::new(self.name.clone());
        for value in self.iter() {
            result.append(value.map(|v| v.shr_wrapped(by)));
        }
        Ok(result)
    }

    /// Widen to an `f64` column (used for mixed-type arithmetic).
    pub fn to_f64_column(&self) -> PrimitiveColumn<f64> {
        PrimitiveColumn::from_values(
            self.name.clone(),
            self.iter().map(|v| v.map(T::to_f64_lossy)),
        )
    }

    //==============================================================================
    // Comparisons
    //==============================================================================

    fn compare(
        &self,
        other: &Self,
        op: impl Fn(T, T) -> bool,
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

    fn compare_scalar(&self, rhs: T, op: impl Fn(T, T) -> bool) -> BooleanColumn {
        let mut result = BooleanColumn::new(self.name.clone());
        for value in self.iter() {
            result.append(value.map(|v| op(v, rhs)));
        }
        result
    }

    pub fn eq(&self, other: &Self) -> Result<BooleanColumn, TabularError> {
        self.compare(other, |a, b| a == b)
    }

    pub fn ne(&self, other: &Self) -> Result<BooleanColumn, TabularError> {
        self.compare(other, |a, b| a != b)
    }

    pub fn lt(&self, other: &Self) -> Result<BooleanColumn, TabularError> {
        self.compare(other, |a, b| a < b)
    }

    pub fn le(&self, other: &Self) -> Result<BooleanColumn, TabularError> {
        self.compare(other, |a, b| a <= b)
    }

    pub fn gt(&self, other: &Self) -> Result<BooleanColumn, TabularError> {
        self.compare(other, |a, b| a > b)
    }

    pub fn ge(&self, other: &Self) -> Result<BooleanColumn, TabularError> {
        self.compare(other, |a, b| a >= b)
    }

    pub fn eq_scalar(&self, rhs: T) -> BooleanColumn {
        self.compare_scalar(rhs, |a, b| a == b)
    }

    pub fn lt_scalar(&self, rhs: T) -> BooleanColumn {
        self.compare_scalar(rhs, |a, b| a < b)
    }

    pub fn gt_scalar(&self, rhs: T) -> BooleanColumn {
        self.compare_scalar(rhs, |a, b| a > b)
    }

    //==============================================================================
    // Clone paths and sorting
    //==============================================================================

    pub fn clone_indexed(&self, indices: &[usize], invert: bool) -> Result<Self, TabularError> {
        let mut result = Self::new(self.name.clone());
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
    ) -> Result<Self, TabularError> {
        let mut result = Self::new(self.name.clone());
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
    pub fn filter(&self, mask: &BooleanColumn) -> Result<Self, TabularError> {
        if mask.len() != self.len() {
            return Err(TabularError::LengthMismatch {
                expected: self.len(),
                actual: mask.len(),
            });
        }
        let mut result = Self::new(self.name.clone());
        for (value, keep) in self.iter().zip(mask.iter()) {
            if keep == Some(true) {
                result.append(value);
            }
        }
        Ok(result)
    }

    /// Full-length ascending permutation: non-null values in order, nulls
    /// last. Each chunk sorts locally, then the chunks k-way merge.
    pub fn ascending_indices(&self) -> Result<Vec<usize>, TabularError> {
        let mut base = 0;
        let mut chunks = Vec::with_capacity(self.container.chunk_count());
        for (values, validity) in self.container.chunk_views() {
            chunks.push(sort::ChunkSortData {
                values: values.to_vec(),
                validity: validity.iter().collect(),
                base,
            });
            base += values.len();
        }
        sort::chunked_ascending_indices(&chunks)
    }

    //==============================================================================
    // Dynamic cell access
    //==============================================================================

    pub fn get_scalar(&self, index: usize) -> Result<Scalar, TabularError> {
        Ok(match self.get(index)? {
            Some(value) => value.to_scalar(),
            None => Scalar::Null,
        })
    }

    pub fn set_scalar(&mut self, index: usize, value: &Scalar) -> Result<(), TabularError> {
        if value.is_null() {
            return self.set(index, None);
        }
        match T::from_scalar(value) {
            Some(v) => self.set(index, Some(v)),
            None => Err(TabularError::UnsupportedOperation(format!(
                "cannot store {value} in a {} column",
                T::DATA_TYPE
            ))),
        }
    }
}

impl<T: NativeType> FromIterator<Option<T>> for PrimitiveColumn<T> {
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Self {
        Self::from_values("", iter)
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_propagates_nulls_and_wraps() {
        let a = PrimitiveColumn::<u8>::from_values("a", [Some(200), Some(1), None]);
        let b = PrimitiveColumn::<u8>::from_values("b", [Some(100), None, Some(3)]);
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.get(0).unwrap(), Some(44)); // 300 mod 256
        assert_eq!(sum.get(1).unwrap(), None);
        assert_eq!(sum.get(2).unwrap(), None);
    }

    #[test]
    fn integer_division_by_zero_is_an_eager_error() {
        let a = PrimitiveColumn::<i32>::from_slice("a", &[6, 7]);
        let b = PrimitiveColumn::<i32>::from_values("b", [Some(2), Some(0)]);
        assert!(matches!(a.div(&b), Err(TabularError::DivideByZero(1))));
        assert_eq!(a.div_scalar(2).unwrap().get(1).unwrap(), Some(3));
    }

    #[test]
    fn float_division_by_zero_is_infinite_not_an_error() {
        let a = PrimitiveColumn::<f64>::from_slice("a", &[1.0]);
        let quotient = a.div_scalar(0.0).unwrap();
        assert_eq!(quotient.get(0).unwrap(), Some(f64::INFINITY));
    }

    #[test]
    fn shifts_reject_float_columns() {
        let ints = PrimitiveColumn::<i16>::from_slice("i", &[1, -2]);
        assert_eq!(ints.shl(2).unwrap().get(0).unwrap(), Some(4));
        let floats = PrimitiveColumn::<f32>::from_slice("f", &[1.0]);
        assert!(matches!(
            floats.shl(1),
            Err(TabularError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn comparisons_yield_null_when_either_side_is_null() {
        let a = PrimitiveColumn::<i64>::from_values("a", [Some(5), None, Some(1)]);
        let b = PrimitiveColumn::<i64>::from_values("b", [Some(3), Some(3), None]);
        let gt = a.gt(&b).unwrap();
        assert_eq!(gt.get(0).unwrap(), Some(true));
        assert_eq!(gt.get(1).unwrap(), None);
        assert_eq!(gt.get(2).unwrap(), None);
    }

    #[test]
    fn clip_bounds_values_and_skips_nulls() {
        let mut column =
            PrimitiveColumn::<i32>::from_values("c", [Some(-5), Some(3), None, Some(50)]);
        column.clip(Some(0), Some(10)).unwrap();
        assert_eq!(column.get(0).unwrap(), Some(0));
        assert_eq!(column.get(1).unwrap(), Some(3));
        assert_eq!(column.get(2).unwrap(), None);
        assert_eq!(column.get(3).unwrap(), Some(10));
    }

    #[test]
    fn sort_merges_chunks_with_nulls_last() {
        let mut column = PrimitiveColumn::<i32>::with_chunk_capacity("s", 3);
        for value in [Some(9), None, Some(2), Some(7), Some(1), None, Some(4)] {
            column.append(value);
        }
        let order = column.ascending_indices().unwrap();
        assert_eq!(order, vec![4, 2, 6, 3, 0, 1, 5]);
    }

    #[test]
    fn descending_view_via_inverted_clone_puts_nulls_first() {
        let column = PrimitiveColumn::<i32>::from_values("s", [Some(3), None, Some(1)]);
        let order = column.ascending_indices().unwrap();
        let descending = column.clone_indexed(&order, true).unwrap();
        assert_eq!(descending.get(0).unwrap(), None);
        assert_eq!(descending.get(1).unwrap(), Some(3));
        assert_eq!(descending.get(2).unwrap(), Some(1));
    }

    #[test]
    fn mean_ignores_nulls() {
        let column = PrimitiveColumn::<i32>::from_values("m", [Some(2), None, Some(4)]);
        assert_eq!(column.mean(), Some(3.0));
        let empty = PrimitiveColumn::<i32>::new("m");
        assert_eq!(empty.mean(), None);
    }

    #[test]
    fn widening_preserves_nulls() {
        let column = PrimitiveColumn::<u16>::from_values("w", [Some(7), None]);
        let wide = column.to_f64_column();
        assert_eq!(wide.get(0).unwrap(), Some(7.0));
        assert_eq!(wide.get(1).unwrap(), None);
    }
}
