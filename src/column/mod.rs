//! The unified column type.
//!
//! A `Column` resolves its element type exactly once, at creation, into an
//! enum variant. Every operation dispatches through a closed macro over the
//! variants; nothing re-inspects the type per element.

pub mod arith;
mod arrow_string;
mod boolean;
mod primitive;
mod string;

pub use arrow_string::ArrowStringColumn;
pub use boolean::BooleanColumn;
pub use primitive::PrimitiveColumn;
pub use string::StringColumn;

use crate::error::TabularError;
use crate::traits::NativeType;
use crate::types::{DataType, Scalar};

#[derive(Debug, Clone)]
pub enum Column {
    Int8(PrimitiveColumn<i8>),
    Int16(PrimitiveColumn<i16>),
    Int32(PrimitiveColumn<i32>),
    Int64(PrimitiveColumn<i64>),
    UInt8(PrimitiveColumn<u8>),
    UInt16(PrimitiveColumn<u16>),
    UInt32(PrimitiveColumn<u32>),
    UInt64(PrimitiveColumn<u64>),
    Float32(PrimitiveColumn<f32>),
    Float64(PrimitiveColumn<f64>),
    Boolean(BooleanColumn),
    Utf8(StringColumn),
    ArrowUtf8(ArrowStringColumn),
}

/// Dispatch over the numeric variants only; `$otherwise` handles the rest.
macro_rules! numeric_dispatch {
    ($self:expr, $col:ident => $body:expr, $otherwise:expr) => {
        match $self {
            Column::Int8($col) => $body,
            Column::Int16($col) => $body,
            Column::Int32($col) => $body,
            Column::Int64($col) => $body,
            Column::UInt8($col) => $body,
            Column::UInt16($col) => $body,
            Column::UInt32($col) => $body,
            Column::UInt64($col) => $body,
            Column::Float32($col) => $body,
            Column::Float64($col) => $body,
            _ => $otherwise,
        }
    };
}

/// Like `numeric_dispatch` but rewraps the result in the same variant.
macro_rules! numeric_rebuild {
    ($self:expr, $col:ident => $body:expr, $otherwise:expr) => {
        match $self {
            Column::Int8($col) => Column::Int8($body),
            Column::Int16($col) => Column::Int16($body),
            Column::Int32($col) => Column::Int32($body),
            Column::Int64($col) => Column::Int64($body),
            Column::UInt8($col) => Column::UInt8($body),
            Column::UInt16($col) => Column::UInt16($body),
            Column::UInt32($col) => Column::UInt32($body),
            Column::UInt64($col) => Column::UInt64($body),
            Column::Float32($col) => Column::Float32($body),
            Column::Float64($col) => Column::Float64($body),
            _ => $otherwise,
        }
    };
}

/// Dispatch over every variant.
macro_rules! all_dispatch {
    ($self:expr, $col:ident => $body:expr) => {
        numeric_dispatch!($self, $col => $body, match $self {
            Column::Boolean($col) => $body,
            Column::Utf8($col) => $body,
            Column::ArrowUtf8($col) => $body,
            _ => unreachable!(),
        })
    };
}

pub(crate) use {numeric_dispatch, numeric_rebuild};

fn scalar_opt<T: NativeType>(value: Option<T>) -> Scalar {
    match value {
        Some(v) => v.to_scalar(),
        None => Scalar::Null,
    }
}

fn non_numeric(what: &str, data_type: DataType) -> TabularError {
    TabularError::UnsupportedOperation(format!("{what} is not defined for {data_type} columns"))
}

impl Column {
    pub fn name(&self) -> &str {
        all_dispatch!(self, c => c.name())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        all_dispatch!(self, c => c.set_name(name))
    }

    pub fn data_type(&self) -> DataType {
        numeric_dispatch!(self, c => {
            fn tag<T: NativeType>(_: &PrimitiveColumn<T>) -> DataType {
                T::DATA_TYPE
            }
            tag(c)
        }, match self {
            Column::Boolean(_) => DataType::Boolean,
            Column::Utf8(_) | Column::ArrowUtf8(_) => DataType::Utf8,
            _ => unreachable!(),
        })
    }

    pub fn len(&self) -> usize {
        all_dispatch!(self, c => c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        all_dispatch!(self, c => c.null_count())
    }

    pub fn is_numeric(&self) -> bool {
        self.data_type().is_numeric()
    }

    /// An empty, mutable column of the same name and type. Arrow-backed
    /// string columns yield an owned string column.
    pub fn empty_like(&self) -> Column {
        numeric_rebuild!(self, c => PrimitiveColumn::new(c.name()), match self {
            Column::Boolean(c) => Column::Boolean(BooleanColumn::new(c.name())),
            Column::Utf8(c) => Column::Utf8(StringColumn::new(c.name())),
            Column::ArrowUtf8(c) => Column::Utf8(StringColumn::new(c.name())),
            _ => unreachable!(),
        })
    }

    //==============================================================================
    // Cell access
    //==============================================================================

    pub fn get(&self, index: usize) -> Result<Scalar, TabularError> {
        numeric_dispatch!(self, c => c.get_scalar(index), match self {
            Column::Boolean(c) => c.get_scalar(index),
            Column::Utf8(c) => Ok(match c.get(index)? {
                Some(v) => Scalar::Utf8(v.to_owned()),
                None => Scalar::Null,
            }),
            Column::ArrowUtf8(c) => c.get_scalar(index),
            _ => unreachable!(),
        })
    }

    pub fn set(&mut self, index: usize, value: &Scalar) -> Result<(), TabularError> {
        numeric_dispatch!(self, c => c.set_scalar(index, value), match self {
            Column::Boolean(c) => c.set_scalar(index, value),
            Column::Utf8(c) => match value {
                Scalar::Null => c.set(index, None),
                Scalar::Utf8(v) => c.set(index, Some(v.clone())),
                other => Err(TabularError::UnsupportedOperation(format!(
                    "cannot store {other} in a string column"
                ))),
            },
            Column::ArrowUtf8(c) => c.set(index, None).map(|_| ()),
            _ => unreachable!(),
        })
    }

    pub fn append_scalar(&mut self, value: &Scalar) -> Result<(), TabularError> {
        let data_type = self.data_type();
        numeric_dispatch!(self, c => {
            if value.is_null() {
                c.append(None);
                return Ok(());
            }
            fn convert<T: NativeType>(value: &Scalar) -> Option<T> {
                T::from_scalar(value)
            }
            match convert(value) {
                Some(v) => {
                    c.append(Some(v));
                    Ok(())
                }
                None => Err(TabularError::UnsupportedOperation(format!(
                    "cannot append {value} to a {data_type} column"
                ))),
            }
        }, match self {
            Column::Boolean(c) => match value {
                Scalar::Null => {
                    c.append(None);
                    Ok(())
                }
                Scalar::Boolean(v) => {
                    c.append(Some(*v));
                    Ok(())
                }
                other => Err(TabularError::UnsupportedOperation(format!(
                    "cannot append {other} to a boolean column"
                ))),
            },
            Column::Utf8(c) => match value {
                Scalar::Null => {
                    c.append(None);
                    Ok(())
                }
                Scalar::Utf8(v) => {
                    c.append(Some(v.clone()));
                    Ok(())
                }
                other => Err(TabularError::UnsupportedOperation(format!(
                    "cannot append {other} to a string column"
                ))),
            },
            Column::ArrowUtf8(c) => c.append(None).map(|_| ()),
            _ => unreachable!(),
        })
    }

    pub fn append_nulls(&mut self, count: usize) -> Result<(), TabularError> {
        numeric_dispatch!(self, c => {
            c.append_many(None, count);
            Ok(())
        }, match self {
            Column::Boolean(c) => {
                c.append_many(None, count);
                Ok(())
            }
            Column::Utf8(c) => {
                c.append_nulls(count);
                Ok(())
            }
            Column::ArrowUtf8(c) => c.resize(c.len() + count).map(|_| ()),
            _ => unreachable!(),
        })
    }

    /// Grow to `new_length` with nulls; shrinking is rejected.
    pub fn resize(&mut self, new_length: usize) -> Result<(), TabularError> {
        all_dispatch!(self, c => c.resize(new_length))
    }

    //==============================================================================
    // Clone paths
    //==============================================================================

    pub fn clone_indexed(&self, indices: &[usize], invert: bool) -> Result<Column, TabularError> {
        Ok(numeric_rebuild!(self, c => c.clone_indexed(indices, invert)?, match self {
            Column::Boolean(c) => Column::Boolean(c.clone_indexed(indices, invert)?),
            Column::Utf8(c) => Column::Utf8(c.clone_indexed(indices, invert)?),
            Column::ArrowUtf8(c) => Column::Utf8(c.clone_indexed(indices, invert)?),
            _ => unreachable!(),
        }))
    }

    /// Null map entries produce null output rows; all clone paths agree.
    pub fn clone_mapped(
        &self,
        map: &[Option<usize>],
        invert: bool,
    ) -> Result<Column, TabularError> {
        Ok(numeric_rebuild!(self, c => c.clone_mapped(map, invert)?, match self {
            Column::Boolean(c) => Column::Boolean(c.clone_mapped(map, invert)?),
            Column::Utf8(c) => Column::Utf8(c.clone_mapped(map, invert)?),
            Column::ArrowUtf8(c) => Column::Utf8(c.clone_mapped(map, invert)?),
            _ => unreachable!(),
        }))
    }

    pub fn filter(&self, mask: &BooleanColumn) -> Result<Column, TabularError> {
        Ok(numeric_rebuild!(self, c => c.filter(mask)?, match self {
            Column::Boolean(c) => Column::Boolean(c.filter(mask)?),
            Column::Utf8(c) => Column::Utf8(c.filter(mask)?),
            Column::ArrowUtf8(c) => Column::Utf8(c.filter(mask)?),
            _ => unreachable!(),
        }))
    }

    //==============================================================================
    // Sorting
    //==============================================================================

    /// Full-length ascending permutation of row indices, nulls last.
    pub fn sort_indices(&self) -> Result<Vec<usize>, TabularError> {
        all_dispatch!(self, c => c.ascending_indices())
    }

    /// A sorted copy. Descending order applies the reversed permutation, so
    /// nulls come first.
    pub fn sort(&self, ascending: bool) -> Result<Column, TabularError> {
        let indices = self.sort_indices()?;
        self.clone_indexed(&indices, !ascending)
    }

    //==============================================================================
    // Aggregations (numeric variants only)
    //==============================================================================

    pub fn sum(&self) -> Result<Scalar, TabularError> {
        numeric_dispatch!(self, c => Ok(scalar_opt(c.sum())),
            Err(non_numeric("sum", self.data_type())))
    }

    pub fn product(&self) -> Result<Scalar, TabularError> {
        numeric_dispatch!(self, c => Ok(scalar_opt(c.product())),
            Err(non_numeric("product", self.data_type())))
    }

    pub fn min(&self) -> Result<Scalar, TabularError> {
        numeric_dispatch!(self, c => Ok(scalar_opt(c.min())),
            Err(non_numeric("min", self.data_type())))
    }

    pub fn max(&self) -> Result<Scalar, TabularError> {
        numeric_dispatch!(self, c => Ok(scalar_opt(c.max())),
            Err(non_numeric("max", self.data_type())))
    }

    pub fn sum_at(&self, rows: &[usize]) -> Result<Scalar, TabularError> {
        numeric_dispatch!(self, c => Ok(scalar_opt(c.sum_at(rows.iter().copied())?)),
            Err(non_numeric("sum", self.data_type())))
    }

    pub fn product_at(&self, rows: &[usize]) -> Result<Scalar, TabularError> {
        numeric_dispatch!(self, c => Ok(scalar_opt(c.product_at(rows.iter().copied())?)),
            Err(non_numeric("product", self.data_type())))
    }

    pub fn min_at(&self, rows: &[usize]) -> Result<Scalar, TabularError> {
        numeric_dispatch!(self, c => Ok(scalar_opt(c.min_at(rows.iter().copied())?)),
            Err(non_numeric("min", self.data_type())))
    }

    pub fn max_at(&self, rows: &[usize]) -> Result<Scalar, TabularError> {
        numeric_dispatch!(self, c => Ok(scalar_opt(c.max_at(rows.iter().copied())?)),
            Err(non_numeric("max", self.data_type())))
    }

    /// Mean of the non-null values.
    pub fn mean(&self) -> Result<Option<f64>, TabularError> {
        numeric_dispatch!(self, c => Ok(c.mean()),
            Err(non_numeric("mean", self.data_type())))
    }

    pub fn abs(&mut self) -> Result<(), TabularError> {
        let data_type = self.data_type();
        numeric_dispatch!(self, c => c.abs(), Err(non_numeric("abs", data_type)))
    }

    pub fn round(&mut self) -> Result<(), TabularError> {
        let data_type = self.data_type();
        numeric_dispatch!(self, c => c.round(), Err(non_numeric("round", data_type)))
    }

    pub fn cumulative_sum(&mut self) -> Result<(), TabularError> {
        let data_type = self.data_type();
        numeric_dispatch!(self, c => c.cumulative_sum(),
            Err(non_numeric("cumulative sum", data_type)))
    }

    pub fn cumulative_product(&mut self) -> Result<(), TabularError> {
        let data_type = self.data_type();
        numeric_dispatch!(self, c => c.cumulative_product(),
            Err(non_numeric("cumulative product", data_type)))
    }

    pub fn cumulative_min(&mut self) -> Result<(), TabularError> {
        let data_type = self.data_type();
        numeric_dispatch!(self, c => c.cumulative_min(),
            Err(non_numeric("cumulative min", data_type)))
    }

    pub fn cumulative_max(&mut self) -> Result<(), TabularError> {
        let data_type = self.data_type();
        numeric_dispatch!(self, c => c.cumulative_max(),
            Err(non_numeric("cumulative max", data_type)))
    }

    pub fn cumulative_sum_at(&mut self, rows: &[usize]) -> Result<(), TabularError> {
        let data_type = self.data_type();
        numeric_dispatch!(self, c => c.cumulative_sum_at(rows.iter().copied()),
            Err(non_numeric("cumulative sum", data_type)))
    }

    pub fn cumulative_product_at(&mut self, rows: &[usize]) -> Result<(), TabularError> {
        let data_type = self.data_type();
        numeric_dispatch!(self, c => c.cumulative_product_at(rows.iter().copied()),
            Err(non_numeric("cumulative product", data_type)))
    }

    pub fn cumulative_min_at(&mut self, rows: &[usize]) -> Result<(), TabularError> {
        let data_type = self.data_type();
        numeric_dispatch!(self, c => c.cumulative_min_at(rows.iter().copied()),
            Err(non_numeric("cumulative min", data_type)))
    }

    pub fn cumulative_max_at(&mut self, rows: &[usize]) -> Result<(), TabularError> {
        let data_type = self.data_type();
        numeric_dispatch!(self, c => c.cumulative_max_at(rows.iter().copied()),
            Err(non_numeric("cumulative max", data_type)))
    }

    /// Clamp values into `[lower, upper]`; null bounds are open ends. Bounds
    /// are converted to the column's element type.
    pub fn clip(&mut self, lower: &Scalar, upper: &Scalar) -> Result<(), TabularError> {
        let data_type = self.data_type();
        numeric_dispatch!(self, c => {
            fn bound<T: NativeType>(scalar: &Scalar) -> Option<T> {
                T::from_scalar(scalar).or_else(|| scalar.to_f64().map(T::from_f64_trunc))
            }
            c.clip(bound(lower), bound(upper))
        }, Err(non_numeric("clip", data_type)))
    }

    /// Replace every null with `value`.
    pub fn fill_nulls(&mut self, value: &Scalar) -> Result<(), TabularError> {
        if value.is_null() {
            return Err(TabularError::UnsupportedOperation(
                "cannot fill nulls with a null value".into(),
            ));
        }
        numeric_dispatch!(self, c => {
            fn convert<T: NativeType>(scalar: &Scalar) -> Option<T> {
                T::from_scalar(scalar).or_else(|| scalar.to_f64().map(T::from_f64_trunc))
            }
            match convert(value) {
                Some(v) => c.fill_nulls(v),
                None => Err(TabularError::UnsupportedOperation(format!(
                    "cannot fill a numeric column with {value}"
                ))),
            }
        }, match self {
            Column::Boolean(c) => match value {
                Scalar::Boolean(v) => {
                    for index in 0..c.len() {
                        if c.get(index)?.is_none() {
                            c.set(index, Some(*v))?;
                        }
                    }
                    Ok(())
                }
                other => Err(TabularError::UnsupportedOperation(format!(
                    "cannot fill a boolean column with {other}"
                ))),
            },
            Column::Utf8(c) => match value {
                Scalar::Utf8(v) => {
                    c.fill_nulls(v);
                    Ok(())
                }
                other => Err(TabularError::UnsupportedOperation(format!(
                    "cannot fill a string column with {other}"
                ))),
            },
            Column::ArrowUtf8(_) => Err(TabularError::UnsupportedOperation(
                "arrow-backed string columns are immutable".into(),
            )),
            _ => unreachable!(),
        })
    }

    //==============================================================================
    // Boolean reductions
    //==============================================================================

    pub fn all(&self) -> Result<bool, TabularError> {
        match self {
            Column::Boolean(c) => Ok(c.all()),
            other => Err(non_numeric("all", other.data_type())),
        }
    }

    pub fn any(&self) -> Result<bool, TabularError> {
        match self {
            Column::Boolean(c) => Ok(c.any()),
            other => Err(non_numeric("any", other.data_type())),
        }
    }

    /// Widen a numeric column to `f64` for mixed-type arithmetic.
    pub(crate) fn as_f64(&self) -> Option<PrimitiveColumn<f64>> {
        numeric_dispatch!(self, c => Some(c.to_f64_column()), None)
    }
}

macro_rules! impl_column_from {
    ($T:ty, $variant:ident) => {
        impl From<PrimitiveColumn<$T>> for Column {
            fn from(column: PrimitiveColumn<$T>) -> Self {
                Column::$variant(column)
            }
        }
    };
}

impl_column_from!(i8, Int8);
impl_column_from!(i16, Int16);
impl_column_from!(i32, Int32);
impl_column_from!(i64, Int64);
impl_column_from!(u8, UInt8);
impl_column_from!(u16, UInt16);
impl_column_from!(u32, UInt32);
impl_column_from!(u64, UInt64);
impl_column_from!(f32, Float32);
impl_column_from!(f64, Float64);

impl From<BooleanColumn> for Column {
    fn from(column: BooleanColumn) -> Self {
        Column::Boolean(column)
    }
}

impl From<StringColumn> for Column {
    fn from(column: StringColumn) -> Self {
        Column::Utf8(column)
    }
}

impl From<ArrowStringColumn> for Column {
    fn from(column: ArrowStringColumn) -> Self {
        Column::ArrowUtf8(column)
    }
}
