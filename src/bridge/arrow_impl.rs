//! Conversion between `Column` and Arrow arrays.
//!
//! Import is zero-copy where the layouts line up: primitive arrays hand
//! their value buffer to a borrowed chunk (copied only on first write), and
//! string arrays are wrapped as immutable [`ArrowStringColumn`]s. Export
//! gathers chunked storage into one contiguous array.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, PrimitiveArray, StringArray};
use arrow::buffer::{NullBuffer, OffsetBuffer, ScalarBuffer};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType as ArrowDataType, Float32Type, Float64Type, Int16Type, Int32Type,
    Int64Type, Int8Type, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};

use crate::column::{ArrowStringColumn, BooleanColumn, Column, PrimitiveColumn};
use crate::error::TabularError;
use crate::traits::NativeType;

fn gather_primitive<T, A>(column: &PrimitiveColumn<T>) -> ArrayRef
where
    T: NativeType,
    A: ArrowPrimitiveType<Native = T>,
{
    let mut values = Vec::with_capacity(column.len());
    let mut validity = Vec::with_capacity(column.len());
    for cell in column.iter() {
        validity.push(cell.is_some());
        values.push(cell.unwrap_or_default());
    }
    let nulls = (column.null_count() > 0).then(|| NullBuffer::from(validity));
    Arc::new(PrimitiveArray::<A>::new(ScalarBuffer::from(values), nulls)) as ArrayRef
}

/// Export a column as a contiguous Arrow array.
pub fn to_arrow(column: &Column) -> Result<ArrayRef, TabularError> {
    Ok(match column {
        Column::Int8(c) => gather_primitive::<_, Int8Type>(c),
        Column::Int16(c) => gather_primitive::<_, Int16Type>(c),
        Column::Int32(c) => gather_primitive::<_, Int32Type>(c),
        Column::Int64(c) => gather_primitive::<_, Int64Type>(c),
        Column::UInt8(c) => gather_primitive::<_, UInt8Type>(c),
        Column::UInt16(c) => gather_primitive::<_, UInt16Type>(c),
        Column::UInt32(c) => gather_primitive::<_, UInt32Type>(c),
        Column::UInt64(c) => gather_primitive::<_, UInt64Type>(c),
        Column::Float32(c) => gather_primitive::<_, Float32Type>(c),
        Column::Float64(c) => gather_primitive::<_, Float64Type>(c),
        Column::Boolean(c) => {
            let cells: Vec<Option<bool>> = c.iter().collect();
            Arc::new(BooleanArray::from(cells))
        }
        Column::Utf8(c) => {
            let cells: Vec<Option<&str>> = c.iter().collect();
            Arc::new(StringArray::from(cells))
        }
        Column::ArrowUtf8(c) => {
            // the original buffers are reused as-is
            let nulls =
                (c.null_count() > 0).then(|| c.validity().to_null_buffer());
            Arc::new(StringArray::try_new(
                OffsetBuffer::new(c.offset_buffer().clone()),
                c.value_buffer().clone(),
                nulls,
            )?)
        }
    })
}

fn wrap_primitive<T, A>(name: &str, array: &dyn Array) -> Result<Column, TabularError>
where
    T: NativeType,
    A: ArrowPrimitiveType<Native = T>,
    Column: From<PrimitiveColumn<T>>,
{
    let array = array
        .as_any()
        .downcast_ref::<PrimitiveArray<A>>()
        .ok_or_else(|| {
            TabularError::InvalidBuffer("array type tag disagrees with its storage".into())
        })?;
    Ok(PrimitiveColumn::<T>::from_arrow_parts(
        name,
        array.values().clone(),
        array.nulls().cloned(),
        array.len(),
    )?
    .into())
}

/// Wrap an Arrow array as a column without copying values.
pub fn from_arrow(name: &str, array: &ArrayRef) -> Result<Column, TabularError> {
    match array.data_type() {
        ArrowDataType::Int8 => wrap_primitive::<i8, Int8Type>(name, array.as_ref()),
        ArrowDataType::Int16 => wrap_primitive::<i16, Int16Type>(name, array.as_ref()),
        ArrowDataType::Int32 => wrap_primitive::<i32, Int32Type>(name, array.as_ref()),
        ArrowDataType::Int64 => wrap_primitive::<i64, Int64Type>(name, array.as_ref()),
        ArrowDataType::UInt8 => wrap_primitive::<u8, UInt8Type>(name, array.as_ref()),
        ArrowDataType::UInt16 => wrap_primitive::<u16, UInt16Type>(name, array.as_ref()),
        ArrowDataType::UInt32 => wrap_primitive::<u32, UInt32Type>(name, array.as_ref()),
        ArrowDataType::UInt64 => wrap_primitive::<u64, UInt64Type>(name, array.as_ref()),
        ArrowDataType::Float32 => wrap_primitive::<f32, Float32Type>(name, array.as_ref()),
        ArrowDataType::Float64 => wrap_primitive::<f64, Float64Type>(name, array.as_ref()),
        ArrowDataType::Boolean => {
            let array = array
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or_else(|| {
                    TabularError::InvalidBuffer("array type tag disagrees with its storage".into())
                })?;
            Ok(BooleanColumn::from_values(name, array.iter()).into())
        }
        ArrowDataType::Utf8 => {
            let array = array
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| {
                    TabularError::InvalidBuffer("array type tag disagrees with its storage".into())
                })?;
            Ok(ArrowStringColumn::from_arrow(name, array)?.into())
        }
        other => Err(TabularError::UnsupportedOperation(format!(
            "unsupported arrow type {other}"
        ))),
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scalar;

    #[test]
    fn primitive_import_borrows_until_first_write() {
        let source: ArrayRef = Arc::new(PrimitiveArray::<Int32Type>::from(vec![
            Some(1),
            None,
            Some(3),
        ]));
        let mut column = from_arrow("n", &source).unwrap();
        assert_eq!(column.len(), 3);
        assert_eq!(column.null_count(), 1);
        assert_eq!(column.get(1).unwrap(), Scalar::Null);

        // writing promotes the borrowed chunk; the source array is untouched
        column.set(0, &Scalar::Int32(99)).unwrap();
        assert_eq!(column.get(0).unwrap(), Scalar::Int32(99));
        let source = source
            .as_any()
            .downcast_ref::<PrimitiveArray<Int32Type>>()
            .unwrap();
        assert_eq!(source.value(0), 1);
    }

    #[test]
    fn primitive_export_round_trips_values_and_nulls() {
        let column: Column =
            PrimitiveColumn::<f64>::from_values("f", [Some(1.5), None, Some(-2.0)]).into();
        let array = to_arrow(&column).unwrap();
        let array = array
            .as_any()
            .downcast_ref::<PrimitiveArray<Float64Type>>()
            .unwrap();
        assert_eq!(array.len(), 3);
        assert!(array.is_null(1));
        assert_eq!(array.value(2), -2.0);
    }

    #[test]
    fn string_import_is_immutable_and_exports_same_buffers() {
        let source = StringArray::from(vec![Some("x"), None, Some("yz")]);
        let array_ref: ArrayRef = Arc::new(source);
        let column = from_arrow("s", &array_ref).unwrap();
        assert!(matches!(column, Column::ArrowUtf8(_)));

        let exported = to_arrow(&column).unwrap();
        let exported = exported.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(exported.value(2), "yz");
        assert!(exported.is_null(1));
    }

    #[test]
    fn boolean_round_trip() {
        let column: Column =
            BooleanColumn::from_values("b", [Some(true), None, Some(false)]).into();
        let array = to_arrow(&column).unwrap();
        let back = from_arrow("b", &array).unwrap();
        assert_eq!(back.get(0).unwrap(), Scalar::Boolean(true));
        assert_eq!(back.get(1).unwrap(), Scalar::Null);
    }

    #[test]
    fn unsupported_arrow_types_are_reported() {
        let array: ArrayRef = Arc::new(arrow::array::LargeStringArray::from(vec![Some("a")]));
        assert!(matches!(
            from_arrow("s", &array),
            Err(TabularError::UnsupportedOperation(_))
        ));
    }
}
