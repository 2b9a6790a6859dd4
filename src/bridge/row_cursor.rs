//! Row-oriented ingestion: a small trait pair that lets any row-producing
//! source load into a frame without this crate knowing its types.

use arrow_schema::{Field, Schema};

use crate::column::{BooleanColumn, Column, PrimitiveColumn, StringColumn};
use crate::error::TabularError;
use crate::frame::DataFrame;
use crate::types::{DataType, Scalar};

/// One column's shape as seen by a row source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    /// An empty column matching this field.
    pub fn make_column(&self) -> Column {
        match self.data_type {
            DataType::Int8 => PrimitiveColumn::<i8>::new(&self.name).into(),
            DataType::Int16 => PrimitiveColumn::<i16>::new(&self.name).into(),
            DataType::Int32 => PrimitiveColumn::<i32>::new(&self.name).into(),
            DataType::Int64 => PrimitiveColumn::<i64>::new(&self.name).into(),
            DataType::UInt8 => PrimitiveColumn::<u8>::new(&self.name).into(),
            DataType::UInt16 => PrimitiveColumn::<u16>::new(&self.name).into(),
            DataType::UInt32 => PrimitiveColumn::<u32>::new(&self.name).into(),
            DataType::UInt64 => PrimitiveColumn::<u64>::new(&self.name).into(),
            DataType::Float32 => PrimitiveColumn::<f32>::new(&self.name).into(),
            DataType::Float64 => PrimitiveColumn::<f64>::new(&self.name).into(),
            DataType::Boolean => BooleanColumn::new(&self.name).into(),
            DataType::Utf8 => StringColumn::new(&self.name).into(),
        }
    }

    /// The equivalent Arrow schema field.
    pub fn to_arrow_field(&self) -> Field {
        Field::new(&self.name, self.data_type.to_arrow_type(), self.nullable)
    }

    /// Build from an Arrow schema field; errors on a type outside the
    /// supported set.
    pub fn from_arrow_field(field: &Field) -> Result<Self, TabularError> {
        Ok(Self {
            name: field.name().clone(),
            data_type: DataType::from_arrow_type(field.data_type())?,
            nullable: field.is_nullable(),
        })
    }
}

/// Forward-only walk over a source's rows.
pub trait RowCursor {
    /// Move to the next row; `false` once the source is exhausted.
    fn advance(&mut self) -> Result<bool, TabularError>;

    /// The current row's cell for `column`.
    fn cell(&self, column: usize) -> Result<Scalar, TabularError>;
}

/// Something that can describe its columns and hand out cursors.
pub trait RowSource {
    type Cursor: RowCursor;

    fn schema(&self) -> Vec<FieldDescriptor>;

    fn open(&self) -> Result<Self::Cursor, TabularError>;
}

impl DataFrame {
    /// Bulk-load every row of `source` into a new frame.
    pub fn from_row_source<S: RowSource>(source: &S) -> Result<DataFrame, TabularError> {
        let schema = source.schema();
        let mut columns: Vec<Column> = schema.iter().map(FieldDescriptor::make_column).collect();
        let mut cursor = source.open()?;
        let mut rows = 0usize;
        while cursor.advance()? {
            for (index, (column, field)) in columns.iter_mut().zip(&schema).enumerate() {
                let cell = cursor.cell(index)?;
                if cell.is_null() && !field.nullable {
                    return Err(TabularError::InvalidBuffer(format!(
                        "null cell in non-nullable field '{}' at row {rows}",
                        field.name
                    )));
                }
                column.append_scalar(&cell)?;
            }
            rows += 1;
        }
        log::debug!("loaded {rows} rows from a row source");
        DataFrame::from_columns(columns)
    }

    /// The frame's shape as field descriptors.
    pub fn schema(&self) -> Vec<FieldDescriptor> {
        self.columns()
            .iter()
            .map(|column| {
                FieldDescriptor::new(column.name(), column.data_type(), column.null_count() > 0)
            })
            .collect()
    }

    /// The frame's shape as an Arrow schema, for interop callers.
    pub fn arrow_schema(&self) -> Schema {
        let fields: Vec<Field> = self
            .schema()
            .iter()
            .map(FieldDescriptor::to_arrow_field)
            .collect();
        Schema::new(fields)
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    struct VecSource {
        fields: Vec<FieldDescriptor>,
        rows: Vec<Vec<Scalar>>,
    }

    struct VecCursor {
        rows: Vec<Vec<Scalar>>,
        position: Option<usize>,
    }

    impl RowCursor for VecCursor {
        fn advance(&mut self) -> Result<bool, TabularError> {
            let next = self.position.map_or(0, |p| p + 1);
            self.position = Some(next);
            Ok(next < self.rows.len())
        }

        fn cell(&self, column: usize) -> Result<Scalar, TabularError> {
            let row = self.position.ok_or_else(|| {
                TabularError::Internal("cursor read before first advance".into())
            })?;
            Ok(self.rows[row][column].clone())
        }
    }

    impl RowSource for VecSource {
        type Cursor = VecCursor;

        fn schema(&self) -> Vec<FieldDescriptor> {
            self.fields.clone()
        }

        fn open(&self) -> Result<Self::Cursor, TabularError> {
            Ok(VecCursor {
                rows: self.rows.clone(),
                position: None,
            })
        }
    }

    fn sample_source() -> VecSource {
        VecSource {
            fields: vec![
                FieldDescriptor::new("id", DataType::Int64, false),
                FieldDescriptor::new("label", DataType::Utf8, true),
            ],
            rows: vec![
                vec![Scalar::Int64(1), Scalar::Utf8("a".into())],
                vec![Scalar::Int64(2), Scalar::Null],
            ],
        }
    }

    #[test]
    fn loads_rows_and_types_from_a_source() {
        let frame = DataFrame::from_row_source(&sample_source()).unwrap();
        assert_eq!(frame.row_count(), 2);
        assert_eq!(frame.column("id").unwrap().data_type(), DataType::Int64);
        assert_eq!(frame.column("label").unwrap().get(1).unwrap(), Scalar::Null);
    }

    #[test]
    fn null_in_non_nullable_field_is_rejected() {
        let mut source = sample_source();
        source.rows.push(vec![Scalar::Null, Scalar::Null]);
        assert!(matches!(
            DataFrame::from_row_source(&source),
            Err(TabularError::InvalidBuffer(_))
        ));
    }

    #[test]
    fn frame_schema_reports_observed_nullability() {
        let frame = DataFrame::from_row_source(&sample_source()).unwrap();
        let schema = frame.schema();
        assert_eq!(schema[0], FieldDescriptor::new("id", DataType::Int64, false));
        assert_eq!(schema[1], FieldDescriptor::new("label", DataType::Utf8, true));
    }

    #[test]
    fn field_descriptors_round_trip_through_arrow_fields() {
        let descriptor = FieldDescriptor::new("score", DataType::Float64, true);
        let field = descriptor.to_arrow_field();
        assert_eq!(field.name(), "score");
        assert!(field.is_nullable());
        assert_eq!(FieldDescriptor::from_arrow_field(&field).unwrap(), descriptor);
    }

    #[test]
    fn frame_exports_an_arrow_schema() {
        let frame = DataFrame::from_row_source(&sample_source()).unwrap();
        let schema = frame.arrow_schema();
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.field(0).name(), "id");
        assert!(schema.field(1).is_nullable());
    }
}
