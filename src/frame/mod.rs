//! The table type: ordered, named columns of equal row count.

pub mod group_by;
pub mod join;

pub use group_by::{GroupBy, GroupMap};
pub use join::JoinAlgorithm;

use std::ops::Range;

use hashbrown::HashMap;
use rand::seq::index::sample;

use crate::column::{BooleanColumn, Column, PrimitiveColumn, StringColumn};
use crate::error::TabularError;
use crate::types::Scalar;

#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    columns: Vec<Column>,
    // name -> position; rebuilt whenever a column is added, removed or renamed
    schema_cache: HashMap<String, usize>,
    row_count: usize,
}

impl DataFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self, TabularError> {
        let mut frame = Self::new();
        for column in columns {
            frame.insert_column(column)?;
        }
        Ok(frame)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema_cache.get(name).copied()
    }

    pub fn column(&self, name: &str) -> Result<&Column, TabularError> {
        let index = self
            .column_index(name)
            .ok_or_else(|| TabularError::ColumnNotFound(name.to_owned()))?;
        Ok(&self.columns[index])
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column, TabularError> {
        let index = self
            .column_index(name)
            .ok_or_else(|| TabularError::ColumnNotFound(name.to_owned()))?;
        Ok(&mut self.columns[index])
    }

    pub fn column_at(&self, index: usize) -> Result<&Column, TabularError> {
        self.columns
            .get(index)
            .ok_or(TabularError::IndexOutOfBounds {
                index,
                length: self.columns.len(),
            })
    }

    fn rebuild_schema_cache(&mut self) {
        self.schema_cache.clear();
        for (index, column) in self.columns.iter().enumerate() {
            self.schema_cache.insert(column.name().to_owned(), index);
        }
    }

    /// Add a column at the end. The first column fixes the row count; all
    /// later ones must match it, and names must stay unique.
    pub fn insert_column(&mut self, column: Column) -> Result<(), TabularError> {
        if self.schema_cache.contains_key(column.name()) {
            return Err(TabularError::DuplicateColumnName(column.name().to_owned()));
        }
        if !self.columns.is_empty() && column.len() != self.row_count {
            return Err(TabularError::LengthMismatch {
                expected: self.row_count,
                actual: column.len(),
            });
        }
        if self.columns.is_empty() {
            self.row_count = column.len();
        }
        self.schema_cache
            .insert(column.name().to_owned(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Result<Column, TabularError> {
        let index = self
            .column_index(name)
            .ok_or_else(|| TabularError::ColumnNotFound(name.to_owned()))?;
        let column = self.columns.remove(index);
        if self.columns.is_empty() {
            self.row_count = 0;
        }
        self.rebuild_schema_cache();
        Ok(column)
    }

    pub fn rename_column(&mut self, name: &str, new_name: &str) -> Result<(), TabularError> {
        if name != new_name && self.schema_cache.contains_key(new_name) {
            return Err(TabularError::DuplicateColumnName(new_name.to_owned()));
        }
        let index = self
            .column_index(name)
            .ok_or_else(|| TabularError::ColumnNotFound(name.to_owned()))?;
        self.columns[index].set_name(new_name);
        self.rebuild_schema_cache();
        Ok(())
    }

    //==============================================================================
    // Row access
    //==============================================================================

    pub fn rows(&self, range: Range<usize>) -> Result<Vec<Vec<Scalar>>, TabularError> {
        if range.end > self.row_count {
            return Err(TabularError::IndexOutOfBounds {
                index: range.end,
                length: self.row_count,
            });
        }
        let mut rows = Vec::with_capacity(range.len());
        for row in range {
            let mut cells = Vec::with_capacity(self.columns.len());
            for column in &self.columns {
                cells.push(column.get(row)?);
            }
            rows.push(cells);
        }
        Ok(rows)
    }

    pub fn head(&self, count: usize) -> Result<Vec<Vec<Scalar>>, TabularError> {
        self.rows(0..count.min(self.row_count))
    }

    pub fn tail(&self, count: usize) -> Result<Vec<Vec<Scalar>>, TabularError> {
        self.rows(self.row_count.saturating_sub(count)..self.row_count)
    }

    /// Append one row; the cell count must equal the column count.
    pub fn append_row(&mut self, cells: &[Scalar]) -> Result<(), TabularError> {
        if cells.len() != self.columns.len() {
            return Err(TabularError::LengthMismatch {
                expected: self.columns.len(),
                actual: cells.len(),
            });
        }
        for (column, cell) in self.columns.iter_mut().zip(cells) {
            column.append_scalar(cell)?;
        }
        self.row_count += 1;
        Ok(())
    }

    //==============================================================================
    // Composition
    //==============================================================================

    /// Sort every column by the named key column's order. One permutation is
    /// computed from the key and applied everywhere.
    pub fn sort_by(&self, name: &str, ascending: bool) -> Result<DataFrame, TabularError> {
        let key = self.column(name)?;
        let indices = key.sort_indices()?;
        let mut columns = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            columns.push(column.clone_indexed(&indices, !ascending)?);
        }
        DataFrame::from_columns(columns)
    }

    pub fn group_by(&self, name: &str) -> Result<GroupBy<'_>, TabularError> {
        GroupBy::new(self, name)
    }

    /// Keep rows where the mask is `true`; null mask entries drop the row.
    pub fn filter(&self, mask: &BooleanColumn) -> Result<DataFrame, TabularError> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            columns.push(column.filter(mask)?);
        }
        DataFrame::from_columns(columns)
    }

    /// A random sample of `count` distinct rows.
    pub fn sample(&self, count: usize) -> Result<DataFrame, TabularError> {
        if count > self.row_count {
            return Err(TabularError::IndexOutOfBounds {
                index: count,
                length: self.row_count,
            });
        }
        let mut rng = rand::rng();
        let indices: Vec<usize> = sample(&mut rng, self.row_count, count).into_vec();
        let mut columns = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            columns.push(column.clone_indexed(&indices, false)?);
        }
        DataFrame::from_columns(columns)
    }

    /// Clamp every numeric column into `[lower, upper]`; other columns are
    /// left alone.
    pub fn clip(&mut self, lower: &Scalar, upper: &Scalar) -> Result<(), TabularError> {
        for column in &mut self.columns {
            if column.is_numeric() {
                column.clip(lower, upper)?;
            }
        }
        Ok(())
    }

    /// Fill nulls in every column the value is compatible with; incompatible
    /// columns are left alone.
    pub fn fill_nulls(&mut self, value: &Scalar) -> Result<(), TabularError> {
        for column in &mut self.columns {
            match column.fill_nulls(value) {
                Ok(()) | Err(TabularError::UnsupportedOperation(_)) => {}
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    /// Summary statistics for the numeric columns: non-null length, max, min
    /// and mean, one row per statistic.
    pub fn description(&self) -> Result<DataFrame, TabularError> {
        let labels = StringColumn::from_values(
            "Description",
            [
                Some("Length (excluding null values)"),
                Some("Max"),
                Some("Min"),
                Some("Mean"),
            ],
        );
        let mut result = DataFrame::new();
        result.insert_column(labels.into())?;
        for column in &self.columns {
            if !column.is_numeric() {
                continue;
            }
            let mut stats = PrimitiveColumn::<f64>::new(column.name());
            stats.append(Some((column.len() - column.null_count()) as f64));
            stats.append(column.max()?.to_f64());
            stats.append(column.min()?.to_f64());
            stats.append(column.mean()?);
            result.insert_column(stats.into())?;
        }
        Ok(result)
    }

    //==============================================================================
    // Frame-level arithmetic
    //==============================================================================

    fn map_numeric(
        &self,
        op: impl Fn(&Column) -> Result<Column, TabularError>,
    ) -> Result<DataFrame, TabularError> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            if column.is_numeric() {
                columns.push(op(column)?);
            } else {
                columns.push(column.clone());
            }
        }
        DataFrame::from_columns(columns)
    }

    pub fn add(&self, value: &Scalar) -> Result<DataFrame, TabularError> {
        self.map_numeric(|c| c.add_scalar(value))
    }

    pub fn sub(&self, value: &Scalar) -> Result<DataFrame, TabularError> {
        self.map_numeric(|c| c.sub_scalar(value))
    }

    pub fn mul(&self, value: &Scalar) -> Result<DataFrame, TabularError> {
        self.map_numeric(|c| c.mul_scalar(value))
    }

    pub fn div(&self, value: &Scalar) -> Result<DataFrame, TabularError> {
        self.map_numeric(|c| c.div_scalar(value))
    }

    fn map_values(
        &self,
        values: &[Scalar],
        op: impl Fn(&Column, &Scalar) -> Result<Column, TabularError>,
    ) -> Result<DataFrame, TabularError> {
        if values.len() != self.columns.len() {
            return Err(TabularError::LengthMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        let mut columns = Vec::with_capacity(self.columns.len());
        for (column, value) in self.columns.iter().zip(values) {
            if value.is_null() {
                columns.push(column.clone());
            } else {
                columns.push(op(column, value)?);
            }
        }
        DataFrame::from_columns(columns)
    }

    /// One addend per column; `Scalar::Null` leaves that column unchanged.
    /// The list length must equal the column count.
    pub fn add_values(&self, values: &[Scalar]) -> Result<DataFrame, TabularError> {
        self.map_values(values, |c, v| c.add_scalar(v))
    }

    pub fn sub_values(&self, values: &[Scalar]) -> Result<DataFrame, TabularError> {
        self.map_values(values, |c, v| c.sub_scalar(v))
    }

    pub fn mul_values(&self, values: &[Scalar]) -> Result<DataFrame, TabularError> {
        self.map_values(values, |c, v| c.mul_scalar(v))
    }

    pub fn div_values(&self, values: &[Scalar]) -> Result<DataFrame, TabularError> {
        self.map_values(values, |c, v| c.div_scalar(v))
    }
}
