//! Grouping: a first-seen-ordered multimap from key value to row indices,
//! and the aggregations built on top of it.
//!
//! Null keys form a real group of their own; they never collide with any
//! non-null value.

use hashbrown::HashMap;

use crate::column::{Column, PrimitiveColumn};
use crate::error::TabularError;
use crate::frame::DataFrame;
use crate::types::{GroupKey, Scalar};

/// Key -> row indices, iterable in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct GroupMap {
    groups: Vec<(Scalar, Vec<usize>)>,
    index: HashMap<GroupKey, usize>,
}

impl GroupMap {
    pub fn from_column(column: &Column) -> Result<GroupMap, TabularError> {
        let mut map = GroupMap::default();
        for row in 0..column.len() {
            let key = column.get(row)?;
            match map.index.get(&GroupKey(key.clone())) {
                Some(&slot) => map.groups[slot].1.push(row),
                None => {
                    map.index.insert(GroupKey(key.clone()), map.groups.len());
                    map.groups.push((key, vec![row]));
                }
            }
        }
        log::debug!(
            "grouped {} rows of '{}' into {} groups",
            column.len(),
            column.name(),
            map.groups.len()
        );
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Scalar, &[usize])> {
        self.groups.iter().map(|(key, rows)| (key, rows.as_slice()))
    }

    pub fn rows(&self, key: &Scalar) -> Option<&[usize]> {
        self.index
            .get(&GroupKey(key.clone()))
            .map(|&slot| self.groups[slot].1.as_slice())
    }
}

impl Column {
    /// Group this column's rows by value, null rows forming their own group.
    pub fn group_rows(&self) -> Result<GroupMap, TabularError> {
        GroupMap::from_column(self)
    }
}

/// A frame grouped by one key column.
pub struct GroupBy<'a> {
    frame: &'a DataFrame,
    key_name: String,
    map: GroupMap,
}

impl<'a> GroupBy<'a> {
    pub(crate) fn new(frame: &'a DataFrame, name: &str) -> Result<Self, TabularError> {
        let key = frame.column(name)?;
        Ok(Self {
            frame,
            key_name: name.to_owned(),
            map: key.group_rows()?,
        })
    }

    pub fn group_map(&self) -> &GroupMap {
        &self.map
    }

    /// One key column row per group, in first-seen order.
    fn key_column(&self) -> Result<Column, TabularError> {
        let mut keys = self.frame.column(&self.key_name)?.empty_like();
        for (key, _) in self.map.iter() {
            keys.append_scalar(key)?;
        }
        Ok(keys)
    }

    fn value_columns(&self) -> impl Iterator<Item = &Column> {
        self.frame
            .columns()
            .iter()
            .filter(move |c| c.name() != self.key_name)
    }

    /// Non-null cell count per group and column, as `i64`.
    pub fn count(&self) -> Result<DataFrame, TabularError> {
        let mut result = DataFrame::new();
        result.insert_column(self.key_column()?)?;
        for column in self.value_columns() {
            let mut counts = PrimitiveColumn::<i64>::new(column.name());
            for (_, rows) in self.map.iter() {
                let mut valid = 0i64;
                for &row in rows {
                    if !column.get(row)?.is_null() {
                        valid += 1;
                    }
                }
                counts.append(Some(valid));
            }
            result.insert_column(counts.into())?;
        }
        Ok(result)
    }

    /// The first row of each group.
    pub fn first(&self) -> Result<DataFrame, TabularError> {
        let mut result = DataFrame::new();
        result.insert_column(self.key_column()?)?;
        for column in self.value_columns() {
            let mut firsts = column.empty_like();
            for (_, rows) in self.map.iter() {
                firsts.append_scalar(&column.get(rows[0])?)?;
            }
            result.insert_column(firsts)?;
        }
        Ok(result)
    }

    fn take_rows(&self, pick: impl Fn(&[usize]) -> Vec<usize>) -> Result<DataFrame, TabularError> {
        let mut taken = Vec::new();
        for (_, rows) in self.map.iter() {
            taken.extend(pick(rows));
        }
        let mut columns = Vec::with_capacity(self.frame.column_count());
        for column in self.frame.columns() {
            columns.push(column.clone_indexed(&taken, false)?);
        }
        DataFrame::from_columns(columns)
    }

    /// Up to the first `count` rows of each group, all columns included.
    pub fn head(&self, count: usize) -> Result<DataFrame, TabularError> {
        self.take_rows(|rows| rows[..count.min(rows.len())].to_vec())
    }

    /// Up to the last `count` rows of each group.
    pub fn tail(&self, count: usize) -> Result<DataFrame, TabularError> {
        self.take_rows(|rows| rows[rows.len() - count.min(rows.len())..].to_vec())
    }

    fn aggregate_numeric(
        &self,
        reduce: impl Fn(&Column, &[usize]) -> Result<Scalar, TabularError>,
    ) -> Result<DataFrame, TabularError> {
        let mut result = DataFrame::new();
        result.insert_column(self.key_column()?)?;
        for column in self.value_columns() {
            // non-numeric columns silently drop out of numeric aggregations
            if !column.is_numeric() {
                continue;
            }
            let mut reduced = column.empty_like();
            for (_, rows) in self.map.iter() {
                reduced.append_scalar(&reduce(column, rows)?)?;
            }
            result.insert_column(reduced)?;
        }
        Ok(result)
    }

    pub fn sum(&self) -> Result<DataFrame, TabularError> {
        self.aggregate_numeric(|column, rows| column.sum_at(rows))
    }

    pub fn product(&self) -> Result<DataFrame, TabularError> {
        self.aggregate_numeric(|column, rows| column.product_at(rows))
    }

    pub fn min(&self) -> Result<DataFrame, TabularError> {
        self.aggregate_numeric(|column, rows| column.min_at(rows))
    }

    pub fn max(&self) -> Result<DataFrame, TabularError> {
        self.aggregate_numeric(|column, rows| column.max_at(rows))
    }

    /// Cumulative sum within each group, rewriting only the grouped rows.
    pub fn cumulative_sum(&self) -> Result<DataFrame, TabularError> {
        let mut columns = Vec::with_capacity(self.frame.column_count());
        for column in self.frame.columns() {
            if column.name() == self.key_name || !column.is_numeric() {
                columns.push(column.clone());
                continue;
            }
            let mut rewritten = column.clone();
            for (_, rows) in self.map.iter() {
                rewritten.cumulative_sum_at(rows)?;
            }
            columns.push(rewritten);
        }
        DataFrame::from_columns(columns)
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::StringColumn;

    fn orders() -> DataFrame {
        DataFrame::from_columns(vec![
            StringColumn::from_values(
                "customer",
                [Some("ada"), Some("bob"), Some("ada"), None, Some("bob"), Some("ada")],
            )
            .into(),
            PrimitiveColumn::<i32>::from_values(
                "amount",
                [Some(10), Some(5), None, Some(7), Some(2), Some(1)],
            )
            .into(),
        ])
        .unwrap()
    }

    #[test]
    fn groups_keep_first_seen_order_with_null_sentinel() {
        let frame = orders();
        let map = frame.column("customer").unwrap().group_rows().unwrap();
        let keys: Vec<&Scalar> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                &Scalar::Utf8("ada".into()),
                &Scalar::Utf8("bob".into()),
                &Scalar::Null
            ]
        );
        assert_eq!(map.rows(&Scalar::Utf8("ada".into())).unwrap(), &[0, 2, 5]);
        assert_eq!(map.rows(&Scalar::Null).unwrap(), &[3]);
    }

    #[test]
    fn count_is_non_null_only() {
        let frame = orders();
        let counts = frame.group_by("customer").unwrap().count().unwrap();
        assert_eq!(counts.row_count(), 3);
        let amounts = counts.column("amount").unwrap();
        assert_eq!(amounts.get(0).unwrap(), Scalar::Int64(2)); // ada: one null amount
        assert_eq!(amounts.get(1).unwrap(), Scalar::Int64(2));
        assert_eq!(amounts.get(2).unwrap(), Scalar::Int64(1));
    }

    #[test]
    fn sum_skips_non_numeric_and_nulls() {
        let frame = orders();
        let sums = frame.group_by("customer").unwrap().sum().unwrap();
        assert_eq!(sums.column_count(), 2); // key + amount only
        let amounts = sums.column("amount").unwrap();
        assert_eq!(amounts.get(0).unwrap(), Scalar::Int32(11));
        assert_eq!(amounts.get(1).unwrap(), Scalar::Int32(7));
        assert_eq!(amounts.get(2).unwrap(), Scalar::Int32(7));
    }

    #[test]
    fn first_takes_the_leading_row_of_each_group() {
        let frame = orders();
        let firsts = frame.group_by("customer").unwrap().first().unwrap();
        let amounts = firsts.column("amount").unwrap();
        assert_eq!(amounts.get(0).unwrap(), Scalar::Int32(10));
        assert_eq!(amounts.get(2).unwrap(), Scalar::Int32(7));
    }

    #[test]
    fn head_and_tail_slice_each_group() {
        let frame = orders();
        let grouped = frame.group_by("customer").unwrap();
        let heads = grouped.head(2).unwrap();
        // ada contributes rows 0 and 2, bob rows 1 and 4, null row 3
        assert_eq!(heads.row_count(), 5);

        let tails = grouped.tail(1).unwrap();
        assert_eq!(tails.row_count(), 3);
        let amounts = tails.column("amount").unwrap();
        assert_eq!(amounts.get(0).unwrap(), Scalar::Int32(1)); // ada's last row
    }

    #[test]
    fn cumulative_sum_runs_within_groups() {
        let frame = orders();
        let running = frame.group_by("customer").unwrap().cumulative_sum().unwrap();
        let amounts = running.column("amount").unwrap();
        assert_eq!(amounts.get(0).unwrap(), Scalar::Int32(10));
        assert_eq!(amounts.get(2).unwrap(), Scalar::Null); // null stays null
        assert_eq!(amounts.get(5).unwrap(), Scalar::Int32(11)); // 10 + 1
        assert_eq!(amounts.get(4).unwrap(), Scalar::Int32(7)); // bob: 5 + 2
    }

    #[test]
    fn float_keys_group_bit_exactly() {
        let column: Column =
            PrimitiveColumn::<f64>::from_values("k", [Some(f64::NAN), Some(f64::NAN), Some(0.0), Some(-0.0)])
                .into();
        let map = column.group_rows().unwrap();
        // NaN groups with NaN; 0.0 and -0.0 stay distinct
        assert_eq!(map.len(), 3);
    }
}
