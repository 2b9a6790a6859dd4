//! Table combination: positional `join` and key-based hash `merge`.
//!
//! Both build two row-index maps (one per side, with `None` marking a
//! null-padded output row) and materialize every column through the shared
//! mapped-clone path, so null semantics cannot drift between columns.

use hashbrown::HashSet;

use crate::column::Column;
use crate::error::TabularError;
use crate::frame::group_by::GroupMap;
use crate::frame::DataFrame;
use crate::types::GroupKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinAlgorithm {
    Left,
    Right,
    Inner,
    FullOuter,
}

/// Rename until `column_name` is free in `frame`: the pre-existing column
/// takes the left suffix, the incoming name takes the right suffix, and the
/// check repeats in case the suffixed names collide too.
fn resolve_name_collision(
    frame: &mut DataFrame,
    mut column_name: String,
    left_suffix: &str,
    right_suffix: &str,
) -> Result<String, TabularError> {
    while let Some(index) = frame.column_index(&column_name) {
        let existing = frame.column_at(index)?.name().to_owned();
        frame.rename_column(&existing, &format!("{existing}{left_suffix}"))?;
        column_name = format!("{column_name}{right_suffix}");
    }
    Ok(column_name)
}

fn identity_map(take: usize, target: usize) -> Vec<Option<usize>> {
    let mut map: Vec<Option<usize>> = (0..take).map(Some).collect();
    map.resize(target, None);
    map
}

impl DataFrame {
    /// Positional join: rows pair up by index, no key comparison. The
    /// algorithm decides the output row count and which side gets truncated
    /// or null-padded.
    pub fn join(
        &self,
        other: &DataFrame,
        left_suffix: &str,
        right_suffix: &str,
        algorithm: JoinAlgorithm,
    ) -> Result<DataFrame, TabularError> {
        let (left_rows, right_rows) = (self.row_count(), other.row_count());
        let target = match algorithm {
            JoinAlgorithm::Left => left_rows,
            JoinAlgorithm::Right => right_rows,
            JoinAlgorithm::Inner => left_rows.min(right_rows),
            JoinAlgorithm::FullOuter => left_rows.max(right_rows),
        };
        let left_map = identity_map(left_rows.min(target), target);
        let right_map = identity_map(right_rows.min(target), target);
        self.assemble(other, &left_map, &right_map, left_suffix, right_suffix)
    }

    /// Hash merge on one key column per side. Probe rows that find matching
    /// key rows fan out to one output row per match; a null probe key matches
    /// only null hash keys.
    pub fn merge(
        &self,
        other: &DataFrame,
        left_on: &str,
        right_on: &str,
        left_suffix: &str,
        right_suffix: &str,
        algorithm: JoinAlgorithm,
    ) -> Result<DataFrame, TabularError> {
        let left_key = self.column(left_on)?;
        let right_key = other.column(right_on)?;

        let mut left_map: Vec<Option<usize>> = Vec::new();
        let mut right_map: Vec<Option<usize>> = Vec::new();

        match algorithm {
            JoinAlgorithm::Left => {
                let hash = GroupMap::from_column(right_key)?;
                probe(left_key, &hash, &mut left_map, &mut right_map, true, None)?;
            }
            JoinAlgorithm::Right => {
                let hash = GroupMap::from_column(left_key)?;
                probe(right_key, &hash, &mut right_map, &mut left_map, true, None)?;
            }
            JoinAlgorithm::Inner => {
                // hash the smaller side, probe with the larger
                if self.row_count() <= other.row_count() {
                    log::debug!("inner merge: hashing left side ({} rows)", self.row_count());
                    let hash = GroupMap::from_column(left_key)?;
                    probe(right_key, &hash, &mut right_map, &mut left_map, false, None)?;
                } else {
                    log::debug!("inner merge: hashing right side ({} rows)", other.row_count());
                    let hash = GroupMap::from_column(right_key)?;
                    probe(left_key, &hash, &mut left_map, &mut right_map, false, None)?;
                }
            }
            JoinAlgorithm::FullOuter => {
                let hash = GroupMap::from_column(right_key)?;
                let mut matched: HashSet<GroupKey> = HashSet::new();
                probe(
                    left_key,
                    &hash,
                    &mut left_map,
                    &mut right_map,
                    true,
                    Some(&mut matched),
                )?;
                // second pass: hash-side rows whose key never matched
                for row in 0..right_key.len() {
                    if !matched.contains(&GroupKey(right_key.get(row)?)) {
                        left_map.push(None);
                        right_map.push(Some(row));
                    }
                }
            }
        }

        log::debug!(
            "merge on '{left_on}'/'{right_on}' emitted {} rows",
            left_map.len()
        );
        self.assemble(other, &left_map, &right_map, left_suffix, right_suffix)
    }

    fn assemble(
        &self,
        other: &DataFrame,
        left_map: &[Option<usize>],
        right_map: &[Option<usize>],
        left_suffix: &str,
        right_suffix: &str,
    ) -> Result<DataFrame, TabularError> {
        let mut result = DataFrame::new();
        for column in self.columns() {
            result.insert_column(column.clone_mapped(left_map, false)?)?;
        }
        for column in other.columns() {
            let mut mapped = column.clone_mapped(right_map, false)?;
            let name = resolve_name_collision(
                &mut result,
                mapped.name().to_owned(),
                left_suffix,
                right_suffix,
            )?;
            mapped.set_name(name);
            result.insert_column(mapped)?;
        }
        Ok(result)
    }
}

/// Walk the probe column in row order against the hashed side. Each match
/// emits one output row per hash row; `keep_unmatched` null-pads probe rows
/// with no partner. `matched` collects the keys that found partners (for the
/// full-outer second pass).
fn probe(
    probe_key: &Column,
    hash: &GroupMap,
    probe_map: &mut Vec<Option<usize>>,
    hash_map: &mut Vec<Option<usize>>,
    keep_unmatched: bool,
    mut matched: Option<&mut HashSet<GroupKey>>,
) -> Result<(), TabularError> {
    for row in 0..probe_key.len() {
        let key = probe_key.get(row)?;
        match hash.rows(&key) {
            Some(partners) => {
                for &partner in partners {
                    probe_map.push(Some(row));
                    hash_map.push(Some(partner));
                }
                if let Some(matched) = matched.as_deref_mut() {
                    matched.insert(GroupKey(key));
                }
            }
            None if keep_unmatched => {
                probe_map.push(Some(row));
                hash_map.push(None);
            }
            None => {}
        }
    }
    Ok(())
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{PrimitiveColumn, StringColumn};
    use crate::types::Scalar;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn left_frame() -> DataFrame {
        init_logs();
        DataFrame::from_columns(vec![
            StringColumn::from_values("key", [Some("a"), Some("b"), None, Some("c")]).into(),
            PrimitiveColumn::<i32>::from_slice("l", &[1, 2, 3, 4]).into(),
        ])
        .unwrap()
    }

    fn right_frame() -> DataFrame {
        DataFrame::from_columns(vec![
            StringColumn::from_values("key", [Some("b"), Some("b"), None, Some("d")]).into(),
            PrimitiveColumn::<i32>::from_slice("r", &[10, 20, 30, 40]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn positional_left_join_pads_the_shorter_side() {
        let left = left_frame();
        let short = DataFrame::from_columns(vec![
            PrimitiveColumn::<i32>::from_slice("r", &[7, 8]).into()
        ])
        .unwrap();
        let joined = left.join(&short, "_left", "_right", JoinAlgorithm::Left).unwrap();
        assert_eq!(joined.row_count(), 4);
        let r = joined.column("r").unwrap();
        assert_eq!(r.get(1).unwrap(), Scalar::Int32(8));
        assert_eq!(r.get(2).unwrap(), Scalar::Null);
        assert_eq!(r.get(3).unwrap(), Scalar::Null);
    }

    #[test]
    fn positional_inner_and_outer_pick_min_and_max() {
        let left = left_frame();
        let short = DataFrame::from_columns(vec![
            PrimitiveColumn::<i32>::from_slice("r", &[7, 8]).into()
        ])
        .unwrap();
        let inner = left.join(&short, "_l", "_r", JoinAlgorithm::Inner).unwrap();
        assert_eq!(inner.row_count(), 2);
        let outer = left.join(&short, "_l", "_r", JoinAlgorithm::FullOuter).unwrap();
        assert_eq!(outer.row_count(), 4);
        let right = left.join(&short, "_l", "_r", JoinAlgorithm::Right).unwrap();
        assert_eq!(right.row_count(), 2);
        assert_eq!(right.column("l").unwrap().get(1).unwrap(), Scalar::Int32(2));
    }

    #[test]
    fn left_merge_fans_out_and_pads() {
        let joined = left_frame()
            .merge(&right_frame(), "key", "key", "_left", "_right", JoinAlgorithm::Left)
            .unwrap();
        // a -> no match (padded), b -> two matches, null -> null row, c -> padded
        assert_eq!(joined.row_count(), 5);
        let l = joined.column("l").unwrap();
        let r = joined.column("r").unwrap();
        assert_eq!(l.get(0).unwrap(), Scalar::Int32(1));
        assert_eq!(r.get(0).unwrap(), Scalar::Null);
        assert_eq!(r.get(1).unwrap(), Scalar::Int32(10));
        assert_eq!(r.get(2).unwrap(), Scalar::Int32(20));
        // null probe key matched the null hash row, not any value
        assert_eq!(l.get(3).unwrap(), Scalar::Int32(3));
        assert_eq!(r.get(3).unwrap(), Scalar::Int32(30));
        assert_eq!(r.get(4).unwrap(), Scalar::Null);
    }

    #[test]
    fn inner_merge_keeps_matches_only() {
        let joined = left_frame()
            .merge(&right_frame(), "key", "key", "_left", "_right", JoinAlgorithm::Inner)
            .unwrap();
        // matches: b (x2) and the null pair
        assert_eq!(joined.row_count(), 3);
        for row in 0..joined.row_count() {
            assert_ne!(joined.column("l").unwrap().get(row).unwrap(), Scalar::Null);
        }
    }

    #[test]
    fn full_outer_merge_appends_unmatched_hash_rows() {
        let joined = left_frame()
            .merge(&right_frame(), "key", "key", "_left", "_right", JoinAlgorithm::FullOuter)
            .unwrap();
        // left pass emits 5 rows (as in the left merge); "d" is appended after
        assert_eq!(joined.row_count(), 6);
        let last = joined.row_count() - 1;
        assert_eq!(joined.column("l").unwrap().get(last).unwrap(), Scalar::Null);
        assert_eq!(
            joined.column("r").unwrap().get(last).unwrap(),
            Scalar::Int32(40)
        );
    }

    #[test]
    fn colliding_names_get_iterated_suffixes() {
        let joined = left_frame()
            .merge(&right_frame(), "key", "key", "_left", "_right", JoinAlgorithm::Left)
            .unwrap();
        let names: Vec<&str> = joined.column_names().collect();
        assert!(names.contains(&"key_left"));
        assert!(names.contains(&"key_right"));
        assert!(names.contains(&"l"));
        assert!(names.contains(&"r"));
    }

    #[test]
    fn missing_key_column_is_an_error() {
        let result = left_frame().merge(
            &right_frame(),
            "nope",
            "key",
            "_l",
            "_r",
            JoinAlgorithm::Left,
        );
        assert!(matches!(result, Err(TabularError::ColumnNotFound(_))));
    }
}
