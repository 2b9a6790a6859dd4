//! Pure, generic numeric kernels over a `PrimitiveContainer`.
//!
//! One generic body per operation, parametrized by `NativeType`. Reductions
//! ignore null entries and return `None` when no valid value exists; in-place
//! transforms (`abs`, `round`, cumulative ops) leave null entries null and
//! carry the accumulator across them.
//!
//! `abs` and `round` compute through an `f64` intermediate and cast back with
//! truncating (`as`) semantics, matching the engine's narrowing-cast rules.

use crate::error::TabularError;
use crate::storage::PrimitiveContainer;
use crate::traits::NativeType;

//==================================================================================
// 1. Whole-column reductions
//==================================================================================

fn reduce<T: NativeType>(
    container: &PrimitiveContainer<T>,
    combine: impl Fn(T, T) -> T,
) -> Option<T> {
    let mut accumulator: Option<T> = None;
    for value in container.iter().flatten() {
        accumulator = Some(match accumulator {
            Some(acc) => combine(acc, value),
            None => value,
        });
    }
    accumulator
}

pub fn sum<T: NativeType>(container: &PrimitiveContainer<T>) -> Option<T> {
    reduce(container, |a, b| a.add_wrapped(b))
}

pub fn product<T: NativeType>(container: &PrimitiveContainer<T>) -> Option<T> {
    reduce(container, |a, b| a.mul_wrapped(b))
}

pub fn min<T: NativeType>(container: &PrimitiveContainer<T>) -> Option<T> {
    reduce(container, |a, b| if b.total_cmp(&a).is_lt() { b } else { a })
}

pub fn max<T: NativeType>(container: &PrimitiveContainer<T>) -> Option<T> {
    reduce(container, |a, b| if b.total_cmp(&a).is_gt() { b } else { a })
}

//==================================================================================
// 2. Row-subset reductions (the group-by path)
//==================================================================================

fn reduce_at<T: NativeType>(
    container: &PrimitiveContainer<T>,
    rows: impl IntoIterator<Item = usize>,
    combine: impl Fn(T, T) -> T,
) -> Result<Option<T>, TabularError> {
    let mut accumulator: Option<T> = None;
    for row in rows {
        if let Some(value) = container.get(row)? {
            accumulator = Some(match accumulator {
                Some(acc) => combine(acc, value),
                None => value,
            });
        }
    }
    Ok(accumulator)
}

pub fn sum_at<T: NativeType>(
    container: &PrimitiveContainer<T>,
    rows: impl IntoIterator<Item = usize>,
) -> Result<Option<T>, TabularError> {
    reduce_at(container, rows, |a, b| a.add_wrapped(b))
}

pub fn product_at<T: NativeType>(
    container: &PrimitiveContainer<T>,
    rows: impl IntoIterator<Item = usize>,
) -> Result<Option<T>, TabularError> {
    reduce_at(container, rows, |a, b| a.mul_wrapped(b))
}

pub fn min_at<T: NativeType>(
    container: &PrimitiveContainer<T>,
    rows: impl IntoIterator<Item = usize>,
) -> Result<Option<T>, TabularError> {
    reduce_at(container, rows, |a, b| if b.total_cmp(&a).is_lt() { b } else { a })
}

pub fn max_at<T: NativeType>(
    container: &PrimitiveContainer<T>,
    rows: impl IntoIterator<Item = usize>,
) -> Result<Option<T>, TabularError> {
    reduce_at(container, rows, |a, b| if b.total_cmp(&a).is_gt() { b } else { a })
}

//==================================================================================
// 3. In-place transforms
//==================================================================================

fn map_in_place<T: NativeType>(
    container: &mut PrimitiveContainer<T>,
    transform: impl Fn(T) -> T,
) -> Result<(), TabularError> {
    for index in 0..container.len() {
        if let Some(value) = container.get(index)? {
            container.set(index, Some(transform(value)))?;
        }
    }
    Ok(())
}

pub fn abs<T: NativeType>(container: &mut PrimitiveContainer<T>) -> Result<(), TabularError> {
    map_in_place(container, |v| T::from_f64_trunc(v.to_f64_lossy().abs()))
}

pub fn round<T: NativeType>(container: &mut PrimitiveContainer<T>) -> Result<(), TabularError> {
    map_in_place(container, |v| T::from_f64_trunc(v.to_f64_lossy().round()))
}

//==================================================================================
// 4. Cumulative ops
//==================================================================================

fn cumulative<T: NativeType>(
    container: &mut PrimitiveContainer<T>,
    rows: impl IntoIterator<Item = usize>,
    combine: impl Fn(T, T) -> T,
) -> Result<(), TabularError> {
    let mut accumulator: Option<T> = None;
    for row in rows {
        if let Some(value) = container.get(row)? {
            let next = match accumulator {
                Some(acc) => combine(acc, value),
                None => value,
            };
            container.set(row, Some(next))?;
            accumulator = Some(next);
        }
    }
    Ok(())
}

pub fn cumulative_sum<T: NativeType>(
    container: &mut PrimitiveContainer<T>,
) -> Result<(), TabularError> {
    let rows = 0..container.len();
    cumulative(container, rows, |a, b| a.add_wrapped(b))
}

pub fn cumulative_product<T: NativeType>(
    container: &mut PrimitiveContainer<T>,
) -> Result<(), TabularError> {
    let rows = 0..container.len();
    cumulative(container, rows, |a, b| a.mul_wrapped(b))
}

pub fn cumulative_min<T: NativeType>(
    container: &mut PrimitiveContainer<T>,
) -> Result<(), TabularError> {
    let rows = 0..container.len();
    cumulative(container, rows, |a, b| if b.total_cmp(&a).is_lt() { b } else { a })
}

pub fn cumulative_max<T: NativeType>(
    container: &mut PrimitiveContainer<T>,
) -> Result<(), TabularError> {
    let rows = 0..container.len();
    cumulative(container, rows, |a, b| if b.total_cmp(&a).is_gt() { b } else { a })
}

/// Row-subset cumulative sum: only the named rows are rewritten.
pub fn cumulative_sum_at<T: NativeType>(
    container: &mut PrimitiveContainer<T>,
    rows: impl IntoIterator<Item = usize>,
) -> Result<(), TabularError> {
    cumulative(container, rows, |a, b| a.add_wrapped(b))
}

/// Row-subset cumulative product: only the named rows are rewritten.
pub fn cumulative_product_at<T: NativeType>(
    container: &mut PrimitiveContainer<T>,
    rows: impl IntoIterator<Item = usize>,
) -> Result<(), TabularError> {
    cumulative(container, rows, |a, b| a.mul_wrapped(b))
}

/// Row-subset running minimum: only the named rows are rewritten.
pub fn cumulative_min_at<T: NativeType>(
    container: &mut PrimitiveContainer<T>,
    rows: impl IntoIterator<Item = usize>,
) -> Result<(), TabularError> {
    cumulative(container, rows, |a, b| if b.total_cmp(&a).is_lt() { b } else { a })
}

/// Row-subset running maximum: only the named rows are rewritten.
pub fn cumulative_max_at<T: NativeType>(
    container: &mut PrimitiveContainer<T>,
    rows: impl IntoIterator<Item = usize>,
) -> Result<(), TabularError> {
    cumulative(container, rows, |a, b| if b.total_cmp(&a).is_gt() { b } else { a })
}
