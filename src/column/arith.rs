//! Elementwise arithmetic and comparison over `Column` pairs.
//!
//! Same-type operands run the typed kernel directly. Mixed numeric operands
//! both widen to `f64` first. Bool arithmetic, logic on non-bool columns, and
//! any arithmetic on strings are eager errors.

use crate::column::{BooleanColumn, Column, StringColumn};
use crate::error::TabularError;
use crate::traits::NativeType;
use crate::types::Scalar;

/// Same-variant numeric pairs run without conversion; everything else falls
/// through to `$otherwise`.
macro_rules! same_type_zip {
    ($lhs:expr, $rhs:expr, $a:ident, $b:ident => $body:expr, $otherwise:expr) => {
        match ($lhs, $rhs) {
            (Column::Int8($a), Column::Int8($b)) => Column::Int8($body),
            (Column::Int16($a), Column::Int16($b)) => Column::Int16($body),
            (Column::Int32($a), Column::Int32($b)) => Column::Int32($body),
            (Column::Int64($a), Column::Int64($b)) => Column::Int64($body),
            (Column::UInt8($a), Column::UInt8($b)) => Column::UInt8($body),
            (Column::UInt16($a), Column::UInt16($b)) => Column::UInt16($body),
            (Column::UInt32($a), Column::UInt32($b)) => Column::UInt32($body),
            (Column::UInt64($a), Column::UInt64($b)) => Column::UInt64($body),
            (Column::Float32($a), Column::Float32($b)) => Column::Float32($body),
            (Column::Float64($a), Column::Float64($b)) => Column::Float64($body),
            _ => $otherwise,
        }
    };
}

macro_rules! same_type_compare {
    ($lhs:expr, $rhs:expr, $a:ident, $b:ident => $body:expr, $otherwise:expr) => {
        match ($lhs, $rhs) {
            (Column::Int8($a), Column::Int8($b)) => $body,
            (Column::Int16($a), Column::Int16($b)) => $body,
            (Column::Int32($a), Column::Int32($b)) => $body,
            (Column::Int64($a), Column::Int64($b)) => $body,
            (Column::UInt8($a), Column::UInt8($b)) => $body,
            (Column::UInt16($a), Column::UInt16($b)) => $body,
            (Column::UInt32($a), Column::UInt32($b)) => $body,
            (Column::UInt64($a), Column::UInt64($b)) => $body,
            (Column::Float32($a), Column::Float32($b)) => $body,
            (Column::Float64($a), Column::Float64($b)) => $body,
            _ => $otherwise,
        }
    };
}

fn not_arithmetic(op: &str, lhs: &Column, rhs: &Column) -> TabularError {
    TabularError::UnsupportedOperation(format!(
        "{op} is not defined between {} and {} columns",
        lhs.data_type(),
        rhs.data_type()
    ))
}

#[derive(Clone, Copy)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    fn name(self) -> &'static str {
        match self {
            BinOp::Add => "addition",
            BinOp::Sub => "subtraction",
            BinOp::Mul => "multiplication",
            BinOp::Div => "division",
            BinOp::Rem => "remainder",
        }
    }

    fn apply<T: NativeType>(
        self,
        lhs: &super::PrimitiveColumn<T>,
        rhs: &super::PrimitiveColumn<T>,
    ) -> Result<super::PrimitiveColumn<T>, TabularError> {
        match self {
            BinOp::Add => lhs.add(rhs),
            BinOp::Sub => lhs.sub(rhs),
            BinOp::Mul => lhs.mul(rhs),
            BinOp::Div => lhs.div(rhs),
            BinOp::Rem => lhs.rem(rhs),
        }
    }

    fn apply_scalar<T: NativeType>(
        self,
        lhs: &super::PrimitiveColumn<T>,
        rhs: T,
    ) -> Result<super::PrimitiveColumn<T>, TabularError> {
        match self {
            BinOp::Add => lhs.add_scalar(rhs),
            BinOp::Sub => lhs.sub_scalar(rhs),
            BinOp::Mul => lhs.mul_scalar(rhs),
            BinOp::Div => lhs.div_scalar(rhs),
            BinOp::Rem => lhs.rem_scalar(rhs),
        }
    }
}

impl Column {
    fn binary(&self, other: &Column, op: BinOp) -> Result<Column, TabularError> {
        Ok(same_type_zip!(self, other, a, b => op.apply(a, b)?, {
            // mixed numeric operands widen to f64
            match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => Column::Float64(op.apply(&a, &b)?),
                _ => return Err(not_arithmetic(op.name(), self, other)),
            }
        }))
    }

    fn binary_scalar(&self, rhs: &Scalar, op: BinOp) -> Result<Column, TabularError> {
        use crate::column::{numeric_dispatch, numeric_rebuild};
        if rhs.is_null() {
            return Err(TabularError::UnsupportedOperation(
                "scalar arithmetic with a null operand".into(),
            ));
        }
        // matching scalar type runs in the column's own lane
        fn matches_lane<T: NativeType>(
            _column: &super::PrimitiveColumn<T>,
            scalar: &Scalar,
        ) -> bool {
            T::from_scalar(scalar).is_some()
        }
        let matched = numeric_dispatch!(self, c => matches_lane(c, rhs), false);
        if matched {
            return Ok(numeric_rebuild!(self, c => {
                let value = NativeType::from_scalar(rhs)
                    .ok_or_else(|| TabularError::Internal("scalar lane mismatch".into()))?;
                op.apply_scalar(c, value)?
            }, unreachable!()));
        }
        match (self.as_f64(), rhs.to_f64()) {
            (Some(column), Some(value)) => {
                Ok(Column::Float64(op.apply_scalar(&column, value)?))
            }
            _ => Err(TabularError::UnsupportedOperation(format!(
                "cannot apply {} between a {} column and {rhs}",
                op.name(),
                self.data_type()
            ))),
        }
    }

    pub fn add(&self, other: &Column) -> Result<Column, TabularError> {
        self.binary(other, BinOp::Add)
    }

    pub fn sub(&self, other: &Column) -> Result<Column, TabularError> {
        self.binary(other, BinOp::Sub)
    }

    pub fn mul(&self, other: &Column) -> Result<Column, TabularError> {
        self.binary(other, BinOp::Mul)
    }

    pub fn div(&self, other: &Column) -> Result<Column, TabularError> {
        self.binary(other, BinOp::Div)
    }

    pub fn rem(&self, other: &Column) -> Result<Column, TabularError> {
        self.binary(other, BinOp::Rem)
    }

    pub fn add_scalar(&self, rhs: &Scalar) -> Result<Column, TabularError> {
        self.binary_scalar(rhs, BinOp::Add)
    }

    pub fn sub_scalar(&self, rhs: &Scalar) -> Result<Column, TabularError> {
        self.binary_scalar(rhs, BinOp::Sub)
    }

    pub fn mul_scalar(&self, rhs: &Scalar) -> Result<Column, TabularError> {
        self.binary_scalar(rhs, BinOp::Mul)
    }

    pub fn div_scalar(&self, rhs: &Scalar) -> Result<Column, TabularError> {
        self.binary_scalar(rhs, BinOp::Div)
    }

    pub fn rem_scalar(&self, rhs: &Scalar) -> Result<Column, TabularError> {
        self.binary_scalar(rhs, BinOp::Rem)
    }

    //==============================================================================
    // Bit shifts
    //==============================================================================

    pub fn shl(&self, by: u32) -> Result<Column, TabularError> {
        use crate::column::numeric_rebuild;
        Ok(numeric_rebuild!(self, c => c.shl(by)?, {
            return Err(TabularError::UnsupportedOperation(format!(
                "bit shifts are not defined for {} columns",
                self.data_type()
            )));
        }))
    }

    pub fn shr(&self, by: u32) -> Result<Column, TabularError> {
        use crate::column::numeric_rebuild;
        Ok(numeric_rebuild!(self, c => c.shr(by)?, {
            return Err(TabularError::UnsupportedOperation(format!(
                "bit shifts are not defined for {} columns",
                self.data_type()
            )));
        }))
    }

    //==============================================================================
    // Logic (boolean columns only)
    //==============================================================================

    pub fn and(&self, other: &Column) -> Result<Column, TabularError> {
        match (self, other) {
            (Column::Boolean(a), Column::Boolean(b)) => Ok(Column::Boolean(a.and(b)?)),
            _ => Err(not_arithmetic("and", self, other)),
        }
    }

    pub fn or(&self, other: &Column) -> Result<Column, TabularError> {
        match (self, other) {
            (Column::Boolean(a), Column::Boolean(b)) => Ok(Column::Boolean(a.or(b)?)),
            _ => Err(not_arithmetic("or", self, other)),
        }
    }

    pub fn xor(&self, other: &Column) -> Result<Column, TabularError> {
        match (self, other) {
            (Column::Boolean(a), Column::Boolean(b)) => Ok(Column::Boolean(a.xor(b)?)),
            _ => Err(not_arithmetic("xor", self, other)),
        }
    }

    //==============================================================================
    // Comparisons
    //==============================================================================

    fn string_view(&self) -> Result<Option<StringColumn>, TabularError> {
        match self {
            Column::Utf8(c) => Ok(Some(c.clone())),
            Column::ArrowUtf8(c) => Ok(Some(c.materialize()?)),
            _ => Ok(None),
        }
    }

    pub fn eq(&self, other: &Column) -> Result<BooleanColumn, TabularError> {
        same_type_compare!(self, other, a, b => a.eq(b), {
            if let (Column::Boolean(a), Column::Boolean(b)) = (self, other) {
                // equal bits xor to 0, so negated xor is elementwise equality
                return Ok(a.xor(b)?.xor_scalar(true));
            }
            if let (Some(a), Some(b)) = (self.string_view()?, other.string_view()?) {
                return a.eq(&b);
            }
            match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.eq(&b),
                _ => Err(not_arithmetic("equality", self, other)),
            }
        })
    }

    pub fn ne(&self, other: &Column) -> Result<BooleanColumn, TabularError> {
        let eq = self.eq(other)?;
        Ok(eq.xor_scalar(true))
    }

    pub fn lt(&self, other: &Column) -> Result<BooleanColumn, TabularError> {
        same_type_compare!(self, other, a, b => a.lt(b), {
            match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.lt(&b),
                _ => Err(not_arithmetic("ordering", self, other)),
            }
        })
    }

    pub fn le(&self, other: &Column) -> Result<BooleanColumn, TabularError> {
        same_type_compare!(self, other, a, b => a.le(b), {
            match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.le(&b),
                _ => Err(not_arithmetic("ordering", self, other)),
            }
        })
    }

    pub fn gt(&self, other: &Column) -> Result<BooleanColumn, TabularError> {
        same_type_compare!(self, other, a, b => a.gt(b), {
            match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.gt(&b),
                _ => Err(not_arithmetic("ordering", self, other)),
            }
        })
    }

    pub fn ge(&self, other: &Column) -> Result<BooleanColumn, TabularError> {
        same_type_compare!(self, other, a, b => a.ge(b), {
            match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.ge(&b),
                _ => Err(not_arithmetic("ordering", self, other)),
            }
        })
    }

    /// Elementwise equality against a single scalar.
    pub fn eq_scalar(&self, rhs: &Scalar) -> Result<BooleanColumn, TabularError> {
        use crate::column::numeric_dispatch;
        match (self, rhs) {
            (Column::Utf8(c), Scalar::Utf8(v)) => return Ok(c.eq_scalar(v)),
            (Column::ArrowUtf8(c), Scalar::Utf8(v)) => return Ok(c.materialize()?.eq_scalar(v)),
            (Column::Boolean(c), Scalar::Boolean(v)) => {
                return Ok(c.xor_scalar(*v).xor_scalar(true))
            }
            _ => {}
        }
        numeric_dispatch!(self, c => {
            match (c.to_f64_column(), rhs.to_f64()) {
                (wide, Some(value)) => Ok(wide.eq_scalar(value)),
                _ => Err(TabularError::UnsupportedOperation(format!(
                    "cannot compare a {} column with {rhs}",
                    self.data_type()
                ))),
            }
        }, Err(TabularError::UnsupportedOperation(format!(
            "cannot compare a {} column with {rhs}",
            self.data_type()
        ))))
    }

    pub fn lt_scalar(&self, rhs: &Scalar) -> Result<BooleanColumn, TabularError> {
        self.ordered_scalar(rhs, |a, b| a < b)
    }

    pub fn gt_scalar(&self, rhs: &Scalar) -> Result<BooleanColumn, TabularError> {
        self.ordered_scalar(rhs, |a, b| a > b)
    }

    fn ordered_scalar(
        &self,
        rhs: &Scalar,
        op: impl Fn(f64, f64) -> bool,
    ) -> Result<BooleanColumn, TabularError> {
        match (self.as_f64(), rhs.to_f64()) {
            (Some(column), Some(value)) => {
                let mut result = BooleanColumn::new(column.name());
                for lhs in column.iter() {
                    result.append(lhs.map(|v| op(v, value)));
                }
                Ok(result)
            }
            _ => Err(TabularError::UnsupportedOperation(format!(
                "cannot compare a {} column with {rhs}",
                self.data_type()
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
    use crate::column::PrimitiveColumn;

    #[test]
    fn same_type_arithmetic_keeps_the_lane() {
        let a: Column = PrimitiveColumn::<i32>::from_slice("a", &[1, 2]).into();
        let b: Column = PrimitiveColumn::<i32>::from_slice("b", &[10, 20]).into();
        let sum = a.add(&b).unwrap();
        assert!(matches!(sum, Column::Int32(_)));
        assert_eq!(sum.get(1).unwrap(), Scalar::Int32(22));
    }

    #[test]
    fn mixed_numeric_arithmetic_widens_to_f64() {
        let a: Column = PrimitiveColumn::<i32>::from_slice("a", &[3]).into();
        let b: Column = PrimitiveColumn::<f32>::from_slice("b", &[0.5]).into();
        let sum = a.add(&b).unwrap();
        assert!(matches!(sum, Column::Float64(_)));
        assert_eq!(sum.get(0).unwrap(), Scalar::Float64(3.5));
    }

    #[test]
    fn string_arithmetic_is_an_eager_error() {
        let a: Column = StringColumn::from_values("a", [Some("x")]).into();
        let b: Column = PrimitiveColumn::<i32>::from_slice("b", &[1]).into();
        assert!(matches!(
            a.add(&b),
            Err(TabularError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn bool_columns_compare_elementwise() {
        let a: Column = BooleanColumn::from_slice("a", &[true, false, true]).into();
        let b: Column = BooleanColumn::from_slice("b", &[true, true, false]).into();
        let eq = a.eq(&b).unwrap();
        assert_eq!(eq.get(0).unwrap(), Some(true));
        assert_eq!(eq.get(1).unwrap(), Some(false));
        let ne = a.ne(&b).unwrap();
        assert_eq!(ne.get(2).unwrap(), Some(true));
    }

    #[test]
    fn bool_arithmetic_rejected_but_logic_allowed() {
        let a: Column = BooleanColumn::from_slice("a", &[true, false]).into();
        let b: Column = BooleanColumn::from_slice("b", &[true, true]).into();
        assert!(a.add(&b).is_err());
        let and = a.and(&b).unwrap();
        assert_eq!(and.get(1).unwrap(), Scalar::Boolean(false));
        let ints: Column = PrimitiveColumn::<i32>::from_slice("i", &[1, 2]).into();
        assert!(ints.and(&b).is_err());
    }

    #[test]
    fn scalar_arithmetic_matches_the_column_lane() {
        let column: Column = PrimitiveColumn::<u8>::from_slice("n", &[250]).into();
        let wrapped = column.add_scalar(&Scalar::UInt8(10)).unwrap();
        assert!(matches!(wrapped, Column::UInt8(_)));
        assert_eq!(wrapped.get(0).unwrap(), Scalar::UInt8(4));

        let widened = column.add_scalar(&Scalar::Float64(0.5)).unwrap();
        assert!(matches!(widened, Column::Float64(_)));
        assert_eq!(widened.get(0).unwrap(), Scalar::Float64(250.5));
    }

    #[test]
    fn mixed_comparison_widens() {
        let a: Column = PrimitiveColumn::<i64>::from_values("a", [Some(5), None]).into();
        let b: Column = PrimitiveColumn::<u8>::from_values("b", [Some(3), Some(1)]).into();
        let gt = a.gt(&b).unwrap();
        assert_eq!(gt.get(0).unwrap(), Some(true));
        assert_eq!(gt.get(1).unwrap(), None);
    }

    #[test]
    fn scalar_equality_covers_strings_and_bools() {
        let strings: Column = StringColumn::from_values("s", [Some("a"), Some("b")]).into();
        let eq = strings.eq_scalar(&Scalar::Utf8("b".into())).unwrap();
        assert_eq!(eq.get(1).unwrap(), Some(true));

        let bools: Column = BooleanColumn::from_slice("b", &[true, false]).into();
        let eq = bools.eq_scalar(&Scalar::Boolean(false)).unwrap();
        assert_eq!(eq.get(0).unwrap(), Some(false));
        assert_eq!(eq.get(1).unwrap(), Some(true));
    }
}
