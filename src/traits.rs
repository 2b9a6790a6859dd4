//! This module defines the shared numeric trait that every generic kernel is
//! written against.
//!
//! The closed set of supported primitive element types implements `NativeType`
//! exactly once, via the macros below. Kernels, containers and columns are all
//! parametrized over this trait, so there is a single generic body per
//! operation instead of one hand-written copy per element type.

use std::cmp::Ordering;
use std::fmt::{Debug, Display};

use arrow::datatypes::ArrowNativeType;
use num_traits::{AsPrimitive, Bounded, Num, NumCast};

use crate::types::{DataType, Scalar};

/// The numeric element types a `PrimitiveColumn` can hold.
///
/// Integer arithmetic wraps (matching the narrowing-cast overflow semantics of
/// two's-complement hardware); floats use IEEE arithmetic. `total_cmp` must be
/// a total order so sort keys can live in ordered maps.
pub trait NativeType:
    Copy
    + Debug
    + Display
    + Default
    + PartialEq
    + PartialOrd
    + Num
    + NumCast
    + Bounded
    + bytemuck::Pod
    + ArrowNativeType
    + AsPrimitive<f64>
    + Send
    + Sync
    + 'static
{
    /// The runtime type tag for this element type.
    const DATA_TYPE: DataType;
    /// Whether bit-shift operators are defined for this type (integers only).
    const SUPPORTS_SHIFT: bool;

    fn add_wrapped(self, rhs: Self) -> Self;
    fn sub_wrapped(self, rhs: Self) -> Self;
    fn mul_wrapped(self, rhs: Self) -> Self;
    /// `None` when dividing by an integer zero. Float division never fails.
    fn div_checked(self, rhs: Self) -> Option<Self>;
    /// `None` when taking a remainder by an integer zero.
    fn rem_checked(self, rhs: Self) -> Option<Self>;
    fn shl_wrapped(self, by: u32) -> Self;
    fn shr_wrapped(self, by: u32) -> Self;

    /// A total order: integer `cmp`, IEEE-754 `total_cmp` for floats.
    fn total_cmp(&self, other: &Self) -> Ordering;

    fn to_f64_lossy(self) -> f64 {
        self.as_()
    }
    /// Cast-truncating conversion back from the `f64` intermediate, i.e. `as`
    /// semantics for narrow integers.
    fn from_f64_trunc(value: f64) -> Self;

    /// Wrap the value into the matching `Scalar` variant.
    fn to_scalar(self) -> Scalar;
    /// Extract from the matching `Scalar` variant; `None` on a type mismatch
    /// or on `Scalar::Null`.
    fn from_scalar(scalar: &Scalar) -> Option<Self>;
}

// Implement the trait for the closed set of integer element types.
macro_rules! impl_native_int {
    ($T:ty, $TAG:ident) => {
        impl NativeType for $T {
            const DATA_TYPE: DataType = DataType::$TAG;
            const SUPPORTS_SHIFT: bool = true;

            fn add_wrapped(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
            fn sub_wrapped(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
            fn mul_wrapped(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
            fn div_checked(self, rhs: Self) -> Option<Self> {
                self.checked_div(rhs)
            }
            fn rem_checked(self, rhs: Self) -> Option<Self> {
                self.checked_rem(rhs)
            }
            fn shl_wrapped(self, by: u32) -> Self {
                self.wrapping_shl(by)
            }
            fn shr_wrapped(self, by: u32) -> Self {
                self.wrapping_shr(by)
            }
            fn total_cmp(&self, other: &Self) -> Ordering {
                Ord::cmp(self, other)
            }
            fn from_f64_trunc(value: f64) -> Self {
                value as $T
            }
            fn to_scalar(self) -> Scalar {
                Scalar::$TAG(self)
            }
            fn from_scalar(scalar: &Scalar) -> Option<Self> {
                match scalar {
                    Scalar::$TAG(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

// And for the float element types. Shifts are rejected upstream; the bodies
// here are unreachable through public APIs.
macro_rules! impl_native_float {
    ($T:ty, $TAG:ident) => {
        impl NativeType for $T {
            const DATA_TYPE: DataType = DataType::$TAG;
            const SUPPORTS_SHIFT: bool = false;

            fn add_wrapped(self, rhs: Self) -> Self {
                self + rhs
            }
            fn sub_wrapped(self, rhs: Self) -> Self {
                self - rhs
            }
            fn mul_wrapped(self, rhs: Self) -> Self {
                self * rhs
            }
            fn div_checked(self, rhs: Self) -> Option<Self> {
                Some(self / rhs)
            }
            fn rem_checked(self, rhs: Self) -> Option<Self> {
                Some(self % rhs)
            }
            fn shl_wrapped(self, _by: u32) -> Self {
                self
            }
            fn shr_wrapped(self, _by: u32) -> Self {
                self
            }
            fn total_cmp(&self, other: &Self) -> Ordering {
                <$T>::total_cmp(self, other)
            }
            fn from_f64_trunc(value: f64) -> Self {
                value as $T
            }
            fn to_scalar(self) -> Scalar {
                Scalar::$TAG(self)
            }
            fn from_scalar(scalar: &Scalar) -> Option<Self> {
                match scalar {
                    Scalar::$TAG(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

impl_native_int!(i8, Int8);
impl_native_int!(i16, Int16);
impl_native_int!(i32, Int32);
impl_native_int!(i64, Int64);
impl_native_int!(u8, UInt8);
impl_native_int!(u16, UInt16);
impl_native_int!(u32, UInt32);
impl_native_int!(u64, UInt64);
impl_native_float!(f32, Float32);
impl_native_float!(f64, Float64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic_wraps() {
        assert_eq!(255u8.add_wrapped(1), 0);
        assert_eq!(i8::MIN.sub_wrapped(1), i8::MAX);
        assert_eq!(200u8.mul_wrapped(2), 144);
    }

    #[test]
    fn integer_division_by_zero_is_none() {
        assert_eq!(7i32.div_checked(0), None);
        assert_eq!(7i32.rem_checked(0), None);
        assert_eq!(7.0f64.div_checked(0.0), Some(f64::INFINITY));
    }

    #[test]
    fn trunc_cast_matches_as_semantics() {
        assert_eq!(u8::from_f64_trunc(300.7), 255); // saturating `as` cast
        assert_eq!(i32::from_f64_trunc(-2.9), -2);
    }

    #[test]
    fn float_total_order_is_total() {
        let mut values = [f64::NAN, 1.0, -1.0, f64::NEG_INFINITY];
        values.sort_by(|a, b| NativeType::total_cmp(a, b));
        assert_eq!(values[0], f64::NEG_INFINITY);
        assert!(values[3].is_nan());
    }
}
