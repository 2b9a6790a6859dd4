//! Dynamically-typed cell values.
//!
//! `Scalar` is the engine's "one row of one column" currency: dynamic cell
//! get/set, group keys, merge row assembly and row-major views all move cells
//! through it. Typed fast paths never touch it; only the row-at-a-time
//! surfaces do.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::types::DataType;

/// A single, possibly-null cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Boolean(bool),
    Utf8(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// The type tag of the carried value; `None` for `Null`.
    pub fn data_type(&self) -> Option<DataType> {
        Some(match self {
            Scalar::Null => return None,
            Scalar::Int8(_) => DataType::Int8,
            Scalar::Int16(_) => DataType::Int16,
            Scalar::Int32(_) => DataType::Int32,
            Scalar::Int64(_) => DataType::Int64,
            Scalar::UInt8(_) => DataType::UInt8,
            Scalar::UInt16(_) => DataType::UInt16,
            Scalar::UInt32(_) => DataType::UInt32,
            Scalar::UInt64(_) => DataType::UInt64,
            Scalar::Float32(_) => DataType::Float32,
            Scalar::Float64(_) => DataType::Float64,
            Scalar::Boolean(_) => DataType::Boolean,
            Scalar::Utf8(_) => DataType::Utf8,
        })
    }

    /// Lossy numeric view, used by the description statistics.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int8(v) => Some(*v as f64),
            Scalar::Int16(v) => Some(*v as f64),
            Scalar::Int32(v) => Some(*v as f64),
            Scalar::Int64(v) => Some(*v as f64),
            Scalar::UInt8(v) => Some(*v as f64),
            Scalar::UInt16(v) => Some(*v as f64),
            Scalar::UInt32(v) => Some(*v as f64),
            Scalar::UInt64(v) => Some(*v as f64),
            Scalar::Float32(v) => Some(*v as f64),
            Scalar::Float64(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Int8(v) => write!(f, "{v}"),
            Scalar::Int16(v) => write!(f, "{v}"),
            Scalar::Int32(v) => write!(f, "{v}"),
            Scalar::Int64(v) => write!(f, "{v}"),
            Scalar::UInt8(v) => write!(f, "{v}"),
            Scalar::UInt16(v) => write!(f, "{v}"),
            Scalar::UInt32(v) => write!(f, "{v}"),
            Scalar::UInt64(v) => write!(f, "{v}"),
            Scalar::Float32(v) => write!(f, "{v}"),
            Scalar::Float64(v) => write!(f, "{v}"),
            Scalar::Boolean(v) => write!(f, "{v}"),
            Scalar::Utf8(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_scalar_from {
    ($T:ty, $VARIANT:ident) => {
        impl From<$T> for Scalar {
            fn from(value: $T) -> Self {
                Scalar::$VARIANT(value)
            }
        }
        impl From<Option<$T>> for Scalar {
            fn from(value: Option<$T>) -> Self {
                match value {
                    Some(v) => Scalar::$VARIANT(v),
                    None => Scalar::Null,
                }
            }
        }
    };
}

impl_scalar_from!(i8, Int8);
impl_scalar_from!(i16, Int16);
impl_scalar_from!(i32, Int32);
impl_scalar_from!(i64, Int64);
impl_scalar_from!(u8, UInt8);
impl_scalar_from!(u16, UInt16);
impl_scalar_from!(u32, UInt32);
impl_scalar_from!(u64, UInt64);
impl_scalar_from!(f32, Float32);
impl_scalar_from!(f64, Float64);
impl_scalar_from!(bool, Boolean);
impl_scalar_from!(String, Utf8);

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Utf8(value.to_owned())
    }
}

/// A `Scalar` wrapper usable as a hash-map key.
///
/// Floats hash and compare bit-exactly: `NaN` equals itself as a group key and
/// `0.0`/`-0.0` form distinct groups. `Null` is its own sentinel key.
#[derive(Debug, Clone)]
pub struct GroupKey(pub Scalar);

// Equality must agree with the bit-exact `Hash` below, so floats compare by
// bit pattern here too. IEEE `==` would split NaN keys into singleton groups
// and collapse `0.0`/`-0.0`.
impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Scalar::Float32(a), Scalar::Float32(b)) => a.to_bits() == b.to_bits(),
            (Scalar::Float64(a), Scalar::Float64(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.0).hash(state);
        match &self.0 {
            Scalar::Null => {}
            Scalar::Int8(v) => v.hash(state),
            Scalar::Int16(v) => v.hash(state),
            Scalar::Int32(v) => v.hash(state),
            Scalar::Int64(v) => v.hash(state),
            Scalar::UInt8(v) => v.hash(state),
            Scalar::UInt16(v) => v.hash(state),
            Scalar::UInt32(v) => v.hash(state),
            Scalar::UInt64(v) => v.hash(state),
            Scalar::Float32(v) => v.to_bits().hash(state),
            Scalar::Float64(v) => v.to_bits().hash(state),
            Scalar::Boolean(v) => v.hash(state),
            Scalar::Utf8(v) => v.hash(state),
        }
    }
}
