//! This module defines the canonical, type-safe representation of element types
//! used throughout the tabular engine.

use arrow::datatypes::DataType as ArrowDataType;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TabularError;

/// The canonical, internal representation of a column element type.
///
/// The set is closed: every `Column` variant carries exactly one of these tags,
/// resolved once when the column is created. Operations dispatch on the tag
/// (or on the enum variant) rather than re-inspecting element types per call.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Boolean,
    Utf8,
}

impl DataType {
    /// Converts an Arrow `DataType` into a tabular `DataType`.
    pub fn from_arrow_type(arrow_type: &ArrowDataType) -> Result<Self, TabularError> {
        match arrow_type {
            ArrowDataType::Int8 => Ok(Self::Int8),
            ArrowDataType::Int16 => Ok(Self::Int16),
            ArrowDataType::Int32 => Ok(Self::Int32),
            ArrowDataType::Int64 => Ok(Self::Int64),
            ArrowDataType::UInt8 => Ok(Self::UInt8),
            ArrowDataType::UInt16 => Ok(Self::UInt16),
            ArrowDataType::UInt32 => Ok(Self::UInt32),
            ArrowDataType::UInt64 => Ok(Self::UInt64),
            ArrowDataType::Float32 => Ok(Self::Float32),
            ArrowDataType::Float64 => Ok(Self::Float64),
            ArrowDataType::Boolean => Ok(Self::Boolean),
            ArrowDataType::Utf8 => Ok(Self::Utf8),
            dt => Err(TabularError::UnsupportedOperation(format!(
                "Cannot convert Arrow type {:?} to a tabular DataType",
                dt
            ))),
        }
    }

    /// Converts a tabular `DataType` back into an Arrow `DataType`.
    pub fn to_arrow_type(&self) -> ArrowDataType {
        match self {
            Self::Int8 => ArrowDataType::Int8,
            Self::Int16 => ArrowDataType::Int16,
            Self::Int32 => ArrowDataType::Int32,
            Self::Int64 => ArrowDataType::Int64,
            Self::UInt8 => ArrowDataType::UInt8,
            Self::UInt16 => ArrowDataType::UInt16,
            Self::UInt32 => ArrowDataType::UInt32,
            Self::UInt64 => ArrowDataType::UInt64,
            Self::Float32 => ArrowDataType::Float32,
            Self::Float64 => ArrowDataType::Float64,
            Self::Boolean => ArrowDataType::Boolean,
            Self::Utf8 => ArrowDataType::Utf8,
        }
    }

    /// Returns `true` if the data type is a signed integer.
    pub fn is_signed_int(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Returns `true` if the data type is an unsigned integer.
    pub fn is_unsigned_int(&self) -> bool {
        matches!(
            self,
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64
        )
    }

    /// Returns `true` if the data type is a floating-point number.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Returns `true` for every arithmetic-capable element type.
    pub fn is_numeric(&self) -> bool {
        self.is_signed_int() || self.is_unsigned_int() || self.is_float()
    }
}

/// Provides the canonical string representation for a `DataType`.
impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // These string representations are part of the public contract.
        // They match the Arrow `DataType` string representation.
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_roundtrip() {
        for dt in [
            DataType::Int8,
            DataType::UInt64,
            DataType::Float32,
            DataType::Boolean,
            DataType::Utf8,
        ] {
            assert_eq!(DataType::from_arrow_type(&dt.to_arrow_type()).unwrap(), dt);
        }
    }

    #[test]
    fn unsupported_arrow_type_errors() {
        let result = DataType::from_arrow_type(&ArrowDataType::Date32);
        assert!(result.is_err());
    }

    #[test]
    fn numeric_predicates() {
        assert!(DataType::Int32.is_numeric());
        assert!(DataType::Float64.is_float());
        assert!(!DataType::Boolean.is_numeric());
        assert!(!DataType::Utf8.is_numeric());
    }
}
