// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Supported element data types and numeric promotion.

use crate::MetaError;
use std::fmt;
use std::str::FromStr;

/// Enumerates the numeric types an expression operand can hold.
///
/// The planner uses `DType` to pick result types, to size per-tile byte
/// offsets, and as part of the kernel-implementation cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    U16,
    /// 32-bit unsigned integer.
    U32,
    /// 64-bit unsigned integer.
    U64,
    /// 8-bit signed integer.
    I8,
    /// 16-bit signed integer.
    I16,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 16-bit IEEE 754 floating point.
    F16,
    /// 16-bit brain floating point.
    BF16,
    /// 32-bit IEEE 754 floating point.
    F32,
    /// 64-bit IEEE 754 floating point.
    F64,
}

impl DType {
    /// Every supported dtype, in declaration order.
    pub const ALL: [DType; 12] = [
        DType::U8,
        DType::U16,
        DType::U32,
        DType::U64,
        DType::I8,
        DType::I16,
        DType::I32,
        DType::I64,
        DType::F16,
        DType::BF16,
        DType::F32,
        DType::F64,
    ];

    /// Returns the size of a single element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            DType::U8 | DType::I8 => 1,
            DType::U16 | DType::I16 | DType::F16 | DType::BF16 => 2,
            DType::U32 | DType::I32 | DType::F32 => 4,
            DType::U64 | DType::I64 | DType::F64 => 8,
        }
    }

    /// Returns a human-readable label for this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::U8 => "u8",
            DType::U16 => "u16",
            DType::U32 => "u32",
            DType::U64 => "u64",
            DType::I8 => "i8",
            DType::I16 => "i16",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::F16 => "f16",
            DType::BF16 => "bf16",
            DType::F32 => "f32",
            DType::F64 => "f64",
        }
    }

    /// Returns `true` for the floating-point types.
    pub fn is_float(self) -> bool {
        matches!(self, DType::F16 | DType::BF16 | DType::F32 | DType::F64)
    }

    /// Returns `true` for the integer types, signed or not.
    pub fn is_integral(self) -> bool {
        !self.is_float()
    }

    /// Returns `true` for the signed integer and floating-point types.
    pub fn is_signed(self) -> bool {
        !matches!(self, DType::U8 | DType::U16 | DType::U32 | DType::U64)
    }

    /// The signed integer type of the given width, capped at 64 bits.
    fn signed_of_width(bytes: usize) -> DType {
        match bytes {
            0 | 1 => DType::I8,
            2 => DType::I16,
            3 | 4 => DType::I32,
            _ => DType::I64,
        }
    }

    /// Smallest signed integer type that holds every value of `self`.
    ///
    /// Unsigned types widen (`u8` → `i16`, ..., `u64` → `i64`, which is
    /// the widest available). Signed and floating-point types are returned
    /// unchanged.
    pub fn to_signed(self) -> DType {
        if self.is_signed() {
            self
        } else {
            Self::signed_of_width(self.size_bytes() * 2)
        }
    }

    /// Standard binary arithmetic promotion.
    ///
    /// - Equal types promote to themselves.
    /// - Float with float promotes to the wider one; `f16` with `bf16`
    ///   promotes to `f32`.
    /// - Float with integer promotes to the float.
    /// - Integers of equal signedness promote to the wider one.
    /// - Mixed-signedness integers promote to the signed operand when it is
    ///   strictly wider, otherwise to the signed type of twice the wider
    ///   width (capped at `i64`).
    ///
    /// The function is symmetric and total over [`DType::ALL`].
    pub fn promote(self, other: DType) -> DType {
        if self == other {
            return self;
        }
        match (self.is_float(), other.is_float()) {
            (true, true) => {
                if self.size_bytes() == other.size_bytes() {
                    // f16 vs bf16: neither represents the other.
                    DType::F32
                } else if self.size_bytes() > other.size_bytes() {
                    self
                } else {
                    other
                }
            }
            (true, false) => self,
            (false, true) => other,
            (false, false) => {
                if self.is_signed() == other.is_signed() {
                    if self.size_bytes() >= other.size_bytes() {
                        self
                    } else {
                        other
                    }
                } else {
                    let (signed, unsigned) = if self.is_signed() {
                        (self, other)
                    } else {
                        (other, self)
                    };
                    if signed.size_bytes() > unsigned.size_bytes() {
                        signed
                    } else {
                        Self::signed_of_width(unsigned.size_bytes() * 2)
                    }
                }
            }
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DType {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        DType::ALL
            .into_iter()
            .find(|d| d.as_str() == lower)
            .ok_or_else(|| MetaError::UnknownDType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_bytes() {
        assert_eq!(DType::U8.size_bytes(), 1);
        assert_eq!(DType::BF16.size_bytes(), 2);
        assert_eq!(DType::I32.size_bytes(), 4);
        assert_eq!(DType::F64.size_bytes(), 8);
    }

    #[test]
    fn test_parse_roundtrip() {
        for d in DType::ALL {
            assert_eq!(d.as_str().parse::<DType>().unwrap(), d);
        }
        assert_eq!("F32".parse::<DType>().unwrap(), DType::F32);
        assert!("f128".parse::<DType>().is_err());
    }

    #[test]
    fn test_promote_floats() {
        assert_eq!(DType::F16.promote(DType::F32), DType::F32);
        assert_eq!(DType::F64.promote(DType::F32), DType::F64);
        assert_eq!(DType::F16.promote(DType::BF16), DType::F32);
    }

    #[test]
    fn test_promote_mixed_int_float() {
        assert_eq!(DType::I64.promote(DType::F16), DType::F16);
        assert_eq!(DType::F32.promote(DType::U8), DType::F32);
    }

    #[test]
    fn test_promote_same_signedness() {
        assert_eq!(DType::I8.promote(DType::I32), DType::I32);
        assert_eq!(DType::U64.promote(DType::U16), DType::U64);
    }

    #[test]
    fn test_promote_mixed_signedness() {
        assert_eq!(DType::I8.promote(DType::U8), DType::I16);
        assert_eq!(DType::U16.promote(DType::I32), DType::I32);
        assert_eq!(DType::U32.promote(DType::I16), DType::I64);
        assert_eq!(DType::U64.promote(DType::I64), DType::I64);
    }

    #[test]
    fn test_promote_symmetric_and_total() {
        for a in DType::ALL {
            for b in DType::ALL {
                assert_eq!(a.promote(b), b.promote(a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_to_signed() {
        assert_eq!(DType::U8.to_signed(), DType::I16);
        assert_eq!(DType::U64.to_signed(), DType::I64);
        assert_eq!(DType::I8.to_signed(), DType::I8);
        assert_eq!(DType::F32.to_signed(), DType::F32);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&DType::BF16).unwrap();
        assert_eq!(json, "\"bf16\"");
        let back: DType = serde_json::from_str("\"u16\"").unwrap();
        assert_eq!(back, DType::U16);
    }
}
