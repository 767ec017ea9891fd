//! Named constants: one member of an enum or flag registry.

use crate::bitwise::{BitwiseValue, Bits};
use crate::error::ContractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Normalize a raw (possibly signed) driver value to an unsigned 32-bit mask.
///
/// Values below zero wrap by `2^32`, so `-1` becomes `0xffff_ffff`. Values
/// that fit neither `i32` nor `u32` are rejected.
pub fn normalize(raw: i64) -> Result<u32, ContractError> {
    let value = if raw < 0 {
        i32::try_from(raw).map(|v| v as u32)
    } else {
        u32::try_from(raw)
    };
    value.map_err(|_| ContractError::ValueOutOfRange(raw))
}

/// An enum or flag item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedConstant {
    pub name: String,
    pub value: u32,
    pub doc: String,
}

impl NamedConstant {
    pub fn new(
        name: impl Into<String>,
        raw: i64,
        doc: impl Into<String>,
    ) -> Result<Self, ContractError> {
        Ok(Self {
            name: name.into(),
            value: normalize(raw)?,
            doc: doc.into(),
        })
    }

    #[inline]
    pub fn as_bitwise(&self) -> BitwiseValue {
        BitwiseValue(self.value)
    }

    /// True when the value has exactly one bit set.
    #[inline]
    pub fn is_single_bit(&self) -> bool {
        self.value.count_ones() == 1
    }
}

impl Bits for NamedConstant {
    #[inline]
    fn bits(&self) -> u32 {
        self.value
    }
}

impl fmt::Display for NamedConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl<B: Bits> BitAnd<B> for &NamedConstant {
    type Output = BitwiseValue;

    fn bitand(self, rhs: B) -> BitwiseValue {
        self.as_bitwise().and(rhs)
    }
}

impl<B: Bits> BitOr<B> for &NamedConstant {
    type Output = BitwiseValue;

    fn bitor(self, rhs: B) -> BitwiseValue {
        self.as_bitwise().or(rhs)
    }
}

impl BitAnd<&NamedConstant> for u32 {
    type Output = BitwiseValue;

    fn bitand(self, rhs: &NamedConstant) -> BitwiseValue {
        BitwiseValue(self & rhs.value)
    }
}

impl BitOr<&NamedConstant> for u32 {
    type Output = BitwiseValue;

    fn bitor(self, rhs: &NamedConstant) -> BitwiseValue {
        BitwiseValue(self | rhs.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(0), Ok(0));
        assert_eq!(normalize(0x40), Ok(0x40));
        assert_eq!(normalize(-1), Ok(0xffff_ffff));
        assert_eq!(normalize(-2147483648), Ok(0x8000_0000));
        assert_eq!(normalize(-67108864), Ok(0xfc00_0000));
        assert_eq!(normalize(0xffff_ffff), Ok(u32::MAX));
    }

    #[test]
    fn test_normalize_out_of_range() {
        assert_eq!(
            normalize(1 << 32),
            Err(ContractError::ValueOutOfRange(1 << 32))
        );
        assert_eq!(
            normalize(-2147483649),
            Err(ContractError::ValueOutOfRange(-2147483649))
        );
        assert!(NamedConstant::new("wide", 0x1_0000_0001, "").is_err());
    }

    #[test]
    fn test_new_normalizes() {
        let c = NamedConstant::new("invert", -2147483648, "CR_INVERT").unwrap();
        assert_eq!(c.value, 2147483648);
        assert!(c.as_bitwise() > 0u32);
        assert!(c.is_single_bit());
    }

    #[test]
    fn test_display_is_name() {
        let c = NamedConstant::new("now", 2, "TRIG_NOW (trigger now + N ns)").unwrap();
        assert_eq!(c.to_string(), "now");
        assert_eq!(c.doc, "TRIG_NOW (trigger now + N ns)");
    }

    #[test]
    fn test_operators() {
        let none = NamedConstant::new("none", 1, "TRIG_NONE").unwrap();
        let now = NamedConstant::new("now", 2, "TRIG_NOW").unwrap();
        assert_eq!(&none & &now, BitwiseValue(0));
        assert_eq!(&none | &now | 64u32, BitwiseValue(67));
        assert_eq!(64u32 | &now, BitwiseValue(66));
        assert_eq!(3u32 & &now, BitwiseValue(2));
    }

    #[test]
    fn test_single_bit() {
        assert!(!NamedConstant::new("invalid", 0, "").unwrap().is_single_bit());
        assert!(!NamedConstant::new("any", -1, "").unwrap().is_single_bit());
        assert!(NamedConstant::new("other", 0x100, "").unwrap().is_single_bit());
    }
}
