//! # Bitwise Values
//!
//! Chainable `&`/`|` over anything that exposes a 32-bit scalar: plain
//! integers, [`NamedConstant`]s, [`FlagValue`]s and earlier results.
//!
//! ```
//! use comedi_spec::{BitwiseValue, Constants};
//!
//! let trig = &Constants::global().trig_src;
//! let now = trig.index_by_name("now").unwrap();
//! let follow = trig.index_by_name("follow").unwrap();
//! let time = trig.index_by_name("time").unwrap();
//!
//! let a = now | follow | time | 64u32;
//! assert_eq!(a, BitwiseValue(78));
//!
//! // Plain integers can lead the chain too.
//! assert_eq!(64u32 | now, BitwiseValue(66));
//! ```
//!
//! [`NamedConstant`]: crate::NamedConstant
//! [`FlagValue`]: crate::FlagValue

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

/// Anything that can take part in a bitwise chain.
pub trait Bits {
    fn bits(&self) -> u32;
}

impl Bits for u32 {
    #[inline]
    fn bits(&self) -> u32 {
        *self
    }
}

impl<T: Bits + ?Sized> Bits for &T {
    #[inline]
    fn bits(&self) -> u32 {
        (**self).bits()
    }
}

/// Unsigned 32-bit result of a bitwise chain.
///
/// Ordering is unsigned, so a mask with the top bit set sorts above zero.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BitwiseValue(pub u32);

impl BitwiseValue {
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Bitwise and with any scalar operand
    #[inline]
    pub fn and<B: Bits>(self, other: B) -> Self {
        Self(self.0 & other.bits())
    }

    /// Bitwise or with any scalar operand
    #[inline]
    pub fn or<B: Bits>(self, other: B) -> Self {
        Self(self.0 | other.bits())
    }

    /// Three-way comparison where `None` stands for "one less than self".
    ///
    /// This keeps `value > None` true for every value, including zero.
    pub fn cmp_optional(self, other: Option<u32>) -> Ordering {
        match other {
            Some(other) => self.0.cmp(&other),
            None => Ordering::Greater,
        }
    }
}

impl Bits for BitwiseValue {
    #[inline]
    fn bits(&self) -> u32 {
        self.0
    }
}

impl From<u32> for BitwiseValue {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<BitwiseValue> for u32 {
    fn from(value: BitwiseValue) -> Self {
        value.0
    }
}

impl fmt::Display for BitwiseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::LowerHex for BitwiseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

// ============================================================================
// Operators
// ============================================================================

impl<B: Bits> BitAnd<B> for BitwiseValue {
    type Output = BitwiseValue;

    fn bitand(self, rhs: B) -> BitwiseValue {
        self.and(rhs)
    }
}

impl<B: Bits> BitOr<B> for BitwiseValue {
    type Output = BitwiseValue;

    fn bitor(self, rhs: B) -> BitwiseValue {
        self.or(rhs)
    }
}

impl<B: Bits> BitAndAssign<B> for BitwiseValue {
    fn bitand_assign(&mut self, rhs: B) {
        self.0 &= rhs.bits();
    }
}

impl<B: Bits> BitOrAssign<B> for BitwiseValue {
    fn bitor_assign(&mut self, rhs: B) {
        self.0 |= rhs.bits();
    }
}

impl BitAnd<BitwiseValue> for u32 {
    type Output = BitwiseValue;

    fn bitand(self, rhs: BitwiseValue) -> BitwiseValue {
        BitwiseValue(self & rhs.0)
    }
}

impl BitOr<BitwiseValue> for u32 {
    type Output = BitwiseValue;

    fn bitor(self, rhs: BitwiseValue) -> BitwiseValue {
        BitwiseValue(self | rhs.0)
    }
}

// ============================================================================
// Comparisons
// ============================================================================

impl PartialEq<u32> for BitwiseValue {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<u32> for BitwiseValue {
    fn partial_cmp(&self, other: &u32) -> Option<Ordering> {
        Some(self.0.cmp(other))
    }
}

impl PartialEq<Option<u32>> for BitwiseValue {
    fn eq(&self, other: &Option<u32>) -> bool {
        self.cmp_optional(*other) == Ordering::Equal
    }
}

impl PartialOrd<Option<u32>> for BitwiseValue {
    fn partial_cmp(&self, other: &Option<u32>) -> Option<Ordering> {
        Some(self.cmp_optional(*other))
    }
}
