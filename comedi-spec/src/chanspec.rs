//! # Channel Specifiers
//!
//! A [`ChanSpec`] packs `(channel, range, aref, flags)` into one word using
//! the layout in [`crate::encoding`]. Setters only touch their own span.
//!
//! ```
//! use comedi_spec::{ChanSpec, Constants};
//!
//! let c = Constants::global();
//! let diff = c.aref.index_by_name("diff").unwrap().value;
//! let flags = c.cr.index_by_name("edge").unwrap() | c.cr.index_by_name("invert").unwrap();
//!
//! let spec = ChanSpec::pack(1, 3, diff, flags.value(), &c.cr).unwrap();
//! assert_eq!(spec.channel(), 1);
//! assert_eq!(spec.range(), 3);
//! assert_eq!(spec.aref(&c.aref).unwrap().name, "diff");
//! assert_eq!(spec.flags(&c.cr).to_string(), "edge|invert");
//! ```

use crate::bitwise::Bits;
use crate::constant::NamedConstant;
use crate::encoding::*;
use crate::error::ContractError;
use crate::flag_value::FlagValue;
use crate::registry::ConstantRegistry;
use crate::Constants;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A packed channel specifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChanSpec(u32);

impl ChanSpec {
    #[inline]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Channel, range and aref with no flag bits
    #[inline]
    pub const fn new(channel: u32, range: u32, aref: u32) -> Self {
        Self(cr_pack(channel, range, aref))
    }

    /// Full pack, with `flags` limited to the bits `family` defines.
    pub fn pack(
        channel: u32,
        range: u32,
        aref: u32,
        flags: u32,
        family: &ConstantRegistry,
    ) -> Result<Self, ContractError> {
        let mut spec = Self::new(channel, range, aref);
        spec.set_flags(flags, family)?;
        Ok(spec)
    }

    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn channel(self) -> u32 {
        extract_chan(self.0)
    }

    #[inline]
    pub const fn range(self) -> u32 {
        extract_range(self.0)
    }

    /// Raw analog reference bits
    #[inline]
    pub const fn aref_value(self) -> u32 {
        extract_aref(self.0)
    }

    #[inline]
    pub fn flags_value(self, family: &ConstantRegistry) -> u32 {
        extract_flags(self.0, family.combined_mask())
    }

    /// Analog reference decoded through `registry`
    pub fn aref(self, registry: &ConstantRegistry) -> Option<&NamedConstant> {
        registry.index_by_value(self.aref_value())
    }

    pub fn flags(self, family: &ConstantRegistry) -> FlagValue<'_> {
        FlagValue::new(family, self.flags_value(family))
    }

    pub fn set_channel(&mut self, channel: u32) {
        self.0 = insert_chan(self.0, channel);
    }

    pub fn set_range(&mut self, range: u32) {
        self.0 = insert_range(self.0, range);
    }

    pub fn set_aref(&mut self, aref: u32) {
        self.0 = insert_aref(self.0, aref);
    }

    /// Replace the flag bits.
    ///
    /// Fails when non-zero flags are given for a family that defines no bits
    /// inside the flag field.
    pub fn set_flags(&mut self, flags: u32, family: &ConstantRegistry) -> Result<(), ContractError> {
        let mask = family.combined_mask() & FLAGS_FIELD_MASK;
        if mask == 0 && flags != 0 {
            return Err(ContractError::UndefinedFlagMask {
                registry: family.name().to_string(),
                flags,
            });
        }
        self.0 = insert_flags(self.0, flags, mask);
        Ok(())
    }

    /// One-line description using the built-in registries
    pub fn describe(self, constants: &Constants) -> String {
        let aref = self
            .aref(&constants.aref)
            .map_or_else(|| self.aref_value().to_string(), |c| c.name.clone());
        format!(
            "chan {} range {} aref {} flags {}",
            self.channel(),
            self.range(),
            aref,
            self.flags(&constants.cr)
        )
    }
}

impl Bits for ChanSpec {
    #[inline]
    fn bits(&self) -> u32 {
        self.0
    }
}

impl From<ChanSpec> for u32 {
    fn from(spec: ChanSpec) -> Self {
        spec.0
    }
}

impl fmt::Display for ChanSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

// ============================================================================
// Chanspec producers
// ============================================================================

/// Anything that can be resolved to a packed channel specifier.
pub trait ProducesChanSpec {
    fn chanspec(&self) -> ChanSpec;
}

impl ProducesChanSpec for ChanSpec {
    #[inline]
    fn chanspec(&self) -> ChanSpec {
        *self
    }
}

impl ProducesChanSpec for u32 {
    #[inline]
    fn chanspec(&self) -> ChanSpec {
        ChanSpec(*self)
    }
}

impl<T: ProducesChanSpec + ?Sized> ProducesChanSpec for &T {
    #[inline]
    fn chanspec(&self) -> ChanSpec {
        (**self).chanspec()
    }
}
