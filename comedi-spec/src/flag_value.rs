//! Flag registry paired with a concrete value.

use crate::bitwise::{BitwiseValue, Bits};
use crate::error::ContractError;
use crate::registry::ConstantRegistry;
use std::fmt;

/// Display string used when no member bit is set
pub const DEFAULT_DISPLAY: &str = "-";

/// A flag instance (flag family + value).
///
/// ```
/// use comedi_spec::{Constants, FlagValue};
///
/// let mut f = FlagValue::new(&Constants::global().sdf, 17);
/// assert!(f.get("busy").unwrap());
/// f.set("busy", false).unwrap();
/// assert_eq!(f.value(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct FlagValue<'a> {
    flag: &'a ConstantRegistry,
    value: u32,
    default: String,
}

impl<'a> FlagValue<'a> {
    pub fn new(flag: &'a ConstantRegistry, value: u32) -> Self {
        Self::with_default(flag, value, DEFAULT_DISPLAY)
    }

    pub fn with_default(flag: &'a ConstantRegistry, value: u32, default: impl Into<String>) -> Self {
        Self {
            flag,
            value,
            default: default.into(),
        }
    }

    /// Parse a `"|"`-joined member list.
    ///
    /// The default display string and the empty string parse to zero.
    pub fn parse(flag: &'a ConstantRegistry, text: &str) -> Result<Self, ContractError> {
        let mut value = Self::new(flag, 0);
        let text = text.trim();
        if text.is_empty() || text == DEFAULT_DISPLAY {
            return Ok(value);
        }
        for name in text.split('|') {
            value.set(name.trim(), true)?;
        }
        Ok(value)
    }

    #[inline]
    pub fn flag(&self) -> &'a ConstantRegistry {
        self.flag
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }

    #[inline]
    pub fn as_bitwise(&self) -> BitwiseValue {
        BitwiseValue(self.value)
    }

    pub fn get(&self, name: &str) -> Result<bool, ContractError> {
        self.flag.get(self.value, name)
    }

    pub fn set(&mut self, name: &str, status: bool) -> Result<(), ContractError> {
        self.value = self.flag.set(self.value, name, status)?;
        Ok(())
    }

    /// Names of the members whose bits are all set
    pub fn names(&self) -> Vec<&'a str> {
        let flag: &'a ConstantRegistry = self.flag;
        flag.set_members(self.value).map(|m| m.name.as_str()).collect()
    }
}

/// Two values are equal when they share a registry instance and a value.
impl PartialEq for FlagValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.flag, other.flag)
            && self.value == other.value
            && self.default == other.default
    }
}

impl Eq for FlagValue<'_> {}

impl Bits for FlagValue<'_> {
    #[inline]
    fn bits(&self) -> u32 {
        self.value
    }
}

impl fmt::Display for FlagValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flag.render(self.value, &self.default))
    }
}
