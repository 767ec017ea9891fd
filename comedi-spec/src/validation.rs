//! # Command Test Outcomes
//!
//! The driver's `command_test` returns one of six fixed codes. Each step of
//! the driver's test adjusts the command a little more; callers repeat the
//! test until it comes back [`ValidationOutcome::Valid`] or stops improving.

use crate::error::ContractError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValidationOutcome {
    /// No adjustment needed
    Valid = 0,
    /// Unsupported trigger source bits were cleared
    UnsupportedSource = 1,
    /// Unsupported source combination, or more than one source per stage
    SourceCombination = 2,
    /// An argument was clamped into range
    ArgumentOutOfRange = 3,
    /// An argument was rounded, e.g. a timer period
    ArgumentAdjusted = 4,
    /// The channel list violates a device constraint
    InvalidChanlist = 5,
}

impl ValidationOutcome {
    pub const ALL: [ValidationOutcome; 6] = [
        ValidationOutcome::Valid,
        ValidationOutcome::UnsupportedSource,
        ValidationOutcome::SourceCombination,
        ValidationOutcome::ArgumentOutOfRange,
        ValidationOutcome::ArgumentAdjusted,
        ValidationOutcome::InvalidChanlist,
    ];

    pub fn from_code(code: i32) -> Result<Self, ContractError> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(ContractError::UnknownValidationCode(code))
    }

    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    /// Driver description, `None` for a valid command
    pub const fn description(self) -> Option<&'static str> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::UnsupportedSource => Some("unsupported *_src trigger"),
            ValidationOutcome::SourceCombination => {
                Some("unsupported *_src combo, or multiple triggers")
            }
            ValidationOutcome::ArgumentOutOfRange => Some("*_arg out of range"),
            ValidationOutcome::ArgumentAdjusted => Some("*_arg required adjustment"),
            ValidationOutcome::InvalidChanlist => Some("invalid chanlist"),
        }
    }
}

impl TryFrom<i32> for ValidationOutcome {
    type Error = ContractError;

    fn try_from(code: i32) -> Result<Self, ContractError> {
        Self::from_code(code)
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description().unwrap_or("valid"))
    }
}
