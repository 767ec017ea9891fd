//! # Error Types for the Comedi core

use thiserror::Error;

/// Two constants could not coexist in one registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("duplicate name in {registry}: {name}")]
    DuplicateName { registry: String, name: String },

    #[error("value collision in {registry}: {second} = {first} = {value:#x}")]
    ValueCollision {
        registry: String,
        first: String,
        second: String,
        value: u32,
    },

    #[error("multiple empty flags in {registry}: {first} and {second}")]
    MultipleEmpty {
        registry: String,
        first: String,
        second: String,
    },

    #[error("{name} in {registry} does not fit in 32 bits: {value}")]
    ValueOutOfRange {
        registry: String,
        name: String,
        value: i64,
    },

    #[error("multiple multi-bit flags in {registry}: {first} = {first_value:#x} and {second} = {second_value:#x}")]
    MultipleAll {
        registry: String,
        first: String,
        first_value: u32,
        second: String,
        second_value: u32,
    },
}

/// A buffer could not be (re)allocated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("out of memory: could not allocate {requested} elements")]
    OutOfMemory { requested: usize },
}

/// The caller broke a precondition of the flag or chanspec algebra.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("{registry} has no member named {name}")]
    UnknownMember { registry: String, name: String },

    #[error("{registry}: cannot test membership of empty mask {name}")]
    EmptyMask { registry: String, name: String },

    #[error("{registry}: {name} = {value:#x} is not a single bit")]
    MultiBitMember {
        registry: String,
        name: String,
        value: u32,
    },

    #[error("{registry} defines no flag bits, cannot pack flags {flags:#x}")]
    UndefinedFlagMask { registry: String, flags: u32 },

    #[error("unknown command_test return code: {0}")]
    UnknownValidationCode(i32),

    #[error("constant value {0} does not fit in 32 bits")]
    ValueOutOfRange(i64),
}

#[derive(Debug, Error)]
pub enum ComediError {
    #[error("Registry conflict: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Contract violation: {0}")]
    Contract(#[from] ContractError),
}

pub type Result<T> = std::result::Result<T, ComediError>;
