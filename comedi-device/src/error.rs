//! Device error types

use crate::config::ConfigError;
use comedi_spec::{ComediError, ConflictError, ContractError, ResourceError, ValidationOutcome};
use thiserror::Error;

/// A failed driver call, as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{function}: {message} ({code})")]
pub struct DriverError {
    pub function: String,
    pub code: i32,
    pub message: String,
}

impl DriverError {
    pub fn new(function: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Core error: {0}")]
    Core(#[from] ComediError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("No subdevice of type {0}")]
    NoSubdevice(String),

    #[error("Unknown subdevice type {0}")]
    UnknownSubdeviceType(u32),

    #[error("Unknown I/O direction {0}")]
    UnknownDirection(u32),

    #[error("Command preparation needs at least one test")]
    NoCommandTests,

    #[error("Command still invalid after {attempts} tests: {outcome}")]
    CommandNotReady {
        attempts: usize,
        outcome: ValidationOutcome,
    },

    #[error("Acquisition ended early: expected {expected} samples, got {received}")]
    Incomplete { expected: usize, received: usize },
}

impl From<ConflictError> for DeviceError {
    fn from(err: ConflictError) -> Self {
        DeviceError::Core(err.into())
    }
}

impl From<ResourceError> for DeviceError {
    fn from(err: ResourceError) -> Self {
        DeviceError::Core(err.into())
    }
}

impl From<ContractError> for DeviceError {
    fn from(err: ContractError) -> Self {
        DeviceError::Core(err.into())
    }
}

pub type Result<T, E = DeviceError> = std::result::Result<T, E>;
