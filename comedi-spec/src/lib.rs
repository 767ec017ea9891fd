//! # Comedi Core Types
//!
//! Typed, bit-exact layer over the Comedi data-acquisition driver's
//! instruction and streaming-command protocol.
//!
//! ## Key Features
//! - Enum and flag registries built from a static constant namespace
//! - Chainable bitwise algebra over named constants and plain integers
//! - Channel specifier packing (`CR_PACK`)
//! - Instructions and commands with exclusively owned buffers
//! - The fixed `command_test` outcome taxonomy

pub mod bitwise;
pub mod buffer;
pub mod chanspec;
pub mod command;
pub mod constant;
pub mod constants;
pub mod encoding;
pub mod error;
pub mod flag_value;
pub mod format;
pub mod instruction;
pub mod namespace;
pub mod registry;
pub mod validation;

pub use bitwise::{Bits, BitwiseValue};
pub use buffer::SampleBuffer;
pub use chanspec::{ChanSpec, ProducesChanSpec};
pub use command::{Command, Stage};
pub use constant::NamedConstant;
pub use constants::Constants;
pub use error::{ComediError, ConflictError, ContractError, ResourceError};
pub use flag_value::FlagValue;
pub use instruction::Insn;
pub use namespace::{RawConstant, COMEDI_NAMESPACE};
pub use registry::{ConstantRegistry, RegistryBuilder, RegistryKind};
pub use validation::ValidationOutcome;

/// Raw sample word (`sampl_t`)
pub type Sampl = u16;

/// Long sample word (`lsampl_t`)
pub type LSampl = u32;
