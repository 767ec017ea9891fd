//! # comedi-device
//!
//! Device access on top of `comedi-spec`.
//!
//! A [`Driver`] is whatever executes instructions and commands; [`Device`]
//! wraps one with logging and error forwarding. Subdevice and channel
//! handles address parts of the board, and [`SimulatedDriver`] stands in for
//! real hardware.
//!
//! ```
//! use comedi_device::{Device, SimulatedDriver};
//!
//! let mut device = Device::open("/dev/comedi0", SimulatedDriver::new());
//! let channel = device.subdevice(0).channel(3);
//! let sample = channel.data_read(&mut device).unwrap();
//! assert!(sample <= channel.get_maxdata(&device).unwrap());
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod simulated;
pub mod subdevice;
pub mod utility;

pub use config::{AcquisitionConfig, ConfigError};
pub use driver::{Device, Driver};
pub use error::{DeviceError, DriverError, Result};
pub use simulated::{SimulatedDriver, SimulatedSubdevice, StreamCapabilities};
pub use subdevice::{Chanlist, DataChannel, StreamingSubdevice, Subdevice};
pub use utility::{gtod_insn, inttrig_insn, prepare_command, timed_read, timed_read_insns, TimedRead};
