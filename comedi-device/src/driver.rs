//! # Driver Boundary
//!
//! [`Driver`] is the narrow interface to whatever actually talks to the
//! hardware. [`Device`] wraps a driver, logs every call and forwards driver
//! errors unchanged.

use crate::error::{DeviceError, DriverError, Result};
use crate::subdevice::{StreamingSubdevice, Subdevice};
use comedi_spec::{Command, Constants, Insn, NamedConstant, Sampl, ValidationOutcome};
use std::fmt;

/// Calls the core needs from a driver.
pub trait Driver {
    fn driver_name(&self) -> &str;

    fn board_name(&self) -> &str;

    fn n_subdevices(&self) -> Result<u32, DriverError>;

    /// `COMEDI_SUBD_*` value
    fn subdevice_type(&self, subdevice: u32) -> Result<u32, DriverError>;

    /// `SDF_*` bits, including runtime state such as `busy`
    fn subdevice_flags(&self, subdevice: u32) -> Result<u32, DriverError>;

    fn n_channels(&self, subdevice: u32) -> Result<u32, DriverError>;

    fn maxdata(&self, subdevice: u32, channel: u32) -> Result<u32, DriverError>;

    /// Returns an instruction-specific count, usually the number of samples.
    fn perform_instruction(&mut self, insn: &mut Insn) -> Result<i32, DriverError>;

    /// Run `insns` in order, stopping at the first failure.
    ///
    /// Returns how many completed; an error is only reported when none did.
    fn perform_instruction_list(&mut self, insns: &mut [Insn]) -> Result<usize, DriverError> {
        let mut done = 0;
        for insn in insns.iter_mut() {
            match self.perform_instruction(insn) {
                Ok(_) => done += 1,
                Err(err) if done == 0 => return Err(err),
                Err(_) => break,
            }
        }
        Ok(done)
    }

    /// Command whose `*_src` fields are the OR of every supported source.
    fn probe_command_capabilities(&mut self, subdevice: u32) -> Result<Command, DriverError>;

    /// Ready-to-run periodic command, minus the chanlist.
    fn probe_generic_timed_command(
        &mut self,
        subdevice: u32,
        chanlist_len: u32,
        scan_period_ns: u32,
    ) -> Result<Command, DriverError>;

    /// Raw `command_test` code; the driver may adjust `command`.
    fn test_command(&mut self, command: &mut Command) -> Result<i32, DriverError>;

    fn submit_command(&mut self, command: &Command) -> Result<(), DriverError>;

    fn cancel_command(&mut self, subdevice: u32) -> Result<(), DriverError>;

    /// Up to `max_samples` samples from a running command; empty when done.
    fn read_samples(&mut self, subdevice: u32, max_samples: usize)
        -> Result<Vec<Sampl>, DriverError>;
}

/// An open device.
pub struct Device<D: Driver> {
    filename: String,
    driver: D,
}

impl<D: Driver> fmt::Debug for Device<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("filename", &self.filename)
            .field("driver", &self.driver.driver_name())
            .field("board", &self.driver.board_name())
            .finish()
    }
}

impl<D: Driver> Device<D> {
    pub fn open(filename: impl Into<String>, driver: D) -> Self {
        let filename = filename.into();
        tracing::info!(
            filename = %filename,
            driver = driver.driver_name(),
            board = driver.board_name(),
            "opened device"
        );
        Self { filename, driver }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn close(self) -> D {
        tracing::info!(filename = %self.filename, "closed device");
        self.driver
    }

    fn call<T: fmt::Debug>(
        &mut self,
        function: &'static str,
        f: impl FnOnce(&mut D) -> std::result::Result<T, DriverError>,
    ) -> std::result::Result<T, DriverError> {
        tracing::debug!(function, "calling driver");
        log_return(function, f(&mut self.driver))
    }

    fn query<T: fmt::Debug>(
        &self,
        function: &'static str,
        f: impl FnOnce(&D) -> std::result::Result<T, DriverError>,
    ) -> std::result::Result<T, DriverError> {
        tracing::debug!(function, "calling driver");
        log_return(function, f(&self.driver))
    }

    // ========================================================================
    // Discovery
    // ========================================================================

    pub fn driver_name(&self) -> &str {
        self.driver.driver_name()
    }

    pub fn board_name(&self) -> &str {
        self.driver.board_name()
    }

    pub fn n_subdevices(&self) -> Result<u32> {
        Ok(self.query("comedi_get_n_subdevices", |d| d.n_subdevices())?)
    }

    pub fn subdevice(&self, index: u32) -> Subdevice {
        Subdevice::new(index)
    }

    pub fn subdevices(&self) -> Result<Vec<Subdevice>> {
        Ok((0..self.n_subdevices()?).map(Subdevice::new).collect())
    }

    pub fn streaming_subdevice(&self, index: u32) -> StreamingSubdevice {
        StreamingSubdevice::new(index)
    }

    pub fn subdevice_type(&self, subdevice: u32) -> Result<u32> {
        Ok(self.query("comedi_get_subdevice_type", |d| d.subdevice_type(subdevice))?)
    }

    pub fn subdevice_flags(&self, subdevice: u32) -> Result<u32> {
        Ok(self.query("comedi_get_subdevice_flags", |d| d.subdevice_flags(subdevice))?)
    }

    pub fn n_channels(&self, subdevice: u32) -> Result<u32> {
        Ok(self.query("comedi_get_n_channels", |d| d.n_channels(subdevice))?)
    }

    pub fn maxdata(&self, subdevice: u32, channel: u32) -> Result<u32> {
        Ok(self.query("comedi_get_maxdata", |d| d.maxdata(subdevice, channel))?)
    }

    /// First subdevice of the given `COMEDI_SUBD_*` type
    pub fn find_subdevice_by_type(&self, kind: &NamedConstant) -> Result<Subdevice> {
        for index in 0..self.n_subdevices()? {
            if self.subdevice_type(index)? == kind.value {
                return Ok(Subdevice::new(index));
            }
        }
        Err(DeviceError::NoSubdevice(kind.name.clone()))
    }

    // ========================================================================
    // Instructions
    // ========================================================================

    /// Blank instruction
    pub fn insn(&self) -> Insn {
        Insn::default()
    }

    pub fn do_insn(&mut self, insn: &mut Insn) -> Result<i32> {
        tracing::trace!("instruction:\n{}", insn);
        Ok(self.call("comedi_do_insn", |d| d.perform_instruction(insn))?)
    }

    /// Returns the number of completed instructions.
    pub fn do_insnlist(&mut self, insns: &mut [Insn]) -> Result<usize> {
        let total = insns.len();
        let done = self.call("comedi_do_insnlist", |d| d.perform_instruction_list(insns))?;
        if done < total {
            tracing::warn!(done, total, "instruction list partially completed");
        }
        Ok(done)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub fn get_cmd_src_mask(&mut self, subdevice: u32) -> Result<Command> {
        Ok(self.call("comedi_get_cmd_src_mask", |d| {
            d.probe_command_capabilities(subdevice)
        })?)
    }

    pub fn get_cmd_generic_timed(
        &mut self,
        subdevice: u32,
        chanlist_len: u32,
        scan_period_ns: u32,
    ) -> Result<Command> {
        Ok(self.call("comedi_get_cmd_generic_timed", |d| {
            d.probe_generic_timed_command(subdevice, chanlist_len, scan_period_ns)
        })?)
    }

    pub fn command_test(&mut self, command: &mut Command) -> Result<ValidationOutcome> {
        let code = self.call("comedi_command_test", |d| d.test_command(command))?;
        let outcome = ValidationOutcome::from_code(code)?;
        tracing::info!(code, %outcome, "command test");
        Ok(outcome)
    }

    pub fn command(&mut self, command: &Command) -> Result<()> {
        tracing::debug!("command:\n{}", command.render(Constants::global()));
        Ok(self.call("comedi_command", |d| d.submit_command(command))?)
    }

    pub fn cancel(&mut self, subdevice: u32) -> Result<()> {
        Ok(self.call("comedi_cancel", |d| d.cancel_command(subdevice))?)
    }

    pub fn read(&mut self, subdevice: u32, max_samples: usize) -> Result<Vec<Sampl>> {
        Ok(self.call("read", |d| d.read_samples(subdevice, max_samples))?)
    }
}

fn log_return<T: fmt::Debug>(
    function: &'static str,
    ret: std::result::Result<T, DriverError>,
) -> std::result::Result<T, DriverError> {
    match &ret {
        Ok(value) => tracing::debug!(function, ?value, "driver call returned"),
        Err(err) => tracing::warn!(
            function,
            code = err.code,
            message = %err.message,
            "driver call failed"
        ),
    }
    ret
}
