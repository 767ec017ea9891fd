//! # Subdevices and Channels
//!
//! Lightweight handles addressing one subdevice (or one channel of it).
//! They hold indices only; every call goes through the owning [`Device`].

use crate::driver::{Device, Driver};
use crate::error::{DeviceError, Result};
use comedi_spec::{
    ChanSpec, Command, Constants, FlagValue, Insn, LSampl, NamedConstant, ProducesChanSpec,
    Sampl, ValidationOutcome,
};
use serde::{Deserialize, Serialize};

fn opcode(name: &str) -> u32 {
    Constants::global().insn.index_by_name(name).map_or(0, |c| c.value)
}

fn config_id(name: &str) -> u32 {
    Constants::global()
        .configuration_ids
        .index_by_name(name)
        .map_or(0, |c| c.value)
}

// ============================================================================
// Subdevice
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subdevice {
    index: u32,
}

impl Subdevice {
    pub const fn new(index: u32) -> Self {
        Self { index }
    }

    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    pub fn get_type<D: Driver>(&self, device: &Device<D>) -> Result<&'static NamedConstant> {
        let value = device.subdevice_type(self.index)?;
        Constants::global()
            .subdevice_type
            .index_by_value(value)
            .ok_or(DeviceError::UnknownSubdeviceType(value))
    }

    /// Subdevice flags as an `SDF` flag value
    pub fn get_flags<D: Driver>(&self, device: &Device<D>) -> Result<FlagValue<'static>> {
        let value = device.subdevice_flags(self.index)?;
        Ok(FlagValue::new(&Constants::global().sdf, value))
    }

    pub fn n_channels<D: Driver>(&self, device: &Device<D>) -> Result<u32> {
        device.n_channels(self.index)
    }

    /// Blank instruction addressed to this subdevice
    pub fn insn(&self) -> Insn {
        Insn::new(0, self.index, ChanSpec::default())
    }

    pub fn channel(&self, index: u32) -> DataChannel {
        DataChannel::new(self.index, index, 0, 0)
    }

    /// Read and write several digital lines at once.
    ///
    /// Bit 0 of `bits` and `write_mask` is line `base_channel`. Only lines
    /// set in `write_mask` are written. Returns the current state of every
    /// line, shifted the same way.
    pub fn dio_bitfield<D: Driver>(
        &self,
        device: &mut Device<D>,
        bits: u32,
        write_mask: u32,
        base_channel: u32,
    ) -> Result<u32> {
        let mut insn = Insn::new(opcode("bits"), self.index, ChanSpec::new(base_channel, 0, 0));
        insn.set_data([write_mask, bits])?;
        device.do_insn(&mut insn)?;
        insn.sample(1).ok_or(DeviceError::Incomplete {
            expected: 2,
            received: insn.n(),
        })
    }
}

// ============================================================================
// Channels
// ============================================================================

/// A channel configured with a range and analog reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataChannel {
    pub subdevice: u32,
    pub index: u32,
    pub range: u32,
    /// `AREF_*` value
    pub aref: u32,
}

impl DataChannel {
    pub const fn new(subdevice: u32, index: u32, range: u32, aref: u32) -> Self {
        Self {
            subdevice,
            index,
            range,
            aref,
        }
    }

    pub fn with_range(mut self, range: u32) -> Self {
        self.range = range;
        self
    }

    pub fn with_aref(mut self, aref: &NamedConstant) -> Self {
        self.aref = aref.value;
        self
    }

    pub fn get_maxdata<D: Driver>(&self, device: &Device<D>) -> Result<u32> {
        device.maxdata(self.subdevice, self.index)
    }

    /// Read `n` samples (timing between samples is undefined)
    pub fn data_read_n<D: Driver>(&self, device: &mut Device<D>, n: usize) -> Result<Vec<LSampl>> {
        let mut insn = Insn::new(opcode("read"), self.subdevice, self.chanspec());
        insn.set_data(vec![0; n])?;
        device.do_insn(&mut insn)?;
        Ok(insn.data())
    }

    /// Read one sample
    pub fn data_read<D: Driver>(&self, device: &mut Device<D>) -> Result<LSampl> {
        let data = self.data_read_n(device, 1)?;
        data.first().copied().ok_or(DeviceError::Incomplete {
            expected: 1,
            received: 0,
        })
    }

    /// Read one sample after a settling delay.
    ///
    /// The channel is selected with an empty read, then the driver waits
    /// `nano_sec` (rounded up to whole microseconds) before sampling.
    pub fn data_read_delayed<D: Driver>(
        &self,
        device: &mut Device<D>,
        nano_sec: u32,
    ) -> Result<LSampl> {
        let select = Insn::new(opcode("read"), self.subdevice, self.chanspec());
        let mut wait = Insn::new(opcode("wait"), self.subdevice, ChanSpec::default());
        wait.set_data([nano_sec])?;
        let mut read = Insn::new(opcode("read"), self.subdevice, self.chanspec());
        read.set_data([0])?;

        let mut insns = [select, wait, read];
        let done = device.do_insnlist(&mut insns)?;
        if done != insns.len() {
            return Err(DeviceError::Incomplete {
                expected: insns.len(),
                received: done,
            });
        }
        insns[2].sample(0).ok_or(DeviceError::Incomplete {
            expected: 1,
            received: 0,
        })
    }

    /// Write one sample
    pub fn data_write<D: Driver>(&self, device: &mut Device<D>, value: LSampl) -> Result<i32> {
        let mut insn = Insn::new(opcode("write"), self.subdevice, self.chanspec());
        insn.set_data([value])?;
        device.do_insn(&mut insn)
    }

    /// Set the line direction to an `IO_DIRECTION` member.
    pub fn dio_config<D: Driver>(
        &self,
        device: &mut Device<D>,
        direction: &NamedConstant,
    ) -> Result<()> {
        let mut insn = Insn::new(opcode("config"), self.subdevice, self.chanspec());
        insn.set_data([direction.value])?;
        device.do_insn(&mut insn)?;
        Ok(())
    }

    pub fn dio_get_config<D: Driver>(&self, device: &mut Device<D>) -> Result<&'static NamedConstant> {
        let mut insn = Insn::new(opcode("config"), self.subdevice, self.chanspec());
        insn.set_data([config_id("dio_query"), 0])?;
        device.do_insn(&mut insn)?;
        let value = insn.sample(1).ok_or(DeviceError::Incomplete {
            expected: 2,
            received: insn.n(),
        })?;
        Constants::global()
            .io_direction
            .index_by_value(value)
            .ok_or(DeviceError::UnknownDirection(value))
    }

    /// Read a single digital line
    pub fn dio_read<D: Driver>(&self, device: &mut Device<D>) -> Result<bool> {
        Ok(self.data_read(device)? != 0)
    }

    /// Write a single digital line
    pub fn dio_write<D: Driver>(&self, device: &mut Device<D>, bit: bool) -> Result<i32> {
        self.data_write(device, LSampl::from(bit))
    }
}

impl ProducesChanSpec for DataChannel {
    fn chanspec(&self) -> ChanSpec {
        ChanSpec::new(self.index, self.range, self.aref)
    }
}

/// Ordered channels scanned once per acquisition cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chanlist {
    channels: Vec<DataChannel>,
}

impl Chanlist {
    pub fn new(channels: Vec<DataChannel>) -> Self {
        Self { channels }
    }

    pub fn push(&mut self, channel: DataChannel) {
        self.channels.push(channel);
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channels(&self) -> &[DataChannel] {
        &self.channels
    }

    /// Packed specifiers, in scan order
    pub fn chanlist(&self) -> Vec<ChanSpec> {
        self.channels.iter().map(ProducesChanSpec::chanspec).collect()
    }
}

impl FromIterator<DataChannel> for Chanlist {
    fn from_iter<I: IntoIterator<Item = DataChannel>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ============================================================================
// Streaming
// ============================================================================

/// A subdevice together with the command it will run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamingSubdevice {
    index: u32,
    pub cmd: Command,
}

impl StreamingSubdevice {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            cmd: Command::new(index),
        }
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn subdevice(&self) -> Subdevice {
        Subdevice::new(self.index)
    }

    /// Load the supported trigger sources into `cmd`.
    pub fn get_cmd_src_mask<D: Driver>(&mut self, device: &mut Device<D>) -> Result<()> {
        self.cmd = device.get_cmd_src_mask(self.index)?;
        Ok(())
    }

    /// Load a periodic sampling command into `cmd`; the chanlist is left empty.
    pub fn get_cmd_generic_timed<D: Driver>(
        &mut self,
        device: &mut Device<D>,
        chanlist_len: u32,
        scan_period_ns: u32,
    ) -> Result<()> {
        self.cmd = device.get_cmd_generic_timed(self.index, chanlist_len, scan_period_ns)?;
        Ok(())
    }

    pub fn command_test<D: Driver>(&mut self, device: &mut Device<D>) -> Result<ValidationOutcome> {
        device.command_test(&mut self.cmd)
    }

    /// Test the command up to `max_tests` times, letting the driver adjust it.
    pub fn prepare_until_valid<D: Driver>(
        &mut self,
        device: &mut Device<D>,
        max_tests: usize,
    ) -> Result<()> {
        if max_tests == 0 {
            return Err(DeviceError::NoCommandTests);
        }
        tracing::info!("command before testing:\n{}", self.cmd);
        let mut outcome = self.command_test(device)?;
        for attempt in 1..max_tests {
            if outcome.is_valid() {
                break;
            }
            tracing::info!("test {} returned {}\n{}", attempt - 1, outcome, self.cmd);
            outcome = self.command_test(device)?;
        }
        if outcome.is_valid() {
            tracing::info!("command is valid");
            return Ok(());
        }
        tracing::error!(%outcome, "error preparing command");
        Err(DeviceError::CommandNotReady {
            attempts: max_tests,
            outcome,
        })
    }

    /// Start streaming
    pub fn command<D: Driver>(&self, device: &mut Device<D>) -> Result<()> {
        device.command(&self.cmd)
    }

    /// Stop streaming
    pub fn cancel<D: Driver>(&self, device: &mut Device<D>) -> Result<()> {
        device.cancel(self.index)
    }

    /// Read `n_scans` complete scans, one row per scan.
    pub fn read_scans<D: Driver>(
        &self,
        device: &mut Device<D>,
        n_scans: usize,
    ) -> Result<Vec<Vec<Sampl>>> {
        let width = self.cmd.chanlist_len().max(1);
        let expected = n_scans * width;
        let mut samples = Vec::with_capacity(expected);
        while samples.len() < expected {
            let chunk = device.read(self.index, expected - samples.len())?;
            if chunk.is_empty() {
                return Err(DeviceError::Incomplete {
                    expected,
                    received: samples.len(),
                });
            }
            samples.extend(chunk);
        }
        Ok(samples.chunks(width).map(<[Sampl]>::to_vec).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedDriver;

    fn device() -> Device<SimulatedDriver> {
        Device::open("/dev/comedi0", SimulatedDriver::new())
    }

    fn trig(name: &str) -> u32 {
        Constants::global().trig_src.index_by_name(name).unwrap().value
    }

    #[test]
    fn test_subdevice_type_and_flags() {
        let dev = device();
        let ai = dev.subdevice(0);
        assert_eq!(ai.get_type(&dev).unwrap().name, "ai");
        let flags = ai.get_flags(&dev).unwrap();
        assert!(flags.get("readable").unwrap());
        assert!(!flags.get("writable").unwrap());
        assert_eq!(ai.n_channels(&dev).unwrap(), 16);
    }

    #[test]
    fn test_insn_bound_to_subdevice() {
        let insn = Subdevice::new(2).insn();
        assert_eq!(insn.subdev, 2);
        assert_eq!(insn.n(), 0);
    }

    #[test]
    fn test_data_channel_chanspec() {
        let diff = Constants::global().aref.index_by_name("diff").unwrap();
        let chan = Subdevice::new(0).channel(3).with_range(1).with_aref(diff);
        assert_eq!(chan.chanspec(), ChanSpec::new(3, 1, 2));
    }

    #[test]
    fn test_chanlist_into_command() {
        let sub = Subdevice::new(0);
        let list: Chanlist = (0..3).map(|i| sub.channel(i).with_range(1)).collect();
        let mut cmd = Command::new(0);
        cmd.set_chanlist(list.channels()).unwrap();
        assert_eq!(cmd.chanlist(), list.chanlist());
        assert_eq!(cmd.chanlist_len(), 3);
    }

    #[test]
    fn test_data_read_write() {
        let mut dev = device();
        let ao = dev.subdevice(1).channel(0);
        ao.data_write(&mut dev, 1234).unwrap();
        let ai = dev.subdevice(0).channel(0);
        let sample = ai.data_read(&mut dev).unwrap();
        assert!(sample <= ai.get_maxdata(&dev).unwrap());
        assert_eq!(ai.data_read_n(&mut dev, 5).unwrap().len(), 5);
    }

    #[test]
    fn test_cmd_src_mask() {
        let mut dev = device();
        let mut sub = dev.streaming_subdevice(0);
        sub.get_cmd_src_mask(&mut dev).unwrap();
        assert_eq!(sub.cmd.start_src, trig("now") | trig("ext") | trig("int"));
        assert_eq!(sub.cmd.stop_src, trig("none") | trig("count"));
    }

    #[test]
    fn test_prepare_needs_a_test() {
        let mut dev = device();
        let mut sub = dev.streaming_subdevice(0);
        let chanlist: Chanlist = (0..2).map(|i| sub.subdevice().channel(i)).collect();
        sub.get_cmd_generic_timed(&mut dev, 2, 1_000_000).unwrap();
        sub.cmd.set_chanlist(chanlist.channels()).unwrap();
        let before = sub.cmd.clone();

        let err = sub.prepare_until_valid(&mut dev, 0).unwrap_err();
        assert!(matches!(err, DeviceError::NoCommandTests));
        assert_eq!(sub.cmd, before);
        sub.prepare_until_valid(&mut dev, 1).unwrap();
    }

    #[test]
    fn test_data_read_delayed() {
        let mut dev = device();
        let ai = dev.subdevice(0).channel(2);
        let start = dev.driver().clock_us();
        let sample = ai.data_read_delayed(&mut dev, 2_500).unwrap();
        assert!(sample <= ai.get_maxdata(&dev).unwrap());
        // 3 us of settling plus one sample
        assert_eq!(dev.driver().clock_us() - start, 3 + 10);
        assert!(dev.subdevice(0).channel(16).data_read_delayed(&mut dev, 0).is_err());
    }

    #[test]
    fn test_dio_lines() {
        let mut dev = device();
        let io = &Constants::global().io_direction;
        let dio = dev.subdevice(2);
        let line = dio.channel(5);

        assert_eq!(line.dio_get_config(&mut dev).unwrap().name, "input");
        line.dio_config(&mut dev, io.member("output").unwrap()).unwrap();
        assert_eq!(line.dio_get_config(&mut dev).unwrap().name, "output");

        line.dio_write(&mut dev, true).unwrap();
        assert!(line.dio_read(&mut dev).unwrap());
        assert!(!dio.channel(4).dio_read(&mut dev).unwrap());
        line.dio_write(&mut dev, false).unwrap();
        assert!(!line.dio_read(&mut dev).unwrap());

        line.dio_config(&mut dev, io.member("opendrain").unwrap()).unwrap();
        assert_eq!(line.dio_get_config(&mut dev).unwrap().name, "opendrain");
    }

    #[test]
    fn test_dio_bitfield() {
        let mut dev = device();
        let output = Constants::global().io_direction.member("output").unwrap();
        let dio = dev.subdevice(2);
        for line in [1, 2, 3] {
            dio.channel(line).dio_config(&mut dev, output).unwrap();
        }

        // line 0 is an input, so its bit is not written
        assert_eq!(dio.dio_bitfield(&mut dev, 0b1111, 0b1111, 0).unwrap(), 0b1110);
        assert!(dio.channel(2).dio_read(&mut dev).unwrap());

        // relative to line 2: clear line 3, keep line 2
        assert_eq!(dio.dio_bitfield(&mut dev, 0b01, 0b10, 2).unwrap(), 0b01);
        assert_eq!(dio.dio_bitfield(&mut dev, 0, 0, 0).unwrap(), 0b0110);
        assert!(dev.subdevice(0).dio_bitfield(&mut dev, 0, 0, 0).is_err());
    }

    #[test]
    fn test_prepare_until_valid_reports_failure() {
        let mut dev = device();
        let mut sub = dev.streaming_subdevice(0);
        sub.get_cmd_generic_timed(&mut dev, 1, 1_000_000).unwrap();
        // no chanlist: the driver can never fix that
        let err = sub.prepare_until_valid(&mut dev, 2).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::CommandNotReady {
                attempts: 2,
                outcome: ValidationOutcome::InvalidChanlist
            }
        ));
    }
}
