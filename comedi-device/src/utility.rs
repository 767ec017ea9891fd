//! Ready-made instructions and acquisition helpers

use crate::driver::{Device, Driver};
use crate::error::{DeviceError, Result};
use crate::subdevice::{Chanlist, StreamingSubdevice, Subdevice};
use comedi_spec::{ChanSpec, Constants, Insn, LSampl};
use serde::{Deserialize, Serialize};

fn opcode(name: &str) -> u32 {
    Constants::global().insn.index_by_name(name).map_or(0, |c| c.value)
}

fn trig(name: &str) -> u32 {
    Constants::global().trig_src.index_by_name(name).map_or(0, |c| c.value)
}

/// Internal trigger for a command started with `start_src=int`
pub fn inttrig_insn(subdevice: &Subdevice) -> Result<Insn> {
    let mut insn = subdevice.insn();
    insn.insn = opcode("inttrig");
    insn.set_data([0])?;
    Ok(insn)
}

/// Time-of-day query; the driver fills `[seconds, microseconds]`
pub fn gtod_insn(subdevice: &Subdevice) -> Result<Insn> {
    let mut insn = subdevice.insn();
    insn.insn = opcode("gtod");
    insn.set_data([0, 0])?;
    Ok(insn)
}

/// A read of `n_samples` bracketed by two time-of-day queries.
pub fn timed_read_insns(
    subdevice: &Subdevice,
    chanspec: ChanSpec,
    n_samples: usize,
) -> Result<Vec<Insn>> {
    let mut read = Insn::new(opcode("read"), subdevice.index(), chanspec);
    read.set_data(vec![0; n_samples])?;
    Ok(vec![gtod_insn(subdevice)?, read, gtod_insn(subdevice)?])
}

/// Result of a completed [`timed_read_insns`] list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedRead {
    /// Seconds before the read
    pub t1: f64,
    pub data: Vec<LSampl>,
    /// Seconds after the read
    pub t2: f64,
}

impl TimedRead {
    pub fn from_insns(insns: &[Insn]) -> Result<Self> {
        let [before, read, after] = insns else {
            return Err(DeviceError::Incomplete {
                expected: 3,
                received: insns.len(),
            });
        };
        Ok(Self {
            t1: gtod_seconds(before)?,
            data: read.data(),
            t2: gtod_seconds(after)?,
        })
    }

    /// Mean time per sample, in seconds
    pub fn sample_period(&self) -> Option<f64> {
        (!self.data.is_empty()).then(|| (self.t2 - self.t1) / self.data.len() as f64)
    }
}

fn gtod_seconds(insn: &Insn) -> Result<f64> {
    match (insn.sample(0), insn.sample(1)) {
        (Some(sec), Some(usec)) => Ok(f64::from(sec) + 1e-6 * f64::from(usec)),
        _ => Err(DeviceError::Incomplete {
            expected: 2,
            received: insn.n(),
        }),
    }
}

/// Run a timed read and collect the result.
pub fn timed_read<D: Driver>(
    device: &mut Device<D>,
    subdevice: &Subdevice,
    chanspec: ChanSpec,
    n_samples: usize,
) -> Result<TimedRead> {
    let mut insns = timed_read_insns(subdevice, chanspec, n_samples)?;
    let done = device.do_insnlist(&mut insns)?;
    if done != insns.len() {
        return Err(DeviceError::Incomplete {
            expected: insns.len(),
            received: done,
        });
    }
    TimedRead::from_insns(&insns)
}

/// Load a generic timed command for `chanlist` that stops after `num_scans`.
pub fn prepare_command<D: Driver>(
    device: &mut Device<D>,
    subdevice: &mut StreamingSubdevice,
    chanlist: &Chanlist,
    scan_period_ns: u32,
    num_scans: u32,
) -> Result<()> {
    subdevice.get_cmd_generic_timed(device, chanlist.len() as u32, scan_period_ns)?;
    subdevice.cmd.set_chanlist(chanlist.channels())?;
    subdevice.cmd.stop_src = trig("count");
    subdevice.cmd.stop_arg = num_scans;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedDriver;

    #[test]
    fn test_utility_insns() {
        let sub = Subdevice::new(1);
        let trigger = inttrig_insn(&sub).unwrap();
        assert_eq!(trigger.subdev, 1);
        assert_eq!(trigger.data(), vec![0]);
        assert_eq!(trigger.opcode(Constants::global()).unwrap().name, "inttrig");

        let gtod = gtod_insn(&sub).unwrap();
        assert_eq!(gtod.data(), vec![0, 0]);
    }

    #[test]
    fn test_timed_read_triple() {
        let insns = timed_read_insns(&Subdevice::new(0), ChanSpec::new(2, 0, 0), 4).unwrap();
        let names: Vec<_> = insns
            .iter()
            .map(|i| i.opcode(Constants::global()).unwrap().name.clone())
            .collect();
        assert_eq!(names, ["gtod", "read", "gtod"]);
        assert_eq!(insns[1].n(), 4);
        assert_eq!(insns[1].chanspec.channel(), 2);
    }

    #[test]
    fn test_timed_read() {
        let mut dev = Device::open("/dev/comedi0", SimulatedDriver::new());
        let result = timed_read(&mut dev, &Subdevice::new(0), ChanSpec::new(0, 0, 0), 10).unwrap();
        assert_eq!(result.data.len(), 10);
        assert!(result.t1 > 0.0);
        assert!(result.t2 > result.t1);
        assert!(result.sample_period().unwrap() > 0.0);
    }

    #[test]
    fn test_from_insns_rejects_short_list() {
        let err = TimedRead::from_insns(&[]).unwrap_err();
        assert!(matches!(err, DeviceError::Incomplete { expected: 3, received: 0 }));
    }

    #[test]
    fn test_prepare_command() {
        let mut dev = Device::open("/dev/comedi0", SimulatedDriver::new());
        let mut sub = dev.streaming_subdevice(0);
        let chanlist: Chanlist = (0..2).map(|i| sub.subdevice().channel(i)).collect();
        prepare_command(&mut dev, &mut sub, &chanlist, 1_000_000, 5).unwrap();
        assert_eq!(sub.cmd.chanlist_len(), 2);
        assert_eq!(sub.cmd.stop_arg, 5);
        sub.prepare_until_valid(&mut dev, 2).unwrap();
    }
}
