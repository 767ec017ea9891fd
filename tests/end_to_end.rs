//! End-to-end tests for the comedi crates
//!
//! These tests drive the same flows as the demo programs:
//! 1. Build registries and channel specifiers from the constant namespace
//! 2. Run instruction lists against a device
//! 3. Prepare, test, run and drain a streaming command

use comedi_device::{
    gtod_insn, prepare_command, timed_read, AcquisitionConfig, Chanlist, DataChannel, Device,
    DeviceError, SimulatedDriver, TimedRead,
};
use comedi_spec::{
    ChanSpec, Command, Constants, FlagValue, Insn, ProducesChanSpec, Stage, ValidationOutcome,
};

fn device() -> Device<SimulatedDriver> {
    Device::open("/dev/comedi0", SimulatedDriver::new())
}

// ============================================================================
// Constants -> Chanspec
// ============================================================================

#[test]
fn test_chanspec_from_names() {
    let c = Constants::global();
    let aref = c.aref.member("diff").unwrap();
    let flags = FlagValue::parse(&c.cr, "alt_filter|invert").unwrap();
    let spec = ChanSpec::pack(7, 2, aref.value, flags.value(), &c.cr).unwrap();

    assert_eq!(spec.describe(c), "chan 7 range 2 aref diff flags alt_filter|invert");
    assert_eq!(spec.flags(&c.cr).value(), flags.value());
}

#[test]
fn test_command_flags_render() {
    let c = Constants::global();
    let mut cmd = Command::new(0);
    cmd.start_src = c.trig_src.member("now").unwrap().value;
    assert_eq!(cmd.command_flags(c).to_string(), "-");
    cmd.flags = c.cmdf.member("priority").unwrap().value;
    assert_eq!(cmd.command_flags(c).to_string(), "priority");
    assert_eq!(cmd.trigger(Stage::Start, c).to_string(), "now");
    assert_eq!(cmd.trigger(Stage::Stop, c).to_string(), "-");
}

// ============================================================================
// Instruction Flow
// ============================================================================

#[test]
fn test_insn_demo_flow() {
    let mut dev = device();
    let config = AcquisitionConfig {
        channels: vec![3],
        num_scans: 25,
        ..Default::default()
    };
    config.validate(Constants::global()).unwrap();

    let ai = dev
        .find_subdevice_by_type(Constants::global().subdevice_type.member("ai").unwrap())
        .unwrap();
    let aref = config.aref_value(Constants::global()).unwrap();
    let channel = DataChannel::new(ai.index(), 3, config.range, aref);
    let result = timed_read(&mut dev, &ai, channel.chanspec(), config.num_scans as usize).unwrap();

    assert_eq!(result.data.len(), 25);
    let maxdata = channel.get_maxdata(&dev).unwrap();
    assert!(result.data.iter().all(|&s| s <= maxdata));
    assert!(result.t2 > result.t1);
}

#[test]
fn test_partial_insnlist_reported() {
    let mut dev = device();
    let ai = dev.subdevice(0);
    let mut bad_read = Insn::new(
        Constants::global().insn.member("read").unwrap().value,
        0,
        ChanSpec::new(99, 0, 0),
    );
    bad_read.set_data([0]).unwrap();
    let mut insns = vec![gtod_insn(&ai).unwrap(), bad_read, gtod_insn(&ai).unwrap()];
    assert_eq!(dev.do_insnlist(&mut insns).unwrap(), 1);
    assert!(TimedRead::from_insns(&insns[..2]).is_err());
}

// ============================================================================
// Command Flow
// ============================================================================

#[test]
fn test_cmd_demo_flow() {
    let mut dev = device();
    let config = AcquisitionConfig {
        channels: vec![0, 1, 2, 3],
        frequency: Some(1000.0),
        num_scans: 8,
        ..Default::default()
    };
    config.validate(Constants::global()).unwrap();

    let sub = dev.subdevice(0);
    let aref = config.aref_value(Constants::global()).unwrap();
    let chanlist: Chanlist = config
        .channels
        .iter()
        .map(|&i| DataChannel::new(sub.index(), i, config.range, aref))
        .collect();

    let mut streaming = dev.streaming_subdevice(sub.index());
    prepare_command(&mut dev, &mut streaming, &chanlist, config.period_ns(), config.num_scans).unwrap();
    assert_eq!(streaming.cmd.scan_begin_arg, 1_000_000);
    streaming.prepare_until_valid(&mut dev, 2).unwrap();

    let rendered = streaming.cmd.to_string();
    assert!(rendered.contains("scan_begin_src: timer"));
    assert!(rendered.contains("stop_src: count"));

    streaming.command(&mut dev).unwrap();
    let scans = streaming.read_scans(&mut dev, config.num_scans as usize).unwrap();
    assert_eq!(scans.len(), 8);
    assert!(scans.iter().all(|scan| scan.len() == 4));
    streaming.cancel(&mut dev).unwrap();
    assert!(!sub.get_flags(&dev).unwrap().get("busy").unwrap());
}

#[test]
fn test_never_valid_command() {
    let mut dev = device();
    let mut streaming = dev.streaming_subdevice(0);
    let chanlist: Chanlist = [0, 1]
        .iter()
        .map(|&i| DataChannel::new(0, i, i, 0))
        .collect();
    prepare_command(&mut dev, &mut streaming, &chanlist, 0, 1).unwrap();
    match streaming.prepare_until_valid(&mut dev, 2) {
        Err(DeviceError::CommandNotReady { attempts, outcome }) => {
            assert_eq!(attempts, 2);
            assert_eq!(outcome, ValidationOutcome::InvalidChanlist);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(streaming.command(&mut dev).is_err());
}

#[test]
fn test_command_json_round_trip() {
    let mut dev = device();
    let mut streaming = dev.streaming_subdevice(0);
    let chanlist: Chanlist = (0..2).map(|i| DataChannel::new(0, i, 0, 0)).collect();
    prepare_command(&mut dev, &mut streaming, &chanlist, 500_000, 3).unwrap();
    streaming.prepare_until_valid(&mut dev, 2).unwrap();

    let json = serde_json::to_string(&streaming.cmd).unwrap();
    let restored: Command = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, streaming.cmd);
}

// ============================================================================
// Properties
// ============================================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_configured_acquisition(
            channels in proptest::collection::vec(0u32..16, 1..5),
            frequency in 10.0f64..10_000.0,
            num_scans in 1u32..16,
        ) {
            let config = AcquisitionConfig {
                channels,
                frequency: Some(frequency),
                num_scans,
                ..Default::default()
            };
            prop_assert!(config.validate(Constants::global()).is_ok());

            let mut dev = device();
            let mut streaming = dev.streaming_subdevice(0);
            let chanlist: Chanlist = config
                .channels
                .iter()
                .map(|&i| DataChannel::new(0, i, config.range, 0))
                .collect();
            prepare_command(&mut dev, &mut streaming, &chanlist, config.period_ns(), num_scans)
                .unwrap();
            streaming.prepare_until_valid(&mut dev, 2).unwrap();
            streaming.command(&mut dev).unwrap();

            let scans = streaming.read_scans(&mut dev, num_scans as usize).unwrap();
            prop_assert_eq!(scans.len(), num_scans as usize);
            prop_assert!(scans.iter().all(|scan| scan.len() == config.channels.len()));
        }
    }
}
