//! Integration tests for streaming acquisition against the simulated board

use comedi_device::{
    inttrig_insn, prepare_command, Chanlist, Device, DeviceError, SimulatedDriver,
    SimulatedSubdevice,
};
use comedi_spec::{Constants, ValidationOutcome};
use proptest::prelude::*;

fn device() -> Device<SimulatedDriver> {
    Device::open("/dev/comedi0", SimulatedDriver::new())
}

fn trig(name: &str) -> u32 {
    Constants::global().trig_src.index_by_name(name).unwrap().value
}

// ============================================================================
// Command Preparation
// ============================================================================

#[test]
fn test_adjusted_command_converges() {
    let mut dev = device();
    let mut sub = dev.streaming_subdevice(0);
    let chanlist: Chanlist = (0..4).map(|i| sub.subdevice().channel(i)).collect();
    prepare_command(&mut dev, &mut sub, &chanlist, 1_000_000, 3).unwrap();

    // too fast for four channels and off the timer grid
    sub.cmd.scan_begin_arg = 1_234;
    assert_eq!(
        sub.command_test(&mut dev).unwrap(),
        ValidationOutcome::ArgumentOutOfRange
    );
    assert_eq!(sub.cmd.scan_begin_arg, 40_000);
    assert_eq!(sub.command_test(&mut dev).unwrap(), ValidationOutcome::Valid);
}

#[test]
fn test_bad_source_then_valid() {
    let mut dev = device();
    let mut sub = dev.streaming_subdevice(0);
    let chanlist: Chanlist = (0..1).map(|i| sub.subdevice().channel(i)).collect();
    prepare_command(&mut dev, &mut sub, &chanlist, 0, 1).unwrap();
    sub.cmd.stop_src |= trig("ext");
    assert_eq!(
        sub.command_test(&mut dev).unwrap(),
        ValidationOutcome::UnsupportedSource
    );
    sub.prepare_until_valid(&mut dev, 2).unwrap();
    assert_eq!(sub.cmd.stop_src, trig("count"));
}

#[test]
fn test_commands_need_streaming_subdevice() {
    let mut dev = device();
    let mut ao = dev.streaming_subdevice(1);
    assert!(matches!(
        ao.get_cmd_src_mask(&mut dev),
        Err(DeviceError::Driver(err)) if err.function == "comedi_get_cmd_src_mask"
    ));
}

// ============================================================================
// Acquisition
// ============================================================================

#[test]
fn test_counted_acquisition() {
    let mut dev = device();
    let mut sub = dev.streaming_subdevice(0);
    let chanlist: Chanlist = [0, 5, 9].iter().map(|&i| sub.subdevice().channel(i)).collect();
    prepare_command(&mut dev, &mut sub, &chanlist, 100_000, 6).unwrap();
    sub.prepare_until_valid(&mut dev, 2).unwrap();
    sub.command(&mut dev).unwrap();

    let flags = sub.subdevice().get_flags(&dev).unwrap();
    assert!(flags.get("busy").unwrap());

    let scans = sub.read_scans(&mut dev, 6).unwrap();
    assert_eq!(scans.len(), 6);
    assert!(scans.iter().all(|scan| scan.len() == 3));
    assert!(matches!(
        sub.read_scans(&mut dev, 1),
        Err(DeviceError::Incomplete { expected: 3, received: 0 })
    ));
}

#[test]
fn test_empty_read_keeps_counted_acquisition() {
    let mut dev = device();
    let mut sub = dev.streaming_subdevice(0);
    let chanlist: Chanlist = (0..2).map(|i| sub.subdevice().channel(i)).collect();
    prepare_command(&mut dev, &mut sub, &chanlist, 0, 4).unwrap();
    sub.prepare_until_valid(&mut dev, 2).unwrap();
    sub.command(&mut dev).unwrap();

    assert!(dev.read(0, 0).unwrap().is_empty());
    assert_eq!(dev.read(0, 3).unwrap().len(), 3);
    assert!(dev.read(0, 0).unwrap().is_empty());
    assert_eq!(dev.read(0, 8).unwrap().len(), 5);

    // drained: the next empty read ends the acquisition
    assert!(dev.read(0, 8).unwrap().is_empty());
    assert!(dev.read(0, 8).is_err());
}

#[test]
fn test_internal_trigger() {
    let mut dev = device();
    let mut sub = dev.streaming_subdevice(0);
    let chanlist: Chanlist = (0..2).map(|i| sub.subdevice().channel(i)).collect();
    prepare_command(&mut dev, &mut sub, &chanlist, 0, 2).unwrap();
    sub.cmd.start_src = trig("int");
    sub.prepare_until_valid(&mut dev, 2).unwrap();
    sub.command(&mut dev).unwrap();

    assert!(sub.read_scans(&mut dev, 1).is_err());
    let mut trigger = inttrig_insn(&sub.subdevice()).unwrap();
    dev.do_insn(&mut trigger).unwrap();
    assert_eq!(sub.read_scans(&mut dev, 1).unwrap().len(), 1);
    sub.cancel(&mut dev).unwrap();
}

#[test]
fn test_busy_subdevice_rejects_instructions() {
    let mut dev = device();
    let mut sub = dev.streaming_subdevice(0);
    let chanlist: Chanlist = (0..1).map(|i| sub.subdevice().channel(i)).collect();
    prepare_command(&mut dev, &mut sub, &chanlist, 0, 10).unwrap();
    sub.prepare_until_valid(&mut dev, 2).unwrap();
    sub.command(&mut dev).unwrap();

    let err = sub.subdevice().channel(0).data_read(&mut dev).unwrap_err();
    assert!(matches!(err, DeviceError::Driver(e) if e.code == -16));
    sub.cancel(&mut dev).unwrap();
    assert!(sub.subdevice().channel(0).data_read(&mut dev).is_ok());
}

#[test]
fn test_custom_board() {
    let driver = SimulatedDriver::with_subdevices(
        "dio-only",
        vec![SimulatedSubdevice::digital_io(24)],
    );
    let dev = Device::open("/dev/comedi1", driver);
    assert_eq!(dev.board_name(), "dio-only");
    let dio = Constants::global().subdevice_type.index_by_name("dio").unwrap();
    assert_eq!(dev.find_subdevice_by_type(dio).unwrap().index(), 0);
    assert_eq!(dev.n_channels(0).unwrap(), 24);
}

// ============================================================================
// Properties
// ============================================================================

mod proptests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_every_scan_is_complete(
            channels in proptest::collection::vec(0u32..16, 1..6),
            num_scans in 1u32..20,
        ) {
            let mut dev = device();
            let mut sub = dev.streaming_subdevice(0);
            let chanlist: Chanlist = channels
                .iter()
                .map(|&i| sub.subdevice().channel(i))
                .collect();
            prepare_command(&mut dev, &mut sub, &chanlist, 0, num_scans).unwrap();
            sub.prepare_until_valid(&mut dev, 2).unwrap();
            sub.command(&mut dev).unwrap();

            let scans = sub.read_scans(&mut dev, num_scans as usize).unwrap();
            prop_assert_eq!(scans.len(), num_scans as usize);
            for scan in &scans {
                prop_assert_eq!(scan.len(), channels.len());
            }
        }

        #[test]
        fn test_test_twice_is_stable(period in 0u32..5_000_000) {
            let mut dev = device();
            let mut sub = dev.streaming_subdevice(0);
            let chanlist: Chanlist = (0..3).map(|i| sub.subdevice().channel(i)).collect();
            prepare_command(&mut dev, &mut sub, &chanlist, period, 1).unwrap();
            sub.cmd.scan_begin_arg = period;
            sub.command_test(&mut dev).unwrap();
            sub.command_test(&mut dev).unwrap();
            prop_assert_eq!(sub.command_test(&mut dev).unwrap(), ValidationOutcome::Valid);
        }
    }
}
