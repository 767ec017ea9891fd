//! # Comedi Constant Namespace
//!
//! Static table of every driver constant the registries are built from.
//! Values are kept as the driver declares them (signed where the C header
//! uses a negative literal); registries normalize them to `u32`.

/// One raw driver constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawConstant {
    pub name: &'static str,
    pub value: i64,
    /// Short description appended to the documentation string
    pub description: Option<&'static str>,
}

const fn c(name: &'static str, value: i64) -> RawConstant {
    RawConstant {
        name,
        value,
        description: None,
    }
}

const fn d(name: &'static str, value: i64, description: &'static str) -> RawConstant {
    RawConstant {
        name,
        value,
        description: Some(description),
    }
}

impl RawConstant {
    /// Documentation string: the raw name plus the description, if any.
    pub fn doc(&self) -> String {
        match self.description {
            Some(description) => format!("{} ({})", self.name, description),
            None => self.name.to_string(),
        }
    }
}

/// Every constant exported by the driver headers, in declaration order.
pub static COMEDI_NAMESPACE: &[RawConstant] = &[
    // ========================================================================
    // Analog reference
    // ========================================================================
    c("AREF_GROUND", 0x00),
    c("AREF_COMMON", 0x01),
    d("AREF_DIFF", 0x02, "differential"),
    d("AREF_OTHER", 0x03, "other / undefined"),
    // ========================================================================
    // Channel-specifier flag bits
    // ========================================================================
    c("CR_FLAGS_MASK", -67108864),
    d("CR_ALT_FILTER", 1 << 26, "alternate input filter"),
    d("CR_DITHER", 1 << 26, "dithering"),
    d("CR_DEGLITCH", 1 << 26, "deglitching"),
    d("CR_ALT_SOURCE", 1 << 27, "alternate input source"),
    d("CR_EDGE", 1 << 30, "edge triggered"),
    d("CR_INVERT", -2147483648, "inverted"),
    // ========================================================================
    // Instruction masks and opcodes
    // ========================================================================
    c("INSN_MASK_WRITE", 0x0800_0000),
    c("INSN_MASK_READ", 0x0400_0000),
    c("INSN_MASK_SPECIAL", 0x0200_0000),
    c("INSN_READ", 0x0400_0000),
    c("INSN_WRITE", 0x0800_0001),
    c("INSN_BITS", 0x0C00_0002),
    c("INSN_CONFIG", 0x0C00_0003),
    c("INSN_GTOD", 0x0600_0004),
    c("INSN_WAIT", 0x0A00_0005),
    c("INSN_INTTRIG", 0x0A00_0006),
    // ========================================================================
    // Instruction configuration ids
    // ========================================================================
    c("INSN_CONFIG_DIO_INPUT", 0),
    c("INSN_CONFIG_DIO_OUTPUT", 1),
    c("INSN_CONFIG_DIO_OPENDRAIN", 2),
    c("INSN_CONFIG_ANALOG_TRIG", 16),
    c("INSN_CONFIG_ALT_SOURCE", 20),
    c("INSN_CONFIG_DIGITAL_TRIG", 21),
    c("INSN_CONFIG_BLOCK_SIZE", 22),
    c("INSN_CONFIG_TIMER_1", 23),
    c("INSN_CONFIG_FILTER", 24),
    c("INSN_CONFIG_CHANGE_NOTIFY", 25),
    c("INSN_CONFIG_SERIAL_CLOCK", 26),
    c("INSN_CONFIG_BIDIRECTIONAL_DATA", 27),
    c("INSN_CONFIG_DIO_QUERY", 28),
    c("INSN_CONFIG_PWM_OUTPUT", 29),
    c("INSN_CONFIG_GET_PWM_OUTPUT", 30),
    c("INSN_CONFIG_ARM", 31),
    c("INSN_CONFIG_DISARM", 32),
    c("INSN_CONFIG_GET_COUNTER_STATUS", 33),
    c("INSN_CONFIG_RESET", 34),
    c("INSN_CONFIG_GPCT_SINGLE_PULSE_GENERATOR", 1001),
    c("INSN_CONFIG_GPCT_PULSE_TRAIN_GENERATOR", 1002),
    c("INSN_CONFIG_GPCT_QUADRATURE_ENCODER", 1003),
    c("INSN_CONFIG_SET_GATE_SRC", 2001),
    c("INSN_CONFIG_GET_GATE_SRC", 2002),
    c("INSN_CONFIG_SET_CLOCK_SRC", 2003),
    c("INSN_CONFIG_GET_CLOCK_SRC", 2004),
    c("INSN_CONFIG_SET_OTHER_SRC", 2005),
    c("INSN_CONFIG_GET_HARDWARE_BUFFER_SIZE", 2006),
    c("INSN_CONFIG_SET_COUNTER_MODE", 4097),
    c("INSN_CONFIG_8254_SET_MODE", 4097),
    c("INSN_CONFIG_8254_READ_STATUS", 4098),
    c("INSN_CONFIG_SET_ROUTING", 4099),
    c("INSN_CONFIG_GET_ROUTING", 4109),
    // ========================================================================
    // Trigger flags and rounding
    // ========================================================================
    d("TRIG_BOGUS", 0x0001, "do the motions"),
    c("TRIG_DITHER", 0x0002),
    c("TRIG_DEGLITCH", 0x0004),
    c("TRIG_RT", 0x0008),
    d("TRIG_CONFIG", 0x0010, "perform configuration, not triggering"),
    d("TRIG_WAKE_EOS", 0x0020, "wake up on end-of-scan events"),
    c("TRIG_WRITE", 0x0040),
    c("TRIG_ROUND_MASK", 0x0003_0000),
    c("TRIG_ROUND_NEAREST", 0x0000_0000),
    c("TRIG_ROUND_DOWN", 0x0001_0000),
    c("TRIG_ROUND_UP", 0x0002_0000),
    c("TRIG_ROUND_UP_NEXT", 0x0003_0000),
    // ========================================================================
    // Trigger sources
    // ========================================================================
    c("TRIG_ANY", -1),
    c("TRIG_INVALID", 0x0000_0000),
    d("TRIG_NONE", 0x0000_0001, "never trigger"),
    d("TRIG_NOW", 0x0000_0002, "trigger now + N ns"),
    d("TRIG_FOLLOW", 0x0000_0004, "trigger on next lower level trig"),
    d("TRIG_TIME", 0x0000_0008, "trigger at time N ns"),
    d("TRIG_TIMER", 0x0000_0010, "trigger at rate N ns"),
    d("TRIG_COUNT", 0x0000_0020, "trigger when count reaches N"),
    d("TRIG_EXT", 0x0000_0040, "trigger on external signal N"),
    d("TRIG_INT", 0x0000_0080, "trigger on comedi-internal signal N"),
    d("TRIG_OTHER", 0x0000_0100, "driver defined"),
    // ========================================================================
    // Command flags and events
    // ========================================================================
    d(
        "CMDF_PRIORITY",
        0x0000_0008,
        "try to use a real-time interrupt while performing command",
    ),
    c("CMDF_WRITE", 0x0000_0040),
    c("CMDF_RAWDATA", 0x0000_0080),
    c("COMEDI_EV_START", 0x0004_0000),
    c("COMEDI_EV_SCAN_BEGIN", 0x0008_0000),
    c("COMEDI_EV_CONVERT", 0x0010_0000),
    c("COMEDI_EV_SCAN_END", 0x0020_0000),
    c("COMEDI_EV_STOP", 0x0040_0000),
    // ========================================================================
    // Subdevice flags
    // ========================================================================
    d("SDF_BUSY", 0x0001, "device is busy"),
    d("SDF_BUSY_OWNER", 0x0002, "device is busy with your job"),
    d("SDF_LOCKED", 0x0004, "subdevice is locked"),
    d("SDF_LOCK_OWNER", 0x0008, "you own lock"),
    d("SDF_MAXDATA", 0x0010, "maxdata depends on channel"),
    d("SDF_FLAGS", 0x0020, "flags depend on channel"),
    d("SDF_RANGETYPE", 0x0040, "range type depends on channel"),
    d("SDF_PWM_COUNTER", 0x0080, "PWM can automatically switch off"),
    d("SDF_PWM_HBRIDGE", 0x0100, "PWM is signed (H-bridge)"),
    c("SDF_CMD", 0x1000),
    d("SDF_SOFT_CALIBRATED", 0x2000, "subdevice uses software calibration"),
    d("SDF_CMD_WRITE", 0x4000, "can do output commands"),
    d("SDF_CMD_READ", 0x8000, "can to input commands"),
    d("SDF_READABLE", 0x0001_0000, "subdevice can be read, e.g. analog input"),
    d(
        "SDF_WRITABLE",
        0x0002_0000,
        "subdevice can be written, e.g. analog output",
    ),
    c("SDF_WRITEABLE", 0x0002_0000),
    d(
        "SDF_INTERNAL",
        0x0004_0000,
        "subdevice does not have externally visible lines",
    ),
    c("SDF_RT", 0x0008_0000),
    d("SDF_GROUND", 0x0010_0000, "can do aref=ground"),
    d("SDF_COMMON", 0x0020_0000, "can do aref=common"),
    d("SDF_DIFF", 0x0040_0000, "can do aref=diff"),
    d("SDF_OTHER", 0x0080_0000, "can do aref=other"),
    d("SDF_DITHER", 0x0100_0000, "can do dithering"),
    d("SDF_DEGLITCH", 0x0200_0000, "can do deglitching"),
    d("SDF_MMAP", 0x0400_0000, "can do mmap()"),
    d("SDF_RUNNING", 0x0800_0000, "subdevice is acquiring data"),
    d("SDF_LSAMPL", 0x1000_0000, "subdevice uses 32-bit samples"),
    d("SDF_PACKED", 0x2000_0000, "subdevice can do packed DIO"),
    // ========================================================================
    // Subdevice types
    // ========================================================================
    d("COMEDI_SUBD_UNUSED", 0, "unused by driver"),
    d("COMEDI_SUBD_AI", 1, "analog input"),
    d("COMEDI_SUBD_AO", 2, "analog output"),
    d("COMEDI_SUBD_DI", 3, "digital input"),
    d("COMEDI_SUBD_DO", 4, "digital output"),
    d("COMEDI_SUBD_DIO", 5, "digital input/output"),
    c("COMEDI_SUBD_COUNTER", 6),
    c("COMEDI_SUBD_TIMER", 7),
    d("COMEDI_SUBD_MEMORY", 8, "memory, EEPROM, DPRAM"),
    d("COMEDI_SUBD_CALIB", 9, "calibration DACs"),
    d("COMEDI_SUBD_PROC", 10, "processor, DSP"),
    d("COMEDI_SUBD_SERIAL", 11, "serial IO"),
    d("COMEDI_SUBD_PWM", 12, "pulse-with modulation"),
    // ========================================================================
    // I/O direction and support level
    // ========================================================================
    c("COMEDI_INPUT", 0),
    c("COMEDI_OUTPUT", 1),
    c("COMEDI_OPENDRAIN", 2),
    c("COMEDI_UNKNOWN_SUPPORT", 0),
    c("COMEDI_SUPPORTED", 1),
    c("COMEDI_UNSUPPORTED", 2),
    // ========================================================================
    // Units and callbacks
    // ========================================================================
    c("UNIT_volt", 0),
    c("UNIT_mA", 1),
    c("UNIT_none", 2),
    d("COMEDI_CB_EOS", 1, "end of scan"),
    d("COMEDI_CB_EOA", 2, "end of acquisition"),
    c("COMEDI_CB_BLOCK", 4),
    c("COMEDI_CB_EOBUF", 8),
    d("COMEDI_CB_ERROR", 16, "card error during acquisition"),
    d("COMEDI_CB_OVERFLOW", 32, "buffer overflow/underflow"),
];

/// Look up a raw constant by its driver name.
pub fn lookup(name: &str) -> Option<&'static RawConstant> {
    COMEDI_NAMESPACE.iter().find(|raw| raw.name == name)
}
