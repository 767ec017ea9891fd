//! # Simulated Driver
//!
//! An in-memory board with one streaming analog input, an analog output and
//! a digital I/O subdevice. Samples are a deterministic ramp, so tests and
//! demos can check what comes back.
//!
//! Command testing follows the usual five driver stages:
//!
//! 1. drop unsupported trigger sources
//! 2. require one source per stage and a compatible combination
//! 3. clamp arguments into range
//! 4. round timer arguments to the timer base
//! 5. check the chanlist

use crate::driver::Driver;
use crate::error::DriverError;
use comedi_spec::{
    ChanSpec, Command, ConstantRegistry, Constants, Insn, LSampl, Sampl, Stage,
};

const EIO: i32 = -5;
const EBUSY: i32 = -16;
const EINVAL: i32 = -22;

/// Microseconds since the epoch when a simulated board powers up.
const BOOT_TIME_US: u64 = 1_332_242_184_029_691;

/// Samples produced per read while streaming with `stop_src=none`.
const CONTINUOUS_BLOCK: usize = 256;

fn value(registry: &ConstantRegistry, name: &str) -> u32 {
    registry.index_by_name(name).map_or(0, |c| c.value)
}

fn trig(name: &str) -> u32 {
    value(&Constants::global().trig_src, name)
}

fn sdf(names: &[&str]) -> u32 {
    names
        .iter()
        .fold(0, |acc, name| acc | value(&Constants::global().sdf, name))
}

fn subd(name: &str) -> u32 {
    value(&Constants::global().subdevice_type, name)
}

fn opcode(name: &str) -> u32 {
    value(&Constants::global().insn, name)
}

fn config_id(name: &str) -> u32 {
    value(&Constants::global().configuration_ids, name)
}

fn invalid(function: &str, message: &str) -> DriverError {
    DriverError::new(function, EINVAL, format!("Invalid argument: {message}"))
}

// ============================================================================
// Board Description
// ============================================================================

/// Timing limits of a streaming subdevice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamCapabilities {
    /// Supported sources per stage, in [`Stage::ALL`] order
    pub src_mask: [u32; 5],
    /// Fastest conversion period, in ns
    pub min_convert_ns: u32,
    /// Timer resolution, in ns
    pub timer_base_ns: u32,
    /// Every chanlist entry must share one range
    pub same_range_required: bool,
}

impl StreamCapabilities {
    pub fn analog_input() -> Self {
        Self {
            src_mask: [
                trig("now") | trig("ext") | trig("int"),
                trig("timer") | trig("ext") | trig("follow"),
                trig("timer") | trig("ext") | trig("now"),
                trig("count"),
                trig("none") | trig("count"),
            ],
            min_convert_ns: 10_000,
            timer_base_ns: 1_000,
            same_range_required: true,
        }
    }

    fn mask(&self, stage: Stage) -> u32 {
        self.src_mask[stage as usize]
    }
}

/// One subdevice of a simulated board.
#[derive(Debug, Clone)]
pub struct SimulatedSubdevice {
    pub kind: u32,
    pub flags: u32,
    pub n_channels: u32,
    pub n_ranges: u32,
    pub maxdata: u32,
    pub stream: Option<StreamCapabilities>,
    outputs: Vec<LSampl>,
    directions: u32,
    opendrain: u32,
    reads: u64,
    running: Option<Stream>,
}

impl SimulatedSubdevice {
    fn new(kind: u32, flags: u32, n_channels: u32, n_ranges: u32, maxdata: u32) -> Self {
        Self {
            kind,
            flags,
            n_channels,
            n_ranges,
            maxdata,
            stream: None,
            outputs: vec![0; n_channels as usize],
            directions: 0,
            opendrain: 0,
            reads: 0,
            running: None,
        }
    }

    /// 16-bit analog input supporting streaming commands
    pub fn analog_input(n_channels: u32) -> Self {
        let mut sub = Self::new(
            subd("ai"),
            sdf(&["readable", "ground", "common", "diff", "cmd_read"]),
            n_channels,
            4,
            0xffff,
        );
        sub.stream = Some(StreamCapabilities::analog_input());
        sub
    }

    pub fn analog_output(n_channels: u32) -> Self {
        Self::new(
            subd("ao"),
            sdf(&["writable", "ground"]),
            n_channels,
            1,
            0xffff,
        )
    }

    pub fn digital_io(n_channels: u32) -> Self {
        Self::new(subd("dio"), sdf(&["readable", "writable"]), n_channels, 1, 1)
    }

    fn is_type(&self, name: &str) -> bool {
        self.kind == subd(name)
    }

    fn ramp(&self, channel: u32, step: u64) -> u32 {
        let raw = step
            .wrapping_mul(97)
            .wrapping_add(u64::from(channel) * 4099);
        (raw % (u64::from(self.maxdata) + 1)) as u32
    }

    fn check_channel(&self, function: &str, spec: ChanSpec) -> Result<u32, DriverError> {
        let channel = spec.channel();
        if channel >= self.n_channels {
            return Err(invalid(function, "channel out of range"));
        }
        Ok(channel)
    }

    /// Bit of a digital line in the 32-bit line word
    fn line_bit(function: &str, channel: u32) -> Result<u32, DriverError> {
        1u32.checked_shl(channel)
            .ok_or_else(|| invalid(function, "digital line beyond bit 31"))
    }
}

/// A running (or armed) acquisition.
#[derive(Debug, Clone)]
struct Stream {
    chanlist: Vec<ChanSpec>,
    armed: bool,
    produced: u64,
    total: Option<u64>,
    scan_period_us: u64,
}

// ============================================================================
// Driver
// ============================================================================

/// A [`Driver`] with no hardware behind it.
#[derive(Debug, Clone)]
pub struct SimulatedDriver {
    board: String,
    subdevices: Vec<SimulatedSubdevice>,
    clock_us: u64,
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDriver {
    /// The stock board: 16-channel AI, 2-channel AO, 8-line DIO.
    pub fn new() -> Self {
        Self::with_subdevices(
            "sim-daq",
            vec![
                SimulatedSubdevice::analog_input(16),
                SimulatedSubdevice::analog_output(2),
                SimulatedSubdevice::digital_io(8),
            ],
        )
    }

    pub fn with_subdevices(board: impl Into<String>, subdevices: Vec<SimulatedSubdevice>) -> Self {
        Self {
            board: board.into(),
            subdevices,
            clock_us: BOOT_TIME_US,
        }
    }

    /// Current simulated time, in microseconds since the epoch
    pub fn clock_us(&self) -> u64 {
        self.clock_us
    }

    fn sub(&self, function: &str, index: u32) -> Result<&SimulatedSubdevice, DriverError> {
        self.subdevices
            .get(index as usize)
            .ok_or_else(|| invalid(function, "no such subdevice"))
    }

    fn sub_mut(
        &mut self,
        function: &str,
        index: u32,
    ) -> Result<&mut SimulatedSubdevice, DriverError> {
        self.subdevices
            .get_mut(index as usize)
            .ok_or_else(|| invalid(function, "no such subdevice"))
    }

    fn caps(&self, function: &str, index: u32) -> Result<&StreamCapabilities, DriverError> {
        self.sub(function, index)?
            .stream
            .as_ref()
            .ok_or_else(|| DriverError::new(function, EIO, "Input/output error: no command support"))
    }

    // ========================================================================
    // Instructions
    // ========================================================================

    fn read(&mut self, insn: &mut Insn) -> Result<i32, DriverError> {
        const F: &str = "comedi_do_insn";
        let sub = self.sub_mut(F, insn.subdev)?;
        if sub.running.is_some() {
            return Err(DriverError::new(F, EBUSY, "Device or resource busy"));
        }
        let channel = sub.check_channel(F, insn.chanspec)?;
        for i in 0..insn.n() {
            let sample = if sub.is_type("ai") {
                sub.reads += 1;
                sub.ramp(channel, sub.reads)
            } else if sub.is_type("dio") {
                u32::from(sub.outputs[0] & SimulatedSubdevice::line_bit(F, channel)? != 0)
            } else {
                sub.outputs[channel as usize]
            };
            insn.store_sample(i, sample);
        }
        self.clock_us += 10 * insn.n() as u64;
        Ok(insn.n() as i32)
    }

    fn write(&mut self, insn: &mut Insn) -> Result<i32, DriverError> {
        const F: &str = "comedi_do_insn";
        let sub = self.sub_mut(F, insn.subdev)?;
        if sub.flags & sdf(&["writable"]) == 0 {
            return Err(invalid(F, "subdevice is not writable"));
        }
        let channel = sub.check_channel(F, insn.chanspec)?;
        for sample in insn.data() {
            if sample > sub.maxdata {
                return Err(invalid(F, "sample exceeds maxdata"));
            }
            if sub.is_type("dio") {
                let bit = SimulatedSubdevice::line_bit(F, channel)?;
                sub.outputs[0] = if sample != 0 {
                    sub.outputs[0] | bit
                } else {
                    sub.outputs[0] & !bit
                };
            } else {
                sub.outputs[channel as usize] = sample;
            }
        }
        Ok(insn.n() as i32)
    }

    fn bits(&mut self, insn: &mut Insn) -> Result<i32, DriverError> {
        const F: &str = "comedi_do_insn";
        let sub = self.sub_mut(F, insn.subdev)?;
        if !sub.is_type("dio") {
            return Err(invalid(F, "bits on a non-digital subdevice"));
        }
        let (Some(mask), Some(bits)) = (insn.sample(0), insn.sample(1)) else {
            return Err(invalid(F, "bits needs two samples"));
        };
        let base = insn.chanspec.channel();
        if base >= 32 {
            return Err(invalid(F, "base channel beyond bit 31"));
        }
        let mask = (mask << base) & sub.directions;
        sub.outputs[0] = (sub.outputs[0] & !mask) | ((bits << base) & mask);
        insn.store_sample(1, sub.outputs[0] >> base);
        Ok(insn.n() as i32)
    }

    fn config(&mut self, insn: &mut Insn) -> Result<i32, DriverError> {
        const F: &str = "comedi_do_insn";
        let sub = self.sub_mut(F, insn.subdev)?;
        if !sub.is_type("dio") {
            return Err(invalid(F, "configuration not supported"));
        }
        let channel = sub.check_channel(F, insn.chanspec)?;
        let bit = SimulatedSubdevice::line_bit(F, channel)?;
        match insn.sample(0) {
            Some(id) if id == config_id("dio_input") => {
                sub.directions &= !bit;
                sub.opendrain &= !bit;
            }
            Some(id) if id == config_id("dio_output") => {
                sub.directions |= bit;
                sub.opendrain &= !bit;
            }
            Some(id) if id == config_id("dio_opendrain") => {
                sub.directions |= bit;
                sub.opendrain |= bit;
            }
            Some(id) if id == config_id("dio_query") => {
                let direction = if sub.opendrain & bit != 0 {
                    config_id("dio_opendrain")
                } else {
                    u32::from(sub.directions & bit != 0)
                };
                if !insn.store_sample(1, direction) {
                    return Err(invalid(F, "query needs two samples"));
                }
            }
            _ => return Err(invalid(F, "unknown configuration id")),
        }
        Ok(insn.n() as i32)
    }

    fn gtod(&mut self, insn: &mut Insn) -> Result<i32, DriverError> {
        if insn.n() < 2 {
            return Err(invalid("comedi_do_insn", "gtod needs two samples"));
        }
        self.clock_us += 1;
        insn.store_sample(0, (self.clock_us / 1_000_000) as u32);
        insn.store_sample(1, (self.clock_us % 1_000_000) as u32);
        Ok(insn.n() as i32)
    }

    fn wait(&mut self, insn: &mut Insn) -> Result<i32, DriverError> {
        let ns = insn.sample(0).unwrap_or(0);
        self.clock_us += u64::from(ns.div_ceil(1_000));
        Ok(insn.n() as i32)
    }

    fn inttrig(&mut self, insn: &mut Insn) -> Result<i32, DriverError> {
        const F: &str = "comedi_do_insn";
        let sub = self.sub_mut(F, insn.subdev)?;
        match sub.running.as_mut() {
            Some(stream) if !stream.armed => {
                stream.armed = true;
                tracing::debug!(subdevice = insn.subdev, "internal trigger fired");
                Ok(insn.n() as i32)
            }
            _ => Err(invalid(F, "no command waiting for an internal trigger")),
        }
    }

    // ========================================================================
    // Command Testing
    // ========================================================================

    fn test_sources(caps: &StreamCapabilities, cmd: &mut Command) -> bool {
        let mut ok = true;
        for stage in Stage::ALL {
            let src = cmd.src_mut(stage);
            let masked = *src & caps.mask(stage);
            if masked == 0 || masked != *src {
                ok = false;
            }
            *src = masked;
        }
        ok
    }

    fn test_combination(cmd: &Command) -> bool {
        let single = Stage::ALL
            .iter()
            .all(|&stage| cmd.src(stage).count_ones() == 1);
        let follow_needs_timer =
            cmd.scan_begin_src != trig("follow") || cmd.convert_src == trig("timer");
        single && follow_needs_timer
    }

    fn clamp(target: &mut u32, value: u32) -> bool {
        let changed = *target != value;
        *target = value;
        !changed
    }

    fn test_arguments(caps: &StreamCapabilities, cmd: &mut Command) -> bool {
        let n = cmd.chanlist_len() as u32;
        let mut ok = true;

        if cmd.start_src != trig("ext") {
            ok &= Self::clamp(&mut cmd.start_arg, 0);
        }

        if cmd.convert_src == trig("timer") {
            let arg = cmd.convert_arg.max(caps.min_convert_ns);
            ok &= Self::clamp(&mut cmd.convert_arg, arg);
        } else if cmd.convert_src == trig("now") {
            ok &= Self::clamp(&mut cmd.convert_arg, 0);
        }

        if cmd.scan_begin_src == trig("timer") {
            let per_scan = match cmd.convert_src {
                src if src == trig("timer") => cmd.convert_arg,
                _ => caps.min_convert_ns,
            };
            let arg = cmd.scan_begin_arg.max(per_scan.saturating_mul(n.max(1)));
            ok &= Self::clamp(&mut cmd.scan_begin_arg, arg);
        } else if cmd.scan_begin_src == trig("follow") {
            ok &= Self::clamp(&mut cmd.scan_begin_arg, 0);
        }

        if n > 0 {
            ok &= Self::clamp(&mut cmd.scan_end_arg, n);
        }

        if cmd.stop_src == trig("count") {
            let arg = cmd.stop_arg.max(1);
            ok &= Self::clamp(&mut cmd.stop_arg, arg);
        } else if cmd.stop_src == trig("none") {
            ok &= Self::clamp(&mut cmd.stop_arg, 0);
        }
        ok
    }

    fn round(ns: u32, base: u32, flags: u32) -> u32 {
        // a zero base means the timer takes any period
        if base == 0 {
            return ns;
        }
        let constants = Constants::global();
        let mode = flags & constants.trig_round_mask;
        let down = ns / base * base;
        let up = down.saturating_add(if ns % base == 0 { 0 } else { base });
        if mode == value(&constants.trig_round, "down") {
            down
        } else if mode == value(&constants.trig_round, "up")
            || mode == value(&constants.trig_round, "up_next")
        {
            up
        } else if ns % base >= base / 2 {
            up
        } else {
            down
        }
    }

    fn test_timers(caps: &StreamCapabilities, cmd: &mut Command) -> bool {
        let mut ok = true;
        for stage in [Stage::ScanBegin, Stage::Convert] {
            if cmd.src(stage) != trig("timer") {
                continue;
            }
            let mut rounded = Self::round(cmd.arg(stage), caps.timer_base_ns, cmd.flags);
            if rounded < caps.min_convert_ns {
                rounded = caps.min_convert_ns;
            }
            ok &= Self::clamp(cmd.arg_mut(stage), rounded);
        }
        ok
    }

    fn test_chanlist(sub: &SimulatedSubdevice, caps: &StreamCapabilities, cmd: &Command) -> bool {
        let chanlist = cmd.chanlist();
        let Some(first) = chanlist.first() else {
            return false;
        };
        let aref_flags = [
            sdf(&["ground"]),
            sdf(&["common"]),
            sdf(&["diff"]),
            sdf(&["other"]),
        ];
        chanlist.iter().all(|spec| {
            spec.channel() < sub.n_channels
                && spec.range() < sub.n_ranges
                && sub.flags & aref_flags[spec.aref_value() as usize] != 0
                && (!caps.same_range_required || spec.range() == first.range())
        })
    }
}

impl Driver for SimulatedDriver {
    fn driver_name(&self) -> &str {
        "simulated"
    }

    fn board_name(&self) -> &str {
        &self.board
    }

    fn n_subdevices(&self) -> Result<u32, DriverError> {
        Ok(self.subdevices.len() as u32)
    }

    fn subdevice_type(&self, subdevice: u32) -> Result<u32, DriverError> {
        Ok(self.sub("comedi_get_subdevice_type", subdevice)?.kind)
    }

    fn subdevice_flags(&self, subdevice: u32) -> Result<u32, DriverError> {
        let sub = self.sub("comedi_get_subdevice_flags", subdevice)?;
        let runtime = match &sub.running {
            Some(stream) if stream.armed => sdf(&["busy", "busy_owner", "running"]),
            Some(_) => sdf(&["busy", "busy_owner"]),
            None => 0,
        };
        Ok(sub.flags | runtime)
    }

    fn n_channels(&self, subdevice: u32) -> Result<u32, DriverError> {
        Ok(self.sub("comedi_get_n_channels", subdevice)?.n_channels)
    }

    fn maxdata(&self, subdevice: u32, channel: u32) -> Result<u32, DriverError> {
        let sub = self.sub("comedi_get_maxdata", subdevice)?;
        if channel >= sub.n_channels {
            return Err(invalid("comedi_get_maxdata", "channel out of range"));
        }
        Ok(sub.maxdata)
    }

    fn perform_instruction(&mut self, insn: &mut Insn) -> Result<i32, DriverError> {
        let op = insn.insn;
        if op == opcode("read") {
            self.read(insn)
        } else if op == opcode("write") {
            self.write(insn)
        } else if op == opcode("bits") {
            self.bits(insn)
        } else if op == opcode("config") {
            self.config(insn)
        } else if op == opcode("gtod") {
            self.gtod(insn)
        } else if op == opcode("wait") {
            self.wait(insn)
        } else if op == opcode("inttrig") {
            self.inttrig(insn)
        } else {
            Err(invalid("comedi_do_insn", "unknown instruction"))
        }
    }

    fn probe_command_capabilities(&mut self, subdevice: u32) -> Result<Command, DriverError> {
        let caps = self.caps("comedi_get_cmd_src_mask", subdevice)?;
        let mut cmd = Command::new(subdevice);
        for stage in Stage::ALL {
            *cmd.src_mut(stage) = caps.mask(stage);
        }
        Ok(cmd)
    }

    fn probe_generic_timed_command(
        &mut self,
        subdevice: u32,
        chanlist_len: u32,
        scan_period_ns: u32,
    ) -> Result<Command, DriverError> {
        const F: &str = "comedi_get_cmd_generic_timed";
        let caps = self.caps(F, subdevice)?;
        if chanlist_len == 0 {
            return Err(invalid(F, "empty chanlist"));
        }
        let min_scan = caps.min_convert_ns.saturating_mul(chanlist_len);
        let period = Self::round(scan_period_ns.max(min_scan), caps.timer_base_ns, 0);

        let mut cmd = Command::new(subdevice);
        cmd.start_src = trig("now");
        cmd.scan_begin_src = trig("timer");
        cmd.scan_begin_arg = period.max(min_scan);
        cmd.convert_src = trig("timer");
        cmd.convert_arg = caps.min_convert_ns;
        cmd.scan_end_src = trig("count");
        cmd.scan_end_arg = chanlist_len;
        cmd.stop_src = trig("none");
        Ok(cmd)
    }

    fn test_command(&mut self, command: &mut Command) -> Result<i32, DriverError> {
        const F: &str = "comedi_command_test";
        let sub = self.sub(F, command.subdev)?;
        let caps = self.caps(F, command.subdev)?;
        if !Self::test_sources(caps, command) {
            return Ok(1);
        }
        if !Self::test_combination(command) {
            return Ok(2);
        }
        if !Self::test_arguments(caps, command) {
            return Ok(3);
        }
        if !Self::test_timers(caps, command) {
            return Ok(4);
        }
        if !Self::test_chanlist(sub, caps, command) {
            return Ok(5);
        }
        Ok(0)
    }

    fn submit_command(&mut self, command: &Command) -> Result<(), DriverError> {
        const F: &str = "comedi_command";
        if self.sub(F, command.subdev)?.running.is_some() {
            return Err(DriverError::new(F, EBUSY, "Device or resource busy"));
        }
        let mut checked = command.clone();
        let code = self.test_command(&mut checked)?;
        if code != 0 || checked != *command {
            return Err(invalid(F, "command does not pass command_test"));
        }

        let stream = Stream {
            chanlist: command.chanlist(),
            armed: command.start_src != trig("int"),
            produced: 0,
            total: (command.stop_src == trig("count"))
                .then(|| u64::from(command.stop_arg) * command.chanlist_len() as u64),
            scan_period_us: u64::from(command.scan_begin_arg / 1_000),
        };
        tracing::debug!(
            subdevice = command.subdev,
            armed = stream.armed,
            total = ?stream.total,
            "simulated acquisition started"
        );
        self.sub_mut(F, command.subdev)?.running = Some(stream);
        Ok(())
    }

    fn cancel_command(&mut self, subdevice: u32) -> Result<(), DriverError> {
        self.sub_mut("comedi_cancel", subdevice)?.running = None;
        Ok(())
    }

    fn read_samples(
        &mut self,
        subdevice: u32,
        max_samples: usize,
    ) -> Result<Vec<Sampl>, DriverError> {
        const F: &str = "read";
        let sub = self.sub_mut(F, subdevice)?;
        let Some(mut stream) = sub.running.take() else {
            return Err(invalid(F, "no command running"));
        };
        if !stream.armed {
            sub.running = Some(stream);
            return Ok(Vec::new());
        }

        let width = stream.chanlist.len().max(1) as u64;
        let available = match stream.total {
            Some(total) => (total - stream.produced) as usize,
            None => CONTINUOUS_BLOCK,
        };
        let n = available.min(max_samples);
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let position = stream.produced;
            let spec = stream.chanlist[(position % width) as usize];
            let sample = sub.ramp(spec.channel(), position / width) as Sampl;
            out.push(sample);
            stream.produced += 1;
        }
        let elapsed = n as u64 / width * stream.scan_period_us;

        // a finished count acquisition ends on the first empty read
        let drained = stream.total == Some(stream.produced) && out.is_empty();
        if !drained {
            sub.running = Some(stream);
        }
        self.clock_us += elapsed;
        Ok(out)
    }
}
