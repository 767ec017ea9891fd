//! # Streaming Commands
//!
//! A [`Command`] (`comedi_cmd`) describes a streaming acquisition as five
//! trigger stages, each with a source (a `TRIG_*` flag value) and an
//! argument whose meaning depends on the source, plus an owned channel list
//! and sample buffer.
//!
//! ```text
//! start ─▶ scan_begin ─▶ convert (× chanlist_len) ─▶ scan_end ─▶ ... ─▶ stop
//! ```

use crate::buffer::SampleBuffer;
use crate::chanspec::{ChanSpec, ProducesChanSpec};
use crate::error::ResourceError;
use crate::flag_value::FlagValue;
use crate::format::field_table;
use crate::{Constants, Sampl};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five trigger stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Start,
    ScanBegin,
    Convert,
    ScanEnd,
    Stop,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Start,
        Stage::ScanBegin,
        Stage::Convert,
        Stage::ScanEnd,
        Stage::Stop,
    ];

    /// Field prefix, e.g. `scan_begin`
    pub const fn name(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::ScanBegin => "scan_begin",
            Stage::Convert => "convert",
            Stage::ScanEnd => "scan_end",
            Stage::Stop => "stop",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub subdev: u32,
    /// `CMDF_*` bits
    pub flags: u32,

    pub start_src: u32,
    pub start_arg: u32,

    pub scan_begin_src: u32,
    pub scan_begin_arg: u32,

    pub convert_src: u32,
    pub convert_arg: u32,

    pub scan_end_src: u32,
    pub scan_end_arg: u32,

    pub stop_src: u32,
    pub stop_arg: u32,

    chanlist: SampleBuffer<u32>,
    data: SampleBuffer<Sampl>,
}

impl Command {
    pub fn new(subdev: u32) -> Self {
        Self {
            subdev,
            ..Default::default()
        }
    }

    // ========================================================================
    // Trigger stages
    // ========================================================================

    pub fn src(&self, stage: Stage) -> u32 {
        match stage {
            Stage::Start => self.start_src,
            Stage::ScanBegin => self.scan_begin_src,
            Stage::Convert => self.convert_src,
            Stage::ScanEnd => self.scan_end_src,
            Stage::Stop => self.stop_src,
        }
    }

    pub fn arg(&self, stage: Stage) -> u32 {
        match stage {
            Stage::Start => self.start_arg,
            Stage::ScanBegin => self.scan_begin_arg,
            Stage::Convert => self.convert_arg,
            Stage::ScanEnd => self.scan_end_arg,
            Stage::Stop => self.stop_arg,
        }
    }

    pub fn src_mut(&mut self, stage: Stage) -> &mut u32 {
        match stage {
            Stage::Start => &mut self.start_src,
            Stage::ScanBegin => &mut self.scan_begin_src,
            Stage::Convert => &mut self.convert_src,
            Stage::ScanEnd => &mut self.scan_end_src,
            Stage::Stop => &mut self.stop_src,
        }
    }

    pub fn arg_mut(&mut self, stage: Stage) -> &mut u32 {
        match stage {
            Stage::Start => &mut self.start_arg,
            Stage::ScanBegin => &mut self.scan_begin_arg,
            Stage::Convert => &mut self.convert_arg,
            Stage::ScanEnd => &mut self.scan_end_arg,
            Stage::Stop => &mut self.stop_arg,
        }
    }

    /// Trigger source of `stage` as a `TRIG_SRC` flag value
    pub fn trigger<'a>(&self, stage: Stage, constants: &'a Constants) -> FlagValue<'a> {
        FlagValue::new(&constants.trig_src, self.src(stage))
    }

    /// Command flags as a `CMDF` flag value
    pub fn command_flags<'a>(&self, constants: &'a Constants) -> FlagValue<'a> {
        FlagValue::new(&constants.cmdf, self.flags)
    }

    // ========================================================================
    // Buffers
    // ========================================================================

    /// Replace the channel list, packing each entry.
    pub fn set_chanlist<T: ProducesChanSpec>(&mut self, channels: &[T]) -> Result<(), ResourceError> {
        self.chanlist
            .assign(channels.iter().map(|c| c.chanspec().value()))
    }

    pub fn chanlist(&self) -> Vec<ChanSpec> {
        self.chanlist.iter().map(ChanSpec::from_raw).collect()
    }

    #[inline]
    pub fn chanlist_len(&self) -> usize {
        self.chanlist.len()
    }

    pub fn set_data<I>(&mut self, data: I) -> Result<(), ResourceError>
    where
        I: IntoIterator<Item = Sampl>,
        I::IntoIter: ExactSizeIterator,
    {
        self.data.assign(data)
    }

    pub fn data(&self) -> Vec<Sampl> {
        self.data.to_vec()
    }

    #[inline]
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    pub fn render(&self, constants: &Constants) -> String {
        let mut fields = vec![
            ("subdev", self.subdev.to_string()),
            ("flags", self.command_flags(constants).to_string()),
        ];
        for (stage, src, arg) in [
            (Stage::Start, "start_src", "start_arg"),
            (Stage::ScanBegin, "scan_begin_src", "scan_begin_arg"),
            (Stage::Convert, "convert_src", "convert_arg"),
            (Stage::ScanEnd, "scan_end_src", "scan_end_arg"),
            (Stage::Stop, "stop_src", "stop_arg"),
        ] {
            fields.push((src, self.trigger(stage, constants).to_string()));
            fields.push((arg, self.arg(stage).to_string()));
        }
        fields.push(("chanlist", self.chanlist.to_string()));
        fields.push(("chanlist_len", self.chanlist_len().to_string()));
        fields.push(("data", self.data.to_string()));
        fields.push(("data_len", self.data_len().to_string()));
        field_table(&fields)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Constants::global()))
    }
}
