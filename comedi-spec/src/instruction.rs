//! # Instructions
//!
//! A single synchronous driver instruction (`comedi_insn`): opcode,
//! subdevice, channel specifier and an owned `lsampl_t` data buffer.

use crate::buffer::SampleBuffer;
use crate::chanspec::ChanSpec;
use crate::constant::NamedConstant;
use crate::error::ResourceError;
use crate::format::field_table;
use crate::{Constants, LSampl};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insn {
    /// Opcode, one of the `INSN_*` values
    pub insn: u32,
    pub subdev: u32,
    pub chanspec: ChanSpec,
    data: SampleBuffer<LSampl>,
}

impl Insn {
    pub fn new(insn: u32, subdev: u32, chanspec: ChanSpec) -> Self {
        Self {
            insn,
            subdev,
            chanspec,
            data: SampleBuffer::new(),
        }
    }

    /// Replace the data buffer.
    ///
    /// On allocation failure the buffer is left empty.
    pub fn set_data<I>(&mut self, data: I) -> Result<(), ResourceError>
    where
        I: IntoIterator<Item = LSampl>,
        I::IntoIter: ExactSizeIterator,
    {
        self.data.assign(data)
    }

    /// Copy of the data buffer
    pub fn data(&self) -> Vec<LSampl> {
        self.data.to_vec()
    }

    /// Number of samples (`insn.n`)
    #[inline]
    pub fn n(&self) -> usize {
        self.data.len()
    }

    pub fn sample(&self, index: usize) -> Option<LSampl> {
        self.data.get(index)
    }

    /// Store a result sample; returns false past the end of the buffer.
    pub fn store_sample(&mut self, index: usize, value: LSampl) -> bool {
        self.data.set(index, value)
    }

    pub fn opcode<'a>(&self, constants: &'a Constants) -> Option<&'a NamedConstant> {
        constants.insn.index_by_value(self.insn)
    }

    pub fn render(&self, constants: &Constants) -> String {
        let opcode = self
            .opcode(constants)
            .map_or_else(|| format!("{:#010x}", self.insn), |c| c.name.clone());
        field_table(&[
            ("insn", opcode),
            ("n", self.n().to_string()),
            ("data", self.data.to_string()),
            ("subdev", self.subdev.to_string()),
            ("chanspec", self.chanspec.describe(constants)),
        ])
    }
}

impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Constants::global()))
    }
}
