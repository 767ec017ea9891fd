//! # Built-in Constant Families
//!
//! Every enum and flag registry the driver defines, built once from
//! [`COMEDI_NAMESPACE`] and shared read-only for the life of the process.
//!
//! ```
//! use comedi_spec::Constants;
//!
//! let c = Constants::global();
//! assert_eq!(c.trig_src.empty().unwrap().name, "invalid");
//! assert_eq!(c.trig_src.all().unwrap().name, "any");
//! assert_eq!(
//!     c.subdevice_type.index_by_name("dio").unwrap().doc,
//!     "COMEDI_SUBD_DIO (digital input/output)"
//! );
//! ```

use crate::error::ConflictError;
use crate::namespace::{RawConstant, COMEDI_NAMESPACE};
use crate::registry::{ConstantRegistry, RegistryBuilder};
use once_cell::sync::Lazy;

static GLOBAL: Lazy<Constants> = Lazy::new(|| {
    Constants::from_namespace(COMEDI_NAMESPACE)
        .expect("built-in constant namespace must not conflict")
});

/// The full set of registries.
#[derive(Debug, Clone)]
pub struct Constants {
    /// Analog reference (`AREF_*`)
    pub aref: ConstantRegistry,
    pub insn_mask: ConstantRegistry,
    pub configuration_ids: ConstantRegistry,
    /// Instruction opcodes (`INSN_*`)
    pub insn: ConstantRegistry,
    /// Trigger flags (`TRIG_*` whitelist)
    pub trig: ConstantRegistry,
    /// Command flags (`CMDF_*`)
    pub cmdf: ConstantRegistry,
    pub ev: ConstantRegistry,
    pub trig_round: ConstantRegistry,
    /// Trigger sources for every `*_src` field
    pub trig_src: ConstantRegistry,
    pub sdf_pwm: ConstantRegistry,
    /// Subdevice flags (`SDF_*`)
    pub sdf: ConstantRegistry,
    pub subdevice_type: ConstantRegistry,
    pub io_direction: ConstantRegistry,
    pub support_level: ConstantRegistry,
    pub unit: ConstantRegistry,
    /// Callback flags (`COMEDI_CB_*`)
    pub cb: ConstantRegistry,
    /// Channel-specifier flag bits (`CR_*`)
    pub cr: ConstantRegistry,
    /// `TRIG_ROUND_MASK`, kept out of the rounding enum
    pub trig_round_mask: u32,
}

fn prefixed<'a>(prefix: &'a str, registry: &'a ConstantRegistry) -> impl Iterator<Item = String> + 'a {
    registry.iter().map(move |m| format!("{prefix}{}", m.name))
}

impl Constants {
    /// Process-wide registries
    pub fn global() -> &'static Constants {
        &GLOBAL
    }

    /// Build every registry from a namespace table.
    pub fn from_namespace(ns: &[RawConstant]) -> Result<Self, ConflictError> {
        let aref = RegistryBuilder::new("analog_reference", "AREF_").build_enum(ns)?;

        let insn_mask = RegistryBuilder::new("instruction_mask", "INSN_MASK_").build_flag(ns)?;

        let configuration_ids = RegistryBuilder::new("configuration_ids", "INSN_CONFIG_")
            .blacklist(["8254_set_mode"])
            .build_enum(ns)?;

        let insn = RegistryBuilder::new("instruction", "INSN_")
            .blacklist(prefixed("mask_", &insn_mask))
            .blacklist(prefixed("config_", &configuration_ids))
            .blacklist(["config_8254_set_mode"])
            .build_enum(ns)?;

        let trig = RegistryBuilder::new("trigger_flags", "TRIG_")
            .whitelist(["bogus", "dither", "deglitch", "config", "wake_eos"])
            .build_flag(ns)?;

        let cmdf = RegistryBuilder::new("command_flags", "CMDF_").build_flag(ns)?;

        let ev = RegistryBuilder::new("event_flags", "COMEDI_EV_").build_flag(ns)?;

        let trig_round = RegistryBuilder::new("trigger_round", "TRIG_ROUND_")
            .blacklist(["mask"])
            .build_enum(ns)?;
        let trig_round_mask = ns
            .iter()
            .find(|raw| raw.name == "TRIG_ROUND_MASK")
            .map_or(Ok(0), |raw| {
                crate::constant::normalize(raw.value).map_err(|_| ConflictError::ValueOutOfRange {
                    registry: "trigger_round".to_string(),
                    name: "mask".to_string(),
                    value: raw.value,
                })
            })?;

        let trig_src = RegistryBuilder::new("trigger_source_flags", "TRIG_")
            .blacklist(trig.iter().map(|m| m.name.clone()))
            .blacklist(prefixed("round_", &trig_round))
            .blacklist(["round_mask", "rt", "write"])
            .build_flag(ns)?;

        let sdf_pwm =
            RegistryBuilder::new("pulse_width_modulation_subdevice_flags", "SDF_PWM_").build_flag(ns)?;

        let sdf = RegistryBuilder::new("subdevice_flags", "SDF_")
            .blacklist(prefixed("pwm_", &sdf_pwm))
            .blacklist(["cmd", "writeable", "rt"])
            .build_flag(ns)?;

        let subdevice_type = RegistryBuilder::new("subdevice_type", "COMEDI_SUBD_").build_enum(ns)?;

        let io_direction = RegistryBuilder::new("io_direction", "COMEDI_")
            .whitelist(["input", "output", "opendrain"])
            .build_enum(ns)?;

        let support_level = RegistryBuilder::new("support_level", "COMEDI_")
            .whitelist(["unknown_support", "supported", "unsupported"])
            .build_enum(ns)?;

        let unit = RegistryBuilder::new("unit", "UNIT_")
            .translate("mA", "mA")
            .build_enum(ns)?;

        let cb = RegistryBuilder::new("callback_flags", "COMEDI_CB_")
            .blacklist(["block", "eobuf"])
            .build_enum(ns)?;

        let cr = RegistryBuilder::new("channel_range_flags", "CR_")
            .blacklist(["dither", "deglitch"])
            .build_flag(ns)?;

        Ok(Self {
            aref,
            insn_mask,
            configuration_ids,
            insn,
            trig,
            cmdf,
            ev,
            trig_round,
            trig_src,
            sdf_pwm,
            sdf,
            subdevice_type,
            io_direction,
            support_level,
            unit,
            cb,
            cr,
            trig_round_mask,
        })
    }

    /// Every registry, in definition order
    pub fn registries(&self) -> [&ConstantRegistry; 17] {
        [
            &self.aref,
            &self.insn_mask,
            &self.configuration_ids,
            &self.insn,
            &self.trig,
            &self.cmdf,
            &self.ev,
            &self.trig_round,
            &self.trig_src,
            &self.sdf_pwm,
            &self.sdf,
            &self.subdevice_type,
            &self.io_direction,
            &self.support_level,
            &self.unit,
            &self.cb,
            &self.cr,
        ]
    }

    /// Find a registry by its family name, e.g. `"trigger_source_flags"`.
    pub fn registry(&self, name: &str) -> Option<&ConstantRegistry> {
        self.registries().into_iter().find(|r| r.name() == name)
    }
}
