//! # Acquisition Configuration
//!
//! Parameters shared by the instruction and command demos: which device,
//! subdevice and channels to sample, and how often.

use comedi_spec::encoding::{CHAN_MASK, RANGE_MASK};
use comedi_spec::Constants;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Acquisition parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Device file
    pub filename: String,
    /// Subdevice index; `None` picks the first analog input
    pub subdevice: Option<u32>,
    /// Channels to scan, in order
    pub channels: Vec<u32>,
    pub range: u32,
    /// `AREF` member name
    pub aref: String,
    pub num_scans: u32,
    /// Scan frequency in Hz; `None` lets the driver pick its fastest rate
    pub frequency: Option<f64>,
}

impl AcquisitionConfig {
    pub const DEFAULT_FILENAME: &'static str = "/dev/comedi0";

    /// Scan period in nanoseconds (0 when no frequency is set).
    ///
    /// Saturates for frequencies that [`validate`](Self::validate) rejects.
    pub fn period_ns(&self) -> u32 {
        match self.frequency {
            Some(f) if f > 0.0 => (1e9 / f) as u32,
            _ => 0,
        }
    }

    /// Validate configuration
    pub fn validate(&self, constants: &Constants) -> Result<(), ConfigError> {
        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        if self.channels.iter().any(|&c| c > CHAN_MASK) {
            return Err(ConfigError::ChannelOutOfRange);
        }
        if self.range > RANGE_MASK {
            return Err(ConfigError::RangeOutOfRange);
        }
        if constants.aref.index_by_name(&self.aref).is_none() {
            return Err(ConfigError::UnknownAref);
        }
        if self.num_scans == 0 {
            return Err(ConfigError::NoScans);
        }
        if let Some(f) = self.frequency {
            if !f.is_finite() || f <= 0.0 {
                return Err(ConfigError::InvalidFrequency);
            }
            if (1e9 / f).round() > f64::from(u32::MAX) {
                return Err(ConfigError::FrequencyTooLow);
            }
        }
        Ok(())
    }

    /// `AREF` value for the configured name
    pub fn aref_value(&self, constants: &Constants) -> Result<u32, ConfigError> {
        constants
            .aref
            .index_by_name(&self.aref)
            .map(|c| c.value)
            .ok_or(ConfigError::UnknownAref)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            filename: Self::DEFAULT_FILENAME.to_string(),
            subdevice: None,
            channels: vec![0],
            range: 0,
            aref: "ground".to_string(),
            num_scans: 10,
            frequency: None,
        }
    }
}

impl fmt::Display for AcquisitionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} subdevice {} channels {:?} range {} aref {}, {} scans",
            self.filename,
            self.subdevice
                .map_or_else(|| "auto".to_string(), |s| s.to_string()),
            self.channels,
            self.range,
            self.aref,
            self.num_scans,
        )?;
        if let Some(freq) = self.frequency {
            write!(f, " at {freq} Hz")?;
        }
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// At least one channel is required
    NoChannels,
    /// Channels must fit the 8-bit channel field
    ChannelOutOfRange,
    /// Range must fit the 8-bit range field
    RangeOutOfRange,
    /// Aref must name an `AREF` member
    UnknownAref,
    /// At least one scan is required
    NoScans,
    /// Frequency must be finite and positive
    InvalidFrequency,
    /// The scan period must fit a 32-bit nanosecond argument
    FrequencyTooLow,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoChannels => write!(f, "at least one channel is required"),
            ConfigError::ChannelOutOfRange => {
                write!(f, "channels must be in range [0, {CHAN_MASK}]")
            }
            ConfigError::RangeOutOfRange => write!(f, "range must be in range [0, {RANGE_MASK}]"),
            ConfigError::UnknownAref => {
                write!(f, "aref must be one of ground, common, diff, other")
            }
            ConfigError::NoScans => write!(f, "num_scans must be positive"),
            ConfigError::InvalidFrequency => write!(f, "frequency must be finite and positive"),
            ConfigError::FrequencyTooLow => write!(
                f,
                "frequency must be at least {:.3} Hz (period limit {} ns)",
                1e9 / f64::from(u32::MAX),
                u32::MAX
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AcquisitionConfig::default();
        assert_eq!(config.filename, "/dev/comedi0");
        assert_eq!(config.channels, vec![0]);
        assert_eq!(config.num_scans, 10);
        assert_eq!(config.period_ns(), 0);
        assert!(config.validate(Constants::global()).is_ok());
        assert_eq!(config.aref_value(Constants::global()), Ok(0));
    }

    #[test]
    fn test_period_from_frequency() {
        let config = AcquisitionConfig {
            frequency: Some(1000.0),
            ..Default::default()
        };
        assert_eq!(config.period_ns(), 1_000_000);
    }

    #[test]
    fn test_validation() {
        let c = Constants::global();
        let invalid = |config: AcquisitionConfig| config.validate(c).unwrap_err();

        assert_eq!(
            invalid(AcquisitionConfig {
                channels: vec![],
                ..Default::default()
            }),
            ConfigError::NoChannels
        );
        assert_eq!(
            invalid(AcquisitionConfig {
                channels: vec![0, 256],
                ..Default::default()
            }),
            ConfigError::ChannelOutOfRange
        );
        assert_eq!(
            invalid(AcquisitionConfig {
                range: 300,
                ..Default::default()
            }),
            ConfigError::RangeOutOfRange
        );
        assert_eq!(
            invalid(AcquisitionConfig {
                aref: "floating".into(),
                ..Default::default()
            }),
            ConfigError::UnknownAref
        );
        assert_eq!(
            invalid(AcquisitionConfig {
                num_scans: 0,
                ..Default::default()
            }),
            ConfigError::NoScans
        );
        assert_eq!(
            invalid(AcquisitionConfig {
                frequency: Some(f64::NAN),
                ..Default::default()
            }),
            ConfigError::InvalidFrequency
        );
    }

    #[test]
    fn test_period_must_fit() {
        let c = Constants::global();
        let slow = AcquisitionConfig {
            frequency: Some(0.1),
            ..Default::default()
        };
        assert_eq!(slow.validate(c), Err(ConfigError::FrequencyTooLow));

        let slowest = AcquisitionConfig {
            frequency: Some(0.25),
            ..Default::default()
        };
        assert!(slowest.validate(c).is_ok());
        assert_eq!(slowest.period_ns(), 4_000_000_000);
    }

    #[test]
    fn test_partial_json() {
        let config: AcquisitionConfig =
            serde_json::from_str(r#"{"channels": [1, 2], "frequency": 100.0}"#).unwrap();
        assert_eq!(config.channels, vec![1, 2]);
        assert_eq!(config.filename, "/dev/comedi0");
        assert_eq!(config.period_ns(), 10_000_000);
    }
}
