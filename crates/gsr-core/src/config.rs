use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::reading::{DetectionBand, RawReading};

/// Name the wireless link advertises under.
pub const DEVICE_NAME: &str = "ESP32_GSR";

/// Baud rate of the wired diagnostic serial port.
pub const DIAGNOSTIC_BAUD_RATE: u32 = 9600;

/// Readings both inputs produce when nothing is plugged in.
/// Calibrated on the reference board; there is no derivation behind it.
pub const NO_SENSOR_BAND: DetectionBand = DetectionBand::new(315, 330);

/// Pause between sampling the first and second input.
pub const SETTLE_DELAY_MS: u32 = 10;

/// Pause at the end of every iteration.
pub const SAMPLE_PERIOD_MS: u32 = 100;

/// Longest name that still fits a legacy advertising packet next to the flags.
pub const MAX_DEVICE_NAME_LEN: usize = 26;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Detection band is inverted ({low} > {high})")]
    InvalidBand { low: RawReading, high: RawReading },
    #[error("Device name is empty")]
    EmptyDeviceName,
    #[error("Device name is {len} bytes (max: {max})")]
    DeviceNameTooLong { len: usize, max: usize },
    #[error("Sample period must be non-zero")]
    ZeroPeriod,
}

/// Calibration and identity settings for the sampling loop.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(bound(deserialize = "'de: 'a"), default)]
pub struct SamplerConfig<'a> {
    pub device_name: &'a str,
    pub diagnostic_baud_rate: u32,
    pub no_sensor_band: DetectionBand,
    pub settle_delay_ms: u32,
    pub sample_period_ms: u32,
}

impl Default for SamplerConfig<'_> {
    fn default() -> Self {
        Self {
            device_name: DEVICE_NAME,
            diagnostic_baud_rate: DIAGNOSTIC_BAUD_RATE,
            no_sensor_band: NO_SENSOR_BAND,
            settle_delay_ms: SETTLE_DELAY_MS,
            sample_period_ms: SAMPLE_PERIOD_MS,
        }
    }
}

impl<'a> SamplerConfig<'a> {
    pub const fn with_device_name(mut self, device_name: &'a str) -> Self {
        self.device_name = device_name;
        self
    }

    pub const fn with_no_sensor_band(mut self, band: DetectionBand) -> Self {
        self.no_sensor_band = band;
        self
    }

    pub const fn with_settle_delay_ms(mut self, ms: u32) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    pub const fn with_sample_period_ms(mut self, ms: u32) -> Self {
        self.sample_period_ms = ms;
        self
    }

    /// Minimum time one iteration spends paused.
    pub const fn min_iteration_ms(&self) -> u32 {
        self.settle_delay_ms.saturating_add(self.sample_period_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.no_sensor_band.is_valid() {
            return Err(ConfigError::InvalidBand {
                low: self.no_sensor_band.low,
                high: self.no_sensor_band.high,
            });
        }

        if self.device_name.is_empty() {
            return Err(ConfigError::EmptyDeviceName);
        }

        if self.device_name.len() > MAX_DEVICE_NAME_LEN {
            return Err(ConfigError::DeviceNameTooLong {
                len: self.device_name.len(),
                max: MAX_DEVICE_NAME_LEN,
            });
        }

        if self.sample_period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }

        Ok(())
    }
}
