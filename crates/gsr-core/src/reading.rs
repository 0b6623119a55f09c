//! Reading model: raw ADC values, the per-iteration pair, and the
//! "no sensor attached" detection band.

use serde::{Deserialize, Serialize};

/// A raw analog-to-digital conversion result.
///
/// The ESP32's ADC1 produces 12-bit values (0-4095).
pub type RawReading = u16;

/// Largest value the 12-bit ADC can produce.
pub const ADC_MAX_READING: RawReading = 4095;

/// The two readings taken during one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingPair {
    /// Reading from the first GSR sensor (sampled first)
    pub first: RawReading,
    /// Reading from the second GSR sensor (sampled after the settle pause)
    pub second: RawReading,
}

impl ReadingPair {
    pub const fn new(first: RawReading, second: RawReading) -> Self {
        Self { first, second }
    }

    /// Classify this pair against the detection band.
    ///
    /// Both readings must fall inside the band for the pair to count as
    /// "no sensor attached".
    pub const fn classify(self, band: DetectionBand) -> Detection {
        if band.contains(self.first) && band.contains(self.second) {
            Detection::NoSensor
        } else {
            Detection::Present
        }
    }
}

/// Result of evaluating a [`ReadingPair`] against a [`DetectionBand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Both inputs read as a floating pin
    NoSensor,
    /// At least one input reads outside the band
    Present,
}

/// Closed interval of readings produced by an unconnected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionBand {
    pub low: RawReading,
    pub high: RawReading,
}

impl DetectionBand {
    pub const fn new(low: RawReading, high: RawReading) -> Self {
        Self { low, high }
    }

    /// Inclusive on both ends.
    #[inline]
    pub const fn contains(self, reading: RawReading) -> bool {
        reading >= self.low && reading <= self.high
    }

    pub const fn is_valid(self) -> bool {
        self.low <= self.high
    }
}
