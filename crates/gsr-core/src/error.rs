//! Error types shared across the crate

use thiserror_no_std::Error;

use crate::channels::ChannelError;
use crate::config::ConfigError;
use crate::record::RecordError;
use crate::sensors::SensorError;

/// Top-level error for the sampling loop.
///
/// There is no recovery policy: any of these ends [`crate::sampling::Sampler::run`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GsrError {
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Record error: {0}")]
    Record(#[from] RecordError),
}
