use core::future::Future;

use thiserror_no_std::Error;

use crate::reading::RawReading;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} read failed: {details}")]
    ReadFailed {
        sensor: &'static str,
        details: &'static str,
    },
}

/// Which of the two GSR inputs a sensor is wired to.
///
/// The first input is always sampled before the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GsrInput {
    First,
    Second,
}

impl GsrInput {
    /// Label used in diagnostic output
    pub const fn label(self) -> &'static str {
        match self {
            Self::First => "Sensor 1",
            Self::Second => "Sensor 2",
        }
    }
}

/// Trait for a single analog input that produces one raw reading per call.
pub trait Sensor {
    /// Sample the input once.
    fn read(&mut self) -> impl Future<Output = Result<RawReading, SensorError>>;
}

impl<S: Sensor> Sensor for &mut S {
    async fn read(&mut self) -> Result<RawReading, SensorError> {
        (**self).read().await
    }
}
