//! The sampling-and-broadcast loop
//!
//! Each iteration samples the first input, pauses to let the ADC settle,
//! samples the second input, and then either reports that no sensors are
//! attached or logs both values and transmits them as one record. A longer
//! pause closes the iteration.
//!
//! The two readings only live for one iteration. The sensors, channels, and
//! delay are owned by the [`Sampler`] for the lifetime of the device.

use core::convert::Infallible;

use embedded_hal_async::delay::DelayNs;
use log::{debug, error, info};

use crate::GsrError;
use crate::channels::{BroadcastChannel, DiagnosticChannel};
use crate::config::SamplerConfig;
use crate::reading::{Detection, ReadingPair};
use crate::record::{self, NO_SENSOR_NOTICE, STARTUP_NOTICE};
use crate::sensors::Sensor;

/// What one iteration did with its readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Both readings were inside the detection band; nothing was transmitted
    NoSensor(ReadingPair),
    /// The pair was logged and transmitted
    Broadcast(ReadingPair),
}

pub struct Sampler<'c, A, B, Diag, Link, D> {
    config: SamplerConfig<'c>,
    first: A,
    second: B,
    diagnostic: Diag,
    broadcast: Link,
    delay: D,
    iterations: u32,
}

impl<'c, A, B, Diag, Link, D> Sampler<'c, A, B, Diag, Link, D>
where
    A: Sensor,
    B: Sensor,
    Diag: DiagnosticChannel,
    Link: BroadcastChannel,
    D: DelayNs,
{
    /// Create a sampler. Fails if `config` does not validate.
    pub fn new(
        config: SamplerConfig<'c>,
        first: A,
        second: B,
        diagnostic: Diag,
        broadcast: Link,
        delay: D,
    ) -> Result<Self, GsrError> {
        config.validate()?;

        Ok(Self {
            config,
            first,
            second,
            diagnostic,
            broadcast,
            delay,
            iterations: 0,
        })
    }

    /// Iterations completed since construction (wraps).
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Write the one-time startup notice to the diagnostic channel.
    pub async fn announce(&mut self) -> Result<(), GsrError> {
        info!(
            "[sampler] starting as '{}' ({} baud diagnostics, {}+{} ms pauses)",
            self.config.device_name,
            self.config.diagnostic_baud_rate,
            self.config.settle_delay_ms,
            self.config.sample_period_ms
        );
        self.diagnostic.write_line(STARTUP_NOTICE).await?;
        Ok(())
    }

    /// Sample the first input, pause for the settle delay, then sample the second.
    pub async fn sample_pair(&mut self) -> Result<ReadingPair, GsrError> {
        let first = self.first.read().await?;
        self.delay.delay_ms(self.config.settle_delay_ms).await;
        let second = self.second.read().await?;

        Ok(ReadingPair::new(first, second))
    }

    /// Run a single iteration, including the closing pause.
    pub async fn run_iteration(&mut self) -> Result<IterationOutcome, GsrError> {
        let pair = self.sample_pair().await?;

        let outcome = match pair.classify(self.config.no_sensor_band) {
            Detection::NoSensor => {
                self.diagnostic.write_line(NO_SENSOR_NOTICE).await?;
                IterationOutcome::NoSensor(pair)
            }
            Detection::Present => {
                let labeled = record::diagnostic_line(pair)?;
                self.diagnostic.write_line(&labeled).await?;

                let line = record::format_record(pair)?;
                self.broadcast.send_line(&line).await?;
                IterationOutcome::Broadcast(pair)
            }
        };

        debug!("[sampler] iteration {}: {:?}", self.iterations, outcome);

        self.delay.delay_ms(self.config.sample_period_ms).await;
        self.iterations = self.iterations.wrapping_add(1);

        Ok(outcome)
    }

    /// Announce, then loop until a sensor or channel fails.
    ///
    /// There is no retry: the first error is logged and returned.
    pub async fn run(&mut self) -> Result<Infallible, GsrError> {
        self.announce().await?;

        loop {
            if let Err(e) = self.run_iteration().await {
                error!(
                    "[sampler] stopping after {} iterations: {}",
                    self.iterations, e
                );
                return Err(e);
            }
        }
    }

    /// Give back the owned parts.
    pub fn into_parts(self) -> (A, B, Diag, Link, D) {
        (
            self.first,
            self.second,
            self.diagnostic,
            self.broadcast,
            self.delay,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ChannelError;
    use crate::channels::mock::RecordingChannel;
    use crate::config::ConfigError;
    use crate::reading::DetectionBand;
    use crate::sensors::SensorError;
    use crate::sensors::mock::ScriptedSensor;
    use embassy_futures::block_on;
    use std::vec::Vec;

    /// Records every requested pause in nanoseconds, without sleeping.
    #[derive(Default)]
    struct RecordingDelay {
        pauses_ns: Vec<u32>,
    }

    impl DelayNs for RecordingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.pauses_ns.push(ns);
        }
    }

    /// Diagnostic port that yields to the executor partway through each
    /// line, the way a UART waiting on its TX FIFO does.
    #[derive(Default)]
    struct DrainingPort {
        lines: Vec<std::string::String>,
        yields: usize,
    }

    impl DiagnosticChannel for DrainingPort {
        async fn write_line(&mut self, line: &str) -> Result<(), ChannelError> {
            let (head, tail) = line.split_at(line.len() / 2);
            embassy_futures::yield_now().await;
            self.yields += 1;
            let mut written = std::string::String::from(head);
            embassy_futures::yield_now().await;
            self.yields += 1;
            written.push_str(tail);
            self.lines.push(written);
            Ok(())
        }
    }

    const MS: u32 = 1_000_000;

    type TestSampler<'s> = Sampler<
        'static,
        ScriptedSensor<'s>,
        ScriptedSensor<'s>,
        RecordingChannel,
        RecordingChannel,
        RecordingDelay,
    >;

    fn sampler<'s>(first: &'s [u16], second: &'s [u16]) -> TestSampler<'s> {
        Sampler::new(
            SamplerConfig::default(),
            ScriptedSensor::new(first),
            ScriptedSensor::new(second),
            RecordingChannel::default(),
            RecordingChannel::default(),
            RecordingDelay::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_both_in_band_reports_no_sensor() {
        let mut sampler = sampler(&[320], &[325]);

        let outcome = block_on(sampler.run_iteration()).unwrap();

        assert_eq!(outcome, IterationOutcome::NoSensor(ReadingPair::new(320, 325)));
        let (_, _, diagnostic, broadcast, _) = sampler.into_parts();
        assert_eq!(diagnostic.lines, ["No sensors detected"]);
        assert!(broadcast.lines.is_empty());
    }

    #[test]
    fn test_band_edges_are_no_sensor() {
        let mut sampler = sampler(&[315], &[330]);

        let outcome = block_on(sampler.run_iteration()).unwrap();

        assert!(matches!(outcome, IterationOutcome::NoSensor(_)));
        let (_, _, diagnostic, broadcast, _) = sampler.into_parts();
        assert_eq!(diagnostic.lines, ["No sensors detected"]);
        assert!(broadcast.lines.is_empty());
    }

    #[test]
    fn test_just_below_band_broadcasts() {
        let mut sampler = sampler(&[314], &[320]);

        let outcome = block_on(sampler.run_iteration()).unwrap();

        assert_eq!(outcome, IterationOutcome::Broadcast(ReadingPair::new(314, 320)));
        let (_, _, diagnostic, broadcast, _) = sampler.into_parts();
        assert_eq!(broadcast.lines, ["314,320\n"]);
        assert_eq!(diagnostic.lines.len(), 1);
        assert!(diagnostic.lines[0].contains("314"));
        assert!(diagnostic.lines[0].contains("320"));
    }

    #[test]
    fn test_full_scale_readings_broadcast() {
        let mut sampler = sampler(&[0], &[4095]);

        block_on(sampler.run_iteration()).unwrap();

        let (_, _, diagnostic, broadcast, _) = sampler.into_parts();
        assert_eq!(broadcast.lines, ["0,4095\n"]);
        assert_eq!(diagnostic.lines, ["Sensor 1: 0\tSensor 2: 4095"]);
    }

    #[test]
    fn test_settle_pause_sits_between_samples() {
        let mut sampler = sampler(&[100], &[200]);

        block_on(sampler.sample_pair()).unwrap();

        let (first, second, _, _, delay) = sampler.into_parts();
        assert_eq!(first.reads(), 1);
        assert_eq!(second.reads(), 1);
        assert_eq!(delay.pauses_ns, [10 * MS]);
    }

    #[test]
    fn test_iteration_pauses_at_least_settle_plus_period() {
        let mut sampler = sampler(&[100, 320], &[200, 320]);

        block_on(sampler.run_iteration()).unwrap();
        block_on(sampler.run_iteration()).unwrap();

        assert_eq!(sampler.iterations(), 2);
        let (_, _, _, _, delay) = sampler.into_parts();
        assert_eq!(delay.pauses_ns, [10 * MS, 100 * MS, 10 * MS, 100 * MS]);
        let total: u64 = delay.pauses_ns.iter().map(|&ns| ns as u64).sum();
        assert_eq!(total, 2 * 110 * MS as u64);
    }

    #[test]
    fn test_no_history_between_iterations() {
        let mut sampler = sampler(&[320, 900, 320], &[320, 320, 320]);

        let outcomes: Vec<_> = (0..3)
            .map(|_| block_on(sampler.run_iteration()).unwrap())
            .collect();

        assert!(matches!(outcomes[0], IterationOutcome::NoSensor(_)));
        assert_eq!(outcomes[1], IterationOutcome::Broadcast(ReadingPair::new(900, 320)));
        assert!(matches!(outcomes[2], IterationOutcome::NoSensor(_)));

        let (_, _, diagnostic, broadcast, _) = sampler.into_parts();
        assert_eq!(broadcast.lines, ["900,320\n"]);
        assert_eq!(
            diagnostic.lines,
            [
                "No sensors detected",
                "Sensor 1: 900\tSensor 2: 320",
                "No sensors detected"
            ]
        );
    }

    #[test]
    fn test_custom_band_is_honoured() {
        let config = SamplerConfig::default().with_no_sensor_band(DetectionBand::new(0, 10));
        let mut sampler = Sampler::new(
            config,
            ScriptedSensor::new(&[320]),
            ScriptedSensor::new(&[325]),
            RecordingChannel::default(),
            RecordingChannel::default(),
            RecordingDelay::default(),
        )
        .unwrap();

        let outcome = block_on(sampler.run_iteration()).unwrap();

        assert!(matches!(outcome, IterationOutcome::Broadcast(_)));
    }

    #[test]
    fn test_announce_writes_startup_notice() {
        let mut sampler = sampler(&[0], &[0]);

        block_on(sampler.announce()).unwrap();

        let (_, _, diagnostic, broadcast, _) = sampler.into_parts();
        assert_eq!(
            diagnostic.lines,
            ["The device started, now you can pair it with Bluetooth!"]
        );
        assert!(broadcast.lines.is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SamplerConfig::default().with_device_name("");
        let result = Sampler::new(
            config,
            ScriptedSensor::new(&[0]),
            ScriptedSensor::new(&[0]),
            RecordingChannel::default(),
            RecordingChannel::default(),
            RecordingDelay::default(),
        );

        assert!(matches!(
            result,
            Err(GsrError::Config(ConfigError::EmptyDeviceName))
        ));
    }

    #[test]
    fn test_run_stops_on_sensor_failure() {
        let mut sampler = sampler(&[], &[0]);

        let result = block_on(sampler.run());

        assert!(matches!(
            result,
            Err(GsrError::Sensor(SensorError::ReadFailed { .. }))
        ));
        let (_, _, diagnostic, broadcast, delay) = sampler.into_parts();
        // Announced, then failed on the very first read
        assert_eq!(diagnostic.lines.len(), 1);
        assert!(broadcast.lines.is_empty());
        assert!(delay.pauses_ns.is_empty());
    }

    #[test]
    fn test_run_stops_on_broadcast_failure() {
        let mut sampler = Sampler::new(
            SamplerConfig::default(),
            ScriptedSensor::new(&[1000]),
            ScriptedSensor::new(&[2000]),
            RecordingChannel::default(),
            RecordingChannel::failing(),
            RecordingDelay::default(),
        )
        .unwrap();

        let result = block_on(sampler.run());

        assert_eq!(
            result.unwrap_err(),
            GsrError::Channel(ChannelError::WriteFailed {
                channel: "broadcast"
            })
        );
        assert_eq!(sampler.iterations(), 0);
    }

    #[test]
    fn test_diagnostic_writes_that_yield_complete_the_iteration() {
        let mut sampler = Sampler::new(
            SamplerConfig::default(),
            ScriptedSensor::new(&[4095]),
            ScriptedSensor::new(&[4095]),
            DrainingPort::default(),
            RecordingChannel::default(),
            RecordingDelay::default(),
        )
        .unwrap();

        block_on(sampler.announce()).unwrap();
        let outcome = block_on(sampler.run_iteration()).unwrap();

        assert_eq!(outcome, IterationOutcome::Broadcast(ReadingPair::new(4095, 4095)));
        let (_, _, diagnostic, broadcast, delay) = sampler.into_parts();
        assert_eq!(diagnostic.yields, 4);
        assert_eq!(
            diagnostic.lines,
            [STARTUP_NOTICE, "Sensor 1: 4095\tSensor 2: 4095"]
        );
        assert_eq!(broadcast.lines, ["4095,4095\n"]);
        assert_eq!(delay.pauses_ns, [10 * MS, 100 * MS]);
    }
}
