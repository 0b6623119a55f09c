//! Desktop simulator for the gsr-streamer sampling loop.
//!
//! Runs the real `gsr_core` sampler against two synthetic GSR signals, prints
//! the diagnostic channel to stdout, and plays the paired receiver: every
//! broadcast record is parsed back and kept in a rolling history.
//!
//! # Environment
//!
//! | Variable             | Effect                                         |
//! |----------------------|------------------------------------------------|
//! | `GSR_SIM_CONFIG`     | Path to a JSON `SamplerConfig` override (*)    |
//! | `GSR_SIM_ITERATIONS` | Number of iterations to run (default 200)      |
//! | `RUST_LOG`           | Log filter for `env_logger`                    |
//!
//! (*) `device_name` is borrowed from the file, so it must be a plain JSON
//! string without escape sequences; `"GSR\u005f1"` is rejected.
//!
//! The synthetic sensors are "unplugged" for a stretch of every cycle so the
//! no-sensor path shows up too.

use std::f64::consts::TAU;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use embassy_futures::block_on;
use embedded_hal_async::delay::DelayNs;
use log::{error, info, warn};

use gsr_core::GsrError;
use gsr_core::broadcast::{BROADCAST_QUEUE, BROADCAST_QUEUE_DEPTH, QueuedBroadcast};
use gsr_core::channels::{ChannelError, DiagnosticChannel};
use gsr_core::config::SamplerConfig;
use gsr_core::history::ReadingHistory;
use gsr_core::reading::{ADC_MAX_READING, RawReading};
use gsr_core::record::parse_record;
use gsr_core::sampling::{IterationOutcome, Sampler};
use gsr_core::sensors::{GsrInput, Sensor, SensorError};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

const DEFAULT_ITERATIONS: u32 = 200;

/// Reads per unplug cycle; the last quarter of each cycle reads as floating
const UNPLUG_CYCLE: u32 = 60;

/// Log receiver stats every this many received records
const STATS_EVERY: usize = 10;

// ---------------------------------------------------------------------------
// Synthetic hardware
// ---------------------------------------------------------------------------

/// Generates a slowly varying skin conductance signal.
struct SyntheticGsr {
    baseline: f64,
    amplitude: f64,
    /// Reads per full oscillation
    period: f64,
    reads: u32,
}

impl SyntheticGsr {
    fn new(input: GsrInput) -> Self {
        match input {
            GsrInput::First => Self {
                baseline: 1800.0,
                amplitude: 400.0,
                period: 90.0,
                reads: 0,
            },
            GsrInput::Second => Self {
                baseline: 2300.0,
                amplitude: 250.0,
                period: 140.0,
                reads: 0,
            },
        }
    }

    fn unplugged(&self) -> bool {
        self.reads % UNPLUG_CYCLE >= UNPLUG_CYCLE * 3 / 4
    }
}

impl Sensor for SyntheticGsr {
    async fn read(&mut self) -> Result<RawReading, SensorError> {
        let value = if self.unplugged() {
            // A floating input wanders inside the no-sensor band
            318 + (self.reads % 10) as RawReading
        } else {
            let t = self.reads as f64;
            let wave = self.baseline + self.amplitude * (TAU * t / self.period).sin();
            let jitter = (self.reads.wrapping_mul(7919) % 23) as f64 - 11.0;
            (wave + jitter).clamp(0.0, ADC_MAX_READING as f64) as RawReading
        };

        self.reads += 1;
        Ok(value)
    }
}

/// Diagnostic channel that prints to stdout.
struct StdoutDiagnostic;

impl DiagnosticChannel for StdoutDiagnostic {
    async fn write_line(&mut self, line: &str) -> Result<(), ChannelError> {
        println!("{line}");
        Ok(())
    }
}

/// Real-time delay backed by `thread::sleep`.
struct StdDelay;

impl DelayNs for StdDelay {
    async fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }
}

// ---------------------------------------------------------------------------
// Receiver side
// ---------------------------------------------------------------------------

/// Plays the paired central: drains the broadcast queue and keeps history.
struct Receiver {
    history: ReadingHistory,
    received: usize,
    rejected: usize,
}

impl Receiver {
    fn new() -> Self {
        Self {
            history: ReadingHistory::new(),
            received: 0,
            rejected: 0,
        }
    }

    fn drain(&mut self) {
        while let Some(line) = BROADCAST_QUEUE.try_receive() {
            match parse_record(&line) {
                Ok(pair) => {
                    self.history.push(pair);
                    self.received += 1;
                    if self.received % STATS_EVERY == 0 {
                        self.log_stats();
                    }
                }
                Err(e) => {
                    self.rejected += 1;
                    warn!("[sim] receiver rejected {:?}: {}", line.as_str(), e);
                }
            }
        }
    }

    fn log_stats(&self) {
        if let Some((first, second)) = self.history.stats() {
            info!(
                "[sim] last {} records: sensor 1 {}..{} (avg {}), sensor 2 {}..{} (avg {})",
                first.count, first.min, first.max, first.avg, second.min, second.max, second.avg
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn iterations_from_env() -> u32 {
    match std::env::var("GSR_SIM_ITERATIONS") {
        Ok(text) => text.parse().unwrap_or_else(|_| {
            warn!(
                "[sim] GSR_SIM_ITERATIONS={:?} is not a number, using {}",
                text, DEFAULT_ITERATIONS
            );
            DEFAULT_ITERATIONS
        }),
        Err(_) => DEFAULT_ITERATIONS,
    }
}

fn load_config(raw: Option<&str>) -> Result<SamplerConfig<'_>, serde_json::Error> {
    match raw {
        Some(text) => serde_json::from_str(text),
        None => Ok(SamplerConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

type SimSampler<'a> = Sampler<
    'a,
    SyntheticGsr,
    SyntheticGsr,
    StdoutDiagnostic,
    QueuedBroadcast<'static, BROADCAST_QUEUE_DEPTH>,
    StdDelay,
>;

async fn simulate(
    sampler: &mut SimSampler<'_>,
    receiver: &mut Receiver,
    iterations: u32,
) -> Result<(u32, u32), GsrError> {
    let mut broadcast = 0;
    let mut no_sensor = 0;

    sampler.announce().await?;

    for _ in 0..iterations {
        match sampler.run_iteration().await? {
            IterationOutcome::Broadcast(_) => broadcast += 1,
            IterationOutcome::NoSensor(_) => no_sensor += 1,
        }
        receiver.drain();
    }

    Ok((broadcast, no_sensor))
}

fn main() -> ExitCode {
    env_logger::init();
    info!("Starting gsr-streamer simulator");

    let raw_config = match std::env::var("GSR_SIM_CONFIG") {
        Ok(path) => match std::fs::read_to_string(&path) {
            Ok(text) => {
                info!("[sim] loading config from {}", path);
                Some(text)
            }
            Err(e) => {
                error!("[sim] cannot read {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        Err(_) => None,
    };

    let config = match load_config(raw_config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("[sim] invalid config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let iterations = iterations_from_env();

    // The simulator is the paired central for the whole run
    BROADCAST_QUEUE.set_connected(true);

    let mut sampler = match Sampler::new(
        config,
        SyntheticGsr::new(GsrInput::First),
        SyntheticGsr::new(GsrInput::Second),
        StdoutDiagnostic,
        QueuedBroadcast::new(&BROADCAST_QUEUE),
        StdDelay,
    ) {
        Ok(sampler) => sampler,
        Err(e) => {
            error!("[sim] {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "[sim] '{}' for {} iterations (>= {} ms each)",
        config.device_name,
        iterations,
        config.min_iteration_ms()
    );

    let mut receiver = Receiver::new();
    let started = Instant::now();
    let result = block_on(simulate(&mut sampler, &mut receiver, iterations));
    BROADCAST_QUEUE.set_connected(false);

    match result {
        Ok((broadcast, no_sensor)) => {
            info!(
                "[sim] done in {:.1?}: {} broadcast, {} no-sensor, {} received, {} rejected",
                started.elapsed(),
                broadcast,
                no_sensor,
                receiver.received,
                receiver.rejected
            );
            receiver.log_stats();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("[sim] sampling stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsr_core::config::NO_SENSOR_BAND;
    use gsr_core::reading::DetectionBand;

    #[test]
    fn test_partial_json_config_keeps_defaults() {
        let config = load_config(Some(r#"{ "device_name": "GSR_BENCH", "sample_period_ms": 250 }"#))
            .unwrap();

        assert_eq!(config.device_name, "GSR_BENCH");
        assert_eq!(config.sample_period_ms, 250);
        assert_eq!(config.settle_delay_ms, 10);
        assert_eq!(config.no_sensor_band, NO_SENSOR_BAND);
    }

    #[test]
    fn test_json_band_override() {
        let config =
            load_config(Some(r#"{ "no_sensor_band": { "low": 100, "high": 120 } }"#)).unwrap();

        assert_eq!(config.no_sensor_band, DetectionBand::new(100, 120));
        assert_eq!(config.device_name, "ESP32_GSR");
    }

    #[test]
    fn test_escaped_device_name_is_rejected() {
        assert!(load_config(Some(r#"{ "device_name": "GSR\u005f1" }"#)).is_err());
    }

    #[test]
    fn test_synthetic_sensor_survives_long_runs() {
        let mut sensor = SyntheticGsr::new(GsrInput::First);

        for reads in [u32::MAX / 7919, 600_000, u32::MAX - 1] {
            sensor.reads = reads;
            let value = block_on(sensor.read()).unwrap();
            assert!(value <= ADC_MAX_READING);
        }
    }

    #[test]
    fn test_synthetic_sensors_unplug_together() {
        let mut first = SyntheticGsr::new(GsrInput::First);
        let mut second = SyntheticGsr::new(GsrInput::Second);

        for read in 0..UNPLUG_CYCLE {
            let a = block_on(first.read()).unwrap();
            let b = block_on(second.read()).unwrap();
            let both_in_band = NO_SENSOR_BAND.contains(a) && NO_SENSOR_BAND.contains(b);

            assert_eq!(both_in_band, read >= UNPLUG_CYCLE * 3 / 4, "read {read}: {a},{b}");
        }
    }
}
