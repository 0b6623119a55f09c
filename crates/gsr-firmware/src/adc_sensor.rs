//! ADC1 input channels shared between the two GSR sensors
//!
//! Both inputs sit on ADC1, so the converter is owned by a
//! critical-section mutex and each [`AdcSensor`] borrows it only for the
//! duration of one conversion.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcChannel, AdcPin};
use esp_hal::peripherals::ADC1;
use log::error;

use gsr_core::reading::RawReading;
use gsr_core::sensors::{GsrInput, Sensor, SensorError};

pub type GsrAdc = Adc<'static, ADC1<'static>, Blocking>;

pub type SharedAdc = BlockingMutex<CriticalSectionRawMutex, RefCell<GsrAdc>>;

/// One GSR input: an ADC1-capable pin plus a handle to the shared converter.
pub struct AdcSensor<'a, PIN> {
    adc: &'a SharedAdc,
    pin: AdcPin<PIN, ADC1<'static>>,
    input: GsrInput,
}

impl<'a, PIN> AdcSensor<'a, PIN> {
    pub const fn new(adc: &'a SharedAdc, pin: AdcPin<PIN, ADC1<'static>>, input: GsrInput) -> Self {
        Self { adc, pin, input }
    }
}

impl<PIN: AdcChannel> Sensor for AdcSensor<'_, PIN> {
    async fn read(&mut self) -> Result<RawReading, SensorError> {
        let pin = &mut self.pin;
        self.adc
            .lock(|adc| nb::block!(adc.borrow_mut().read_oneshot(pin)))
            .map_err(|_| {
                error!("[adc] {} oneshot conversion failed", self.input.label());
                SensorError::ReadFailed {
                    sensor: self.input.label(),
                    details: "ADC1 oneshot conversion failed",
                }
            })
    }
}
