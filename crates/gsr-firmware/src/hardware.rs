//! Hardware initialization for the GSR streamer
//!
//! This module sets up the wired diagnostic port and the two analog inputs.
//! The radio is brought up in `main` because its controller must outlive
//! the BLE task.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use esp_hal::analog::adc::{Adc, AdcConfig, Attenuation};
use esp_hal::peripherals::{ADC1, GPIO1, GPIO3, GPIO34, GPIO35, UART0};
use esp_hal::uart::{Config as UartConfig, Uart};
use log::info;
use static_cell::StaticCell;

use gsr_core::sensors::GsrInput;

use crate::adc_sensor::{AdcSensor, SharedAdc};
use crate::diagnostic_uart::UartDiagnostic;

/// Full 0-3.3 V input range, the platform default for analog reads.
const GSR_ATTENUATION: Attenuation = Attenuation::_11dB;

pub type FirstGsrSensor = AdcSensor<'static, GPIO34<'static>>;
pub type SecondGsrSensor = AdcSensor<'static, GPIO35<'static>>;

/// Open UART0 (TX GPIO1, RX GPIO3) at `baud_rate` for diagnostic output.
pub fn init_diagnostic_uart(
    uart0: UART0<'static>,
    tx: GPIO1<'static>,
    rx: GPIO3<'static>,
    baud_rate: u32,
) -> UartDiagnostic<'static> {
    let uart = Uart::new(uart0, UartConfig::default().with_baudrate(baud_rate))
        .expect("Failed to configure diagnostic UART")
        .with_tx(tx)
        .with_rx(rx)
        .into_async();

    info!("Diagnostic UART ready at {} baud", baud_rate);
    UartDiagnostic::new(uart)
}

/// Configure GPIO34 and GPIO35 as ADC1 inputs.
///
/// # Returns
/// A tuple of (first sensor, second sensor), both sharing ADC1
pub fn init_gsr_inputs(
    adc1: ADC1<'static>,
    first_pin: GPIO34<'static>,
    second_pin: GPIO35<'static>,
) -> (FirstGsrSensor, SecondGsrSensor) {
    let mut adc_config = AdcConfig::new();
    let first = adc_config.enable_pin(first_pin, GSR_ATTENUATION);
    let second = adc_config.enable_pin(second_pin, GSR_ATTENUATION);

    static ADC1_SHARED: StaticCell<SharedAdc> = StaticCell::new();
    let adc = ADC1_SHARED.init(BlockingMutex::new(RefCell::new(Adc::new(adc1, adc_config))));

    info!("GSR inputs ready on GPIO34/GPIO35 (ADC1)");

    (
        AdcSensor::new(adc, first, GsrInput::First),
        AdcSensor::new(adc, second, GsrInput::Second),
    )
}
