//! ESP32 firmware-specific modules for gsr-streamer
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: ADC1 input channels, the UART0 diagnostic port, and the BLE
//! Nordic UART peripheral that carries broadcast records.

#![no_std]

pub mod adc_sensor;
pub mod ble;
pub mod diagnostic_uart;
pub mod hardware;
