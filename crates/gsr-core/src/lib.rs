//! Hardware-independent core library for gsr-streamer
//!
//! This crate contains all platform-agnostic logic for the two-channel
//! galvanic skin response streamer: the sensor and channel traits, the
//! sampling-and-broadcast loop, record formatting, the queue that hands
//! records to the wireless link, and the receiver-side reading history.
//!
//! It is `#![no_std]` so it compiles on both the ESP32 target and desktop
//! hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod broadcast;
pub mod channels;
pub mod config;
pub mod error;
pub mod history;
pub mod reading;
pub mod record;
pub mod sampling;
pub mod sensors;

pub use error::GsrError;
