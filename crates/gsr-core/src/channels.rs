//! Output channel abstractions
//!
//! The device has two outputs: a wired diagnostic serial port carrying
//! human-readable lines, and a wireless link carrying one machine-readable
//! record per qualifying iteration. Both are traits so the sampler can be
//! driven against UART/BLE on the device and against recorders on the host.

use core::future::Future;

use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    #[error("{channel} write failed")]
    WriteFailed { channel: &'static str },
    #[error("{channel} line of {len} bytes exceeds buffer")]
    LineTooLong { channel: &'static str, len: usize },
}

/// Wired diagnostic output (human-readable, not meant for parsing).
pub trait DiagnosticChannel {
    /// Write `line` followed by the channel's line terminator.
    fn write_line(&mut self, line: &str) -> impl Future<Output = Result<(), ChannelError>>;
}

/// Wireless broadcast output.
pub trait BroadcastChannel {
    /// Transmit `line` exactly as given. The caller supplies the terminator.
    fn send_line(&mut self, line: &str) -> impl Future<Output = Result<(), ChannelError>>;
}

impl<C: DiagnosticChannel> DiagnosticChannel for &mut C {
    async fn write_line(&mut self, line: &str) -> Result<(), ChannelError> {
        (**self).write_line(line).await
    }
}

impl<C: BroadcastChannel> BroadcastChannel for &mut C {
    async fn send_line(&mut self, line: &str) -> Result<(), ChannelError> {
        (**self).send_line(line).await
    }
}
