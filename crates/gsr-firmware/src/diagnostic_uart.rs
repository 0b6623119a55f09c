use embedded_io_async::Write;
use esp_hal::Async;
use esp_hal::uart::Uart;

use gsr_core::channels::{ChannelError, DiagnosticChannel};

/// Human-readable log lines on the wired serial port, `\r\n` terminated.
///
/// Writes await the TX FIFO so the BLE host keeps running while a line drains
/// at 9600 baud.
pub struct UartDiagnostic<'d> {
    uart: Uart<'d, Async>,
}

impl<'d> UartDiagnostic<'d> {
    pub fn new(uart: Uart<'d, Async>) -> Self {
        Self { uart }
    }
}

impl DiagnosticChannel for UartDiagnostic<'_> {
    async fn write_line(&mut self, line: &str) -> Result<(), ChannelError> {
        let result = async {
            self.uart.write_all(line.as_bytes()).await?;
            self.uart.write_all(b"\r\n").await?;
            self.uart.flush().await
        }
        .await;

        result.map_err(|e| {
            log::error!("[uart] diagnostic write failed: {:?}", e);
            ChannelError::WriteFailed {
                channel: "diagnostic",
            }
        })
    }
}
