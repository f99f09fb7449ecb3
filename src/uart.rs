//! ESP-IDF UART channels.
//!
//! Wraps a `UartDriver` as a [`CharStream`]. Reads never block: the driver
//! is polled with `NON_BLOCK`, and one byte of lookahead backs `peek()`.
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32-S3 UART1 (17/18) ◀──▶ host agent (USB-UART, 38400)
//! ESP32-S3 UART2 (4/5)   ◀──▶ debug monitor (USB-UART, 115200)
//! ESP32-S3 UART0 (43/44) ◀──▶ operator console + log output
//! ```

use core::cell::Cell;

use esp_idf_svc::hal::delay::NON_BLOCK;
use esp_idf_svc::hal::gpio;
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{self, Uart, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::EspError;

use crate::channel::CharStream;
use crate::config::UartConfig;

/// UART-backed bridge channel.
pub struct UartStream<'d> {
    driver: UartDriver<'d>,
    peeked: Cell<Option<u8>>,
}

impl<'d> UartStream<'d> {
    pub fn new(driver: UartDriver<'d>) -> Self {
        Self {
            driver,
            peeked: Cell::new(None),
        }
    }

    fn read_raw(&self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.driver.read(&mut byte, NON_BLOCK) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

impl CharStream for UartStream<'_> {
    fn available(&self) -> usize {
        let buffered = self.driver.remaining_read().unwrap_or(0);
        buffered + usize::from(self.peeked.get().is_some())
    }

    fn read(&mut self) -> Option<u8> {
        self.peeked.take().or_else(|| self.read_raw())
    }

    fn peek(&self) -> Option<u8> {
        if self.peeked.get().is_none() {
            self.peeked.set(self.read_raw());
        }
        self.peeked.get()
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        self.driver.write(bytes).unwrap_or(0)
    }
}

/// Install a full-duplex UART driver and wrap it as a channel.
pub fn init_uart<'d, U: Uart>(
    uart: impl Peripheral<P = U> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    rx_pin: impl Peripheral<P = impl gpio::InputPin> + 'd,
    config: &UartConfig,
) -> Result<UartStream<'d>, EspError> {
    let uart_config = uart::config::Config::default().baudrate(Hertz(config.baud_rate));

    let driver = UartDriver::new(
        uart,
        tx_pin,
        rx_pin,
        Option::<gpio::AnyIOPin>::None, // CTS
        Option::<gpio::AnyIOPin>::None, // RTS
        &uart_config,
    )?;

    Ok(UartStream::new(driver))
}
