//! Serial Port (UART) Hardware Abstraction Layer.
//!
//! This module defines platform-independent configuration, error and
//! byte-level I/O traits for serial communication.

use core::fmt;

/// Functional clock of the LPUART after reset (FRO_12M, divider 1).
pub const DEFAULT_SRC_CLOCK_HZ: u32 = 12_000_000;

/// Serial port configuration.
///
/// An immutable snapshot handed to the driver at init time and kept for
/// the lifetime of the handle (low-power exit reprograms from it).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UartConfig {
    /// Functional clock feeding the baud generator, in Hz.
    pub src_clock_hz: u32,
    /// Baud rate in bits per second.
    pub baud_rate: u32,
    /// Parity checking mode.
    pub parity: Parity,
    /// Number of stop bits.
    pub stop_bits: StopBits,
    /// Enable the receiver.
    pub enable_rx: bool,
    /// Enable the transmitter.
    pub enable_tx: bool,
    /// Drive RTS from the receiver (receive flow control).
    pub enable_rx_rts: bool,
    /// Gate the transmitter on CTS (transmit flow control).
    pub enable_tx_cts: bool,
    /// Peripheral instance index.
    pub instance: u8,
    /// Complete an armed receive early once the line goes idle.
    pub idle_line_timeout: bool,
}

impl UartConfig {
    /// Create a standard 8N1 configuration.
    ///
    /// 8N1 means: 8 data bits, no parity, 1 stop bit. Receiver and
    /// transmitter are enabled, flow control is off.
    pub const fn new_8n1(instance: u8, src_clock_hz: u32, baud_rate: u32) -> Self {
        Self {
            src_clock_hz,
            baud_rate,
            parity: Parity::None,
            stop_bits: StopBits::One,
            enable_rx: true,
            enable_tx: true,
            enable_rx_rts: false,
            enable_tx_cts: false,
            instance,
            idle_line_timeout: false,
        }
    }

    pub const fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    pub const fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Select RTS (receive side) and CTS (transmit side) flow control.
    pub const fn with_flow_control(mut self, rx_rts: bool, tx_cts: bool) -> Self {
        self.enable_rx_rts = rx_rts;
        self.enable_tx_cts = tx_cts;
        self
    }

    /// Enable or disable one direction of the port.
    pub const fn with_directions(mut self, rx: bool, tx: bool) -> Self {
        self.enable_rx = rx;
        self.enable_tx = tx;
        self
    }

    pub const fn with_idle_line_timeout(mut self, enabled: bool) -> Self {
        self.idle_line_timeout = enabled;
        self
    }
}

impl Default for UartConfig {
    /// Default configuration: instance 0, 12 MHz source, 115200 baud, 8N1.
    fn default() -> Self {
        Self::new_8n1(0, DEFAULT_SRC_CLOCK_HZ, 115200)
    }
}

/// Parity mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Parity {
    /// No parity bit.
    None,
    /// Even parity.
    Even,
    /// Odd parity.
    Odd,
}

/// Number of stop bits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StopBits {
    /// One stop bit.
    One,
    /// Two stop bits.
    Two,
}

/// Receive line errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LineError {
    /// Framing error (stop bit sampled low).
    Framing,
    /// Parity error (parity check failed).
    Parity,
    /// Noise detected while sampling a bit.
    Noise,
    /// Overrun error (data received faster than it could be read).
    Overrun,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LineError::Framing => "framing error",
            LineError::Parity => "parity error",
            LineError::Noise => "noise error",
            LineError::Overrun => "receiver overrun",
        };
        f.write_str(s)
    }
}

/// Serial port errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SerialError {
    /// A receive line error was detected.
    Line(LineError),
    /// Operation would block but non-blocking mode was requested.
    WouldBlock,
    /// No divisor reaches the requested baud rate from the source clock.
    BaudrateNotSupported,
}

impl From<LineError> for SerialError {
    fn from(err: LineError) -> Self {
        SerialError::Line(err)
    }
}

/// Serial port trait.
///
/// This trait provides the core interface for blocking serial communication.
pub trait SerialPort {
    /// Error type for serial operations.
    type Error: core::fmt::Debug;

    /// Configure the serial port.
    ///
    /// This must be called before using the serial port.
    fn configure(&mut self, config: &UartConfig) -> Result<(), Self::Error>;

    /// Write a single byte (blocking).
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Write multiple bytes (blocking).
    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(bytes.len())
    }

    /// Read a single byte (blocking).
    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Read multiple bytes (blocking).
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        for byte in buffer.iter_mut() {
            *byte = self.read_byte()?;
        }
        Ok(buffer.len())
    }

    /// Wait until every written byte has left the shift register.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if the serial port is busy transmitting.
    fn is_busy(&self) -> bool;
}

/// Extension trait for non-blocking operations.
pub trait NonBlockingSerial: SerialPort {
    /// Try to write a byte without blocking.
    fn try_write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Try to read a byte without blocking.
    fn try_read_byte(&mut self) -> Result<u8, Self::Error>;
}
