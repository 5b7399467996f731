//! Hardware Driver Subsystem
//!
//! This crate provides a layered UART stack for the NXP LPUART:
//!
//! # Module Organization
//!
//! - [`hal`]: Platform-independent configuration, errors and serial traits
//! - [`peripheral`]: Register-level LPUART driver
//! - [`platform`]: Per-part peripheral instance tables
//! - [`uart`]: Blocking and interrupt-driven transfers on one instance
//! - [`console`]: `log` backend over a serial console
//!
//! # Design Principles
//!
//! 1. **Separation of Concerns**: Platform code is separate from peripheral code
//! 2. **Zero-Cost Abstractions**: HAL traits compile to direct hardware access
//! 3. **Clear Ownership**: An instance has exactly one handle at a time
//! 4. **Interrupt Safety**: State shared with the handler is only touched
//!    with interrupts masked
//!
//! # Usage Example
//!
//! ```no_run
//! use drivers::hal::serial::UartConfig;
//! use drivers::platform::CurrentPlatform;
//! use drivers::uart::Uart;
//!
//! let uart: Uart<'_, _> = Uart::init(UartConfig::default(), &CurrentPlatform).unwrap();
//! uart.send_blocking(b"Hello, world!\r\n").unwrap();
//! ```

#![cfg_attr(not(test), no_std)]

pub mod console;
pub mod hal;
pub mod peripheral;
pub mod platform;
pub mod uart;

// Re-export commonly used types
pub use hal::serial::{LineError, Parity, SerialError, SerialPort, StopBits, UartConfig};
pub use uart::{CompletionSink, Status, Uart, UartError};
