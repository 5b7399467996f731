//! Serial console and `log` backend.
//!
//! Any [`Console`] can carry log output. [`init`] installs a
//! [`SerialLogger`] once; later calls fail with the `log` crate's error.
//!
//! ```no_run
//! use drivers::console;
//! use drivers::hal::serial::UartConfig;
//! use drivers::platform::CurrentPlatform;
//! use drivers::uart::Uart;
//!
//! static PLATFORM: CurrentPlatform = CurrentPlatform;
//! let uart: &'static Uart<'static, _> = Box::leak(Box::new(
//!     Uart::init(UartConfig::default(), &PLATFORM).unwrap(),
//! ));
//! console::init(uart, log::LevelFilter::Debug).unwrap();
//! log::info!("console up");
//! ```

use crate::peripheral::lpuart::regs::RegisterBlock;
use crate::uart::Uart;
use common::sync::irq::IrqControl;
use core::fmt::{self, Write};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Once;

/// Byte sink for console output.
pub trait Console: Sync {
    fn write_bytes(&self, bytes: &[u8]);
}

impl<'a, B: RegisterBlock, I: IrqControl> Console for Uart<'a, B, I> {
    fn write_bytes(&self, bytes: &[u8]) {
        // Console output is best effort
        let _ = self.send_blocking(bytes);
    }
}

/// `core::fmt::Write` adapter that turns `\n` into `\r\n`.
pub struct ConsoleWriter<'c> {
    console: &'c dyn Console,
}

impl<'c> ConsoleWriter<'c> {
    pub fn new(console: &'c dyn Console) -> Self {
        Self { console }
    }
}

impl Write for ConsoleWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut lines = s.split('\n');
        if let Some(first) = lines.next() {
            self.console.write_bytes(first.as_bytes());
        }
        for line in lines {
            self.console.write_bytes(b"\r\n");
            self.console.write_bytes(line.as_bytes());
        }
        Ok(())
    }
}

/// `log` backend writing one line per record.
pub struct SerialLogger {
    console: &'static dyn Console,
    level: LevelFilter,
}

impl SerialLogger {
    pub const fn new(console: &'static dyn Console, level: LevelFilter) -> Self {
        Self { console, level }
    }
}

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut writer = ConsoleWriter::new(self.console);
        let _ = writeln!(
            writer,
            "[{:<5} {}] {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: Once<SerialLogger> = Once::new();

/// Route the `log` macros to `console`.
pub fn init(console: &'static dyn Console, level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = LOGGER.call_once(|| SerialLogger::new(console, level));
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}
