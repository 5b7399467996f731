//! Interrupt-driven UART adapter.
//!
//! [`Uart`] owns one claimed LPUART and layers two transfer styles on top
//! of the register driver:
//!
//! - Blocking calls poll the status register and return once the data has
//!   moved. They never depend on the interrupt handler.
//! - Non-blocking calls arm a per-direction [`Transfer`] and return at
//!   once. [`Uart::isr_function`] moves the data and reports completion to
//!   the installed [`CompletionSink`].
//!
//! All state the handler and the caller share sits behind one
//! [`IrqSpinLock`]. Sinks and log messages only run after it is released.
//!
//! # Example
//!
//! ```no_run
//! use drivers::hal::serial::UartConfig;
//! use drivers::platform::CurrentPlatform;
//! use drivers::uart::Uart;
//!
//! let uart: Uart<'_, _> = Uart::init(UartConfig::default(), &CurrentPlatform).unwrap();
//! uart.send_blocking(b"boot\r\n").unwrap();
//! ```

mod callback;
mod ring;
mod status;
mod transfer;


pub use callback::{CompletionSink, FnSink};
pub use ring::RingBuffer;
pub use status::{Status, UartError};
pub use transfer::{Transfer, TransferState};

use crate::hal::serial::{LineError, NonBlockingSerial, SerialError, SerialPort, UartConfig};
use crate::peripheral::lpuart::{self, Lpuart, baud::BaudDivisor, regs::*};
use crate::platform::{ClaimError, Peripherals};
use common::arch::DefaultIrq;
use common::sync::IrqSpinLock;
use common::sync::irq::IrqControl;
use log::{debug, trace, warn};

/// Receive interrupts kept on while a ring buffer collects idle traffic.
const RING_INTERRUPTS: Ctrl = Ctrl::RIE.union(Ctrl::ORIE);

/// UART handle for one LPUART instance.
pub struct Uart<'a, B: RegisterBlock, I: IrqControl = DefaultIrq> {
    config: UartConfig,
    inner: IrqSpinLock<Inner<'a, B>, I>,
}

struct Inner<'a, B: RegisterBlock> {
    port: Lpuart<B>,
    tx: Transfer<&'a [u8]>,
    rx: Transfer<&'a mut [u8]>,
    sink: Option<&'a dyn CompletionSink>,
    ring: Option<RingBuffer<'a>>,
    low_power: bool,
}

/// What one interrupt pass found; acted on after the lock is dropped.
#[derive(Default)]
struct Events {
    tx: Option<Status>,
    rx: Option<Status>,
    line_error: Option<LineError>,
    dropped: usize,
}

impl<'a, B: RegisterBlock, I: IrqControl> Uart<'a, B, I> {
    /// Claim `config.instance` from `peripherals` and program it.
    pub fn init<P>(config: UartConfig, peripherals: &P) -> Result<Self, UartError>
    where
        P: Peripherals<Lpuart = B>,
    {
        let divisor = BaudDivisor::compute(config.src_clock_hz, config.baud_rate)
            .map_err(|_| UartError::BaudrateNotSupported)?;

        let regs = peripherals
            .claim_lpuart(config.instance)
            .map_err(|err| match err {
                ClaimError::NoSuchInstance => UartError::InvalidInstance(config.instance),
                ClaimError::InUse => UartError::InstanceInUse(config.instance),
            })?;

        let mut port = Lpuart::new(regs);
        port.reset();
        port.configure(&config).map_err(|_| UartError::BaudrateNotSupported)?;

        debug!(
            "lpuart{}: {} baud requested, {} actual (osr {}, sbr {})",
            config.instance,
            config.baud_rate,
            divisor.actual_baud(config.src_clock_hz),
            divisor.osr,
            divisor.sbr
        );

        Ok(Self {
            config,
            inner: IrqSpinLock::new(Inner {
                port,
                tx: Transfer::new(),
                rx: Transfer::new(),
                sink: None,
                ring: None,
                low_power: false,
            }),
        })
    }

    /// Stop the port and release the instance.
    ///
    /// Transfers still in flight are aborted without notification.
    pub fn deinit(self) {
        drop(self);
    }

    pub fn config(&self) -> &UartConfig {
        &self.config
    }

    pub fn instance(&self) -> u8 {
        self.config.instance
    }

    // ========================================================================
    // Blocking transfers
    // ========================================================================

    /// Transmit `data` and wait until the last stop bit is on the wire.
    pub fn send_blocking(&self, data: &[u8]) -> Result<(), UartError> {
        if data.is_empty() {
            return Ok(());
        }
        if !self.config.enable_tx {
            return Err(UartError::Disabled);
        }

        for &byte in data {
            loop {
                let mut inner = self.inner.lock();
                inner.check_tx_free()?;
                if inner.port.try_write_byte(byte).is_ok() {
                    break;
                }
                drop(inner);
                core::hint::spin_loop();
            }
        }

        while self.inner.lock().port.is_busy() {
            core::hint::spin_loop();
        }

        Ok(())
    }

    /// Fill `buf` from the line, consuming ring-buffered bytes first.
    pub fn receive_blocking(&self, buf: &mut [u8]) -> Result<(), UartError> {
        if buf.is_empty() {
            return Ok(());
        }
        if !self.config.enable_rx {
            return Err(UartError::Disabled);
        }

        for slot in buf.iter_mut() {
            loop {
                let mut inner = self.inner.lock();
                inner.check_rx_free()?;

                if let Some(byte) = inner.ring.as_mut().and_then(RingBuffer::pop) {
                    *slot = byte;
                    break;
                }

                match inner.port.try_read_byte() {
                    Ok(byte) => {
                        *slot = byte;
                        break;
                    }
                    Err(SerialError::Line(err)) => {
                        drop(inner);
                        warn!("lpuart{}: receive failed: {}", self.config.instance, err);
                        return Err(UartError::Protocol(err));
                    }
                    Err(_) => {}
                }

                drop(inner);
                core::hint::spin_loop();
            }
        }

        Ok(())
    }

    // ========================================================================
    // Non-blocking transfers
    // ========================================================================

    /// Arm an interrupt-driven send of `data`.
    ///
    /// Completion is reported as [`Status::TxIdle`] once every byte has
    /// left the transmitter.
    pub fn send_non_blocking(&self, data: &'a [u8]) -> Result<(), UartError> {
        if data.is_empty() {
            return Err(UartError::EmptyTransfer);
        }
        if !self.config.enable_tx {
            return Err(UartError::Disabled);
        }

        {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.low_power {
                return Err(UartError::LowPower);
            }
            inner.tx.start(data).map_err(|_| UartError::TxBusy)?;
            inner.port.disable_interrupts(Ctrl::TCIE);
            inner.port.enable_interrupts(Ctrl::TIE);
        }

        trace!(
            "lpuart{}: send armed, {} bytes",
            self.config.instance,
            data.len()
        );
        Ok(())
    }

    /// Arm an interrupt-driven receive into `buf`.
    ///
    /// Bytes already queued in the ring buffer are consumed first; if they
    /// fill `buf` the transfer completes before this call returns.
    pub fn receive_non_blocking(&self, buf: &'a mut [u8]) -> Result<(), UartError> {
        if buf.is_empty() {
            return Err(UartError::EmptyTransfer);
        }
        if !self.config.enable_rx {
            return Err(UartError::Disabled);
        }

        let len = buf.len();
        let (completed, sink) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.low_power {
                return Err(UartError::LowPower);
            }
            inner.rx.start(buf).map_err(|_| UartError::RxBusy)?;

            let mut filled = false;
            if let (Some(ring), Some((buf, count))) = (inner.ring.as_mut(), inner.rx.busy_mut()) {
                while *count < buf.len() {
                    match ring.pop() {
                        Some(byte) => {
                            buf[*count] = byte;
                            *count += 1;
                        }
                        None => break,
                    }
                }
                filled = *count == buf.len();
            }

            if filled {
                inner.rx.finish();
            } else {
                inner.port.clear_stale_flags();
                let mut irqs = Ctrl::RX_INTERRUPTS;
                if self.config.idle_line_timeout {
                    irqs |= Ctrl::ILIE;
                }
                inner.port.enable_interrupts(irqs);
            }
            (filled, inner.sink)
        };

        if completed {
            trace!(
                "lpuart{}: receive of {} bytes served from ring buffer",
                self.config.instance, len
            );
            if let Some(sink) = sink {
                sink.notify(Status::RxIdle);
            }
        } else {
            trace!(
                "lpuart{}: receive armed, {} bytes",
                self.config.instance, len
            );
        }

        Ok(())
    }

    /// Set the completion sink used by later interrupt passes.
    pub fn install_callback(&self, sink: &'a dyn CompletionSink) {
        self.inner.lock().sink = Some(sink);
    }

    /// Bytes moved by the current or last send.
    pub fn send_count(&self) -> Result<usize, UartError> {
        self.inner.lock().tx.count().ok_or(UartError::NoTransfer)
    }

    /// Bytes moved by the current or last receive.
    pub fn receive_count(&self) -> Result<usize, UartError> {
        self.inner.lock().rx.count().ok_or(UartError::NoTransfer)
    }

    pub fn tx_state(&self) -> TransferState {
        self.inner.lock().tx.state()
    }

    pub fn rx_state(&self) -> TransferState {
        self.inner.lock().rx.state()
    }

    /// Hand back the buffer of a finished or aborted send.
    pub fn take_send_buffer(&self) -> Option<&'a [u8]> {
        self.inner.lock().tx.take()
    }

    /// Hand back the buffer of a finished or aborted receive.
    pub fn take_receive_buffer(&self) -> Option<&'a mut [u8]> {
        self.inner.lock().rx.take()
    }

    /// Stop an in-flight send. No notification is delivered.
    pub fn abort_send(&self) {
        let aborted = {
            let mut inner = self.inner.lock();
            let aborted = inner.tx.finish();
            if aborted {
                inner.port.disable_interrupts(Ctrl::TX_INTERRUPTS);
                inner.port.flush_tx_fifo();
            }
            aborted
        };

        if aborted {
            trace!("lpuart{}: send aborted", self.config.instance);
        }
    }

    /// Stop an in-flight receive. No notification is delivered.
    pub fn abort_receive(&self) {
        let aborted = {
            let mut inner = self.inner.lock();
            let aborted = inner.rx.finish();
            if aborted {
                inner.port.flush_rx_fifo();
                inner.park_rx();
            }
            aborted
        };

        if aborted {
            trace!("lpuart{}: receive aborted", self.config.instance);
        }
    }

    // ========================================================================
    // Receive ring buffer
    // ========================================================================

    /// Queue bytes that arrive while no receive is armed into `storage`.
    ///
    /// Replaces any earlier ring buffer and its contents.
    pub fn install_ring_buffer(&self, storage: &'a mut [u8]) -> Result<(), UartError> {
        if storage.is_empty() {
            return Err(UartError::EmptyTransfer);
        }
        if !self.config.enable_rx {
            return Err(UartError::Disabled);
        }

        let capacity = storage.len();
        {
            let mut inner = self.inner.lock();
            inner.ring = Some(RingBuffer::new(storage));
            if !inner.rx.is_busy() {
                inner.park_rx();
            }
        }

        debug!(
            "lpuart{}: ring buffer installed, {} bytes",
            self.config.instance, capacity
        );
        Ok(())
    }

    /// Bytes waiting in the ring buffer.
    pub fn ring_buffer_len(&self) -> usize {
        self.inner.lock().ring.as_ref().map_or(0, RingBuffer::len)
    }

    // ========================================================================
    // Low power
    // ========================================================================

    /// Stop the transmitter and receiver ahead of a low-power mode.
    ///
    /// Refused while a non-blocking transfer is in flight.
    pub fn enter_low_power(&self) -> Result<(), UartError> {
        {
            let mut inner = self.inner.lock();
            if inner.low_power {
                return Ok(());
            }
            inner.check_tx_free()?;
            inner.check_rx_free()?;
            inner.port.disable();
            inner.low_power = true;
        }

        debug!("lpuart{}: entered low power", self.config.instance);
        Ok(())
    }

    /// Reprogram the port from the stored configuration.
    pub fn exit_low_power(&self) -> Result<(), UartError> {
        {
            let mut inner = self.inner.lock();
            if !inner.low_power {
                return Ok(());
            }
            inner
                .port
                .configure(&self.config)
                .map_err(|_| UartError::BaudrateNotSupported)?;
            inner.low_power = false;
            inner.park_rx();
        }

        debug!("lpuart{}: exited low power", self.config.instance);
        Ok(())
    }

    // ========================================================================
    // Interrupt handling
    // ========================================================================

    /// Service the LPUART interrupt.
    ///
    /// Call from the instance's interrupt vector. Safe to call when nothing
    /// is pending.
    pub fn isr_function(&self) {
        let mut events = Events::default();

        let sink = {
            let mut inner = self.inner.lock();
            let stat = inner.port.status();
            let enabled = inner.port.interrupts();

            if enabled.intersects(Ctrl::RX_INTERRUPTS | Ctrl::ILIE) {
                inner.service_rx(stat, &mut events, self.config.idle_line_timeout);
            }
            if enabled.intersects(Ctrl::TX_INTERRUPTS) {
                inner.service_tx(stat, enabled, &mut events);
            }
            inner.sink
        };

        if let Some(err) = events.line_error {
            warn!("lpuart{}: {}", self.config.instance, err);
        }
        if events.dropped > 0 {
            warn!(
                "lpuart{}: ring buffer full, dropped {} bytes",
                self.config.instance, events.dropped
            );
        }

        if let Some(sink) = sink {
            for status in [events.rx, events.tx].into_iter().flatten() {
                sink.notify(status);
            }
        }
    }
}

impl<'a, B: RegisterBlock> Inner<'a, B> {
    fn check_tx_free(&self) -> Result<(), UartError> {
        if self.low_power {
            Err(UartError::LowPower)
        } else if self.tx.is_busy() {
            Err(UartError::TxBusy)
        } else {
            Ok(())
        }
    }

    fn check_rx_free(&self) -> Result<(), UartError> {
        if self.low_power {
            Err(UartError::LowPower)
        } else if self.rx.is_busy() {
            Err(UartError::RxBusy)
        } else {
            Ok(())
        }
    }

    /// Receive interrupts for an idle receiver: ring buffer traffic only.
    fn park_rx(&mut self) {
        self.port.disable_interrupts(Ctrl::RX_INTERRUPTS | Ctrl::ILIE);
        if self.ring.is_some() && !self.low_power {
            self.port.enable_interrupts(RING_INTERRUPTS);
        }
    }

    fn service_rx(&mut self, stat: Stat, events: &mut Events, idle_line_timeout: bool) {
        if !self.rx.is_busy() {
            self.fill_ring(stat, events);
            return;
        }
        let Some((buf, count)) = self.rx.busy_mut() else {
            return;
        };

        let mut outcome = None;
        while *count < buf.len() {
            match self.port.read_data() {
                Some(Ok(byte)) => {
                    buf[*count] = byte;
                    *count += 1;
                }
                Some(Err(err)) => {
                    events.line_error = Some(err);
                    outcome = Some(Status::ProtocolError);
                    break;
                }
                None => break,
            }
        }

        if outcome.is_none() && *count == buf.len() {
            outcome = Some(Status::RxIdle);
        }

        if outcome.is_none() {
            if let Some(err) = lpuart::line_error(stat) {
                self.port.clear_status(Stat::LINE_ERRORS);
                events.line_error = Some(err);
                outcome = Some(Status::ProtocolError);
            } else if stat.contains(Stat::IDLE) {
                self.port.clear_status(Stat::IDLE);
                if idle_line_timeout && *count > 0 {
                    outcome = Some(Status::RxIdle);
                }
            }
        }

        if let Some(status) = outcome {
            self.rx.finish();
            self.park_rx();
            events.rx = Some(status);
        }
    }

    /// Move idle-time traffic into the ring buffer.
    fn fill_ring(&mut self, stat: Stat, events: &mut Events) {
        if self.ring.is_none() {
            self.port.flush_rx_fifo();
            self.park_rx();
            return;
        }
        let Some(ring) = self.ring.as_mut() else {
            return;
        };

        while let Some(word) = self.port.read_data() {
            match word {
                Ok(byte) => {
                    if !ring.push(byte) {
                        events.dropped += 1;
                    }
                }
                Err(err) => events.line_error = Some(err),
            }
        }

        if let Some(err) = lpuart::line_error(stat) {
            events.line_error = Some(err);
        }
        self.port.clear_status(Stat::LINE_ERRORS | Stat::IDLE);
    }

    /// `enabled` is the interrupt mask at entry: completion is only
    /// trusted once TCIE was already on when `stat` was sampled.
    fn service_tx(&mut self, stat: Stat, enabled: Ctrl, events: &mut Events) {
        if !self.tx.is_busy() {
            self.port.disable_interrupts(Ctrl::TX_INTERRUPTS);
            return;
        }
        let Some((buf, count)) = self.tx.busy_mut() else {
            return;
        };

        if enabled.contains(Ctrl::TIE) && stat.contains(Stat::TDRE) {
            let depth = self.port.tx_fifo_depth();
            while *count < buf.len() && self.port.tx_fifo_count() < depth {
                self.port.write_data(buf[*count]);
                *count += 1;
            }

            if *count == buf.len() {
                self.port.disable_interrupts(Ctrl::TIE);
                self.port.enable_interrupts(Ctrl::TCIE);
            }
        }

        let done = *count == buf.len()
            && enabled.contains(Ctrl::TCIE)
            && stat.contains(Stat::TC);
        if done {
            self.tx.finish();
            self.port.disable_interrupts(Ctrl::TX_INTERRUPTS);
            events.tx = Some(Status::TxIdle);
        }
    }
}

impl<'a, B: RegisterBlock, I: IrqControl> Drop for Uart<'a, B, I> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        let aborted_tx = inner.tx.finish();
        let aborted_rx = inner.rx.finish();
        inner.port.disable();

        if aborted_tx || aborted_rx {
            debug!(
                "lpuart{}: deinit aborted transfers (tx {}, rx {})",
                self.config.instance, aborted_tx, aborted_rx
            );
        }
        debug!("lpuart{}: deinit", self.config.instance);
    }
}
