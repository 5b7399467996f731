//! NXP Low-Power UART (LPUART) Driver
//!
//! Register-level driver for the LPUART found on MCX A and i.MX RT parts.
//! It translates a [`UartConfig`] into baud generator, frame format, FIFO
//! and flow control settings, and exposes the status, interrupt mask and
//! FIFO operations the transfer layer builds on.
//!
//! # Features
//!
//! - Baud divisor search over every oversampling ratio
//! - Even/odd parity, one or two stop bits
//! - RTS/CTS flow control
//! - TX/RX FIFOs with per-word receive error decoding
//! - Blocking and non-blocking byte I/O
//!
//! # Example
//!
//! ```no_run
//! use drivers::hal::serial::{SerialPort, UartConfig};
//! use drivers::peripheral::lpuart::{Lpuart, regs::Mmio};
//!
//! let mut uart = Lpuart::new(unsafe { Mmio::new(0x4009_F000) });
//! uart.reset();
//! uart.configure(&UartConfig::default()).unwrap();
//! uart.write(b"Hello, world!\n").unwrap();
//! ```

pub mod baud;
pub mod regs;

#[cfg(test)]
pub(crate) mod sim;

use crate::hal::serial::{
    LineError, NonBlockingSerial, Parity, SerialError, SerialPort, StopBits, UartConfig,
};
use baud::BaudDivisor;
use regs::*;

/// Idle characters before IDLE is raised, as CTRL.IDLECFG (2^1 = 2).
const IDLE_CHARACTERS_CFG: u32 = 0b001;

/// Frame settings read back from the hardware.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LineSettings {
    pub divisor: BaudDivisor,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub rx_rts: bool,
    pub tx_cts: bool,
}

/// LPUART driver.
pub struct Lpuart<B: RegisterBlock> {
    regs: B,
}

impl<B: RegisterBlock> Lpuart<B> {
    pub fn new(regs: B) -> Self {
        Self { regs }
    }

    /// Pulse the software reset; every register returns to its reset value.
    pub fn reset(&mut self) {
        self.regs.write(GLOBAL, Global::RST.bits());
        self.regs.write(GLOBAL, 0);
    }

    /// Mask every interrupt source, stop both directions and drop FIFO
    /// contents.
    pub fn disable(&mut self) {
        self.regs.modify(CTRL, |v| {
            v & !(Ctrl::ALL_INTERRUPTS | Ctrl::TE | Ctrl::RE).bits()
        });
        self.flush_tx_fifo();
        self.flush_rx_fifo();
        self.clear_stale_flags();
    }

    pub fn is_enabled(&self) -> bool {
        Ctrl::from_bits_retain(self.regs.read(CTRL)).intersects(Ctrl::TE | Ctrl::RE)
    }

    pub fn status(&self) -> Stat {
        Stat::from_bits_retain(self.regs.read(STAT))
    }

    /// Clear write-1-to-clear flags without disturbing the read/write
    /// configuration bits that share the register.
    pub fn clear_status(&mut self, flags: Stat) {
        let keep = self.regs.read(STAT) & !Stat::W1C.bits();
        self.regs.write(STAT, keep | (flags & Stat::W1C).bits());
    }

    /// Clear flags left over from an earlier transfer.
    pub fn clear_stale_flags(&mut self) {
        self.clear_status(Stat::W1C);
    }

    /// Enabled interrupt sources.
    pub fn interrupts(&self) -> Ctrl {
        Ctrl::from_bits_retain(self.regs.read(CTRL)) & Ctrl::ALL_INTERRUPTS
    }

    pub fn enable_interrupts(&mut self, irqs: Ctrl) {
        self.regs.modify(CTRL, |v| v | (irqs & Ctrl::ALL_INTERRUPTS).bits());
    }

    pub fn disable_interrupts(&mut self, irqs: Ctrl) {
        self.regs.modify(CTRL, |v| v & !(irqs & Ctrl::ALL_INTERRUPTS).bits());
    }

    pub fn tx_fifo_depth(&self) -> usize {
        1 << ((self.regs.read(PARAM) >> PARAM_TXFIFO_SHIFT) & PARAM_FIFO_MASK)
    }

    pub fn rx_fifo_depth(&self) -> usize {
        1 << ((self.regs.read(PARAM) >> PARAM_RXFIFO_SHIFT) & PARAM_FIFO_MASK)
    }

    pub fn tx_fifo_count(&self) -> usize {
        ((self.regs.read(WATER) >> WATER_TXCOUNT_SHIFT) & WATER_COUNT_MASK) as usize
    }

    pub fn rx_fifo_count(&self) -> usize {
        ((self.regs.read(WATER) >> WATER_RXCOUNT_SHIFT) & WATER_COUNT_MASK) as usize
    }

    pub fn flush_tx_fifo(&mut self) {
        self.regs.modify(FIFO, |v| v | Fifo::TXFLUSH.bits());
    }

    pub fn flush_rx_fifo(&mut self) {
        self.regs.modify(FIFO, |v| v | Fifo::RXFLUSH.bits());
    }

    /// Push one byte into the transmit FIFO. The caller checks for room.
    #[inline]
    pub fn write_data(&mut self, byte: u8) {
        self.regs.write(DATA, byte as u32);
    }

    /// Pop one word from the receive FIFO.
    ///
    /// Returns `None` when the FIFO is empty. A word that arrived with a
    /// framing, parity or noise error is reported as that error and its
    /// status flag is cleared.
    pub fn read_data(&mut self) -> Option<Result<u8, LineError>> {
        let word = self.regs.read(DATA);
        let flags = Data::from_bits_truncate(word);

        if flags.contains(Data::RXEMPT) {
            return None;
        }

        let fault = if flags.contains(Data::FRETSC) {
            Some((LineError::Framing, Stat::FE))
        } else if flags.contains(Data::PARITYE) {
            Some((LineError::Parity, Stat::PF))
        } else if flags.contains(Data::NOISY) {
            Some((LineError::Noise, Stat::NF))
        } else {
            None
        };

        match fault {
            Some((err, flag)) => {
                self.clear_status(flag);
                Some(Err(err))
            }
            None => Some(Ok((word & 0xFF) as u8)),
        }
    }

    /// Frame settings currently programmed.
    pub fn line_settings(&self) -> LineSettings {
        let baud = self.regs.read(BAUD);
        let ctrl = Ctrl::from_bits_retain(self.regs.read(CTRL));
        let modir = Modir::from_bits_retain(self.regs.read(MODIR));

        let parity = if !ctrl.contains(Ctrl::PE) {
            Parity::None
        } else if ctrl.contains(Ctrl::PT) {
            Parity::Odd
        } else {
            Parity::Even
        };

        let stop_bits = if baud & Baud::SBNS.bits() != 0 {
            StopBits::Two
        } else {
            StopBits::One
        };

        LineSettings {
            divisor: BaudDivisor::from_register(baud),
            parity,
            stop_bits,
            rx_rts: modir.contains(Modir::RXRTSE),
            tx_cts: modir.contains(Modir::TXCTSE),
        }
    }
}

/// Highest-priority receive error in a status snapshot.
pub fn line_error(stat: Stat) -> Option<LineError> {
    if stat.contains(Stat::OR) {
        Some(LineError::Overrun)
    } else if stat.contains(Stat::FE) {
        Some(LineError::Framing)
    } else if stat.contains(Stat::PF) {
        Some(LineError::Parity)
    } else if stat.contains(Stat::NF) {
        Some(LineError::Noise)
    } else {
        None
    }
}

// ============================================================================
// HAL Implementation
// ============================================================================

impl<B: RegisterBlock> SerialPort for Lpuart<B> {
    type Error = SerialError;

    fn configure(&mut self, config: &UartConfig) -> Result<(), SerialError> {
        let divisor = BaudDivisor::compute(config.src_clock_hz, config.baud_rate)?;

        // Frame format and FIFO enables only take effect with TE/RE clear
        self.regs.modify(CTRL, |v| v & !(Ctrl::TE | Ctrl::RE).bits());

        let mut baud = divisor.apply(self.regs.read(BAUD));
        baud &= !(Baud::M10 | Baud::SBNS | Baud::TDMAE | Baud::RDMAE | Baud::RIDMAE).bits();
        if config.stop_bits == StopBits::Two {
            baud |= Baud::SBNS.bits();
        }
        self.regs.write(BAUD, baud);

        // 8 data bits; with parity the frame grows to 9 bits
        let mut ctrl = match config.parity {
            Parity::None => Ctrl::empty(),
            Parity::Even => Ctrl::PE | Ctrl::M,
            Parity::Odd => Ctrl::PE | Ctrl::M | Ctrl::PT,
        };
        let mut idlecfg = 0;
        if config.idle_line_timeout {
            ctrl |= Ctrl::ILT;
            idlecfg = IDLE_CHARACTERS_CFG << CTRL_IDLECFG_SHIFT;
        }
        self.regs.write(CTRL, ctrl.bits() | idlecfg);

        // Watermarks at zero: TDRE on empty TX FIFO, RDRF on any RX data
        self.regs.write(WATER, 0);

        self.regs.modify(FIFO, |v| {
            v | (Fifo::TXFE | Fifo::RXFE | Fifo::TXFLUSH | Fifo::RXFLUSH).bits()
        });

        let mut modir = Modir::from_bits_retain(self.regs.read(MODIR));
        modir.remove(Modir::RXRTSE | Modir::TXCTSE | Modir::TXCTSC | Modir::TXCTSSRC);
        modir.set(Modir::RXRTSE, config.enable_rx_rts);
        modir.set(Modir::TXCTSE, config.enable_tx_cts);
        self.regs.write(MODIR, modir.bits());

        self.clear_stale_flags();

        let mut enable = Ctrl::empty();
        enable.set(Ctrl::TE, config.enable_tx);
        enable.set(Ctrl::RE, config.enable_rx);
        self.regs.modify(CTRL, |v| v | enable.bits());

        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        loop {
            match self.try_write_byte(byte) {
                Err(SerialError::WouldBlock) => core::hint::spin_loop(),
                result => return result,
            }
        }
    }

    fn read_byte(&mut self) -> Result<u8, SerialError> {
        loop {
            match self.try_read_byte() {
                Err(SerialError::WouldBlock) => core::hint::spin_loop(),
                result => return result,
            }
        }
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        while !self.status().contains(Stat::TC) {
            core::hint::spin_loop();
        }
        Ok(())
    }

    fn is_busy(&self) -> bool {
        !self.status().contains(Stat::TC)
    }
}

impl<B: RegisterBlock> NonBlockingSerial for Lpuart<B> {
    fn try_write_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        if !self.status().contains(Stat::TDRE) {
            return Err(SerialError::WouldBlock);
        }

        self.write_data(byte);
        Ok(())
    }

    fn try_read_byte(&mut self) -> Result<u8, SerialError> {
        // Words already in the FIFO predate the overrun, but a blocking
        // reader cannot tell which bytes were lost, so report it first.
        if self.status().contains(Stat::OR) {
            self.clear_status(Stat::OR);
            return Err(LineError::Overrun.into());
        }

        match self.read_data() {
            Some(Ok(byte)) => Ok(byte),
            Some(Err(err)) => Err(err.into()),
            None => Err(SerialError::WouldBlock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::sim::SimLpuart;
    use super::*;

    fn configured(config: UartConfig) -> (Lpuart<SimLpuart>, SimLpuart) {
        let sim = SimLpuart::new();
        let mut uart = Lpuart::new(sim.clone());
        uart.reset();
        uart.configure(&config).unwrap();
        (uart, sim)
    }

    #[test]
    fn configure_programs_frame_format() {
        let config = UartConfig::default()
            .with_parity(Parity::Odd)
            .with_stop_bits(StopBits::Two)
            .with_flow_control(true, true);
        let (uart, sim) = configured(config);

        let settings = uart.line_settings();
        assert_eq!(settings.divisor, BaudDivisor { osr: 26, sbr: 4 });
        assert_eq!(settings.parity, Parity::Odd);
        assert_eq!(settings.stop_bits, StopBits::Two);
        assert!(settings.rx_rts && settings.tx_cts);

        let ctrl = Ctrl::from_bits_retain(sim.reg(CTRL));
        assert!(ctrl.contains(Ctrl::TE | Ctrl::RE | Ctrl::M | Ctrl::PE | Ctrl::PT));
        assert!(uart.interrupts().is_empty());

        let fifo = Fifo::from_bits_retain(sim.reg(FIFO));
        assert!(fifo.contains(Fifo::TXFE | Fifo::RXFE));
    }

    #[test]
    fn configure_rejects_bad_baud_without_touching_hardware() {
        let sim = SimLpuart::new();
        let mut uart = Lpuart::new(sim.clone());
        let config = UartConfig::new_8n1(0, 12_000_000, 5_000_000);

        assert_eq!(
            uart.configure(&config),
            Err(SerialError::BaudrateNotSupported)
        );
        assert_eq!(sim.accesses(), 0);
    }

    #[test]
    fn configure_honours_direction_enables() {
        let (uart, sim) = configured(UartConfig::default().with_directions(true, false));

        let ctrl = Ctrl::from_bits_retain(sim.reg(CTRL));
        assert!(ctrl.contains(Ctrl::RE));
        assert!(!ctrl.contains(Ctrl::TE));
        assert!(uart.is_enabled());
    }

    #[test]
    fn blocking_bytes_reach_the_wire() {
        let (mut uart, sim) = configured(UartConfig::default());

        assert_eq!(uart.write(b"abc"), Ok(3));
        uart.flush().unwrap();

        assert_eq!(sim.wire(), b"abc");
        assert!(!uart.is_busy());
    }

    #[test]
    fn reads_decode_word_errors() {
        let (mut uart, sim) = configured(UartConfig::default());

        sim.inject(b"o");
        sim.inject_error(b'x', LineError::Parity);
        sim.inject(b"k");

        assert_eq!(uart.try_read_byte(), Ok(b'o'));
        assert_eq!(
            uart.try_read_byte(),
            Err(SerialError::Line(LineError::Parity))
        );
        assert!(!uart.status().contains(Stat::PF));
        assert_eq!(uart.try_read_byte(), Ok(b'k'));
        assert_eq!(uart.try_read_byte(), Err(SerialError::WouldBlock));
    }

    #[test]
    fn overrun_is_reported_once() {
        let (mut uart, sim) = configured(UartConfig::default());

        // FIFO holds four words; the fifth overruns
        sim.inject(b"12345");
        assert_eq!(uart.rx_fifo_count(), 4);

        assert_eq!(
            uart.try_read_byte(),
            Err(SerialError::Line(LineError::Overrun))
        );
        assert_eq!(uart.read_byte(), Ok(b'1'));
    }

    #[test]
    fn clear_status_keeps_configuration_bits() {
        let (mut uart, sim) = configured(UartConfig::default());

        sim.set_reg_bits(STAT, Stat::MSBF.bits());
        sim.inject_error(b'?', LineError::Framing);
        assert!(uart.status().contains(Stat::FE));

        uart.clear_stale_flags();

        let stat = uart.status();
        assert!(stat.contains(Stat::MSBF));
        assert!(!stat.contains(Stat::FE));
    }

    #[test]
    fn disable_stops_everything() {
        let (mut uart, sim) = configured(UartConfig::default());
        uart.enable_interrupts(Ctrl::RIE | Ctrl::TIE);
        sim.inject(b"zz");

        uart.disable();

        assert!(!uart.is_enabled());
        assert!(uart.interrupts().is_empty());
        assert_eq!(uart.rx_fifo_count(), 0);
    }

    #[test]
    fn fifo_geometry_comes_from_param() {
        let (uart, _sim) = configured(UartConfig::default());

        assert_eq!(uart.tx_fifo_depth(), 4);
        assert_eq!(uart.rx_fifo_depth(), 4);
    }
}
