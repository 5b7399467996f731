//! LPUART register map.
//!
//! Offsets, bit definitions and the [`RegisterBlock`] access seam.

use bitflags::bitflags;
use core::ptr::{read_volatile, write_volatile};

// Register offsets
pub const VERID: usize = 0x00;
pub const PARAM: usize = 0x04;
pub const GLOBAL: usize = 0x08;
pub const PINCFG: usize = 0x0C;
pub const BAUD: usize = 0x10;
pub const STAT: usize = 0x14;
pub const CTRL: usize = 0x18;
pub const DATA: usize = 0x1C;
pub const MATCH: usize = 0x20;
pub const MODIR: usize = 0x24;
pub const FIFO: usize = 0x28;
pub const WATER: usize = 0x2C;

// BAUD fields
pub const BAUD_OSR_SHIFT: u32 = 24;
pub const BAUD_OSR_MASK: u32 = 0x1F << BAUD_OSR_SHIFT;
pub const BAUD_SBR_MASK: u32 = 0x1FFF;

// CTRL.IDLECFG: idle characters before IDLE is flagged (2^n)
pub const CTRL_IDLECFG_SHIFT: u32 = 8;

// WATER fields
pub const WATER_RXCOUNT_SHIFT: u32 = 24;
pub const WATER_RXWATER_SHIFT: u32 = 16;
pub const WATER_TXCOUNT_SHIFT: u32 = 8;
pub const WATER_TXWATER_SHIFT: u32 = 0;
pub const WATER_COUNT_MASK: u32 = 0x7;
pub const WATER_WATER_MASK: u32 = 0x3;

// PARAM fields (log2 of FIFO depth)
pub const PARAM_RXFIFO_SHIFT: u32 = 8;
pub const PARAM_TXFIFO_SHIFT: u32 = 0;
pub const PARAM_FIFO_MASK: u32 = 0xFF;

bitflags! {
    /// Global Register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Global: u32 {
        /// Software reset
        const RST = 1 << 1;
    }
}

bitflags! {
    /// Baud Rate Register (flag bits only; see `BAUD_*` for fields).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Baud: u32 {
        const M10 = 1 << 29;
        const TDMAE = 1 << 23;
        const RDMAE = 1 << 21;
        const RIDMAE = 1 << 20;
        const BOTHEDGE = 1 << 17;
        const RESYNCDIS = 1 << 16;
        const LBKDIE = 1 << 15;
        const RXEDGIE = 1 << 14;
        /// Two stop bits
        const SBNS = 1 << 13;
    }
}

bitflags! {
    /// Status Register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Stat: u32 {
        const LBKDIF = 1 << 31;
        const RXEDGIF = 1 << 30;
        const MSBF = 1 << 29;
        const RXINV = 1 << 28;
        const RWUID = 1 << 27;
        const BRK13 = 1 << 26;
        const LBKDE = 1 << 25;
        const RAF = 1 << 24;
        /// Transmit data register empty (TX count <= TXWATER)
        const TDRE = 1 << 23;
        /// Transmission complete
        const TC = 1 << 22;
        /// Receive data register full (RX count > RXWATER)
        const RDRF = 1 << 21;
        const IDLE = 1 << 20;
        const OR = 1 << 19;
        const NF = 1 << 18;
        const FE = 1 << 17;
        const PF = 1 << 16;
        const MA1F = 1 << 15;
        const MA2F = 1 << 14;
    }
}

impl Stat {
    /// Write-1-to-clear flags.
    pub const W1C: Stat = Stat::LBKDIF
        .union(Stat::RXEDGIF)
        .union(Stat::IDLE)
        .union(Stat::OR)
        .union(Stat::NF)
        .union(Stat::FE)
        .union(Stat::PF)
        .union(Stat::MA1F)
        .union(Stat::MA2F);

    /// Receive line error flags.
    pub const LINE_ERRORS: Stat = Stat::OR.union(Stat::NF).union(Stat::FE).union(Stat::PF);
}

bitflags! {
    /// Control Register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ctrl: u32 {
        const ORIE = 1 << 27;
        const NEIE = 1 << 26;
        const FEIE = 1 << 25;
        const PEIE = 1 << 24;
        const TIE = 1 << 23;
        const TCIE = 1 << 22;
        const RIE = 1 << 21;
        const ILIE = 1 << 20;
        const TE = 1 << 19;
        const RE = 1 << 18;
        const LOOPS = 1 << 7;
        const DOZEEN = 1 << 6;
        const RSRC = 1 << 5;
        /// 9-bit frame (8 data bits + parity)
        const M = 1 << 4;
        /// Idle count starts after the stop bit
        const ILT = 1 << 2;
        const PE = 1 << 1;
        /// Odd parity
        const PT = 1 << 0;
    }
}

impl Ctrl {
    /// Interrupt sources owned by the transmit path.
    pub const TX_INTERRUPTS: Ctrl = Ctrl::TIE.union(Ctrl::TCIE);

    /// Interrupt sources owned by the receive path (idle line excluded).
    pub const RX_INTERRUPTS: Ctrl = Ctrl::RIE
        .union(Ctrl::ORIE)
        .union(Ctrl::NEIE)
        .union(Ctrl::FEIE)
        .union(Ctrl::PEIE);

    pub const ALL_INTERRUPTS: Ctrl = Ctrl::TX_INTERRUPTS
        .union(Ctrl::RX_INTERRUPTS)
        .union(Ctrl::ILIE);
}

bitflags! {
    /// Data Register (receive word status bits).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Data: u32 {
        const NOISY = 1 << 15;
        const PARITYE = 1 << 14;
        const FRETSC = 1 << 13;
        const RXEMPT = 1 << 12;
        const IDLINE = 1 << 11;
    }
}

bitflags! {
    /// Modem IrDA Register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modir: u32 {
        const TXCTSSRC = 1 << 5;
        const TXCTSC = 1 << 4;
        const RXRTSE = 1 << 3;
        const TXRTSPOL = 1 << 2;
        const TXRTSE = 1 << 1;
        const TXCTSE = 1 << 0;
    }
}

bitflags! {
    /// FIFO Register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fifo: u32 {
        const TXEMPT = 1 << 23;
        const RXEMPT = 1 << 22;
        const TXOF = 1 << 17;
        const RXUF = 1 << 16;
        /// Write-only: flush transmit FIFO
        const TXFLUSH = 1 << 15;
        /// Write-only: flush receive FIFO
        const RXFLUSH = 1 << 14;
        const TXOFE = 1 << 9;
        const RXUFE = 1 << 8;
        const TXFE = 1 << 7;
        const RXFE = 1 << 3;
    }
}

/// Word-level access to one LPUART register block.
///
/// `offset` is one of the register offsets in this module.
pub trait RegisterBlock: Send {
    fn read(&self, offset: usize) -> u32;

    fn write(&mut self, offset: usize, value: u32);

    /// Read-modify-write. Not for `STAT`, whose flags are write-1-to-clear.
    fn modify(&mut self, offset: usize, f: impl FnOnce(u32) -> u32) {
        let value = self.read(offset);
        self.write(offset, f(value));
    }
}

/// Memory-mapped register block.
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// # Safety
    ///
    /// - `base` must point to a valid LPUART register block
    /// - Only one `Mmio` should exist per LPUART instance
    /// - Memory must be mapped as device memory
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }
}

impl RegisterBlock for Mmio {
    #[inline]
    fn read(&self, offset: usize) -> u32 {
        unsafe { read_volatile((self.base + offset) as *const u32) }
    }

    #[inline]
    fn write(&mut self, offset: usize, value: u32) {
        unsafe { write_volatile((self.base + offset) as *mut u32, value) }
    }
}
