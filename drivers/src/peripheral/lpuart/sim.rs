//! Simulated LPUART for host tests.
//!
//! Time only moves on `STAT` reads: each one shifts one character from the
//! transmit FIFO onto the wire, unless CTS holds the transmitter. With
//! loopback on, wire bytes land in the receive FIFO.

use super::regs::*;
use crate::hal::serial::LineError;
use crate::platform::{ClaimError, Peripherals};
use spin::Mutex;
use std::{collections::VecDeque, sync::Arc};

const FIFO_DEPTH: usize = 4;

/// log2(4) for both FIFOs.
const PARAM_RESET: u32 = 0x0202;
const VERID_RESET: u32 = 0x0400_0003;

/// STAT bits that software can write and read back.
const STAT_CONFIG: u32 = Stat::MSBF.bits()
    | Stat::RXINV.bits()
    | Stat::RWUID.bits()
    | Stat::BRK13.bits()
    | Stat::LBKDE.bits();

const WATER_FIELDS: u32 =
    (WATER_WATER_MASK << WATER_TXWATER_SHIFT) | (WATER_WATER_MASK << WATER_RXWATER_SHIFT);

#[derive(Default)]
struct State {
    global: u32,
    pincfg: u32,
    baud: u32,
    stat: u32,
    ctrl: u32,
    match_reg: u32,
    modir: u32,
    fifo: u32,
    water: u32,
    tx_fifo: VecDeque<u8>,
    rx_fifo: VecDeque<u32>,
    wire: Vec<u8>,
    loopback: bool,
    cts_hold: bool,
    accesses: usize,
}

impl State {
    fn ctrl(&self) -> Ctrl {
        Ctrl::from_bits_retain(self.ctrl)
    }

    fn tx_water(&self) -> usize {
        ((self.water >> WATER_TXWATER_SHIFT) & WATER_WATER_MASK) as usize
    }

    fn rx_water(&self) -> usize {
        ((self.water >> WATER_RXWATER_SHIFT) & WATER_WATER_MASK) as usize
    }

    fn reset(&mut self) {
        let wire = core::mem::take(&mut self.wire);
        let (loopback, cts_hold, accesses) = (self.loopback, self.cts_hold, self.accesses);
        *self = State {
            baud: 0x0F00_0004,
            wire,
            loopback,
            cts_hold,
            accesses,
            ..State::default()
        };
    }

    fn shift_out(&mut self) {
        if self.cts_hold || !self.ctrl().contains(Ctrl::TE) {
            return;
        }
        if let Some(byte) = self.tx_fifo.pop_front() {
            self.wire.push(byte);
            if self.loopback {
                self.receive(byte as u32);
            }
        }
    }

    fn receive(&mut self, word: u32) {
        if !self.ctrl().contains(Ctrl::RE) {
            return;
        }
        if self.rx_fifo.len() >= FIFO_DEPTH {
            self.stat |= Stat::OR.bits();
            return;
        }
        self.rx_fifo.push_back(word);
    }

    fn read(&mut self, offset: usize) -> u32 {
        self.accesses += 1;
        match offset {
            VERID => VERID_RESET,
            PARAM => PARAM_RESET,
            GLOBAL => self.global,
            PINCFG => self.pincfg,
            BAUD => self.baud,
            STAT => {
                self.shift_out();
                let mut stat = Stat::from_bits_retain(self.stat);
                stat.set(Stat::TDRE, self.tx_fifo.len() <= self.tx_water());
                stat.set(Stat::TC, self.tx_fifo.is_empty());
                stat.set(Stat::RDRF, self.rx_fifo.len() > self.rx_water());
                stat.bits()
            }
            CTRL => self.ctrl,
            DATA => self.rx_fifo.pop_front().unwrap_or(Data::RXEMPT.bits()),
            MATCH => self.match_reg,
            MODIR => self.modir,
            FIFO => {
                let mut fifo = Fifo::from_bits_retain(self.fifo);
                fifo.set(Fifo::TXEMPT, self.tx_fifo.is_empty());
                fifo.set(Fifo::RXEMPT, self.rx_fifo.is_empty());
                fifo.bits()
            }
            WATER => {
                self.water
                    | ((self.rx_fifo.len() as u32) << WATER_RXCOUNT_SHIFT)
                    | ((self.tx_fifo.len() as u32) << WATER_TXCOUNT_SHIFT)
            }
            _ => panic!("read from unmapped LPUART offset {offset:#x}"),
        }
    }

    fn write(&mut self, offset: usize, value: u32) {
        self.accesses += 1;
        match offset {
            GLOBAL => {
                if value & Global::RST.bits() != 0 {
                    self.reset();
                }
                self.global = value;
            }
            PINCFG => self.pincfg = value,
            BAUD => self.baud = value,
            STAT => {
                let cleared = value & Stat::W1C.bits();
                self.stat = (self.stat & !cleared & !STAT_CONFIG) | (value & STAT_CONFIG);
            }
            CTRL => self.ctrl = value,
            DATA => {
                if self.ctrl().contains(Ctrl::TE) && self.tx_fifo.len() < FIFO_DEPTH {
                    self.tx_fifo.push_back(value as u8);
                }
            }
            MATCH => self.match_reg = value,
            MODIR => self.modir = value,
            FIFO => {
                let fifo = Fifo::from_bits_retain(value);
                if fifo.contains(Fifo::TXFLUSH) {
                    self.tx_fifo.clear();
                }
                if fifo.contains(Fifo::RXFLUSH) {
                    self.rx_fifo.clear();
                }
                let status = Fifo::TXFLUSH | Fifo::RXFLUSH | Fifo::TXEMPT | Fifo::RXEMPT;
                self.fifo = value & !status.bits();
            }
            WATER => self.water = value & WATER_FIELDS,
            _ => panic!("write to unmapped LPUART offset {offset:#x}"),
        }
    }
}

/// Shared handle to one simulated LPUART. Clones see the same hardware.
#[derive(Clone)]
pub struct SimLpuart(Arc<Mutex<State>>);

impl SimLpuart {
    pub fn new() -> Self {
        let mut state = State::default();
        state.reset();
        Self(Arc::new(Mutex::new(state)))
    }

    /// Raw register contents, without side effects or access counting.
    pub fn reg(&self, offset: usize) -> u32 {
        let mut state = self.0.lock();
        let accesses = state.accesses;
        let value = match offset {
            STAT => state.stat,
            _ => state.read(offset),
        };
        state.accesses = accesses;
        value
    }

    pub fn set_reg_bits(&self, offset: usize, bits: u32) {
        let mut state = self.0.lock();
        match offset {
            STAT => state.stat |= bits,
            CTRL => state.ctrl |= bits,
            _ => panic!("unsupported offset {offset:#x}"),
        }
    }

    pub fn accesses(&self) -> usize {
        self.0.lock().accesses
    }

    /// Bytes that have left the transmitter.
    pub fn wire(&self) -> Vec<u8> {
        self.0.lock().wire.clone()
    }

    pub fn set_loopback(&self, enabled: bool) {
        self.0.lock().loopback = enabled;
    }

    /// Deassert CTS: the transmitter stops shifting.
    pub fn hold_cts(&self, hold: bool) {
        self.0.lock().cts_hold = hold;
    }

    /// Bytes arriving on the receive line.
    pub fn inject(&self, bytes: &[u8]) {
        let mut state = self.0.lock();
        for &byte in bytes {
            state.receive(byte as u32);
        }
    }

    /// A character that arrives with `err` set in its status bits.
    pub fn inject_error(&self, byte: u8, err: LineError) {
        let mut state = self.0.lock();
        let (word_flag, stat_flag) = match err {
            LineError::Framing => (Data::FRETSC, Stat::FE),
            LineError::Parity => (Data::PARITYE, Stat::PF),
            LineError::Noise => (Data::NOISY, Stat::NF),
            LineError::Overrun => {
                state.stat |= Stat::OR.bits();
                return;
            }
        };
        state.receive(byte as u32 | word_flag.bits());
        state.stat |= stat_flag.bits();
    }

    /// The receive line has gone idle.
    pub fn signal_idle(&self) {
        self.0.lock().stat |= Stat::IDLE.bits();
    }
}

impl RegisterBlock for SimLpuart {
    fn read(&self, offset: usize) -> u32 {
        self.0.lock().read(offset)
    }

    fn write(&mut self, offset: usize, value: u32) {
        self.0.lock().write(offset, value);
    }
}

/// Simulated part with a fixed number of LPUART instances.
pub struct SimPlatform {
    ports: Vec<SimLpuart>,
    claimed: Arc<Mutex<Vec<bool>>>,
}

impl SimPlatform {
    pub fn new(instances: usize) -> Self {
        Self {
            ports: (0..instances).map(|_| SimLpuart::new()).collect(),
            claimed: Arc::new(Mutex::new(vec![false; instances])),
        }
    }

    pub fn port(&self, instance: u8) -> SimLpuart {
        self.ports[instance as usize].clone()
    }
}

/// A claimed simulated register block; releases the instance on drop.
pub struct SimBlock {
    port: SimLpuart,
    instance: u8,
    claimed: Arc<Mutex<Vec<bool>>>,
}

impl RegisterBlock for SimBlock {
    fn read(&self, offset: usize) -> u32 {
        self.port.read(offset)
    }

    fn write(&mut self, offset: usize, value: u32) {
        self.port.write(offset, value);
    }
}

impl Drop for SimBlock {
    fn drop(&mut self) {
        self.claimed.lock()[self.instance as usize] = false;
    }
}

impl Peripherals for SimPlatform {
    type Lpuart = SimBlock;

    fn lpuart_count(&self) -> usize {
        self.ports.len()
    }

    fn claim_lpuart(&self, instance: u8) -> Result<SimBlock, ClaimError> {
        let mut claimed = self.claimed.lock();
        let slot = claimed
            .get_mut(instance as usize)
            .ok_or(ClaimError::NoSuchInstance)?;
        if *slot {
            return Err(ClaimError::InUse);
        }
        *slot = true;

        Ok(SimBlock {
            port: self.ports[instance as usize].clone(),
            instance,
            claimed: self.claimed.clone(),
        })
    }
}
