//! NXP MCX A153
//!
//! Three LPUART instances on the AIPS peripheral bus, all clocked from
//! FRO_12M after reset.

use super::{ClaimError, Peripherals};
use crate::peripheral::lpuart::regs::{Mmio, RegisterBlock};
use common::sync::SpinLock;

/// LPUART0..=2 base addresses.
pub const LPUART_BASES: [usize; 3] = [0x4009_F000, 0x400A_0000, 0x400A_1000];

/// Claimed instances (private)
static CLAIMED: SpinLock<[bool; LPUART_BASES.len()]> = SpinLock::new([false; LPUART_BASES.len()]);

pub struct Mcxa153;

/// LPUART register block owned by one driver handle.
pub struct Mcxa153Lpuart {
    regs: Mmio,
    instance: u8,
}

impl Mcxa153Lpuart {
    pub fn instance(&self) -> u8 {
        self.instance
    }
}

impl RegisterBlock for Mcxa153Lpuart {
    #[inline]
    fn read(&self, offset: usize) -> u32 {
        self.regs.read(offset)
    }

    #[inline]
    fn write(&mut self, offset: usize, value: u32) {
        self.regs.write(offset, value);
    }
}

impl Drop for Mcxa153Lpuart {
    fn drop(&mut self) {
        CLAIMED.lock()[self.instance as usize] = false;
    }
}

impl Peripherals for Mcxa153 {
    type Lpuart = Mcxa153Lpuart;

    fn name(&self) -> &'static str {
        "NXP MCX A153"
    }

    fn lpuart_count(&self) -> usize {
        LPUART_BASES.len()
    }

    fn claim_lpuart(&self, instance: u8) -> Result<Mcxa153Lpuart, ClaimError> {
        let base = *LPUART_BASES
            .get(instance as usize)
            .ok_or(ClaimError::NoSuchInstance)?;

        let mut claimed = CLAIMED.lock();
        if claimed[instance as usize] {
            return Err(ClaimError::InUse);
        }
        claimed[instance as usize] = true;

        Ok(Mcxa153Lpuart {
            // SAFETY: `base` is an LPUART block on this part and the claim
            // table guarantees a single owner
            regs: unsafe { Mmio::new(base) },
            instance,
        })
    }
}
