//! Baud generator divisor search.
//!
//! baud = src_clock / (OSR * SBR), with OSR in 4..=32 and SBR in 1..=0x1FFF.

use super::regs::{BAUD_OSR_MASK, BAUD_OSR_SHIFT, BAUD_SBR_MASK, Baud};
use crate::hal::serial::SerialError;

const OSR_MIN: u32 = 4;
const OSR_MAX: u32 = 32;

/// Oversampling ratios below this need both-edge sampling.
const OSR_BOTHEDGE_LIMIT: u32 = 8;

/// Largest accepted deviation from the requested rate, in percent.
const MAX_ERROR_PERCENT: u32 = 3;

/// Oversampling ratio and modulo divisor for one baud rate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BaudDivisor {
    pub osr: u32,
    pub sbr: u32,
}

impl BaudDivisor {
    /// Find the divisor pair closest to `baud_rate`.
    ///
    /// Ties go to the larger oversampling ratio, which samples each bit
    /// more often.
    pub fn compute(src_clock_hz: u32, baud_rate: u32) -> Result<Self, SerialError> {
        if src_clock_hz == 0 || baud_rate == 0 {
            return Err(SerialError::BaudrateNotSupported);
        }

        let src = src_clock_hz as u64;
        let baud = baud_rate as u64;

        let mut best: Option<BaudDivisor> = None;
        let mut best_diff = baud;

        for osr in OSR_MIN..=OSR_MAX {
            // Round to nearest in tenths
            let sbr = ((src * 10 / (baud * osr as u64) + 5) / 10).clamp(1, BAUD_SBR_MASK as u64);
            let actual = src / (osr as u64 * sbr);
            let diff = actual.abs_diff(baud);

            if diff <= best_diff {
                best_diff = diff;
                best = Some(BaudDivisor {
                    osr,
                    sbr: sbr as u32,
                });
            }
        }

        match best {
            Some(divisor) if best_diff <= (baud / 100) * MAX_ERROR_PERCENT as u64 => Ok(divisor),
            _ => Err(SerialError::BaudrateNotSupported),
        }
    }

    /// Baud rate actually produced from `src_clock_hz`.
    pub fn actual_baud(&self, src_clock_hz: u32) -> u32 {
        src_clock_hz / (self.osr * self.sbr)
    }

    pub fn needs_both_edge(&self) -> bool {
        self.osr < OSR_BOTHEDGE_LIMIT
    }

    /// Merge OSR, SBR and BOTHEDGE into a BAUD register value.
    pub fn apply(&self, baud_reg: u32) -> u32 {
        let mut value = baud_reg & !(BAUD_OSR_MASK | BAUD_SBR_MASK | Baud::BOTHEDGE.bits());
        value |= ((self.osr - 1) << BAUD_OSR_SHIFT) & BAUD_OSR_MASK;
        value |= self.sbr & BAUD_SBR_MASK;
        if self.needs_both_edge() {
            value |= Baud::BOTHEDGE.bits();
        }
        value
    }

    /// Decode the divisor programmed in a BAUD register value.
    pub fn from_register(baud_reg: u32) -> Self {
        Self {
            osr: ((baud_reg & BAUD_OSR_MASK) >> BAUD_OSR_SHIFT) + 1,
            sbr: baud_reg & BAUD_SBR_MASK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRO_12M: u32 = 12_000_000;

    #[test]
    fn picks_closest_divisor_for_common_rates() {
        let divisor = BaudDivisor::compute(FRO_12M, 115_200).unwrap();
        assert_eq!(divisor, BaudDivisor { osr: 26, sbr: 4 });
        assert_eq!(divisor.actual_baud(FRO_12M), 115_384);

        let divisor = BaudDivisor::compute(FRO_12M, 57_600).unwrap();
        assert_eq!(divisor, BaudDivisor { osr: 26, sbr: 8 });
    }

    #[test]
    fn exact_rates_prefer_highest_oversampling() {
        // 1250 = 5 * 250 = 10 * 125 = 25 * 50
        let divisor = BaudDivisor::compute(FRO_12M, 9_600).unwrap();
        assert_eq!(divisor, BaudDivisor { osr: 25, sbr: 50 });
        assert_eq!(divisor.actual_baud(FRO_12M), 9_600);
        assert!(!divisor.needs_both_edge());
    }

    #[test]
    fn fast_rates_use_both_edge_sampling() {
        let divisor = BaudDivisor::compute(FRO_12M, 3_000_000).unwrap();
        assert_eq!(divisor, BaudDivisor { osr: 4, sbr: 1 });
        assert!(divisor.needs_both_edge());

        let reg = divisor.apply(0);
        assert_ne!(reg & Baud::BOTHEDGE.bits(), 0);
        assert_eq!(BaudDivisor::from_register(reg), divisor);
    }

    #[test]
    fn apply_preserves_unrelated_bits() {
        let divisor = BaudDivisor::compute(FRO_12M, 115_200).unwrap();
        let reg = divisor.apply(Baud::SBNS.bits() | BAUD_SBR_MASK | Baud::BOTHEDGE.bits());

        assert_ne!(reg & Baud::SBNS.bits(), 0);
        assert_eq!(reg & Baud::BOTHEDGE.bits(), 0);
        assert_eq!(BaudDivisor::from_register(reg), divisor);
    }

    #[test]
    fn rejects_unreachable_rates() {
        // Above src / 4
        assert_eq!(
            BaudDivisor::compute(FRO_12M, 5_000_000),
            Err(SerialError::BaudrateNotSupported)
        );
        // SBR saturates at 0x1FFF
        assert_eq!(
            BaudDivisor::compute(FRO_12M, 10),
            Err(SerialError::BaudrateNotSupported)
        );
        assert_eq!(
            BaudDivisor::compute(FRO_12M, 0),
            Err(SerialError::BaudrateNotSupported)
        );
        assert_eq!(
            BaudDivisor::compute(0, 115_200),
            Err(SerialError::BaudrateNotSupported)
        );
    }
}
