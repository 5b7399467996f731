use core::sync::atomic::{Ordering, compiler_fence};

use crate::sync::irq::IrqControl;

const PRIMASK_PM: u32 = 1 << 0;

/// Interrupt masking for ARMv6-M/ARMv7-M/ARMv8-M cores.
///
/// Uses PRIMASK, which masks every exception with configurable priority.
///
/// # State Management
/// The `State` type is `bool`: `true` if interrupts were enabled before
/// `disable()` was called.
///
/// # Assembly Details
///
/// - `mrs {0}, PRIMASK`: Read the current mask
/// - `cpsid i`: Set PRIMASK (mask interrupts)
/// - `cpsie i`: Clear PRIMASK (unmask interrupts)
///
/// The compiler fences keep memory accesses from moving across the
/// critical section boundary.
pub struct CortexMIrq;

impl IrqControl for CortexMIrq {
    type State = bool;

    #[inline(always)]
    fn disable() -> bool {
        let primask: u32;
        unsafe {
            core::arch::asm!(
                "mrs {0}, PRIMASK",
                "cpsid i",
                out(reg) primask,
                options(nomem, nostack, preserves_flags)
            );
        }
        compiler_fence(Ordering::SeqCst);
        primask & PRIMASK_PM == 0
    }

    #[inline(always)]
    fn restore(prev_enabled: bool) {
        compiler_fence(Ordering::SeqCst);
        if prev_enabled {
            unsafe {
                core::arch::asm!("cpsie i", options(nomem, nostack, preserves_flags));
            }
        }
    }
}
