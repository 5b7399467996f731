//! Platform Abstraction Layer
//!
//! Each supported part describes its peripheral instances through the
//! [`Peripherals`] trait. Drivers claim a register block by instance
//! index; the claim is held for as long as the returned block lives, so
//! two handles can never drive the same hardware.
//!
//! # Usage
//!
//! ```no_run
//! use drivers::platform::{CurrentPlatform, Peripherals};
//!
//! let lpuart0 = CurrentPlatform.claim_lpuart(0).unwrap();
//! ```

use crate::peripheral::lpuart::regs::RegisterBlock;
use core::fmt;

/// Reasons an instance cannot be claimed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClaimError {
    /// The part has no instance with that index.
    NoSuchInstance,
    /// Another handle owns the instance.
    InUse,
}

impl fmt::Display for ClaimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimError::NoSuchInstance => f.write_str("no such instance"),
            ClaimError::InUse => f.write_str("instance already claimed"),
        }
    }
}

/// Peripheral instance table - implemented by each supported platform
pub trait Peripherals {
    /// Register block of one LPUART; releases its claim on drop.
    type Lpuart: RegisterBlock;

    /// Platform name for debugging
    fn name(&self) -> &'static str {
        "unknown"
    }

    /// Number of LPUART instances on the part.
    fn lpuart_count(&self) -> usize;

    /// Take exclusive ownership of LPUART `instance`.
    fn claim_lpuart(&self, instance: u8) -> Result<Self::Lpuart, ClaimError>;
}

// Platform selection based on Cargo features
cfg_if::cfg_if! {
    if #[cfg(feature = "mcxa153")] {
        pub mod mcxa153;
        pub use mcxa153::Mcxa153 as CurrentPlatform;
    } else if #[cfg(not(test))] {
        compile_error!(
            "No platform selected!\n\
            Use: cargo build --features mcxa153"
        );
    }
}
