//! Low-level primitives shared by the driver crates.
//!
//! - [`sync`]: locks that are safe to share between thread and interrupt context
//! - [`arch`]: per-architecture interrupt masking

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod sync;
