//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! This module defines generic traits for interacting with hardware
//! peripherals. They are implemented by the peripheral drivers, so the
//! transfer logic above them can be written without platform knowledge.
//!
//! # Available Interfaces
//!
//! - [`serial`]: Serial port (UART) configuration and byte I/O

pub mod serial;
