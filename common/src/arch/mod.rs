//! Architecture support.
//!
//! Exposes [`DefaultIrq`], the [`IrqControl`](crate::sync::irq::IrqControl)
//! implementation for the build target.

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "arm", target_os = "none"))] {
        pub mod arm;
        pub use arm::irq::CortexMIrq as DefaultIrq;
    } else {
        pub mod host;
        pub use host::HostIrq as DefaultIrq;
    }
}
