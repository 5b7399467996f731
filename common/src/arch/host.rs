use crate::sync::irq::IrqControl;

/// Interrupt control for hosted builds.
///
/// There is no interrupt context off-target; "interrupts" are plain calls
/// made by the test harness, so masking is a no-op.
pub struct HostIrq;

impl IrqControl for HostIrq {
    type State = ();

    #[inline(always)]
    fn disable() {}

    #[inline(always)]
    fn restore(_state: ()) {}
}
