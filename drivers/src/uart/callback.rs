//! Completion notification.

use super::Status;

/// Receiver of transfer completion events.
///
/// Called from the interrupt handler after the driver lock is released,
/// so an implementation may start the next transfer on the same handle.
pub trait CompletionSink: Sync {
    fn notify(&self, status: Status);
}

/// Plain function plus a context value.
pub struct FnSink<C> {
    callback: fn(Status, &C),
    context: C,
}

impl<C> FnSink<C> {
    pub const fn new(callback: fn(Status, &C), context: C) -> Self {
        Self { callback, context }
    }

    pub fn context(&self) -> &C {
        &self.context
    }
}

impl<C: Sync> CompletionSink for FnSink<C> {
    fn notify(&self, status: Status) {
        (self.callback)(status, &self.context);
    }
}
