//! Per-direction transfer state.

/// Coarse view of a [`Transfer`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    Busy,
}

/// One direction's transfer.
///
/// `Finished` still reads as idle, but keeps the buffer and the number of
/// bytes moved until the caller takes it back or starts a new transfer.
#[derive(Debug)]
pub enum Transfer<Buf> {
    Idle,
    Busy { buf: Buf, count: usize },
    Finished { buf: Buf, count: usize },
}

impl<Buf> Transfer<Buf> {
    pub const fn new() -> Self {
        Transfer::Idle
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Transfer::Busy { .. })
    }

    pub fn state(&self) -> TransferState {
        if self.is_busy() {
            TransferState::Busy
        } else {
            TransferState::Idle
        }
    }

    /// Bytes moved by the current or last transfer.
    pub fn count(&self) -> Option<usize> {
        match self {
            Transfer::Idle => None,
            Transfer::Busy { count, .. } | Transfer::Finished { count, .. } => Some(*count),
        }
    }

    /// Arm a new transfer. A busy transfer is left alone and `buf` is
    /// handed back.
    pub fn start(&mut self, buf: Buf) -> Result<(), Buf> {
        if self.is_busy() {
            return Err(buf);
        }

        *self = Transfer::Busy { buf, count: 0 };
        Ok(())
    }

    /// Buffer and progress of a busy transfer.
    pub fn busy_mut(&mut self) -> Option<(&mut Buf, &mut usize)> {
        match self {
            Transfer::Busy { buf, count } => Some((buf, count)),
            _ => None,
        }
    }

    /// Busy -> Finished. Returns whether a transfer was in flight.
    pub fn finish(&mut self) -> bool {
        match core::mem::replace(self, Transfer::Idle) {
            Transfer::Busy { buf, count } => {
                *self = Transfer::Finished { buf, count };
                true
            }
            other => {
                *self = other;
                false
            }
        }
    }

    /// Reclaim the buffer of a finished transfer.
    pub fn take(&mut self) -> Option<Buf> {
        match core::mem::replace(self, Transfer::Idle) {
            Transfer::Finished { buf, .. } => Some(buf),
            other => {
                *self = other;
                None
            }
        }
    }
}
