//! Receive queue over caller-provided storage.

/// Fixed-capacity FIFO of received bytes.
pub struct RingBuffer<'a> {
    storage: &'a mut [u8],
    head: usize,
    len: usize,
}

impl<'a> RingBuffer<'a> {
    pub fn new(storage: &'a mut [u8]) -> Self {
        Self {
            storage,
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Queue a byte. A full queue keeps its contents and drops `byte`.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }

        let tail = (self.head + self.len) % self.capacity();
        self.storage[tail] = byte;
        self.len += 1;
        true
    }

    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }

        let byte = self.storage[self.head];
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        Some(byte)
    }
}
