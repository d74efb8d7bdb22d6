use core::sync::atomic::{AtomicUsize, Ordering};

/// Bytes pushed into the transmit holding register since the last reset.
///
/// Shared by every writer of the device and by the control channel, so all
/// updates are single atomic operations on one word.
#[derive(Debug, Default)]
pub struct TransferCounter(AtomicUsize);

impl TransferCounter {
    pub const fn new() -> Self {
        TransferCounter(AtomicUsize::new(0))
    }

    #[inline]
    pub fn increment(&self) {
        self.add(1);
    }

    #[inline]
    pub fn add(&self, count: usize) {
        self.0.fetch_add(count, Ordering::AcqRel);
    }

    #[inline]
    pub fn reset(&self) {
        self.0.store(0, Ordering::Release);
    }

    #[inline]
    pub fn read(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}
