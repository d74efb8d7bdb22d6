use core::{fmt, ops::Deref, slice};
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::ReadWrite;

/// Register file with a fixed 32-bit stride.
///
/// `offset` is a register index: index `n` lives at byte `n * 4` of the
/// window. Writes are fire-and-forget and may have side effects on the
/// device (the transmit holding register sends on write).
pub trait RegisterPort: Send + Sync {
    fn write(&self, offset: usize, value: u32);

    fn read(&self, offset: usize) -> u32;
}

/// A mapped MMIO window seen as an array of 32-bit registers.
///
/// The array length is fixed when the window is created, so an offset past
/// the mapped range panics instead of writing somewhere else.
pub struct MmioWindow {
    regs: &'static [ReadWrite<u32>],
}

// SAFETY: every access is a single volatile 32-bit load or store, which the
// device serializes on its own.
unsafe impl Send for MmioWindow {}
unsafe impl Sync for MmioWindow {}

impl MmioWindow {
    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - `start_addr..start_addr + len` must be mapped device memory (or RAM)
    ///   that stays valid and unaliased for as long as the window lives.
    /// - `start_addr` must be 4-byte aligned.
    pub unsafe fn new(start_addr: usize, len: usize) -> Self {
        Self {
            regs: slice::from_raw_parts(start_addr as *const ReadWrite<u32>, len / 4),
        }
    }

    /// Number of registers reachable through this window.
    #[inline]
    pub fn len(&self) -> usize {
        self.regs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }
}

impl Deref for MmioWindow {
    type Target = [ReadWrite<u32>];

    fn deref(&self) -> &Self::Target {
        self.regs
    }
}

impl RegisterPort for MmioWindow {
    #[inline]
    fn write(&self, offset: usize, value: u32) {
        self.regs[offset].set(value);
    }

    #[inline]
    fn read(&self, offset: usize) -> u32 {
        self.regs[offset].get()
    }
}

impl fmt::Debug for MmioWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmioWindow")
            .field("base", &self.regs.as_ptr())
            .field("len", &self.regs.len())
            .finish()
    }
}
