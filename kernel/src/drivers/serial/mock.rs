//! Test doubles for the register file and the user address space.
use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use spin::Mutex;

use super::omap_uart::regs;
use crate::{
    drivers::{DriverError, MmioMapper, RegisterPort, Resource, Result},
    memory::{UserPtr, UserSpace, VmError, VmResult},
};

/// Start of the fake user mapping.
pub const USER_BASE: usize = 0x1000_0000;

#[derive(Default)]
struct PortState {
    writes: Mutex<Vec<(usize, u32)>>,
    busy_reads: AtomicUsize,
    lsr_reads: AtomicUsize,
    stall_after: Mutex<Option<usize>>,
    thr_writes: AtomicUsize,
}

/// Records every register write. LSR reads report the transmitter idle
/// unless told otherwise.
#[derive(Clone, Default)]
pub struct RecordingPort(Arc<PortState>);

impl RecordingPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.0.writes.lock().clone()
    }

    /// Bytes that went into THR outside of line configuration.
    pub fn transmitted(&self) -> Vec<u8> {
        let writes = self.0.writes.lock();
        let skip = writes
            .iter()
            .rposition(|&(offset, _)| offset == regs::MDR1)
            .map_or(0, |last| last + 1);
        writes[skip..]
            .iter()
            .filter(|&&(offset, _)| offset == regs::THR)
            .map(|&(_, value)| value as u8)
            .collect()
    }

    /// Report THR busy for the next `count` LSR reads.
    pub fn set_busy_reads(&self, count: usize) {
        self.0.busy_reads.store(count, Ordering::SeqCst);
    }

    /// Report THR busy forever once `count` bytes have been written to it.
    pub fn stall_after(&self, count: usize) {
        *self.0.stall_after.lock() = Some(count);
    }

    pub fn lsr_reads(&self) -> usize {
        self.0.lsr_reads.load(Ordering::SeqCst)
    }
}

impl RegisterPort for RecordingPort {
    fn write(&self, offset: usize, value: u32) {
        if offset == regs::THR {
            self.0.thr_writes.fetch_add(1, Ordering::SeqCst);
        }
        self.0.writes.lock().push((offset, value));
    }

    fn read(&self, offset: usize) -> u32 {
        if offset != regs::LSR {
            return 0;
        }
        self.0.lsr_reads.fetch_add(1, Ordering::SeqCst);
        let stalled = match *self.0.stall_after.lock() {
            Some(limit) => self.0.thr_writes.load(Ordering::SeqCst) >= limit,
            None => false,
        };
        let busy = self
            .0
            .busy_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stalled || busy {
            0
        } else {
            // THRE | TEMT
            0x60
        }
    }
}

/// Hands out clones of one [`RecordingPort`], or fails every mapping.
pub struct RecordingMapper {
    pub port: RecordingPort,
    pub fail: AtomicBool,
    pub mapped: Mutex<Vec<Resource>>,
}

impl RecordingMapper {
    pub fn new(port: &RecordingPort) -> Self {
        RecordingMapper {
            port: port.clone(),
            fail: AtomicBool::new(false),
            mapped: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(port: &RecordingPort) -> Self {
        let mapper = Self::new(port);
        mapper.fail.store(true, Ordering::SeqCst);
        mapper
    }
}

impl MmioMapper for RecordingMapper {
    fn map(&self, res: &Resource) -> Result<Box<dyn RegisterPort>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DriverError::MapFailed);
        }
        self.mapped.lock().push(res.clone());
        Ok(Box::new(self.port.clone()))
    }
}

/// A user mapping at [`USER_BASE`] whose tail can be made inaccessible.
pub struct FakeUserSpace {
    mem: Mutex<Vec<u8>>,
    fault_from: Option<usize>,
    reads: Mutex<Vec<(usize, usize)>>,
    writes: AtomicUsize,
}

impl FakeUserSpace {
    pub fn new(contents: &[u8]) -> Self {
        FakeUserSpace {
            mem: Mutex::new(contents.to_vec()),
            fault_from: None,
            reads: Mutex::new(Vec::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Every address at or above `addr` faults.
    pub fn fault_from(mut self, addr: usize) -> Self {
        self.fault_from = Some(addr);
        self
    }

    /// `(address, length)` of every attempted copy from user memory.
    pub fn reads(&self) -> Vec<(usize, usize)> {
        self.reads.lock().clone()
    }

    /// Number of successful copies to user memory.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn read_usize(&self, addr: usize) -> usize {
        let mut raw = [0u8; core::mem::size_of::<usize>()];
        let start = addr - USER_BASE;
        raw.copy_from_slice(&self.mem.lock()[start..start + core::mem::size_of::<usize>()]);
        usize::from_ne_bytes(raw)
    }

    fn check(&self, addr: UserPtr, len: usize) -> VmResult<usize> {
        let start = addr.addr().checked_sub(USER_BASE).ok_or(VmError::Fault)?;
        let end = addr.addr().checked_add(len).ok_or(VmError::Fault)?;
        if start + len > self.mem.lock().len() {
            return Err(VmError::Fault);
        }
        match self.fault_from {
            Some(bad) if end > bad => Err(VmError::Fault),
            _ => Ok(start),
        }
    }
}

impl UserSpace for FakeUserSpace {
    fn copy_from_user(&self, src: UserPtr, dst: &mut [u8]) -> VmResult<()> {
        self.reads.lock().push((src.addr(), dst.len()));
        let start = self.check(src, dst.len())?;
        dst.copy_from_slice(&self.mem.lock()[start..start + dst.len()]);
        Ok(())
    }

    fn copy_to_user(&self, dst: UserPtr, src: &[u8]) -> VmResult<()> {
        let start = self.check(dst, src.len())?;
        self.mem.lock()[start..start + src.len()].copy_from_slice(src);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
