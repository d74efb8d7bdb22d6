use crate::consts::PHYSICAL_MEMORY_OFFSET;
use core::fmt;

/// Convert physical address to virtual address
#[inline]
pub const fn phys_to_virt(paddr: usize) -> usize {
    PHYSICAL_MEMORY_OFFSET + paddr
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum VmError {
    /// The caller's memory is unmapped or not accessible.
    Fault,
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::Fault => write!(f, "inaccessible user memory"),
        }
    }
}

pub type VmResult<T> = core::result::Result<T, VmError>;

/// Address in the calling process. Never dereferenced by the driver itself.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct UserPtr(usize);

impl UserPtr {
    #[inline]
    pub const fn new(addr: usize) -> Self {
        UserPtr(addr)
    }

    #[inline]
    pub const fn addr(self) -> usize {
        self.0
    }

    #[inline]
    pub const fn add(self, count: usize) -> Self {
        UserPtr(self.0.wrapping_add(count))
    }
}

impl From<usize> for UserPtr {
    fn from(addr: usize) -> Self {
        UserPtr(addr)
    }
}

/// Copies across the user/kernel boundary, supplied by the host runtime.
///
/// Both directions are all-or-nothing: a copy that hits inaccessible memory
/// anywhere in the range fails as a whole.
pub trait UserSpace: Sync {
    fn copy_from_user(&self, src: UserPtr, dst: &mut [u8]) -> VmResult<()>;

    fn copy_to_user(&self, dst: UserPtr, src: &[u8]) -> VmResult<()>;
}
