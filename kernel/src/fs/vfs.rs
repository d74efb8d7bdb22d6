use core::fmt;
use num_enum::IntoPrimitive;

use crate::{
    drivers::serial::SerialError,
    memory::{UserPtr, UserSpace},
};

/// Linux errno values the host runtime hands back to user space.
#[derive(Debug, Clone, Copy, Eq, PartialEq, IntoPrimitive)]
#[repr(i32)]
pub enum Errno {
    ENOENT = 2,
    EIO = 5,
    ENOMEM = 12,
    EACCES = 13,
    EFAULT = 14,
    EBUSY = 16,
    EEXIST = 17,
    ENODEV = 19,
    EINVAL = 22,
    EOPNOTSUPP = 95,
    ETIMEDOUT = 110,
}

impl Errno {
    /// Negative status as returned from a file operation.
    #[inline]
    pub fn status(self) -> isize {
        -(i32::from(self) as isize)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FsError {
    NotSupported,
    InvalidParam,
    /// The device behind the node has been unbound.
    NoDevice,
    EntryExist,
    EntryNotFound,
    /// Caller memory was inaccessible after `transmitted` bytes went out.
    Fault { transmitted: usize },
    AccessDenied,
    TimedOut { transmitted: usize },
}

impl FsError {
    pub fn errno(&self) -> Errno {
        match self {
            FsError::NotSupported => Errno::EOPNOTSUPP,
            FsError::InvalidParam => Errno::EINVAL,
            FsError::NoDevice => Errno::ENODEV,
            FsError::EntryExist => Errno::EEXIST,
            FsError::EntryNotFound => Errno::ENOENT,
            FsError::Fault { .. } => Errno::EFAULT,
            FsError::AccessDenied => Errno::EACCES,
            FsError::TimedOut { .. } => Errno::ETIMEDOUT,
        }
    }

    /// Bytes that reached the hardware before a write failed.
    pub fn transmitted(&self) -> Option<usize> {
        match self {
            FsError::Fault { transmitted } | FsError::TimedOut { transmitted } => {
                Some(*transmitted)
            }
            _ => None,
        }
    }
}

impl From<SerialError> for FsError {
    fn from(err: SerialError) -> Self {
        match err {
            SerialError::Fault { transmitted } => FsError::Fault { transmitted },
            SerialError::TxTimeout { transmitted } => FsError::TimedOut { transmitted },
            SerialError::AccessDenied => FsError::AccessDenied,
            SerialError::InvalidCommand(_) => FsError::InvalidParam,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::NotSupported => write!(f, "operation not supported"),
            FsError::InvalidParam => write!(f, "invalid argument"),
            FsError::NoDevice => write!(f, "no such device"),
            FsError::EntryExist => write!(f, "entry exists"),
            FsError::EntryNotFound => write!(f, "entry not found"),
            FsError::Fault { transmitted } => {
                write!(f, "bad address after {} bytes", transmitted)
            }
            FsError::AccessDenied => write!(f, "access denied"),
            FsError::TimedOut { transmitted } => {
                write!(f, "timed out after {} bytes", transmitted)
            }
        }
    }
}

pub type Result<T> = core::result::Result<T, FsError>;

/// Collapse a file operation result into a syscall return value.
pub fn syscall_ret(result: Result<usize>) -> isize {
    match result {
        Ok(len) => len as isize,
        Err(err) => err.errno().status(),
    }
}

/// File operations of a device node.
pub trait INode: Send + Sync {
    fn open(&self) -> Result<()> {
        Ok(())
    }

    /// Read up to `len` bytes into the caller's `buf`.
    fn read(&self, user: &dyn UserSpace, buf: UserPtr, len: usize) -> Result<usize>;

    /// Write `len` bytes from the caller's `buf`, return the number written.
    fn write(&self, user: &dyn UserSpace, buf: UserPtr, len: usize) -> Result<usize>;

    fn io_control(&self, user: &dyn UserSpace, cmd: u32, arg: usize) -> Result<usize>;
}
