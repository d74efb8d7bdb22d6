use alloc::sync::Arc;

use crate::{
    drivers::serial::SerialDevice,
    fs::vfs::{FsError, INode, Result},
    memory::{UserPtr, UserSpace},
};

/// Character device node of a bound UART. Write-only.
pub struct SerialINode {
    device: Arc<SerialDevice>,
}

impl SerialINode {
    pub fn new(device: Arc<SerialDevice>) -> Self {
        SerialINode { device }
    }
}

impl INode for SerialINode {
    fn read(&self, _user: &dyn UserSpace, _buf: UserPtr, _len: usize) -> Result<usize> {
        Err(FsError::NotSupported)
    }

    fn write(&self, user: &dyn UserSpace, buf: UserPtr, len: usize) -> Result<usize> {
        self.device
            .with(|handle| handle.write_from_user(user, buf, len))
            .ok_or(FsError::NoDevice)?
            .map_err(FsError::from)
    }

    fn io_control(&self, user: &dyn UserSpace, cmd: u32, arg: usize) -> Result<usize> {
        self.device
            .with(|handle| handle.control(user, cmd, arg))
            .ok_or(FsError::NoDevice)?
            .map_err(FsError::from)
    }
}
