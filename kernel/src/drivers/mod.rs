pub mod bus;
mod common;
pub mod device_tree;
pub mod serial;

use core::fmt::{self, Display};

use crate::fs::Errno;

pub use bus::platform::{LinearMapper, MmioMapper, PlatformDevice, Resource, ResourceKind};
pub use common::{MmioWindow, RegisterPort};
pub use device_tree::DeviceTree;
pub use serial::SerialDriver;

pub type Result<T> = core::result::Result<T, DriverError>;

/// Why a bind or a kernel-side driver call failed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DriverError {
    /// The platform device has no usable MEM resource.
    NoResource,
    /// The register window could not be mapped.
    MapFailed,
    /// Line parameters produce no valid divisor.
    InvalidConfig,
    /// The device node could not be published.
    PublishFailed,
    /// A bind or unbind is in progress, or the driver is already bound.
    Busy,
    NotBound,
    /// The transmitter never became ready.
    Timeout,
    /// A kernel-side transfer failed for a reason other than a timeout.
    Io,
}

impl DriverError {
    /// Status reported back to the host runtime, as a positive errno.
    pub fn errno(&self) -> Errno {
        match self {
            DriverError::NoResource | DriverError::NotBound => Errno::ENODEV,
            DriverError::MapFailed => Errno::ENOMEM,
            DriverError::InvalidConfig => Errno::EINVAL,
            DriverError::PublishFailed => Errno::EIO,
            DriverError::Busy => Errno::EBUSY,
            DriverError::Timeout => Errno::ETIMEDOUT,
            DriverError::Io => Errno::EIO,
        }
    }
}

impl Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DriverError::NoResource => "unable to get IORESOURCE_MEM",
            DriverError::MapFailed => "cannot remap registers",
            DriverError::InvalidConfig => "invalid line configuration",
            DriverError::PublishFailed => "unable to publish device node",
            DriverError::Busy => "device busy",
            DriverError::NotBound => "device not bound",
            DriverError::Timeout => "transmitter timed out",
            DriverError::Io => "transmit failed",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Eq, PartialEq)]
pub enum DeviceType {
    Serial,
}

impl DeviceType {
    #[inline]
    fn description(&self) -> &'static str {
        match self {
            DeviceType::Serial => "Serial",
        }
    }
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.description())
    }
}

pub trait Driver: Send + Sync {
    /// Return a compatibility string for identifying the driver.
    fn compatible(&self) -> &'static str;

    /// return the correspondent device type
    fn device_type(&self) -> DeviceType;
}
