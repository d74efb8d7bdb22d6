use alloc::{boxed::Box, string::String, vec::Vec};
use core::ops::Range;

use super::super::{common::MmioWindow, DriverError, RegisterPort, Result};
use crate::memory::phys_to_virt;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ResourceKind {
    Mem,
    Irq,
}

/// One hardware resource handed to a driver at bind time.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub range: Range<usize>,
}

impl Resource {
    pub fn mem(range: Range<usize>) -> Self {
        Resource {
            kind: ResourceKind::Mem,
            range,
        }
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.range.start
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.range.end.saturating_sub(self.range.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A device found on a non-discoverable bus, as described by firmware.
#[derive(Debug, Clone, Default)]
pub struct PlatformDevice {
    pub name: String,
    pub resources: Vec<Resource>,
}

impl PlatformDevice {
    pub fn new(name: &str) -> Self {
        PlatformDevice {
            name: name.into(),
            resources: Vec::new(),
        }
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Returns the `index`-th resource of `kind`.
    pub fn get_resource(&self, kind: ResourceKind, index: usize) -> Option<&Resource> {
        self.resources
            .iter()
            .filter(|res| res.kind == kind)
            .nth(index)
    }
}

/// Turns a physical MEM resource into a register port.
pub trait MmioMapper {
    fn map(&self, res: &Resource) -> Result<Box<dyn RegisterPort>>;
}

/// Maps through the kernel's linear physical mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearMapper;

impl MmioMapper for LinearMapper {
    fn map(&self, res: &Resource) -> Result<Box<dyn RegisterPort>> {
        if res.kind != ResourceKind::Mem || res.len() < 4 || res.start() % 4 != 0 {
            return Err(DriverError::MapFailed);
        }
        let vaddr = phys_to_virt(res.start());
        // SAFETY: the resource comes from firmware and covers the device's
        // register block, which the linear map keeps mapped.
        let window = unsafe { MmioWindow::new(vaddr, res.len()) };
        Ok(Box::new(window))
    }
}
