use core::{convert::TryFrom, ops::Range};
use fdt_rs::{base::*, prelude::*};

use super::{PlatformDevice, Resource};

pub struct DeviceTree<'dt>(DevTree<'dt>);

impl<'dt> DeviceTree<'dt> {
    /// Parse flattened device tree from `addr`.
    /// # Safety
    /// Must ensure `addr` is valid.
    pub unsafe fn from_raw(addr: usize) -> fdt_rs::error::Result<Self> {
        let fdt_header = core::slice::from_raw_parts(addr as *const u8, DevTree::MIN_HEADER_SIZE);
        let len: usize = DevTree::read_totalsize(fdt_header)?;
        let fdt = core::slice::from_raw_parts(addr as *const u8, len);

        Self::new(fdt)
    }

    /// Parse a flattened device tree already copied into `buf`.
    ///
    /// `buf` must be 4-byte aligned.
    pub fn new(buf: &'dt [u8]) -> fdt_rs::error::Result<Self> {
        #[allow(unused_unsafe)]
        let tree = unsafe { DevTree::new(buf)? };
        Ok(DeviceTree(tree))
    }

    #[inline]
    pub fn device_tree(&self) -> DevTree {
        self.0
    }

    /// Returns physical memory address `start..end`
    pub fn probe_memory(&self) -> Option<Range<usize>> {
        let mem_node = self
            .0
            .nodes()
            .find(|node| node.name().map(|name| name.starts_with("memory")))
            .ok()
            .flatten()?;

        let reg = mem_node
            .props()
            .find(|prop| prop.name().map(|name| name == "reg"))
            .ok()
            .flatten()?;

        reg_range(&reg)
    }

    /// Build a platform device from the first node whose `compatible` list
    /// contains `compatible`. Its first `reg` entry becomes MEM resource 0.
    pub fn probe_platform_device(&self, compatible: &str) -> Option<PlatformDevice> {
        let mut nodes = self.0.nodes();
        while let Some(node) = nodes.next().ok()? {
            let mut props = node.props();
            let mut matched = false;
            let mut reg = None;
            while let Some(prop) = props.next().ok()? {
                match prop.name().ok()? {
                    "compatible" => {
                        matched = prop.iter_str().any(|s| Ok(s == compatible)).ok()?;
                    }
                    "reg" => reg = reg_range(&prop),
                    _ => {}
                }
            }
            if matched {
                let name = node.name().ok()?;
                let mut pdev = PlatformDevice::new(name);
                if let Some(range) = reg {
                    pdev = pdev.with_resource(Resource::mem(range));
                }
                return Some(pdev);
            }
        }
        None
    }
}

/// Decode the first `<address size>` pair of a `reg` property, with either
/// one or two cells per value.
fn reg_range<'dt>(reg: &impl PropReader<'dt>) -> Option<Range<usize>> {
    let (start, len) = match reg.length() {
        8 => (reg.u32(0).ok()? as usize, reg.u32(1).ok()? as usize),
        16 => (
            usize::try_from(reg.u64(0).ok()?).ok()?,
            usize::try_from(reg.u64(1).ok()?).ok()?,
        ),
        _ => return None,
    };

    Some(Range {
        start,
        end: start.checked_add(len)?,
    })
}
