use alloc::{string::String, sync::Arc};
use core::mem;
use spin::{Mutex, RwLock};

use super::{
    bus::platform::{MmioMapper, PlatformDevice, ResourceKind},
    DeviceType, Driver, DriverError, Result,
};
use crate::{
    consts::{OMAP_UART_COMPATIBLE, SERIAL_NODE_PREFIX},
    fs::{devfs::SerialINode, DevFs},
};

pub mod counter;
#[cfg(test)]
pub(crate) mod mock;
pub mod omap_uart;

pub use counter::TransferCounter;
pub use omap_uart::{DeviceHandle, LineConfig, SerialError, SerialIoctl, TxPolicy};

use omap_uart::regs;

pub trait SerialDriver: Driver {
    /// Write bytes from kernel memory, return how many went out.
    fn write_bytes(&self, bytes: &[u8]) -> Result<usize>;

    /// Bytes transmitted since the counter was last reset.
    fn transfer_count(&self) -> Result<usize>;
}

/// Per-driver settings, fixed before the first bind.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SerialConfig {
    pub line: LineConfig,
    pub tx_policy: TxPolicy,
    /// Sent once right after the line is configured. Counted like any write.
    pub banner: Option<&'static [u8]>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            line: LineConfig::default(),
            tx_policy: TxPolicy::default(),
            banner: None,
        }
    }
}

/// The bound controller, shared by the driver and the node it published.
///
/// Unbind empties the slot, after which every node operation fails without
/// touching the registers.
#[derive(Default)]
pub struct SerialDevice {
    handle: RwLock<Option<DeviceHandle>>,
}

impl SerialDevice {
    /// Run `f` on the live handle, or return `None` once it is revoked.
    ///
    /// The slot stays read-locked while `f` runs, so unbind waits for
    /// in-flight writes to finish before the window is released.
    pub fn with<R>(&self, f: impl FnOnce(&DeviceHandle) -> R) -> Option<R> {
        self.handle.read().as_ref().map(f)
    }

    fn install(&self, handle: DeviceHandle) {
        *self.handle.write() = Some(handle);
    }

    fn revoke(&self) -> Option<DeviceHandle> {
        self.handle.write().take()
    }
}

enum BindState {
    Unbound,
    Binding,
    Bound {
        node: String,
        device: Arc<SerialDevice>,
    },
    Unbinding,
}

/// Platform driver for the OMAP UART.
pub struct OmapUartDriver {
    config: SerialConfig,
    state: Mutex<BindState>,
}

impl OmapUartDriver {
    pub fn new(config: SerialConfig) -> Self {
        OmapUartDriver {
            config,
            state: Mutex::new(BindState::Unbound),
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(*self.state.lock(), BindState::Bound { .. })
    }

    /// Name of the published device node while bound.
    pub fn node_name(&self) -> Option<String> {
        match &*self.state.lock() {
            BindState::Bound { node, .. } => Some(node.clone()),
            _ => None,
        }
    }

    /// Bind to `pdev`: map its registers, set up the line and publish the
    /// device node in `devfs`.
    ///
    /// On failure nothing stays mapped or published.
    pub fn probe(
        &self,
        pdev: &PlatformDevice,
        mapper: &dyn MmioMapper,
        devfs: &DevFs,
    ) -> Result<()> {
        {
            let mut state = self.state.lock();
            if !matches!(*state, BindState::Unbound) {
                return Err(DriverError::Busy);
            }
            *state = BindState::Binding;
        }

        let next = match self.bind(pdev, mapper, devfs) {
            Ok((node, device)) => {
                info!("{}: bound as {}", pdev.name, node);
                BindState::Bound { node, device }
            }
            Err(err) => {
                error!("{}: probe failed: {}", pdev.name, err);
                *self.state.lock() = BindState::Unbound;
                return Err(err);
            }
        };
        *self.state.lock() = next;
        Ok(())
    }

    fn bind(
        &self,
        pdev: &PlatformDevice,
        mapper: &dyn MmioMapper,
        devfs: &DevFs,
    ) -> Result<(String, Arc<SerialDevice>)> {
        let res = pdev
            .get_resource(ResourceKind::Mem, 0)
            .filter(|res| res.len() >= regs::WINDOW_LEN)
            .ok_or(DriverError::NoResource)?;
        debug!("{}: IO memory resource start address: {:#x}", pdev.name, res.start());

        if self.config.line.divisor().is_none() {
            return Err(DriverError::InvalidConfig);
        }
        let port = mapper.map(res)?;

        let node = format!("{}-{:x}", SERIAL_NODE_PREFIX, res.start());
        let handle = DeviceHandle::new(node.clone(), port, self.config.tx_policy);
        handle.configure(&self.config.line)?;
        if let Some(banner) = self.config.banner {
            if let Err(err) = handle.transmit(banner) {
                warn!("{}: banner not sent: {}", node, err);
            }
        }

        let device = Arc::new(SerialDevice::default());
        device.install(handle);
        if let Err(err) = devfs.publish(&node, Arc::new(SerialINode::new(device.clone()))) {
            error!("{}: unable to register device node: {}", node, err);
            device.revoke();
            return Err(DriverError::PublishFailed);
        }
        Ok((node, device))
    }

    /// Unbind: withdraw the device node, then release registers and counter.
    pub fn remove(&self, devfs: &DevFs) -> Result<()> {
        let (node, device) = {
            let mut state = self.state.lock();
            match mem::replace(&mut *state, BindState::Unbinding) {
                BindState::Bound { node, device } => (node, device),
                BindState::Unbound => {
                    *state = BindState::Unbound;
                    return Err(DriverError::NotBound);
                }
                other => {
                    *state = other;
                    return Err(DriverError::Busy);
                }
            }
        };

        devfs.withdraw(&node);
        if let Some(handle) = device.revoke() {
            info!(
                "{}: removed, {} bytes since last reset",
                node,
                handle.counter().read()
            );
        }
        *self.state.lock() = BindState::Unbound;
        Ok(())
    }

    fn device(&self) -> Result<Arc<SerialDevice>> {
        match &*self.state.lock() {
            BindState::Bound { device, .. } => Ok(device.clone()),
            _ => Err(DriverError::NotBound),
        }
    }
}

impl Default for OmapUartDriver {
    fn default() -> Self {
        Self::new(SerialConfig::default())
    }
}

impl Driver for OmapUartDriver {
    fn compatible(&self) -> &'static str {
        OMAP_UART_COMPATIBLE
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::Serial
    }
}

impl SerialDriver for OmapUartDriver {
    fn write_bytes(&self, bytes: &[u8]) -> Result<usize> {
        self.device()?
            .with(|handle| handle.transmit(bytes))
            .ok_or(DriverError::NotBound)?
            .map_err(|err| match err {
                SerialError::TxTimeout { .. } => DriverError::Timeout,
                SerialError::Fault { .. }
                | SerialError::AccessDenied
                | SerialError::InvalidCommand(_) => DriverError::Io,
            })
    }

    fn transfer_count(&self) -> Result<usize> {
        self.device()?
            .with(|handle| handle.counter().read())
            .ok_or(DriverError::NotBound)
    }
}
