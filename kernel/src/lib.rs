//! OMAP UART driver exposed as a write-only character device.
//!
//! The host kernel binds the driver to a platform device, the driver programs
//! the line once and publishes `serial-<base>` in [`fs::DevFs`]. Writes go out
//! byte by byte through the transmit holding register, and a transfer counter
//! can be reset or queried through `io_control`.
#![no_std]

#[macro_use]
extern crate alloc;
#[macro_use]
extern crate log;
#[cfg(test)]
extern crate std;

pub mod consts;
pub mod drivers;
pub mod fs;
pub mod logging;
pub mod memory;

pub use drivers::serial::{OmapUartDriver, SerialConfig};
