/// Offset of the linear mapping of physical memory into the kernel address space.
pub const PHYSICAL_MEMORY_OFFSET: usize = 0;

/// Functional clock feeding the UART baud generator.
pub const UART_CLOCK_HZ: u32 = 48_000_000;
pub const UART_BAUD: u32 = 115_200;

/// Largest piece of a user buffer staged in kernel memory at once.
pub const CHUNK_SIZE: usize = 32;

pub const OMAP_UART_COMPATIBLE: &str = "ti,omap3-uart";
pub const SERIAL_NODE_PREFIX: &str = "serial";

/// LSR reads before a polled transmit gives up.
pub const TX_POLL_SPINS: u32 = 100_000;
