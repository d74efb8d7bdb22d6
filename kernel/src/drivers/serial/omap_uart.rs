//! Register-level half of the OMAP UART driver.
//!
//! The controller is a 16550 with a 4-byte register stride and an extra mode
//! register (MDR1). Only the transmit side is driven: the line is set up once
//! at bind time and then bytes are pushed into THR one write at a time.
use alloc::{boxed::Box, string::String};
use core::{convert::TryFrom, fmt, hint::spin_loop, mem::size_of};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use tock_registers::register_bitfields;

use super::counter::TransferCounter;
use crate::{
    consts::{CHUNK_SIZE, TX_POLL_SPINS, UART_BAUD, UART_CLOCK_HZ},
    drivers::{DriverError, RegisterPort},
    memory::{UserPtr, UserSpace},
};

/// Register indices (multiply by 4 for the byte offset).
pub mod regs {
    /// Transmit holding register (write).
    pub const THR: usize = 0;
    /// Divisor latch low, aliases THR while LCR.DLAB is set.
    pub const DLL: usize = 0;
    /// Divisor latch high, aliases IER while LCR.DLAB is set.
    pub const DLM: usize = 1;
    pub const FCR: usize = 2;
    pub const LCR: usize = 3;
    pub const LSR: usize = 5;
    /// Mode definition register 1 (OMAP specific).
    pub const MDR1: usize = 8;

    /// Smallest register window, in bytes, that reaches every register above.
    pub const WINDOW_LEN: usize = (MDR1 + 1) * 4;
}

register_bitfields! {
    u32,

    /// Line Control Register
    LCR [
        /// Word length
        WLEN OFFSET(0) NUMBITS(2) [
            FiveBits = 0,
            SixBits = 1,
            SevenBits = 2,
            EightBits = 3
        ],
        STOP OFFSET(2) NUMBITS(1) [
            OneBit = 0,
            TwoBits = 1
        ],
        PARITY_EN OFFSET(3) NUMBITS(1) [],
        /// Divisor latch access. While set, offsets 0 and 1 reach DLL/DLM.
        DLAB OFFSET(7) NUMBITS(1) []
    ],

    /// FIFO Control Register
    FCR [
        FIFO_EN OFFSET(0) NUMBITS(1) [],
        CLEAR_RCVR OFFSET(1) NUMBITS(1) [],
        CLEAR_XMIT OFFSET(2) NUMBITS(1) []
    ],

    /// Mode Definition Register 1
    MDR1 [
        MODE_SELECT OFFSET(0) NUMBITS(3) [
            Uart16x = 0,
            Sir = 1,
            Uart16xAutoBaud = 2,
            Uart13x = 3,
            Mir = 4,
            Fir = 5,
            Cir = 6,
            Disable = 7
        ]
    ],

    /// Line Status Register
    LSR [
        DATA_READY OFFSET(0) NUMBITS(1) [],
        OVERRUN OFFSET(1) NUMBITS(1) [],
        PARITY_ERR OFFSET(2) NUMBITS(1) [],
        FRAMING_ERR OFFSET(3) NUMBITS(1) [],
        BREAK OFFSET(4) NUMBITS(1) [],
        /// Transmit holding register empty
        THRE OFFSET(5) NUMBITS(1) [],
        /// Transmitter (THR and shift register) empty
        TEMT OFFSET(6) NUMBITS(1) []
    ]
}

/// Baud generator parameters. Fixed for this board, recomputed at every bind.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LineConfig {
    pub clock_hz: u32,
    pub baud: u32,
}

impl Default for LineConfig {
    fn default() -> Self {
        LineConfig {
            clock_hz: UART_CLOCK_HZ,
            baud: UART_BAUD,
        }
    }
}

impl LineConfig {
    /// `clock / 16 / baud`, or `None` if that is zero or wider than 16 bits.
    pub fn divisor(&self) -> Option<u16> {
        let divisor = self.clock_hz.checked_div(16)?.checked_div(self.baud)?;
        match u16::try_from(divisor) {
            Ok(0) | Err(_) => None,
            Ok(divisor) => Some(divisor),
        }
    }
}

/// What to do before each byte goes into THR.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TxPolicy {
    /// Write straight away. The hardware FIFO is trusted to keep up.
    FireAndForget,
    /// Spin on LSR.THRE, giving up after `max_spins` reads.
    PollLineStatus { max_spins: u32 },
}

impl Default for TxPolicy {
    fn default() -> Self {
        if cfg!(feature = "tx_poll") {
            TxPolicy::PollLineStatus {
                max_spins: TX_POLL_SPINS,
            }
        } else {
            TxPolicy::FireAndForget
        }
    }
}

/// `io_control` commands understood by the device node.
#[derive(Debug, Clone, Copy, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum SerialIoctl {
    ResetCounter = 0,
    GetCounter = 1,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SerialError {
    /// Caller memory became inaccessible. `transmitted` bytes went out before.
    Fault { transmitted: usize },
    /// THR never drained under [`TxPolicy::PollLineStatus`].
    TxTimeout { transmitted: usize },
    /// The counter value could not be copied back to the caller.
    AccessDenied,
    InvalidCommand(u32),
}

impl SerialError {
    fn after(self, already: usize) -> Self {
        match self {
            SerialError::Fault { transmitted } => SerialError::Fault {
                transmitted: already + transmitted,
            },
            SerialError::TxTimeout { transmitted } => SerialError::TxTimeout {
                transmitted: already + transmitted,
            },
            other => other,
        }
    }
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialError::Fault { transmitted } => {
                write!(f, "bad user buffer after {} bytes", transmitted)
            }
            SerialError::TxTimeout { transmitted } => {
                write!(f, "transmitter stuck after {} bytes", transmitted)
            }
            SerialError::AccessDenied => write!(f, "cannot copy counter to user"),
            SerialError::InvalidCommand(cmd) => write!(f, "unknown ioctl {:#x}", cmd),
        }
    }
}

/// Reset the line and program 8N1 at `line`'s baud rate.
///
/// The write order is what the hardware expects; do not shuffle it.
pub fn configure(port: &dyn RegisterPort, line: &LineConfig) -> Result<(), DriverError> {
    let divisor = line.divisor().ok_or(DriverError::InvalidConfig)?;
    debug!(
        "omap-uart: clock {} Hz, baud {}, divisor {}",
        line.clock_hz, line.baud, divisor
    );

    let write = |offset: usize, value: u32| {
        trace!("omap-uart: writing {:#x} to register {}", value, offset);
        port.write(offset, value);
    };

    write(regs::MDR1, MDR1::MODE_SELECT::Disable.value);
    write(regs::LCR, 0);
    write(regs::LCR, LCR::DLAB::SET.value);
    write(regs::DLL, u32::from(divisor & 0xff));
    write(regs::DLM, u32::from(divisor >> 8));
    write(
        regs::LCR,
        (LCR::WLEN::EightBits + LCR::STOP::OneBit + LCR::PARITY_EN::CLEAR).value,
    );

    // soft reset of both FIFOs
    write(
        regs::FCR,
        (FCR::CLEAR_RCVR::SET + FCR::CLEAR_XMIT::SET).value,
    );
    write(regs::MDR1, MDR1::MODE_SELECT::Uart16x.value);
    Ok(())
}

/// Everything one bound controller owns: its register window and counter.
pub struct DeviceHandle {
    name: String,
    port: Box<dyn RegisterPort>,
    counter: TransferCounter,
    tx_policy: TxPolicy,
}

impl DeviceHandle {
    pub fn new(name: String, port: Box<dyn RegisterPort>, tx_policy: TxPolicy) -> Self {
        DeviceHandle {
            name,
            port,
            counter: TransferCounter::new(),
            tx_policy,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn counter(&self) -> &TransferCounter {
        &self.counter
    }

    pub fn configure(&self, line: &LineConfig) -> Result<(), DriverError> {
        configure(&*self.port, line)
    }

    fn wait_tx_ready(&self) -> bool {
        match self.tx_policy {
            TxPolicy::FireAndForget => true,
            TxPolicy::PollLineStatus { max_spins } => {
                for _ in 0..max_spins {
                    if LSR::THRE.read(self.port.read(regs::LSR)) != 0 {
                        return true;
                    }
                    spin_loop();
                }
                false
            }
        }
    }

    /// Put one byte on the wire and count it.
    pub fn transmit_byte(&self, byte: u8) -> Result<(), SerialError> {
        if !self.wait_tx_ready() {
            return Err(SerialError::TxTimeout { transmitted: 0 });
        }
        self.port.write(regs::THR, u32::from(byte));
        self.counter.increment();
        Ok(())
    }

    /// Send `bytes` in order, one register write each.
    pub fn transmit(&self, bytes: &[u8]) -> Result<usize, SerialError> {
        for (sent, &byte) in bytes.iter().enumerate() {
            if let Err(err) = self.transmit_byte(byte) {
                let err = err.after(sent);
                warn!("{}: {}", self.name, err);
                return Err(err);
            }
        }
        Ok(bytes.len())
    }

    /// Send `len` bytes starting at `buf` in the caller's address space.
    ///
    /// The buffer is staged through kernel memory [`CHUNK_SIZE`] bytes at a
    /// time. When a copy fails nothing from that chunk on is sent, and the
    /// error carries the number of bytes that already went out.
    pub fn write_from_user(
        &self,
        user: &dyn UserSpace,
        buf: UserPtr,
        len: usize,
    ) -> Result<usize, SerialError> {
        let mut kbuf = [0u8; CHUNK_SIZE];
        let mut written = 0;

        while written < len {
            let chunk = &mut kbuf[..(len - written).min(CHUNK_SIZE)];
            if user.copy_from_user(buf.add(written), chunk).is_err() {
                warn!("{}: copy_from_user() failed after {} bytes", self.name, written);
                return Err(SerialError::Fault {
                    transmitted: written,
                });
            }
            let sent = self.transmit(chunk).map_err(|err| err.after(written))?;
            written += sent;
        }

        Ok(written)
    }

    /// Out-of-band commands on the transfer counter.
    pub fn control(&self, user: &dyn UserSpace, cmd: u32, arg: usize) -> Result<usize, SerialError> {
        match SerialIoctl::try_from(cmd).map_err(|_| SerialError::InvalidCommand(cmd))? {
            SerialIoctl::ResetCounter => {
                self.counter.reset();
                Ok(0)
            }
            SerialIoctl::GetCounter => {
                let value = self.counter.read();
                user.copy_to_user(UserPtr::new(arg), &value.to_ne_bytes())
                    .map_err(|_| SerialError::AccessDenied)?;
                Ok(0)
            }
        }
    }
}

/// Size of the value [`SerialIoctl::GetCounter`] stores at the caller's pointer.
pub const COUNTER_SIZE: usize = size_of::<usize>();
