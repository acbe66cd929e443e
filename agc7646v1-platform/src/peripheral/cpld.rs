//! CPU board CPLD driver
//!
//! The CPU CPLD sits at 0x31 on I2C bus 0. Register 0x14 steers the bus-0
//! mux: it decides whether the CPU's I2C controller sees the switch-board
//! peripherals (SWPLD3, SERDES) or only the ID EEPROM, which is how
//! userspace daemons are kept off the peripherals once the kernel platform
//! driver owns them.

use crate::error::Result;
use crate::hw_trait::I2c;
use crate::tracing::prelude::*;

/// CPU CPLD I2C bus
pub const CPUPLD_BUS: u8 = 0;

/// CPU CPLD I2C address
pub const CPUPLD_ADDR: u8 = 0x31;

/// Register addresses
pub mod registers {
    /// Bus-0 mux select
    pub const BUS0_MUX: u8 = 0x14;
}

/// Values for the bus-0 mux register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Bus0Mux {
    /// All downstream channels routed, including SERDES and SWPLD3
    #[strum(to_string = "serdes+swpld3")]
    SerdesSwpld3,
    /// Channel state used while the bus is torn down and re-enumerated
    #[strum(to_string = "rescan")]
    Rescan,
    /// Only the ID EEPROM reachable; peripherals locked away from userspace
    #[strum(to_string = "id-eeprom")]
    IdEeprom,
}

impl Bus0Mux {
    /// Raw register value.
    pub const fn value(self) -> u8 {
        match self {
            Bus0Mux::SerdesSwpld3 => 0xff,
            Bus0Mux::Rescan => 0xfd,
            Bus0Mux::IdEeprom => 0xfc,
        }
    }

    /// Decode a raw register value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0xff => Some(Bus0Mux::SerdesSwpld3),
            0xfd => Some(Bus0Mux::Rescan),
            0xfc => Some(Bus0Mux::IdEeprom),
            _ => None,
        }
    }
}

/// CPU CPLD driver
pub struct Cpld<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Cpld<I2C> {
    /// Create a driver for the CPLD at the standard address
    pub fn new(i2c: I2C) -> Self {
        Self { i2c, address: CPUPLD_ADDR }
    }

    /// Read one register
    pub async fn read_register(&mut self, register: u8) -> Result<u8> {
        let value = self.i2c.read_byte_data(self.address, register).await?;
        trace!("CPLD 0x{:02x}: reg 0x{:02x} = 0x{:02x}", self.address, register, value);
        Ok(value)
    }

    /// Current bus-0 mux setting, `None` for values outside the known set
    pub async fn bus0_mux(&mut self) -> Result<Option<Bus0Mux>> {
        let value = self.read_register(registers::BUS0_MUX).await?;
        Ok(Bus0Mux::from_value(value))
    }
}
