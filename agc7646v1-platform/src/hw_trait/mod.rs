//! Hardware abstraction layer traits.
//!
//! Drivers in `peripheral` are written against these traits so the same
//! code runs over the Linux i2c-dev interface or an in-memory bus in tests.

use async_trait::async_trait;

use crate::error::Result;

pub mod i2c_dev;

pub use i2c_dev::I2cDev;

/// I2C master interface, limited to the SMBus transfers the board's
/// controller supports.
#[async_trait]
pub trait I2c: Send {
    /// SMBus "write byte data": `value` into `register` of the device at
    /// 7-bit `address`.
    async fn write_byte_data(&mut self, address: u8, register: u8, value: u8) -> Result<()>;

    /// SMBus "read byte data" from `register` of the device at `address`.
    async fn read_byte_data(&mut self, address: u8, register: u8) -> Result<u8>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::error::Error;
    use std::collections::HashMap;

    /// In-memory register file keyed by (address, register).
    #[derive(Default)]
    pub struct MockI2c {
        pub registers: HashMap<(u8, u8), u8>,
        pub absent: Vec<u8>,
    }

    impl MockI2c {
        fn check(&self, address: u8) -> Result<()> {
            if self.absent.contains(&address) {
                return Err(Error::Hardware(format!("no ACK from 0x{:02x}", address)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl I2c for MockI2c {
        async fn write_byte_data(&mut self, address: u8, register: u8, value: u8) -> Result<()> {
            self.check(address)?;
            self.registers.insert((address, register), value);
            Ok(())
        }

        async fn read_byte_data(&mut self, address: u8, register: u8) -> Result<u8> {
            self.check(address)?;
            Ok(self
                .registers
                .get(&(address, register))
                .copied()
                .unwrap_or(0xff))
        }
    }
}
