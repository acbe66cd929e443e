//! Linux i2c-dev backend for the `I2c` trait.
//!
//! Each transfer selects the target with the `I2C_SLAVE` ioctl (or
//! `I2C_SLAVE_FORCE` when the address is already bound to a kernel driver)
//! and then issues an `I2C_SMBUS` ioctl, the same path `i2cset`/`i2cget`
//! take. Plain read/write on the device node would need `master_xfer`,
//! which SMBus-only controllers such as i2c-i801 lack.

use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use super::I2c;
use crate::error::{Error, Result};
use crate::tracing::prelude::*;

/// Definitions from <linux/i2c-dev.h> and <linux/i2c.h>.
mod ioctl {
    pub const I2C_SLAVE: u16 = 0x0703;
    pub const I2C_SLAVE_FORCE: u16 = 0x0706;
    pub const I2C_SMBUS: u16 = 0x0720;

    pub const I2C_SMBUS_WRITE: u8 = 0;
    pub const I2C_SMBUS_READ: u8 = 1;
    pub const I2C_SMBUS_BYTE_DATA: u32 = 2;

    pub const I2C_SMBUS_BLOCK_MAX: usize = 32;

    /// `union i2c_smbus_data`
    #[repr(C)]
    #[allow(dead_code)]
    #[derive(Clone, Copy)]
    pub union SmbusData {
        pub byte: u8,
        pub word: u16,
        pub block: [u8; I2C_SMBUS_BLOCK_MAX + 2],
    }

    /// `struct i2c_smbus_ioctl_data`
    #[repr(C)]
    pub struct SmbusIoctlData {
        pub read_write: u8,
        pub command: u8,
        pub size: u32,
        pub data: *mut SmbusData,
    }

    impl SmbusIoctlData {
        pub fn byte_data(read_write: u8, command: u8, data: &mut SmbusData) -> Self {
            Self {
                read_write,
                command,
                size: I2C_SMBUS_BYTE_DATA,
                data,
            }
        }
    }

    nix::ioctl_write_int_bad!(i2c_slave, I2C_SLAVE);
    nix::ioctl_write_int_bad!(i2c_slave_force, I2C_SLAVE_FORCE);
    nix::ioctl_readwrite_bad!(i2c_smbus, I2C_SMBUS, SmbusIoctlData);
}

use ioctl::{SmbusData, SmbusIoctlData};

/// An open `/dev/i2c-N` adapter.
///
/// Transfers are blocking ioctls made inline from the async methods; they
/// take microseconds and bring-up runs alone on a current-thread runtime.
pub struct I2cDev {
    file: File,
    path: PathBuf,
    force: bool,
}

impl I2cDev {
    /// Path of the character device for `bus` under `dev_root`.
    pub fn device_path(dev_root: &Path, bus: u8) -> PathBuf {
        dev_root.join(format!("i2c-{}", bus))
    }

    /// Open the adapter for `bus`.
    pub fn open(dev_root: &Path, bus: u8) -> Result<Self> {
        let path = Self::device_path(dev_root, bus);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| Error::Hardware(format!("{}: {}", path.display(), e)))?;
        trace!(path = %path.display(), "Opened I2C adapter");
        Ok(Self {
            file,
            path,
            force: false,
        })
    }

    /// Address devices even when a kernel driver has claimed them.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    fn select(&self, address: u8) -> Result<()> {
        let fd = self.file.as_raw_fd();
        let address = i32::from(address);
        // SAFETY: fd is an open i2c-dev descriptor owned by self.file and
        // both requests take the slave address by value.
        unsafe {
            if self.force {
                ioctl::i2c_slave_force(fd, address)?;
            } else {
                ioctl::i2c_slave(fd, address)?;
            }
        }
        Ok(())
    }

    fn smbus_byte_data(&self, read_write: u8, register: u8, data: &mut SmbusData) -> Result<()> {
        let mut args = SmbusIoctlData::byte_data(read_write, register, data);
        // SAFETY: args and the SmbusData it points to outlive the call and
        // match the kernel's i2c_smbus_ioctl_data layout.
        unsafe {
            ioctl::i2c_smbus(self.file.as_raw_fd(), &mut args)?;
        }
        Ok(())
    }
}

#[async_trait]
impl I2c for I2cDev {
    async fn write_byte_data(&mut self, address: u8, register: u8, value: u8) -> Result<()> {
        self.select(address)?;
        trace!(
            path = %self.path.display(),
            "SMBus write 0x{:02x} reg 0x{:02x} <- 0x{:02x}",
            address,
            register,
            value
        );
        let mut data = SmbusData { byte: value };
        self.smbus_byte_data(ioctl::I2C_SMBUS_WRITE, register, &mut data)
    }

    async fn read_byte_data(&mut self, address: u8, register: u8) -> Result<u8> {
        self.select(address)?;
        let mut data = SmbusData { byte: 0 };
        self.smbus_byte_data(ioctl::I2C_SMBUS_READ, register, &mut data)?;
        // SAFETY: a byte-data read fills the `byte` member.
        let value = unsafe { data.byte };
        trace!(
            path = %self.path.display(),
            "SMBus read 0x{:02x} reg 0x{:02x} = 0x{:02x}",
            address,
            register,
            value
        );
        Ok(value)
    }
}
