//! Linux backend: applies `HardwareOp`s to the running system.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::hw_op::{HardwareExecutor, HardwareOp};
use crate::hw_trait::{I2c, I2cDev};

pub mod kmod;
pub mod sysfs;

pub use kmod::ModuleLoader;
pub use sysfs::Sysfs;

/// Executor backed by i2c-dev, sysfs and the kernel module loader.
pub struct LinuxExecutor {
    dev_root: PathBuf,
    sysfs: Sysfs,
    modules: ModuleLoader,
}

impl LinuxExecutor {
    pub fn new(dev_root: impl Into<PathBuf>, sysfs: Sysfs, modules: ModuleLoader) -> Self {
        Self {
            dev_root: dev_root.into(),
            sysfs,
            modules,
        }
    }
}

#[async_trait]
impl HardwareExecutor for LinuxExecutor {
    async fn execute(&mut self, op: &HardwareOp) -> Result<()> {
        match op {
            HardwareOp::RegisterWrite {
                bus,
                address,
                register,
                value,
                force,
            } => {
                let mut i2c = I2cDev::open(&self.dev_root, *bus)?.force(*force);
                i2c.write_byte_data(*address, *register, *value).await
            }
            HardwareOp::RemoveI2cAdapter { .. } | HardwareOp::PciRescan => {
                let attribute = op
                    .sysfs_attribute()
                    .ok_or_else(|| Error::Unsupported(op.to_string()))?;
                self.sysfs.write(&attribute, "1").await
            }
            HardwareOp::ModuleLoad { name } => self.modules.load(name).await,
        }
    }
}
