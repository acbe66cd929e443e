//! Typed hardware operations and the executors that carry them out.
//!
//! Bring-up is expressed as a list of `HardwareOp`s rather than ad-hoc
//! shell commands. The Linux executor applies them to the running system;
//! `RecordingExecutor` only remembers them, which backs `--dry-run` and the
//! sequencing tests.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// One side-effecting step of board bring-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareOp {
    /// SMBus byte-data write to a register of an I2C device.
    RegisterWrite {
        bus: u8,
        address: u8,
        register: u8,
        value: u8,
        /// Address the device even when a kernel driver has bound it.
        force: bool,
    },
    /// Remove the physical device behind an I2C adapter from the device
    /// tree so it is re-enumerated on the next PCI rescan.
    RemoveI2cAdapter { bus: u8 },
    /// Ask the kernel to re-enumerate the PCI bus.
    PciRescan,
    /// Load a kernel module by name.
    ModuleLoad { name: String },
}

impl HardwareOp {
    /// Sysfs attribute (relative to the sysfs root) written by this op, if any.
    pub fn sysfs_attribute(&self) -> Option<PathBuf> {
        match self {
            HardwareOp::RemoveI2cAdapter { bus } => Some(PathBuf::from(format!(
                "bus/i2c/devices/i2c-{}/firmware_node/physical_node/remove",
                bus
            ))),
            HardwareOp::PciRescan => Some(PathBuf::from("bus/pci/rescan")),
            HardwareOp::RegisterWrite { .. } | HardwareOp::ModuleLoad { .. } => None,
        }
    }
}

impl fmt::Display for HardwareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareOp::RegisterWrite {
                bus,
                address,
                register,
                value,
                force,
            } => {
                write!(
                    f,
                    "i2c {}-{:04x}: reg 0x{:02x} <- 0x{:02x}",
                    bus, address, register, value
                )?;
                if *force {
                    write!(f, " (forced)")?;
                }
                Ok(())
            }
            HardwareOp::RemoveI2cAdapter { bus } => write!(f, "remove i2c-{} physical node", bus),
            HardwareOp::PciRescan => write!(f, "rescan PCI bus"),
            HardwareOp::ModuleLoad { name } => write!(f, "load module {}", name),
        }
    }
}

/// Something that can apply hardware operations.
#[async_trait]
pub trait HardwareExecutor: Send {
    async fn execute(&mut self, op: &HardwareOp) -> Result<()>;
}

/// Executor that records operations instead of performing them.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    executed: Vec<HardwareOp>,
    failing: Vec<HardwareOp>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `op` report failure (it is still recorded).
    pub fn fail_on(mut self, op: HardwareOp) -> Self {
        self.failing.push(op);
        self
    }

    /// Operations seen so far, in order.
    pub fn executed(&self) -> &[HardwareOp] {
        &self.executed
    }
}

#[async_trait]
impl HardwareExecutor for RecordingExecutor {
    async fn execute(&mut self, op: &HardwareOp) -> Result<()> {
        self.executed.push(op.clone());
        if self.failing.contains(op) {
            return Err(Error::Hardware(format!("simulated failure: {}", op)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(
        HardwareOp::RegisterWrite {
            bus: 0,
            address: 0x31,
            register: 0x14,
            value: 0xfd,
            force: false,
        },
        "i2c 0-0031: reg 0x14 <- 0xfd";
        "register write"
    )]
    #[test_case(
        HardwareOp::RegisterWrite {
            bus: 0,
            address: 0x31,
            register: 0x14,
            value: 0xfc,
            force: true,
        },
        "i2c 0-0031: reg 0x14 <- 0xfc (forced)";
        "forced register write"
    )]
    #[test_case(HardwareOp::RemoveI2cAdapter { bus: 0 }, "remove i2c-0 physical node"; "remove")]
    #[test_case(HardwareOp::PciRescan, "rescan PCI bus"; "rescan")]
    #[test_case(HardwareOp::ModuleLoad { name: "optoe".into() }, "load module optoe"; "module")]
    fn test_display(op: HardwareOp, expected: &str) {
        assert_eq!(op.to_string(), expected);
    }

    #[test]
    fn test_sysfs_attributes() {
        assert_eq!(
            HardwareOp::RemoveI2cAdapter { bus: 0 }.sysfs_attribute(),
            Some(PathBuf::from(
                "bus/i2c/devices/i2c-0/firmware_node/physical_node/remove"
            ))
        );
        assert_eq!(
            HardwareOp::PciRescan.sysfs_attribute(),
            Some(PathBuf::from("bus/pci/rescan"))
        );
        assert_eq!(
            HardwareOp::ModuleLoad { name: "optoe".into() }.sysfs_attribute(),
            None
        );
    }

    #[tokio::test]
    async fn test_recording_executor_fails_selected_ops() {
        let mut exec = RecordingExecutor::new().fail_on(HardwareOp::PciRescan);

        assert!(exec.execute(&HardwareOp::PciRescan).await.is_err());
        exec.execute(&HardwareOp::ModuleLoad { name: "optoe".into() })
            .await
            .unwrap();

        assert_eq!(exec.executed().len(), 2);
        assert_eq!(exec.executed()[0], HardwareOp::PciRescan);
    }
}
