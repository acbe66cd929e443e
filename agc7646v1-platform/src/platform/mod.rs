//! Platform description.
//!
//! A platform is the composition of three capabilities: its identity, its
//! port layout, and the base-config hook run once at boot. Each is a trait
//! so boards pick up shared behavior by implementing them, not by deriving
//! from a common base.

use async_trait::async_trait;

use crate::hw_op::{HardwareExecutor, HardwareOp};
use crate::tracing::prelude::*;

pub mod agc7646v1;
pub mod ports;

pub use agc7646v1::Agc7646v1;
pub use ports::{Port, PortKind, PortLayout};

/// Who the platform is.
pub trait PlatformIdentity {
    /// Full platform name, including revision (`...-r0`)
    fn platform(&self) -> &str;
    fn model(&self) -> &str;
    fn manufacturer(&self) -> &str;
    /// IANA private enterprise number of the manufacturer
    fn private_enterprise_number(&self) -> u32;
    /// Suffix appended to the enterprise OID, e.g. `.7648.1`
    fn sys_object_id(&self) -> &str;

    /// SNMP sysObjectID.
    fn sys_oid(&self) -> String {
        format!(
            ".1.3.6.1.4.1.{}{}",
            self.private_enterprise_number(),
            self.sys_object_id()
        )
    }

    /// Platform name without the revision suffix.
    fn platform_basename(&self) -> &str {
        let name = self.platform();
        match name.rsplit_once("-r") {
            Some((base, rev)) if !rev.is_empty() && rev.bytes().all(|b| b.is_ascii_digit()) => {
                base
            }
            _ => name,
        }
    }

    /// Vendor directory name used in the module tree.
    fn vendor(&self) -> String {
        self.manufacturer().to_ascii_lowercase()
    }
}

/// One-time bring-up hook.
#[async_trait]
pub trait BaseConfig: PlatformIdentity + Sync {
    /// Operations performed by `baseconfig`, in order.
    fn base_config_ops(&self) -> Vec<HardwareOp>;

    /// Run every bring-up operation in order.
    ///
    /// Each operation is attempted whatever happened to the previous ones;
    /// failures are logged and otherwise ignored. Always returns `true`.
    async fn baseconfig(&self, executor: &mut dyn HardwareExecutor) -> bool {
        let ops = self.base_config_ops();
        info!(platform = self.platform(), steps = ops.len(), "Starting base configuration");

        let mut failed = 0usize;
        for (i, op) in ops.iter().enumerate() {
            let step = i + 1;
            debug!(step, %op, "Executing");
            if let Err(e) = executor.execute(op).await {
                failed += 1;
                warn!(step, %op, error = %e, "Step failed, continuing");
            }
        }

        if failed == 0 {
            info!(platform = self.platform(), "Base configuration complete");
        } else {
            warn!(platform = self.platform(), failed, "Base configuration complete with failures");
        }
        true
    }
}
