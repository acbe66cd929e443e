//! Delta AGC7646V1: 46 x 10G SFP+ and 6 x 100G QSFP28.

use crate::hw_op::HardwareOp;
use crate::peripheral::cpld::{registers, Bus0Mux, CPUPLD_ADDR, CPUPLD_BUS};

use super::{BaseConfig, PlatformIdentity, PortLayout};

/// Optical transceiver EEPROM driver
pub const MODULE_OPTOE: &str = "optoe";

/// Board platform driver (CPLD, muxes, transceiver EEPROM devices)
pub const MODULE_PLATFORM: &str = "delta_agc7646v1_platform";

/// The AGC7646V1 switch, revision 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct Agc7646v1;

impl PlatformIdentity for Agc7646v1 {
    fn platform(&self) -> &str {
        "x86-64-delta-agc7646v1-r0"
    }

    fn model(&self) -> &str {
        "AGC7646V1"
    }

    fn manufacturer(&self) -> &str {
        "Delta"
    }

    fn private_enterprise_number(&self) -> u32 {
        2254
    }

    fn sys_object_id(&self) -> &str {
        ".7648.1"
    }
}

impl PortLayout for Agc7646v1 {
    fn sfp_ports(&self) -> u16 {
        46
    }

    fn sfp_speed_gbps(&self) -> u32 {
        10
    }

    fn sfp_bus_base(&self) -> u16 {
        51
    }

    fn qsfp_ports(&self) -> u16 {
        6
    }

    fn qsfp_speed_gbps(&self) -> u32 {
        100
    }

    fn qsfp_bus_base(&self) -> u16 {
        41
    }
}

impl BaseConfig for Agc7646v1 {
    fn base_config_ops(&self) -> Vec<HardwareOp> {
        let bus0_mux = |mux: Bus0Mux, force: bool| HardwareOp::RegisterWrite {
            bus: CPUPLD_BUS,
            address: CPUPLD_ADDR,
            register: registers::BUS0_MUX,
            value: mux.value(),
            force,
        };

        vec![
            bus0_mux(Bus0Mux::Rescan, false),
            HardwareOp::RemoveI2cAdapter { bus: CPUPLD_BUS },
            HardwareOp::PciRescan,
            HardwareOp::ModuleLoad {
                name: MODULE_OPTOE.into(),
            },
            HardwareOp::ModuleLoad {
                name: MODULE_PLATFORM.into(),
            },
            // The platform driver now owns 0x31, hence the forced write.
            // Parking the mux on the ID EEPROM keeps onlpd and onlp-snmpd
            // off the switch-board peripherals.
            bus0_mux(Bus0Mux::IdEeprom, true),
        ]
    }
}
