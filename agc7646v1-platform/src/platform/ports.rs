//! Front-panel port layout.

/// Transceiver cage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PortKind {
    #[strum(to_string = "SFP+")]
    Sfp,
    #[strum(to_string = "QSFP28")]
    Qsfp,
}

/// One front-panel port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port {
    /// 1-based front-panel number
    pub number: u16,
    pub kind: PortKind,
    pub speed_gbps: u32,
    /// I2C bus the transceiver EEPROM is reached through
    pub eeprom_bus: u16,
}

/// EEPROM address of every transceiver, behind its own mux channel.
pub const TRANSCEIVER_EEPROM_ADDR: u8 = 0x50;

impl Port {
    /// optoe device type to bind on the transceiver EEPROM.
    pub fn eeprom_driver(&self) -> &'static str {
        match self.kind {
            PortKind::Sfp => "optoe2",
            PortKind::Qsfp => "optoe1",
        }
    }
}

/// A layout of SFP ports followed by QSFP ports.
///
/// Implementors give the group sizes and where each group's EEPROM buses
/// start; numbering and lookup are derived.
pub trait PortLayout {
    fn sfp_ports(&self) -> u16;
    fn sfp_speed_gbps(&self) -> u32;
    fn sfp_bus_base(&self) -> u16;
    fn qsfp_ports(&self) -> u16;
    fn qsfp_speed_gbps(&self) -> u32;
    fn qsfp_bus_base(&self) -> u16;

    fn port_count(&self) -> u16 {
        self.sfp_ports() + self.qsfp_ports()
    }

    /// Layout string in the host framework's notation, e.g. `46x10 + 6x100`.
    fn port_config(&self) -> String {
        format!(
            "{}x{} + {}x{}",
            self.sfp_ports(),
            self.sfp_speed_gbps(),
            self.qsfp_ports(),
            self.qsfp_speed_gbps()
        )
    }

    /// Port by 1-based number.
    fn port(&self, number: u16) -> Option<Port> {
        if number == 0 || number > self.port_count() {
            return None;
        }
        let port = if number <= self.sfp_ports() {
            Port {
                number,
                kind: PortKind::Sfp,
                speed_gbps: self.sfp_speed_gbps(),
                eeprom_bus: self.sfp_bus_base() + (number - 1),
            }
        } else {
            let index = number - self.sfp_ports() - 1;
            Port {
                number,
                kind: PortKind::Qsfp,
                speed_gbps: self.qsfp_speed_gbps(),
                eeprom_bus: self.qsfp_bus_base() + index,
            }
        };
        Some(port)
    }

    /// All ports in front-panel order.
    fn ports(&self) -> Vec<Port> {
        (1..=self.port_count()).filter_map(|n| self.port(n)).collect()
    }
}
