//! Thermal sensor inventory.
//!
//! The CPU package temperature comes from the coretemp hwmon driver; every
//! other sensor on this board lives behind the BMC.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::linux::Sysfs;
use crate::tracing::prelude::*;

/// Where a sensor's reading comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SensorSource {
    #[strum(to_string = "coretemp")]
    CpuCore,
    #[strum(to_string = "bmc")]
    Bmc,
}

/// A thermal sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermalSensor {
    pub id: u8,
    pub description: &'static str,
    pub source: SensorSource,
    /// PSU the sensor belongs to, if any
    pub psu: Option<u8>,
}

pub const SENSORS: [ThermalSensor; 8] = [
    ThermalSensor {
        id: 1,
        description: "CPU Core",
        source: SensorSource::CpuCore,
        psu: None,
    },
    ThermalSensor {
        id: 2,
        description: "Board sensor on Fan_BD (UT15)",
        source: SensorSource::Bmc,
        psu: None,
    },
    ThermalSensor {
        id: 3,
        description: "Board sensor near MAC (U24)",
        source: SensorSource::Bmc,
        psu: None,
    },
    ThermalSensor {
        id: 4,
        description: "Board sensor near MAC (U25)",
        source: SensorSource::Bmc,
        psu: None,
    },
    ThermalSensor {
        id: 5,
        description: "Board sensor near MAC (U3 REMOTE)",
        source: SensorSource::Bmc,
        psu: None,
    },
    ThermalSensor {
        id: 6,
        description: "Board sensor near MAC (U3 LOCAL)",
        source: SensorSource::Bmc,
        psu: None,
    },
    ThermalSensor {
        id: 7,
        description: "PSU-1 internal sensor",
        source: SensorSource::Bmc,
        psu: Some(1),
    },
    ThermalSensor {
        id: 8,
        description: "PSU-2 internal sensor",
        source: SensorSource::Bmc,
        psu: Some(2),
    },
];

/// Number of coretemp inputs exposed on this CPU.
const CORETEMP_INPUTS: u8 = 9;

/// Look up a sensor by id.
pub fn sensor(id: u8) -> Option<&'static ThermalSensor> {
    SENSORS.iter().find(|s| s.id == id)
}

fn coretemp_input(index: u8) -> PathBuf {
    PathBuf::from(format!(
        "devices/platform/coretemp.0/hwmon/hwmon0/temp{}_input",
        index
    ))
}

/// Hottest CPU core reading, in millidegrees Celsius.
///
/// Unreadable or malformed inputs are skipped; at least one must read.
pub async fn read_cpu_core_millicelsius(sysfs: &Sysfs) -> Result<i32> {
    let mut hottest: Option<i32> = None;
    for index in 1..=CORETEMP_INPUTS {
        let attribute = coretemp_input(index);
        let value = match sysfs.read(&attribute).await {
            Ok(text) => text.parse::<i32>().ok(),
            Err(_) => None,
        };
        match value {
            Some(mc) => hottest = Some(hottest.map_or(mc, |h| h.max(mc))),
            None => trace!(input = index, "coretemp input unavailable"),
        }
    }
    hottest.ok_or_else(|| Error::Hardware("no readable coretemp input".into()))
}

/// Read a sensor, in millidegrees Celsius.
pub async fn read_millicelsius(sysfs: &Sysfs, sensor: &ThermalSensor) -> Result<i32> {
    match sensor.source {
        SensorSource::CpuCore => read_cpu_core_millicelsius(sysfs).await,
        SensorSource::Bmc => Err(Error::Unsupported(format!(
            "{} is read through the BMC",
            sensor.description
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_coretemp(root: &TempDir, inputs: &[(u8, &str)]) -> Sysfs {
        let dir = root.path().join("devices/platform/coretemp.0/hwmon/hwmon0");
        std::fs::create_dir_all(&dir).unwrap();
        for (index, value) in inputs {
            std::fs::write(dir.join(format!("temp{}_input", index)), value).unwrap();
        }
        Sysfs::new(root.path())
    }

    #[test]
    fn test_inventory() {
        assert_eq!(SENSORS.len(), 8);
        assert_eq!(sensor(1).unwrap().source, SensorSource::CpuCore);
        assert_eq!(sensor(8).unwrap().psu, Some(2));
        assert!(sensor(0).is_none());
        assert!(sensor(9).is_none());
    }

    #[tokio::test]
    async fn test_cpu_core_takes_maximum() {
        let root = tempfile::tempdir().unwrap();
        let sysfs = fake_coretemp(&root, &[(1, "41000\n"), (2, "47000\n"), (5, "39000\n")]);
        assert_eq!(read_cpu_core_millicelsius(&sysfs).await.unwrap(), 47000);
    }

    #[tokio::test]
    async fn test_cpu_core_skips_garbage() {
        let root = tempfile::tempdir().unwrap();
        let sysfs = fake_coretemp(&root, &[(1, "n/a\n"), (3, "52000\n")]);
        assert_eq!(read_cpu_core_millicelsius(&sysfs).await.unwrap(), 52000);
    }

    #[tokio::test]
    async fn test_cpu_core_without_inputs() {
        let root = tempfile::tempdir().unwrap();
        let sysfs = Sysfs::new(root.path());
        assert!(matches!(
            read_cpu_core_millicelsius(&sysfs).await,
            Err(Error::Hardware(_))
        ));
    }

    #[tokio::test]
    async fn test_bmc_sensor_unsupported() {
        let root = tempfile::tempdir().unwrap();
        let sysfs = Sysfs::new(root.path());
        assert!(matches!(
            read_millicelsius(&sysfs, sensor(3).unwrap()).await,
            Err(Error::Unsupported(_))
        ));
    }
}
