//! Temperature and fan sensors.

use serde::Serialize;
use sysinfo::Components;

use super::error::HalResult;
#[cfg(any(target_os = "windows", target_os = "macos", target_os = "freebsd"))]
use {super::error::HalError, crate::platform::Platform};

/// A labelled temperature reading.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TemperatureReading {
    pub label: String,
    /// Degrees Celsius, if the sensor could be read.
    pub celsius: Option<f32>,
    pub critical: Option<f32>,
}

pub trait Sensors: Send + Sync {
    /// Every labelled temperature sensor.
    fn temperatures(&self) -> HalResult<Vec<TemperatureReading>>;

    /// Fan speeds in rpm. Empty if there are no fans;
    /// [`NotEnumerable`](super::error::HalError::NotEnumerable) if the
    /// platform gives us no way to read them.
    fn fan_speeds(&self) -> HalResult<Vec<u32>>;

    /// The CPU temperature in degrees Celsius, if any sensor looks like a CPU sensor.
    fn cpu_temperature(&self) -> HalResult<Option<f32>> {
        Ok(pick_cpu_temperature(&self.temperatures()?))
    }
}

/// Sensor labels that belong to the CPU package, from most to least specific.
const CPU_SENSOR_HINTS: [&str; 6] = ["package", "tctl", "k10temp", "coretemp", "cpu", "tdie"];

pub(crate) fn pick_cpu_temperature(readings: &[TemperatureReading]) -> Option<f32> {
    CPU_SENSOR_HINTS.iter().find_map(|hint| {
        readings
            .iter()
            .filter(|reading| reading.label.to_lowercase().contains(hint))
            .find_map(|reading| reading.celsius)
    })
}

/// Reads temperatures through sysinfo.
pub(crate) fn sysinfo_temperatures() -> Vec<TemperatureReading> {
    let components = Components::new_with_refreshed_list();

    components
        .list()
        .iter()
        .map(|component| TemperatureReading {
            label: component.label().to_string(),
            celsius: component.temperature().filter(|temp| temp.is_finite()),
            critical: component.critical(),
        })
        .collect()
}

/// [`Sensors`] through sysinfo only, for platforms that do not expose fans to us.
#[cfg(any(target_os = "windows", target_os = "macos", target_os = "freebsd"))]
#[derive(Debug, Default)]
pub(crate) struct SysinfoSensors;

#[cfg(any(target_os = "windows", target_os = "macos", target_os = "freebsd"))]
impl Sensors for SysinfoSensors {
    fn temperatures(&self) -> HalResult<Vec<TemperatureReading>> {
        Ok(sysinfo_temperatures())
    }

    fn fan_speeds(&self) -> HalResult<Vec<u32>> {
        Err(HalError::not_enumerable("fans", Platform::current()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn reading(label: &str, celsius: Option<f32>) -> TemperatureReading {
        TemperatureReading {
            label: label.to_string(),
            celsius,
            critical: None,
        }
    }

    #[test]
    fn cpu_package_preferred() {
        let readings = [
            reading("nvme Composite", Some(40.0)),
            reading("coretemp Core 0", Some(51.0)),
            reading("coretemp Package id 0", Some(55.0)),
        ];

        assert_eq!(pick_cpu_temperature(&readings), Some(55.0));
    }

    #[test]
    fn unreadable_sensors_skipped() {
        let readings = [reading("k10temp Tctl", None), reading("CPU", Some(48.5))];
        assert_eq!(pick_cpu_temperature(&readings), Some(48.5));
    }

    #[test]
    fn no_cpu_sensor() {
        let readings = [reading("acpitz temp1", Some(27.8))];
        assert_eq!(pick_cpu_temperature(&readings), None);
        assert_eq!(pick_cpu_temperature(&[]), None);
    }
}
