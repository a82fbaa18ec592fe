//! Linux backend. Most data comes from procfs and sysfs; memory, disks, networks and
//! temperatures go through sysinfo.

mod processor;
mod sysfs;

use std::path::PathBuf;

use self::{
    processor::{proc_root, LinuxProcessorSource},
    sysfs::Dmi,
};
use super::{
    computer_system::{model_with_version, ComputerSystem, Firmware},
    disks::{sysinfo_disk_stores, HwDiskStore},
    displays::Display,
    error::HalResult,
    memory::{GlobalMemory, SysinfoMemory},
    network::{sysinfo_network_ifs, NetworkIf},
    power::{battery_power_sources, PowerSource},
    processor::CentralProcessor,
    sensors::{sysinfo_temperatures, Sensors, TemperatureReading},
    sound::SoundCard,
    usb::{build_usb_forest, flatten_usb_records, UsbDevice},
    HardwareAbstractionLayer,
};
use crate::platform::Platform;

pub(crate) struct LinuxHardwareAbstractionLayer {
    proc_root: PathBuf,
    sys_root: PathBuf,
}

impl Default for LinuxHardwareAbstractionLayer {
    fn default() -> Self {
        Self::with_roots(proc_root().to_path_buf(), PathBuf::from("/sys"))
    }
}

impl LinuxHardwareAbstractionLayer {
    /// A layer reading procfs and sysfs from the given roots.
    pub(crate) fn with_roots(proc_root: PathBuf, sys_root: PathBuf) -> Self {
        Self {
            proc_root,
            sys_root,
        }
    }
}

impl HardwareAbstractionLayer for LinuxHardwareAbstractionLayer {
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    fn create_computer_system(&self) -> Box<dyn ComputerSystem> {
        Box::new(LinuxComputerSystem {
            dmi: Dmi::new(self.sys_root.join("class/dmi/id")),
        })
    }

    fn create_memory(&self) -> Box<dyn GlobalMemory> {
        Box::new(SysinfoMemory)
    }

    fn create_processor(&self) -> CentralProcessor {
        CentralProcessor::new(Box::new(LinuxProcessorSource::new(self.proc_root.clone())))
    }

    fn create_sensors(&self) -> Box<dyn Sensors> {
        Box::new(LinuxSensors {
            hwmon_root: self.sys_root.join("class/hwmon"),
        })
    }

    fn disk_stores(&self) -> HalResult<Vec<HwDiskStore>> {
        sysinfo_disk_stores()
    }

    fn displays(&self) -> HalResult<Vec<Display>> {
        sysfs::drm_displays(&self.sys_root.join("class/drm"))
    }

    fn network_ifs(&self) -> HalResult<Vec<NetworkIf>> {
        sysinfo_network_ifs()
    }

    fn sound_cards(&self) -> HalResult<Vec<SoundCard>> {
        sysfs::sound_cards(&self.proc_root.join("asound"))
    }

    fn power_sources(&self) -> HalResult<Vec<PowerSource>> {
        battery_power_sources()
    }

    fn usb_devices(&self, tree: bool) -> HalResult<Vec<UsbDevice>> {
        let records = sysfs::usb_records(&self.sys_root.join("bus/usb/devices"))?;

        Ok(if tree {
            build_usb_forest(&records)
        } else {
            flatten_usb_records(&records)
        })
    }
}

/// DMI identity. Fields the kernel hides from unprivileged users (like the serial number)
/// come back as unknown.
struct LinuxComputerSystem {
    dmi: Dmi,
}

impl ComputerSystem for LinuxComputerSystem {
    fn manufacturer(&self) -> HalResult<Option<String>> {
        self.dmi.attribute("sys_vendor")
    }

    fn model(&self) -> HalResult<Option<String>> {
        let name = self.dmi.attribute("product_name")?;
        let version = self.dmi.attribute("product_version")?;

        Ok(model_with_version(name, version))
    }

    fn serial_number(&self) -> HalResult<Option<String>> {
        self.dmi.attribute("product_serial")
    }

    fn firmware(&self) -> HalResult<Firmware> {
        self.dmi.firmware()
    }
}

struct LinuxSensors {
    hwmon_root: PathBuf,
}

impl Sensors for LinuxSensors {
    fn temperatures(&self) -> HalResult<Vec<TemperatureReading>> {
        Ok(sysinfo_temperatures())
    }

    fn fan_speeds(&self) -> HalResult<Vec<u32>> {
        sysfs::hwmon_fan_speeds(&self.hwmon_root)
    }
}
