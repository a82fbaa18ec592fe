//! Windows backend. CPU times come from `GetSystemTimes`, firmware identity, monitors and
//! sound drivers from the registry, and USB devices from the configuration manager. The
//! rest goes through sysinfo and the battery crate.

mod devices;
mod registry;

use std::env;

use windows::Win32::{Foundation::FILETIME, System::Threading::GetSystemTimes};

use self::registry::WindowsComputerSystem;
use super::{
    computer_system::ComputerSystem,
    disks::{sysinfo_disk_stores, HwDiskStore},
    displays::Display,
    error::{HalError, HalResult},
    memory::{GlobalMemory, SysinfoMemory},
    network::{sysinfo_network_ifs, NetworkIf},
    power::{battery_power_sources, PowerSource},
    processor::{
        logical_processor_count, one_minute_load_average, sysinfo_identity, CentralProcessor,
        CpuTicks, ProcessorIdentity, ProcessorSource, SysinfoCpuUsage,
    },
    sensors::{Sensors, SysinfoSensors},
    sound::SoundCard,
    usb::{build_usb_forest, flatten_usb_records, UsbDevice},
    HardwareAbstractionLayer,
};
use crate::platform::Platform;

#[derive(Default)]
pub(crate) struct WindowsHardwareAbstractionLayer;

impl HardwareAbstractionLayer for WindowsHardwareAbstractionLayer {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    fn create_computer_system(&self) -> Box<dyn ComputerSystem> {
        Box::new(WindowsComputerSystem)
    }

    fn create_memory(&self) -> Box<dyn GlobalMemory> {
        Box::new(SysinfoMemory)
    }

    fn create_processor(&self) -> CentralProcessor {
        CentralProcessor::new(Box::new(WindowsProcessorSource::default()))
    }

    fn create_sensors(&self) -> Box<dyn Sensors> {
        Box::new(SysinfoSensors)
    }

    fn disk_stores(&self) -> HalResult<Vec<HwDiskStore>> {
        sysinfo_disk_stores()
    }

    fn displays(&self) -> HalResult<Vec<Display>> {
        registry::monitor_displays()
    }

    fn network_ifs(&self) -> HalResult<Vec<NetworkIf>> {
        sysinfo_network_ifs()
    }

    fn sound_cards(&self) -> HalResult<Vec<SoundCard>> {
        registry::sound_cards()
    }

    fn power_sources(&self) -> HalResult<Vec<PowerSource>> {
        battery_power_sources()
    }

    fn usb_devices(&self, tree: bool) -> HalResult<Vec<UsbDevice>> {
        let records = devices::usb_records()?;

        Ok(if tree {
            build_usb_forest(&records)
        } else {
            flatten_usb_records(&records)
        })
    }
}

#[derive(Default)]
struct WindowsProcessorSource {
    cpu_usage: SysinfoCpuUsage,
}

impl ProcessorSource for WindowsProcessorSource {
    fn identity(&self) -> HalResult<ProcessorIdentity> {
        let identifier = env::var("PROCESSOR_IDENTIFIER").ok();
        let architecture = env::var("PROCESSOR_ARCHITECTURE").ok();

        Ok(windows_identity(
            sysinfo_identity(),
            identifier.as_deref(),
            architecture.as_deref(),
        ))
    }

    fn cpu_load_ticks(&self) -> HalResult<CpuTicks> {
        let mut idle = FILETIME::default();
        let mut kernel = FILETIME::default();
        let mut user = FILETIME::default();

        // SAFETY: All three pointers are to live, writable FILETIMEs owned by this frame.
        unsafe {
            GetSystemTimes(
                Some(&mut idle as *mut FILETIME),
                Some(&mut kernel as *mut FILETIME),
                Some(&mut user as *mut FILETIME),
            )
        }
        .map_err(|err| HalError::native("GetSystemTimes", err.code().0, err.message()))?;

        let (idle, kernel, user) = (
            filetime_to_u64(idle),
            filetime_to_u64(kernel),
            filetime_to_u64(user),
        );

        Ok(ticks_from_system_times(idle, kernel, user))
    }

    fn logical_processor_count(&self) -> usize {
        logical_processor_count()
    }

    fn system_load_average(&self) -> Option<f64> {
        one_minute_load_average()
    }

    fn system_cpu_load(&self) -> f32 {
        self.cpu_usage.refresh()
    }
}

#[inline]
fn filetime_to_u64(time: FILETIME) -> u64 {
    (u64::from(time.dwHighDateTime) << 32) | u64::from(time.dwLowDateTime)
}

/// Kernel time includes idle time, so idle is taken out of the system bucket. Windows has
/// no nice time.
fn ticks_from_system_times(idle: u64, kernel: u64, user: u64) -> CpuTicks {
    CpuTicks::new(user, 0, kernel.saturating_sub(idle), idle)
}

/// Fills the identifier and 64-bit flag in from the `PROCESSOR_IDENTIFIER` and
/// `PROCESSOR_ARCHITECTURE` environment variables, which look like
/// `Intel64 Family 6 Model 158 Stepping 10, GenuineIntel` and `AMD64`.
fn windows_identity(
    mut identity: ProcessorIdentity, identifier: Option<&str>, architecture: Option<&str>,
) -> ProcessorIdentity {
    if let Some(identifier) = identifier {
        let (ident, vendor) = match identifier.rsplit_once(',') {
            Some((ident, vendor)) => (ident.trim(), Some(vendor.trim())),
            None => (identifier.trim(), None),
        };

        identity.identifier = ident.to_string();
        if identity.vendor.is_empty() {
            if let Some(vendor) = vendor {
                identity.vendor = vendor.to_string();
            }
        }
    }

    identity.cpu64 = architecture.map(|arch| {
        matches!(
            arch.trim().to_ascii_uppercase().as_str(),
            "AMD64" | "ARM64" | "IA64"
        )
    });

    identity
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kernel_time_excludes_idle() {
        let ticks = ticks_from_system_times(600, 800, 300);
        assert_eq!(ticks.as_array(), [300, 0, 200, 600]);
    }

    #[test]
    fn filetime_halves() {
        let time = FILETIME {
            dwLowDateTime: 0x0000_0002,
            dwHighDateTime: 0x0000_0001,
        };
        assert_eq!(filetime_to_u64(time), 0x1_0000_0002);
    }

    #[test]
    fn identity_from_environment() {
        let identity = windows_identity(
            ProcessorIdentity {
                name: "Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz".into(),
                ..Default::default()
            },
            Some("Intel64 Family 6 Model 158 Stepping 10, GenuineIntel"),
            Some("AMD64"),
        );

        assert_eq!(identity.vendor, "GenuineIntel");
        assert_eq!(identity.identifier, "Intel64 Family 6 Model 158 Stepping 10");
        assert_eq!(identity.cpu64, Some(true));
    }

    #[test]
    fn identity_without_environment() {
        let identity = windows_identity(ProcessorIdentity::default(), None, Some("x86"));

        assert_eq!(identity.identifier, "");
        assert_eq!(identity.cpu64, Some(false));
        assert_eq!(windows_identity(ProcessorIdentity::default(), None, None).cpu64, None);
    }

    #[test]
    fn live_usb_tree_matches_flat_list() {
        let layer = WindowsHardwareAbstractionLayer;

        let tree = layer.usb_devices(true).unwrap();
        let flat = layer.usb_devices(false).unwrap();
        assert_eq!(
            tree.iter().map(UsbDevice::subtree_len).sum::<usize>(),
            flat.len()
        );
    }

    #[test]
    fn live_computer_system() {
        let system = WindowsHardwareAbstractionLayer.create_computer_system();
        system.manufacturer().unwrap();
        system.firmware().unwrap();
    }

    #[test]
    fn live_system_times() {
        let ticks = WindowsProcessorSource::default().cpu_load_ticks().unwrap();
        assert!(ticks.total() > 0);
    }
}
