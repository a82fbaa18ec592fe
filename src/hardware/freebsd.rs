//! FreeBSD backend. CPU ticks come from the `kern.cp_time` sysctl and the machine's
//! identity from the `smbios.*` kernel environment the loader fills in.

use std::{ffi::CString, io, mem::size_of};

use libc::{c_char, c_int, c_long, c_void};
use sysctl::{CtlValue, Sysctl};

use super::{
    computer_system::{model_with_version, ComputerSystem, Firmware},
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
    usb::UsbDevice,
    HardwareAbstractionLayer,
};
use crate::{platform::Platform, utils::strings::firmware_value};

/// `CPUSTATES` from `sys/resource.h`: user, nice, sys, intr, idle.
const CPUSTATES: usize = 5;

/// `KENV_MVALLEN` from `sys/kenv.h`, plus the terminating NUL.
const KENV_VALUE_LEN: usize = 128 + 1;

#[derive(Default)]
pub(crate) struct FreeBsdHardwareAbstractionLayer;

impl HardwareAbstractionLayer for FreeBsdHardwareAbstractionLayer {
    fn platform(&self) -> Platform {
        Platform::FreeBsd
    }

    fn create_computer_system(&self) -> Box<dyn ComputerSystem> {
        Box::new(FreeBsdComputerSystem)
    }

    fn create_memory(&self) -> Box<dyn GlobalMemory> {
        Box::new(SysinfoMemory)
    }

    fn create_processor(&self) -> CentralProcessor {
        CentralProcessor::new(Box::new(FreeBsdProcessorSource::default()))
    }

    fn create_sensors(&self) -> Box<dyn Sensors> {
        Box::new(SysinfoSensors)
    }

    fn disk_stores(&self) -> HalResult<Vec<HwDiskStore>> {
        sysinfo_disk_stores()
    }

    fn displays(&self) -> HalResult<Vec<Display>> {
        Err(HalError::not_enumerable("displays", Platform::FreeBsd))
    }

    fn network_ifs(&self) -> HalResult<Vec<NetworkIf>> {
        sysinfo_network_ifs()
    }

    fn sound_cards(&self) -> HalResult<Vec<SoundCard>> {
        Err(HalError::not_enumerable("sound cards", Platform::FreeBsd))
    }

    fn power_sources(&self) -> HalResult<Vec<PowerSource>> {
        battery_power_sources()
    }

    fn usb_devices(&self, _tree: bool) -> HalResult<Vec<UsbDevice>> {
        Err(HalError::not_enumerable("usb devices", Platform::FreeBsd))
    }
}

#[derive(Default)]
struct FreeBsdProcessorSource {
    cpu_usage: SysinfoCpuUsage,
}

impl ProcessorSource for FreeBsdProcessorSource {
    fn identity(&self) -> HalResult<ProcessorIdentity> {
        let mut identity = sysinfo_identity();

        if identity.name.is_empty() {
            if let Ok(CtlValue::String(model)) =
                sysctl::Ctl::new("hw.model").and_then(|ctl| ctl.value())
            {
                identity.name = model.trim().to_string();
            }
        }

        identity.cpu64 = Some(cfg!(target_pointer_width = "64"));
        Ok(identity)
    }

    fn cpu_load_ticks(&self) -> HalResult<CpuTicks> {
        let mut cp_time: [c_long; CPUSTATES] = [0; CPUSTATES];
        let mut size = size_of::<[c_long; CPUSTATES]>();

        // SAFETY: `cp_time` is exactly `size` writable bytes.
        let result = unsafe {
            libc::sysctlbyname(
                c"kern.cp_time".as_ptr(),
                cp_time.as_mut_ptr() as *mut c_void,
                &mut size,
                std::ptr::null_mut(),
                0,
            )
        };

        if result < 0 {
            return Err(HalError::from_io(
                "sysctl kern.cp_time",
                &io::Error::last_os_error(),
            ));
        }

        Ok(ticks_from_cp_time(cp_time))
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

/// Interrupt time counts as system time.
fn ticks_from_cp_time(cp_time: [c_long; CPUSTATES]) -> CpuTicks {
    let [user, nice, sys, intr, idle] = cp_time.map(|ticks| ticks.max(0) as u64);
    CpuTicks::new(user, nice, sys.saturating_add(intr), idle)
}

/// Reads a kernel environment variable. One the loader did not set is [`None`].
fn kenv_get(name: &str) -> HalResult<Option<String>> {
    let c_name = CString::new(name)
        .map_err(|_| HalError::malformed("kenv", format!("'{name}' contains a NUL byte")))?;
    let mut value = [0 as c_char; KENV_VALUE_LEN];

    // SAFETY: `value` is KENV_VALUE_LEN writable bytes, which is the length we pass.
    let result = unsafe {
        libc::kenv(
            libc::KENV_GET,
            c_name.as_ptr(),
            value.as_mut_ptr(),
            KENV_VALUE_LEN as c_int,
        )
    };

    if result < 0 {
        let err = io::Error::last_os_error();
        return match err.raw_os_error() {
            Some(libc::ENOENT) => Ok(None),
            _ => Err(HalError::from_io(format!("kenv {name}"), &err)),
        };
    }

    let bytes: Vec<u8> = value
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    Ok(firmware_value(&String::from_utf8_lossy(&bytes)))
}

struct FreeBsdComputerSystem;

impl ComputerSystem for FreeBsdComputerSystem {
    fn manufacturer(&self) -> HalResult<Option<String>> {
        kenv_get("smbios.system.maker")
    }

    fn model(&self) -> HalResult<Option<String>> {
        Ok(model_with_version(
            kenv_get("smbios.system.product")?,
            kenv_get("smbios.system.version")?,
        ))
    }

    fn serial_number(&self) -> HalResult<Option<String>> {
        kenv_get("smbios.system.serial")
    }

    fn firmware(&self) -> HalResult<Firmware> {
        Ok(Firmware {
            vendor: kenv_get("smbios.bios.vendor")?,
            version: kenv_get("smbios.bios.version")?,
            release_date: kenv_get("smbios.bios.reldate")?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn interrupts_fold_into_system() {
        assert_eq!(
            ticks_from_cp_time([100, 5, 40, 10, 800]).as_array(),
            [100, 5, 50, 800]
        );
    }

    #[test]
    fn unset_kenv() {
        assert_eq!(kenv_get("hwscope.does.not.exist").unwrap(), None);
    }

    #[test]
    fn devices_are_not_enumerable() {
        let layer = FreeBsdHardwareAbstractionLayer;

        assert!(matches!(
            layer.usb_devices(true),
            Err(HalError::NotEnumerable { platform: Platform::FreeBsd, .. })
        ));
        assert!(layer.displays().is_err());
        assert!(layer.sound_cards().is_err());
    }

    #[test]
    fn live_cp_time() {
        assert!(FreeBsdProcessorSource::default().cpu_load_ticks().unwrap().total() > 0);
    }
}
