//! macOS backend. CPU ticks come from the mach host statistics and identity from sysctl.

mod bindings;

use std::{
    ffi::CString,
    io,
    mem::{size_of, MaybeUninit},
};

use libc::{c_int, c_void};
use mach2::{kern_return::KERN_SUCCESS, mach_port::mach_port_deallocate, traps::mach_task_self};

use self::bindings::*;
use super::{
    computer_system::{ComputerSystem, Firmware},
    disks::{sysinfo_disk_stores, HwDiskStore},
    displays::Display,
    error::{HalError, HalResult},
    memory::{GlobalMemory, SysinfoMemory},
    network::{sysinfo_network_ifs, NetworkIf},
    power::{battery_power_sources, PowerSource},
    processor::{
        logical_processor_count, one_minute_load_average, sysinfo_identity, x86_identifier,
        CentralProcessor, CpuTicks, ProcessorIdentity, ProcessorSource, SysinfoCpuUsage,
    },
    sensors::{Sensors, SysinfoSensors},
    sound::SoundCard,
    usb::UsbDevice,
    HardwareAbstractionLayer,
};
use crate::platform::Platform;

#[derive(Default)]
pub(crate) struct MacHardwareAbstractionLayer;

impl HardwareAbstractionLayer for MacHardwareAbstractionLayer {
    fn platform(&self) -> Platform {
        Platform::MacOs
    }

    fn create_computer_system(&self) -> Box<dyn ComputerSystem> {
        Box::new(MacComputerSystem)
    }

    fn create_memory(&self) -> Box<dyn GlobalMemory> {
        Box::new(SysinfoMemory)
    }

    fn create_processor(&self) -> CentralProcessor {
        CentralProcessor::new(Box::new(MacProcessorSource::default()))
    }

    fn create_sensors(&self) -> Box<dyn Sensors> {
        Box::new(SysinfoSensors)
    }

    fn disk_stores(&self) -> HalResult<Vec<HwDiskStore>> {
        sysinfo_disk_stores()
    }

    fn displays(&self) -> HalResult<Vec<Display>> {
        Err(HalError::not_enumerable("displays", Platform::MacOs))
    }

    fn network_ifs(&self) -> HalResult<Vec<NetworkIf>> {
        sysinfo_network_ifs()
    }

    fn sound_cards(&self) -> HalResult<Vec<SoundCard>> {
        Err(HalError::not_enumerable("sound cards", Platform::MacOs))
    }

    fn power_sources(&self) -> HalResult<Vec<PowerSource>> {
        battery_power_sources()
    }

    fn usb_devices(&self, _tree: bool) -> HalResult<Vec<UsbDevice>> {
        Err(HalError::not_enumerable("usb devices", Platform::MacOs))
    }
}

/// Reads a sysctl by name into `buf`, returning how many bytes were written. A name the
/// kernel does not know is [`None`].
fn sysctl_raw(name: &str, buf: *mut c_void, len: usize) -> HalResult<Option<usize>> {
    let c_name = CString::new(name)
        .map_err(|_| HalError::malformed("sysctl", format!("'{name}' contains a NUL byte")))?;
    let mut size = len;

    // SAFETY: `buf` points to at least `len` writable bytes, and `size` tells the kernel so.
    let result = unsafe {
        libc::sysctlbyname(c_name.as_ptr(), buf, &mut size, std::ptr::null_mut(), 0)
    };

    if result < 0 {
        let err = io::Error::last_os_error();
        return match err.raw_os_error() {
            Some(libc::ENOENT) => Ok(None),
            _ => Err(HalError::from_io(format!("sysctl {name}"), &err)),
        };
    }

    Ok(Some(size))
}

fn sysctl_int(name: &str) -> HalResult<Option<c_int>> {
    let mut value: c_int = 0;
    let written = sysctl_raw(name, (&mut value as *mut c_int).cast(), size_of::<c_int>())?;
    Ok(written.map(|_| value))
}

fn sysctl_string(name: &str) -> HalResult<Option<String>> {
    let mut buf = [0u8; 256];
    let Some(written) = sysctl_raw(name, buf.as_mut_ptr().cast(), buf.len())? else {
        return Ok(None);
    };

    let bytes = &buf[..written.min(buf.len())];
    let bytes = bytes.split(|&b| b == 0).next().unwrap_or_default();
    Ok(crate::utils::strings::non_empty(&String::from_utf8_lossy(bytes)))
}

#[derive(Default)]
struct MacProcessorSource {
    cpu_usage: SysinfoCpuUsage,
}

impl ProcessorSource for MacProcessorSource {
    fn identity(&self) -> HalResult<ProcessorIdentity> {
        let fallback = sysinfo_identity();

        let vendor = sysctl_string("machdep.cpu.vendor")?.unwrap_or(fallback.vendor);
        let name = sysctl_string("machdep.cpu.brand_string")?.unwrap_or(fallback.name);
        let cpu64 = sysctl_int("hw.cpu64bit_capable")?.map(|capable| capable != 0);

        let identifier = match (
            sysctl_int("machdep.cpu.family")?,
            sysctl_int("machdep.cpu.model")?,
            sysctl_int("machdep.cpu.stepping")?,
        ) {
            (Some(family), Some(model), Some(stepping)) => x86_identifier(
                &vendor,
                cpu64,
                &family.to_string(),
                &model.to_string(),
                &stepping.to_string(),
            ),
            _ => String::new(),
        };

        Ok(ProcessorIdentity {
            vendor,
            name,
            identifier,
            cpu64,
        })
    }

    fn cpu_load_ticks(&self) -> HalResult<CpuTicks> {
        let mut info = MaybeUninit::<host_cpu_load_info>::zeroed();
        let mut count = HOST_CPU_LOAD_INFO_COUNT;

        // SAFETY: `info` has room for HOST_CPU_LOAD_INFO_COUNT integers, which `count` says.
        // The host port send right is released once we are done with it.
        let (result, info) = unsafe {
            let host = mach_host_self();
            let result = host_statistics(
                host,
                HOST_CPU_LOAD_INFO,
                info.as_mut_ptr().cast(),
                &mut count,
            );
            mach_port_deallocate(mach_task_self(), host);

            (result, info.assume_init())
        };

        if result != KERN_SUCCESS {
            return Err(HalError::native(
                "host_statistics",
                result,
                "failed to read HOST_CPU_LOAD_INFO".into(),
            ));
        }

        Ok(ticks_from_load_info(&info))
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

fn ticks_from_load_info(info: &host_cpu_load_info) -> CpuTicks {
    let ticks = info.cpu_ticks.map(u64::from);

    CpuTicks::new(
        ticks[CPU_STATE_USER],
        ticks[CPU_STATE_NICE],
        ticks[CPU_STATE_SYSTEM],
        ticks[CPU_STATE_IDLE],
    )
}

struct MacComputerSystem;

impl ComputerSystem for MacComputerSystem {
    fn manufacturer(&self) -> HalResult<Option<String>> {
        Ok(Some("Apple Inc.".to_string()))
    }

    fn model(&self) -> HalResult<Option<String>> {
        sysctl_string("hw.model")
    }

    fn serial_number(&self) -> HalResult<Option<String>> {
        Ok(None)
    }

    fn firmware(&self) -> HalResult<Firmware> {
        Ok(Firmware::default())
    }
}
