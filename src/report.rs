//! A one-shot snapshot of everything the hardware layer reports, and how to print it.

use std::fmt::{self, Write};

use serde::Serialize;

use crate::{
    hardware::{
        computer_system::Firmware,
        disks::HwDiskStore,
        displays::Display,
        error::{HalError, HalResult},
        memory::used_percentage,
        network::NetworkIf,
        power::{PowerSource, TimeRemaining},
        processor::{CentralProcessor, CpuTicks},
        sensors::TemperatureReading,
        sound::SoundCard,
        usb::UsbDevice,
        HardwareAbstractionLayer,
    },
    options::{ReportOptions, Section},
    platform::Platform,
    utils::{cancellation_token::CancellationToken, data_units::binary_bytes_string},
};

#[derive(Clone, Debug, Serialize)]
pub struct ProcessorReport {
    pub name: String,
    pub vendor: String,
    pub identifier: String,
    pub family: Option<String>,
    pub model: Option<String>,
    pub stepping: Option<String>,
    pub cpu64: Option<bool>,
    /// In Hz, or -1 when the name carries no frequency.
    pub vendor_freq: i64,
    pub logical_processors: usize,
    pub load_average: Option<f64>,
    /// Non-blocking system-wide usage, in percent.
    pub system_cpu_load: f32,
    pub ticks: CpuTicks,
    /// Percent of non-idle time over `load_interval_ms`.
    pub load: f32,
    pub load_interval_ms: u128,
}

#[derive(Clone, Debug, Serialize)]
pub struct MemoryReport {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_percent: f64,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SystemReport {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub firmware: Firmware,
}

#[derive(Clone, Debug, Serialize)]
pub struct SensorsReport {
    pub cpu_temperature: Option<f32>,
    pub temperatures: Vec<TemperatureReading>,
    /// [`None`] where the platform exposes no fans to read.
    pub fan_speeds: Option<Vec<u32>>,
}

/// A section that could not be read.
#[derive(Clone, Debug, Serialize)]
pub struct SectionError {
    pub section: String,
    pub message: String,
}

/// Everything that was asked for. Sections that were not asked for are [`None`], as are
/// sections that failed; failures are listed in `errors`.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processor: Option<ProcessorReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensors: Option<SensorsReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disks: Option<Vec<HwDiskStore>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displays: Option<Vec<Display>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Vec<NetworkIf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<Vec<SoundCard>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<Vec<PowerSource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usb: Option<Vec<UsbDevice>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SectionError>,
}

impl Snapshot {
    fn empty(platform: Platform) -> Self {
        Self {
            platform,
            processor: None,
            memory: None,
            system: None,
            sensors: None,
            disks: None,
            displays: None,
            network: None,
            sound: None,
            power: None,
            usb: None,
            errors: Vec::new(),
        }
    }

    /// Reads every section in `options` from `hal`. Processor load blocks for the
    /// configured interval unless `token` is cancelled first.
    pub fn collect(
        hal: &dyn HardwareAbstractionLayer, options: &ReportOptions, token: &CancellationToken,
    ) -> Self {
        let mut snapshot = Self::empty(hal.platform());

        for &section in &options.sections {
            match section {
                Section::Processor => {
                    let processor = hal.create_processor();
                    snapshot.processor = snapshot.record(
                        section,
                        processor_report(&processor, options, token),
                    );
                }
                Section::Memory => {
                    snapshot.memory = snapshot.record(section, memory_report(hal));
                }
                Section::System => {
                    snapshot.system = snapshot.record(section, system_report(hal));
                }
                Section::Sensors => {
                    snapshot.sensors = snapshot.record(section, sensors_report(hal));
                }
                Section::Disks => snapshot.disks = snapshot.record(section, hal.disk_stores()),
                Section::Displays => {
                    snapshot.displays = snapshot.record(section, hal.displays());
                }
                Section::Network => {
                    snapshot.network = snapshot.record(section, hal.network_ifs());
                }
                Section::Sound => snapshot.sound = snapshot.record(section, hal.sound_cards()),
                Section::Power => snapshot.power = snapshot.record(section, hal.power_sources()),
                Section::Usb => {
                    snapshot.usb = snapshot.record(section, hal.usb_devices(options.usb_tree));
                }
            }
        }

        snapshot
    }

    /// Keeps a section's value, or notes why it is missing.
    fn record<T>(&mut self, section: Section, result: HalResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("failed to read the {} section: {err}", section.name());
                self.errors.push(SectionError {
                    section: section.name(),
                    message: err.to_string(),
                });
                None
            }
        }
    }
}

fn processor_report(
    processor: &CentralProcessor, options: &ReportOptions, token: &CancellationToken,
) -> HalResult<ProcessorReport> {
    let ticks = processor.cpu_load_ticks()?;
    let load = processor.load_over(options.interval, token)?;

    Ok(ProcessorReport {
        name: processor.name().to_string(),
        vendor: processor.vendor().to_string(),
        identifier: processor.identifier().to_string(),
        family: processor.family().map(str::to_string),
        model: processor.model().map(str::to_string),
        stepping: processor.stepping().map(str::to_string),
        cpu64: processor.is_cpu_64bit(),
        vendor_freq: processor.vendor_freq(),
        logical_processors: processor.logical_processor_count(),
        load_average: processor.system_load_average(),
        system_cpu_load: processor.system_cpu_load(),
        ticks,
        load,
        load_interval_ms: options.interval.as_millis(),
    })
}

fn memory_report(hal: &dyn HardwareAbstractionLayer) -> HalResult<MemoryReport> {
    let memory = hal.create_memory();
    let total_bytes = memory.total()?;
    let available_bytes = memory.available()?;

    Ok(MemoryReport {
        total_bytes,
        available_bytes,
        used_percent: used_percentage(total_bytes, available_bytes),
        swap_total_bytes: memory.swap_total()?,
        swap_used_bytes: memory.swap_used()?,
    })
}

fn system_report(hal: &dyn HardwareAbstractionLayer) -> HalResult<SystemReport> {
    let system = hal.create_computer_system();

    Ok(SystemReport {
        manufacturer: system.manufacturer()?,
        model: system.model()?,
        serial_number: system.serial_number()?,
        firmware: system.firmware()?,
    })
}

fn sensors_report(hal: &dyn HardwareAbstractionLayer) -> HalResult<SensorsReport> {
    let sensors = hal.create_sensors();
    let temperatures = sensors.temperatures()?;

    Ok(SensorsReport {
        cpu_temperature: crate::hardware::sensors::pick_cpu_temperature(&temperatures),
        temperatures,
        fan_speeds: match sensors.fan_speeds() {
            Ok(speeds) => Some(speeds),
            Err(HalError::NotEnumerable { .. }) => None,
            Err(err) => return Err(err),
        },
    })
}

/// Formats a frequency in Hz with a decimal prefix, e.g. `2.00 GHz`.
pub fn hertz_string(hz: i64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "THz"), (1e9, "GHz"), (1e6, "MHz"), (1e3, "kHz")];

    if hz < 0 {
        return "unknown".to_string();
    }

    let hz = hz as f64;
    match UNITS.iter().find(|(scale, _)| hz >= *scale) {
        Some((scale, unit)) => format!("{:.2} {unit}", hz / scale),
        None => format!("{hz} Hz"),
    }
}

fn or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or("unknown")
}

fn write_usb_device(f: &mut fmt::Formatter<'_>, device: &UsbDevice, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth + 1);
    write!(f, "{indent}{}", device.name)?;

    if !device.vendor.is_empty() {
        write!(f, " ({})", device.vendor)?;
    }
    if !device.vendor_id.is_empty() || !device.product_id.is_empty() {
        write!(f, " [{}:{}]", device.vendor_id, device.product_id)?;
    }
    writeln!(f)?;

    device
        .connected_devices
        .iter()
        .try_for_each(|child| write_usb_device(f, child, depth + 1))
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Platform: {}", self.platform)?;

        if let Some(cpu) = &self.processor {
            writeln!(f, "\nProcessor")?;
            writeln!(f, "  Name: {}", cpu.name)?;
            writeln!(f, "  Vendor: {}", cpu.vendor)?;
            writeln!(f, "  Identifier: {}", cpu.identifier)?;
            writeln!(
                f,
                "  Family {} Model {} Stepping {}",
                or_unknown(cpu.family.as_deref()),
                or_unknown(cpu.model.as_deref()),
                or_unknown(cpu.stepping.as_deref())
            )?;
            let cpu64 = match cpu.cpu64 {
                Some(true) => "yes",
                Some(false) => "no",
                None => "unknown",
            };
            writeln!(f, "  64-bit: {cpu64}")?;
            writeln!(f, "  Vendor frequency: {}", hertz_string(cpu.vendor_freq))?;
            writeln!(f, "  Logical processors: {}", cpu.logical_processors)?;
            if let Some(load_average) = cpu.load_average {
                writeln!(f, "  Load average (1m): {load_average:.2}")?;
            }
            writeln!(f, "  System CPU load: {:.1}%", cpu.system_cpu_load)?;
            writeln!(f, "  Load: {:.1}% over {}ms", cpu.load, cpu.load_interval_ms)?;
        }

        if let Some(memory) = &self.memory {
            writeln!(f, "\nMemory")?;
            writeln!(
                f,
                "  Available: {} of {} ({:.1}% used)",
                binary_bytes_string(memory.available_bytes),
                binary_bytes_string(memory.total_bytes),
                memory.used_percent
            )?;
            writeln!(
                f,
                "  Swap: {} of {} used",
                binary_bytes_string(memory.swap_used_bytes),
                binary_bytes_string(memory.swap_total_bytes)
            )?;
        }

        if let Some(system) = &self.system {
            writeln!(f, "\nSystem")?;
            writeln!(f, "  Manufacturer: {}", or_unknown(system.manufacturer.as_deref()))?;
            writeln!(f, "  Model: {}", or_unknown(system.model.as_deref()))?;
            writeln!(f, "  Serial number: {}", or_unknown(system.serial_number.as_deref()))?;
            writeln!(
                f,
                "  Firmware: {} {} ({})",
                or_unknown(system.firmware.vendor.as_deref()),
                or_unknown(system.firmware.version.as_deref()),
                or_unknown(system.firmware.release_date.as_deref())
            )?;
        }

        if let Some(sensors) = &self.sensors {
            writeln!(f, "\nSensors")?;
            match sensors.cpu_temperature {
                Some(celsius) => writeln!(f, "  CPU temperature: {celsius:.1} °C")?,
                None => writeln!(f, "  CPU temperature: unknown")?,
            }
            for reading in &sensors.temperatures {
                match reading.celsius {
                    Some(celsius) => writeln!(f, "  {}: {celsius:.1} °C", reading.label)?,
                    None => writeln!(f, "  {}: unknown", reading.label)?,
                }
            }
            if let Some(fan_speeds) =
                sensors.fan_speeds.as_ref().filter(|speeds| !speeds.is_empty())
            {
                let mut fans = String::new();
                for (index, rpm) in fan_speeds.iter().enumerate() {
                    if index > 0 {
                        fans.push_str(", ");
                    }
                    write!(fans, "{rpm} rpm")?;
                }
                writeln!(f, "  Fans: {fans}")?;
            }
        }

        if let Some(disks) = &self.disks {
            writeln!(f, "\nDisks")?;
            for disk in disks {
                writeln!(
                    f,
                    "  {} on {} ({}, {}{}): {} free of {}",
                    disk.name,
                    disk.mount_point,
                    disk.file_system,
                    disk.kind,
                    if disk.removable { ", removable" } else { "" },
                    binary_bytes_string(disk.available_bytes),
                    binary_bytes_string(disk.total_bytes)
                )?;
            }
        }

        if let Some(displays) = &self.displays {
            writeln!(f, "\nDisplays")?;
            for display in displays {
                write!(f, "  {}", display.connector)?;
                if let Some(manufacturer) = display.manufacturer_id() {
                    write!(f, ": {manufacturer}")?;
                }
                if let Some(product) = display.product_code() {
                    write!(f, " {product:04x}")?;
                }
                if !display.has_valid_header() {
                    write!(f, " (invalid EDID)")?;
                }
                writeln!(f)?;
            }
        }

        if let Some(network) = &self.network {
            writeln!(f, "\nNetwork")?;
            for interface in network {
                writeln!(
                    f,
                    "  {} ({}): {}",
                    interface.name,
                    interface.mac,
                    interface.addresses.join(", ")
                )?;
                writeln!(
                    f,
                    "    received {} in {} packets, sent {} in {} packets",
                    binary_bytes_string(interface.bytes_recv),
                    interface.packets_recv,
                    binary_bytes_string(interface.bytes_sent),
                    interface.packets_sent
                )?;
            }
        }

        if let Some(sound) = &self.sound {
            writeln!(f, "\nSound")?;
            for card in sound {
                write!(f, "  {}", card.name)?;
                if !card.codec.is_empty() {
                    write!(f, " [{}]", card.codec)?;
                }
                writeln!(f)?;
            }
        }

        if let Some(power) = &self.power {
            writeln!(f, "\nPower")?;
            for source in power {
                let remaining = match source.time_remaining {
                    TimeRemaining::Estimating => "estimating".to_string(),
                    TimeRemaining::Unlimited => "on external power".to_string(),
                    TimeRemaining::Seconds(seconds) => {
                        format!("{}m remaining", (seconds / 60.0).round())
                    }
                };
                writeln!(
                    f,
                    "  {}: {:.0}% ({remaining})",
                    source.name,
                    source.remaining_capacity * 100.0
                )?;
            }
        }

        if let Some(usb) = &self.usb {
            writeln!(f, "\nUSB")?;
            for device in usb {
                write_usb_device(f, device, 0)?;
            }
        }

        if !self.errors.is_empty() {
            writeln!(f, "\nErrors")?;
            for error in &self.errors {
                writeln!(f, "  {}: {}", error.section, error.message)?;
            }
        }

        Ok(())
    }
}
