//! Processor data from procfs.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::hardware::{
    error::{HalError, HalResult},
    processor::{
        logical_processor_count, one_minute_load_average, x86_identifier, CpuTicks,
        ProcessorIdentity, ProcessorSource, SysinfoCpuUsage,
    },
};

pub(crate) struct LinuxProcessorSource {
    proc_root: PathBuf,
    cpu_usage: SysinfoCpuUsage,
}

impl LinuxProcessorSource {
    pub(crate) fn new(proc_root: PathBuf) -> Self {
        Self {
            proc_root,
            cpu_usage: SysinfoCpuUsage::default(),
        }
    }

    fn read(&self, file: &str) -> HalResult<String> {
        let path = self.proc_root.join(file);
        fs::read_to_string(&path)
            .map_err(|err| HalError::from_io(path.display().to_string(), &err))
    }
}

impl ProcessorSource for LinuxProcessorSource {
    fn identity(&self) -> HalResult<ProcessorIdentity> {
        Ok(parse_cpuinfo(&self.read("cpuinfo")?))
    }

    fn cpu_load_ticks(&self) -> HalResult<CpuTicks> {
        parse_proc_stat(&self.read("stat")?)
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

/// Reads `[user, nice, system, idle]` from the aggregate `cpu` line of `/proc/stat`.
pub(crate) fn parse_proc_stat(stat: &str) -> HalResult<CpuTicks> {
    const SOURCE: &str = "/proc/stat";

    let line = stat
        .lines()
        .find(|line| line.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| HalError::malformed(SOURCE, "no aggregate cpu line"))?;

    let mut fields = line.split_whitespace().skip(1).map(str::parse::<u64>);
    let mut next = || match fields.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(err)) => Err(HalError::malformed(SOURCE, format!("bad tick value: {err}"))),
        None => Err(HalError::malformed(SOURCE, "fewer than four tick fields")),
    };

    let (user, nice, system, idle) = (next()?, next()?, next()?, next()?);
    Ok(CpuTicks::new(user, nice, system, idle))
}

/// Builds an identity from the first processor block of `/proc/cpuinfo`.
pub(crate) fn parse_cpuinfo(cpuinfo: &str) -> ProcessorIdentity {
    let mut vendor = None;
    let mut name = None;
    let mut family = None;
    let mut model = None;
    let mut stepping = None;
    let mut flags = None;

    for line in cpuinfo.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        let slot = match key.trim() {
            "vendor_id" | "CPU implementer" => &mut vendor,
            "model name" | "Processor" | "cpu model" => &mut name,
            "cpu family" => &mut family,
            "model" => &mut model,
            "stepping" => &mut stepping,
            "flags" => &mut flags,
            _ => continue,
        };

        // Only the first processor block matters.
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    let cpu64 = flags.map(|flags| flags.split_whitespace().any(|flag| flag == "lm"));
    let vendor = vendor.unwrap_or_default();

    let identifier = match (family, model, stepping) {
        (Some(family), Some(model), Some(stepping)) => {
            x86_identifier(vendor, cpu64, family, model, stepping)
        }
        _ => String::new(),
    };

    ProcessorIdentity {
        vendor: vendor.to_string(),
        name: name.unwrap_or_default().to_string(),
        identifier,
        cpu64,
    }
}

/// Where procfs is mounted.
pub(crate) fn proc_root() -> &'static Path {
    Path::new("/proc")
}
