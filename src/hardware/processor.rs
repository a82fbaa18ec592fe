//! The central processor: identity, tick counters and load sampling.

mod ticks;

use std::{
    fmt,
    sync::{Mutex, OnceLock, PoisonError},
    time::Duration,
};

use serde::Serialize;
use sysinfo::{CpuRefreshKind, RefreshKind, System};

pub use self::ticks::{CpuTicks, TickType};
use super::error::HalResult;
use crate::utils::{
    cancellation_token::CancellationToken,
    strings::{parse_identifier, vendor_freq_from_name},
};

/// How long [`CentralProcessor::load`] waits between its two tick samples.
pub const DEFAULT_LOAD_INTERVAL: Duration = Duration::from_millis(1000);

/// Static identity of a processor, as reported by the platform.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorIdentity {
    /// Vendor identifier, e.g. `GenuineIntel`.
    pub vendor: String,
    /// Name, e.g. `Intel(R) Core(TM)2 Duo CPU T7300 @ 2.00GHz`.
    pub name: String,
    /// Identifier, e.g. `x86 Family 6 Model 15 Stepping 10`.
    pub identifier: String,
    /// Whether the processor is 64-bit capable, if the platform says.
    pub cpu64: Option<bool>,
}

/// The platform side of a [`CentralProcessor`]. Each backend implements this against its
/// own native interfaces.
pub trait ProcessorSource: Send + Sync {
    /// Reads the processor's identity.
    fn identity(&self) -> HalResult<ProcessorIdentity>;

    /// Reads the cumulative `[user, nice, system, idle]` tick counters.
    fn cpu_load_ticks(&self) -> HalResult<CpuTicks>;

    /// The number of logical processors.
    fn logical_processor_count(&self) -> usize;

    /// The one-minute system load average, if the platform has one.
    fn system_load_average(&self) -> Option<f64>;

    /// System-wide CPU usage in percent since the previous call, without blocking.
    fn system_cpu_load(&self) -> f32;
}

/// A CPU, wired to the native source of the platform it was created for.
///
/// Construction does no I/O. The identity is read on first use and kept; ticks are read
/// fresh every time.
pub struct CentralProcessor {
    source: Box<dyn ProcessorSource>,
    identity: OnceLock<ProcessorIdentity>,
    vendor_freq: OnceLock<i64>,
}

impl CentralProcessor {
    pub fn new(source: Box<dyn ProcessorSource>) -> Self {
        Self {
            source,
            identity: OnceLock::new(),
            vendor_freq: OnceLock::new(),
        }
    }

    /// Creates a processor with an already known identity.
    pub fn with_identity(identity: ProcessorIdentity, source: Box<dyn ProcessorSource>) -> Self {
        Self {
            source,
            identity: OnceLock::from(identity),
            vendor_freq: OnceLock::new(),
        }
    }

    /// The full identity. If the platform cannot provide it, every field is unknown.
    pub fn identity(&self) -> &ProcessorIdentity {
        self.identity
            .get_or_init(|| match self.source.identity() {
                Ok(identity) => identity,
                Err(err) => {
                    log::warn!("unable to read the processor identity: {err}");
                    ProcessorIdentity::default()
                }
            })
    }

    pub fn vendor(&self) -> &str {
        &self.identity().vendor
    }

    pub fn name(&self) -> &str {
        &self.identity().name
    }

    pub fn identifier(&self) -> &str {
        &self.identity().identifier
    }

    pub fn family(&self) -> Option<&str> {
        parse_identifier(self.identifier()).map(|parts| parts.family)
    }

    pub fn model(&self) -> Option<&str> {
        parse_identifier(self.identifier()).map(|parts| parts.model)
    }

    pub fn stepping(&self) -> Option<&str> {
        parse_identifier(self.identifier()).map(|parts| parts.stepping)
    }

    pub fn is_cpu_64bit(&self) -> Option<bool> {
        self.identity().cpu64
    }

    /// The vendor frequency in Hz, parsed from the trailing `@ <freq>` of the name, or `-1`
    /// if the name has no such suffix.
    ///
    /// The name is only parsed once; see [`CentralProcessor::invalidate_vendor_freq`].
    pub fn vendor_freq(&self) -> i64 {
        *self
            .vendor_freq
            .get_or_init(|| vendor_freq_from_name(self.name()))
    }

    /// Drops the cached vendor frequency so the next [`CentralProcessor::vendor_freq`]
    /// parses the name again.
    pub fn invalidate_vendor_freq(&mut self) {
        self.vendor_freq.take();
    }

    /// Reads the current cumulative `[user, nice, system, idle]` tick counters.
    pub fn cpu_load_ticks(&self) -> HalResult<CpuTicks> {
        self.source.cpu_load_ticks()
    }

    /// Samples the tick counters twice, [`DEFAULT_LOAD_INTERVAL`] apart, and returns the
    /// percentage of non-idle time in between. Blocks the calling thread.
    pub fn load(&self) -> HalResult<f32> {
        self.load_over(DEFAULT_LOAD_INTERVAL, &CancellationToken::default())
    }

    /// Like [`CentralProcessor::load`] with a custom window. If `token` is cancelled during
    /// the wait, this returns 0 without taking the second sample.
    pub fn load_over(&self, interval: Duration, token: &CancellationToken) -> HalResult<f32> {
        let prev = self.cpu_load_ticks()?;

        if token.sleep_with_cancellation(interval) {
            log::debug!("processor load sampling was cancelled");
            return Ok(0.0);
        }

        let curr = self.cpu_load_ticks()?;
        Ok(curr.load_since(&prev))
    }

    pub fn logical_processor_count(&self) -> usize {
        self.source.logical_processor_count()
    }

    pub fn system_load_average(&self) -> Option<f64> {
        self.source.system_load_average()
    }

    /// System-wide CPU usage in `[0, 100]` since the last time this was asked, without
    /// waiting. The first call covers whatever history the platform keeps, which is time
    /// since boot on Linux and may be nothing (0) elsewhere. Use [`CentralProcessor::load`]
    /// for a measurement over a known window.
    pub fn system_cpu_load(&self) -> f32 {
        self.source.system_cpu_load()
    }
}

impl fmt::Debug for CentralProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CentralProcessor")
            .field("identity", &self.identity.get())
            .field("vendor_freq", &self.vendor_freq.get())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for CentralProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Formats an x86 identifier like `Intel64 Family 6 Model 15 Stepping 10`. The prefix is
/// `Intel64` or `AMD64` for 64-bit Intel and AMD parts and `x86` otherwise.
#[cfg_attr(any(target_os = "windows", target_os = "freebsd"), allow(dead_code))]
pub(crate) fn x86_identifier(
    vendor: &str, cpu64: Option<bool>, family: &str, model: &str, stepping: &str,
) -> String {
    let arch = match (vendor, cpu64) {
        ("GenuineIntel", Some(true)) => "Intel64",
        ("AuthenticAMD", Some(true)) => "AMD64",
        _ => "x86",
    };

    format!("{arch} Family {family} Model {model} Stepping {stepping}")
}

fn sysinfo_cpu_list() -> System {
    System::new_with_specifics(RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing()))
}

/// The number of logical processors sysinfo sees, never less than one.
pub(crate) fn logical_processor_count() -> usize {
    sysinfo_cpu_list().cpus().len().max(1)
}

/// Vendor and brand of the first CPU as sysinfo reports them. The identifier is left to the
/// caller.
#[cfg_attr(target_os = "linux", allow(dead_code))]
pub(crate) fn sysinfo_identity() -> ProcessorIdentity {
    let sys = sysinfo_cpu_list();

    match sys.cpus().first() {
        Some(cpu) => ProcessorIdentity {
            vendor: cpu.vendor_id().trim().to_string(),
            name: cpu.brand().trim().to_string(),
            ..Default::default()
        },
        None => ProcessorIdentity::default(),
    }
}

/// Non-blocking system-wide CPU usage through sysinfo, which diffs against its previous
/// refresh.
pub(crate) struct SysinfoCpuUsage(Mutex<System>);

impl Default for SysinfoCpuUsage {
    fn default() -> Self {
        Self(Mutex::new(System::new()))
    }
}

impl SysinfoCpuUsage {
    pub(crate) fn refresh(&self) -> f32 {
        let mut sys = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        sys.refresh_cpu_usage();

        let usage = sys.global_cpu_usage();
        if usage.is_finite() {
            usage.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// The one-minute load average. sysinfo reports zeros on platforms without one, which
/// we treat as unknown there.
pub(crate) fn one_minute_load_average() -> Option<f64> {
    let load = System::load_average().one;

    if cfg!(target_os = "windows") || load < 0.0 {
        None
    } else {
        Some(load)
    }
}
