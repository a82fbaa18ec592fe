//! Physical and swap memory.

use sysinfo::System;

use super::error::{HalError, HalResult};

/// Memory counters. All values are in bytes and are read fresh on every call.
pub trait GlobalMemory: Send + Sync {
    fn total(&self) -> HalResult<u64>;

    /// Memory that can be handed to processes without swapping, including reclaimable
    /// cache.
    fn available(&self) -> HalResult<u64>;

    fn swap_total(&self) -> HalResult<u64>;

    fn swap_used(&self) -> HalResult<u64>;
}

/// A [`GlobalMemory`] backed by sysinfo, which wraps the native call of every platform we
/// have a backend for.
#[derive(Debug, Default)]
pub(crate) struct SysinfoMemory;

impl SysinfoMemory {
    fn refreshed() -> HalResult<System> {
        let mut sys = System::new();
        sys.refresh_memory();

        // sysinfo reports a zero total rather than an error if the native call failed.
        if sys.total_memory() == 0 {
            return Err(HalError::native(
                "memory statistics",
                -1,
                "the platform reported no physical memory".into(),
            ));
        }

        Ok(sys)
    }
}

impl GlobalMemory for SysinfoMemory {
    fn total(&self) -> HalResult<u64> {
        Ok(Self::refreshed()?.total_memory())
    }

    fn available(&self) -> HalResult<u64> {
        Ok(Self::refreshed()?.available_memory())
    }

    fn swap_total(&self) -> HalResult<u64> {
        Ok(Self::refreshed()?.total_swap())
    }

    fn swap_used(&self) -> HalResult<u64> {
        Ok(Self::refreshed()?.used_swap())
    }
}

/// Returns the used percentage of `total`, or 0 if `total` is 0.
#[inline]
pub fn used_percentage(total: u64, available: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        total.saturating_sub(available) as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn percentage() {
        assert_eq!(used_percentage(0, 0), 0.0);
        assert_eq!(used_percentage(100, 25), 75.0);
        assert_eq!(used_percentage(100, 200), 0.0);
    }

    #[test]
    fn reads_memory() {
        let memory = SysinfoMemory;
        let total = memory.total().unwrap();

        assert!(total > 0);
        assert!(memory.available().unwrap() <= total);
        assert!(memory.swap_used().unwrap() <= memory.swap_total().unwrap());
    }
}
