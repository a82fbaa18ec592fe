//! Cumulative CPU tick counters and the load derived from two of them.

use serde::Serialize;

/// The categories of a [`CpuTicks`] sample, in their fixed order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickType {
    User = 0,
    /// Low-priority user time. Backends without such a notion report 0.
    Nice = 1,
    System = 2,
    Idle = 3,
}

/// One sample of the cumulative time a CPU has spent in each [`TickType`] since boot.
///
/// The order is always `[user, nice, system, idle]`, regardless of platform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CpuTicks([u64; 4]);

impl CpuTicks {
    pub const fn new(user: u64, nice: u64, system: u64, idle: u64) -> Self {
        CpuTicks([user, nice, system, idle])
    }

    #[inline]
    pub fn get(&self, tick_type: TickType) -> u64 {
        self.0[tick_type as usize]
    }

    #[inline]
    pub fn as_array(&self) -> [u64; 4] {
        self.0
    }

    /// The sum of every category.
    pub fn total(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, ticks| acc.saturating_add(*ticks))
    }

    /// Returns the percentage of non-idle time, in `[0, 100]`, between `prev` and `self`.
    ///
    /// If no ticks elapsed, or the counters went backwards (e.g. rollover), this is 0.
    pub fn load_since(&self, prev: &CpuTicks) -> f32 {
        let deltas = std::array::from_fn::<i128, 4, _>(|i| {
            i128::from(self.0[i]) - i128::from(prev.0[i])
        });

        let total: i128 = deltas.iter().sum();
        let idle = deltas[TickType::Idle as usize];

        if total > 0 && idle >= 0 {
            let load = 100.0 * (total - idle) as f64 / total as f64;
            load.clamp(0.0, 100.0) as f32
        } else {
            0.0
        }
    }
}

impl From<[u64; 4]> for CpuTicks {
    fn from(ticks: [u64; 4]) -> Self {
        CpuTicks(ticks)
    }
}

impl From<CpuTicks> for [u64; 4] {
    fn from(ticks: CpuTicks) -> Self {
        ticks.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fixed_order() {
        let ticks = CpuTicks::new(1, 2, 3, 4);

        assert_eq!(ticks.as_array(), [1, 2, 3, 4]);
        assert_eq!(ticks.get(TickType::User), 1);
        assert_eq!(ticks.get(TickType::Nice), 2);
        assert_eq!(ticks.get(TickType::System), 3);
        assert_eq!(ticks.get(TickType::Idle), 4);
        assert_eq!(ticks.total(), 10);
    }

    #[test]
    fn known_window() {
        let prev = CpuTicks::from([100, 0, 50, 850]);
        let curr = CpuTicks::from([110, 0, 60, 890]);

        // total = 60, idle = 40
        let load = curr.load_since(&prev);
        assert!((load - 33.333_332).abs() < 1e-3, "load was {load}");
    }

    #[test]
    fn no_elapsed_ticks() {
        let ticks = CpuTicks::from([100, 5, 50, 850]);
        assert_eq!(ticks.load_since(&ticks), 0.0);
    }

    #[test]
    fn rollover_is_zero() {
        let prev = CpuTicks::from([u64::MAX, 0, u64::MAX, u64::MAX]);
        let curr = CpuTicks::from([3, 0, 2, 1]);
        assert_eq!(curr.load_since(&prev), 0.0);
    }

    #[test]
    fn fully_busy_and_fully_idle() {
        let prev = CpuTicks::from([0, 0, 0, 0]);

        assert_eq!(CpuTicks::from([50, 10, 40, 0]).load_since(&prev), 100.0);
        assert_eq!(CpuTicks::from([0, 0, 0, 100]).load_since(&prev), 0.0);
    }

    #[test]
    fn monotonic_samples_stay_in_range() {
        // A small deterministic walk over many windows, including huge counters.
        let mut prev = CpuTicks::from([u64::MAX / 2, 7, u64::MAX / 4, 1]);
        let mut state = 0x2545_f491_4f6c_dd1d_u64;

        for _ in 0..500 {
            let mut next = prev.as_array();
            for slot in next.iter_mut() {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                *slot = slot.saturating_add(state % 10_000);
            }
            let next = CpuTicks::from(next);

            let load = next.load_since(&prev);
            assert!((0.0..=100.0).contains(&load), "load was {load}");
            prev = next;
        }
    }
}
