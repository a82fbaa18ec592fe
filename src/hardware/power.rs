//! Power sources (batteries).
//!
//! Uses the battery crate, which covers Linux, macOS, Windows and FreeBSD.
//! For more information, refer to the [starship_battery](https://github.com/starship/rust-battery) repo/docs.

use serde::Serialize;

use super::error::HalResult;

/// How long a power source is expected to last.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRemaining {
    /// The platform is still estimating, or cannot tell.
    Estimating,
    /// On external power.
    Unlimited,
    Seconds(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PowerSource {
    pub name: String,
    /// Remaining capacity as a fraction in `[0, 1]`.
    pub remaining_capacity: f64,
    pub time_remaining: TimeRemaining,
}

#[cfg(feature = "battery")]
pub(crate) fn battery_power_sources() -> HalResult<Vec<PowerSource>> {
    use starship_battery::{
        units::{ratio::ratio, time::second},
        Manager, State,
    };

    use super::error::HalError;

    fn battery_error(query: &'static str, err: starship_battery::Error) -> HalError {
        let code = std::error::Error::source(&err)
            .and_then(|source| source.downcast_ref::<std::io::Error>())
            .and_then(std::io::Error::raw_os_error)
            .unwrap_or(-1);

        HalError::native(query, code, err.to_string())
    }

    let manager = Manager::new().map_err(|err| battery_error("battery manager", err))?;
    let batteries = manager
        .batteries()
        .map_err(|err| battery_error("battery enumeration", err))?;

    let mut sources = Vec::new();
    for (index, battery) in batteries.enumerate() {
        let battery = battery.map_err(|err| battery_error("battery", err))?;

        let name = match (battery.vendor(), battery.model()) {
            (Some(vendor), Some(model)) => format!("{} {}", vendor.trim(), model.trim()),
            (None, Some(model)) => model.trim().to_string(),
            _ => format!("Battery {index}"),
        };

        let time_remaining = match battery.state() {
            State::Charging | State::Full => TimeRemaining::Unlimited,
            State::Discharging => battery
                .time_to_empty()
                .map(|time| TimeRemaining::Seconds(f64::from(time.get::<second>())))
                .unwrap_or(TimeRemaining::Estimating),
            State::Empty => TimeRemaining::Seconds(0.0),
            State::Unknown => TimeRemaining::Estimating,
        };

        sources.push(PowerSource {
            name,
            remaining_capacity: f64::from(battery.state_of_charge().get::<ratio>()).clamp(0.0, 1.0),
            time_remaining,
        });
    }

    Ok(sources)
}

/// Without battery support compiled in, there is nothing to enumerate.
#[cfg(not(feature = "battery"))]
pub(crate) fn battery_power_sources() -> HalResult<Vec<PowerSource>> {
    log::debug!("battery support is disabled, reporting no power sources");
    Ok(Vec::new())
}
