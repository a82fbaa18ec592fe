//! The machine itself: manufacturer, model and firmware.

use serde::Serialize;

use super::error::HalResult;

/// Firmware (BIOS/UEFI) details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Firmware {
    pub vendor: Option<String>,
    pub version: Option<String>,
    pub release_date: Option<String>,
}

/// Identity of the computer. Any field the platform does not expose is [`None`].
pub trait ComputerSystem: Send + Sync {
    fn manufacturer(&self) -> HalResult<Option<String>>;

    fn model(&self) -> HalResult<Option<String>>;

    fn serial_number(&self) -> HalResult<Option<String>>;

    fn firmware(&self) -> HalResult<Firmware>;
}

/// Joins a product name and version the way firmware tables report them separately.
#[cfg_attr(target_os = "macos", allow(dead_code))]
pub(crate) fn model_with_version(name: Option<String>, version: Option<String>) -> Option<String> {
    match (name, version) {
        (Some(name), Some(version)) => Some(format!("{name} (version: {version})")),
        (name, None) => name,
        (None, version) => version,
    }
}
