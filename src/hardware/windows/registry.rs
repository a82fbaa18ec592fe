//! Registry-backed queries: firmware identity, monitor EDIDs and sound card drivers.

use std::io;

use winreg::{enums::HKEY_LOCAL_MACHINE, RegKey};

use crate::{
    hardware::{
        computer_system::{model_with_version, ComputerSystem, Firmware},
        displays::Display,
        error::{HalError, HalResult},
        sound::SoundCard,
    },
    utils::strings::{firmware_value, non_empty},
};

const BIOS_KEY: &str = r"HARDWARE\DESCRIPTION\System\BIOS";
const DISPLAY_ENUM_KEY: &str = r"SYSTEM\CurrentControlSet\Enum\DISPLAY";
const MEDIA_CLASS_KEY: &str =
    r"SYSTEM\CurrentControlSet\Control\Class\{4d36e96c-e325-11ce-bfc1-08002be10318}";

/// Opens `path` under `parent`. A key that does not exist, or that we may not read, is
/// [`None`].
fn open_key(parent: &RegKey, path: &str) -> HalResult<Option<RegKey>> {
    match parent.open_subkey(path) {
        Ok(key) => Ok(Some(key)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            log::debug!("no access to registry key '{path}'");
            Ok(None)
        }
        Err(err) => Err(HalError::from_io(format!("registry {path}"), &err)),
    }
}

fn hklm(path: &str) -> HalResult<Option<RegKey>> {
    open_key(&RegKey::predef(HKEY_LOCAL_MACHINE), path)
}

fn string_value(key: &RegKey, name: &str) -> HalResult<Option<String>> {
    match key.get_value::<String, _>(name) {
        Ok(value) => Ok(non_empty(&value)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(HalError::from_io(format!("registry value {name}"), &err)),
    }
}

fn binary_value(key: &RegKey, name: &str) -> HalResult<Option<Vec<u8>>> {
    match key.get_raw_value(name) {
        Ok(value) => Ok(Some(value.bytes.to_vec())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(HalError::from_io(format!("registry value {name}"), &err)),
    }
}

/// Names of the subkeys of `key`, sorted so enumeration order is stable.
fn sorted_subkeys(key: &RegKey) -> HalResult<Vec<String>> {
    let mut names = key
        .enum_keys()
        .collect::<io::Result<Vec<_>>>()
        .map_err(|err| HalError::from_io("registry subkeys", &err))?;
    names.sort();
    Ok(names)
}

/// The firmware's SMBIOS strings, which Windows copies into the registry at boot.
pub(super) struct WindowsComputerSystem;

impl WindowsComputerSystem {
    fn bios_value(&self, name: &str) -> HalResult<Option<String>> {
        let Some(key) = hklm(BIOS_KEY)? else {
            return Ok(None);
        };

        Ok(string_value(&key, name)?.and_then(|value| firmware_value(&value)))
    }
}

impl ComputerSystem for WindowsComputerSystem {
    fn manufacturer(&self) -> HalResult<Option<String>> {
        self.bios_value("SystemManufacturer")
    }

    fn model(&self) -> HalResult<Option<String>> {
        Ok(model_with_version(
            self.bios_value("SystemProductName")?,
            self.bios_value("SystemVersion")?,
        ))
    }

    /// The system serial is not copied into the registry.
    fn serial_number(&self) -> HalResult<Option<String>> {
        Ok(None)
    }

    fn firmware(&self) -> HalResult<Firmware> {
        Ok(Firmware {
            vendor: self.bios_value("BIOSVendor")?,
            version: self.bios_value("BIOSVersion")?,
            release_date: self.bios_value("BIOSReleaseDate")?,
        })
    }
}

/// Every monitor instance that is currently attached, with its EDID. Instances of monitors
/// that were attached once keep their keys but lose the `Control` subkey.
pub(super) fn monitor_displays() -> HalResult<Vec<Display>> {
    let Some(display_enum) = hklm(DISPLAY_ENUM_KEY)? else {
        return Ok(Vec::new());
    };

    let mut displays = Vec::new();

    for monitor in sorted_subkeys(&display_enum)? {
        let Some(monitor_key) = open_key(&display_enum, &monitor)? else {
            continue;
        };

        for instance in sorted_subkeys(&monitor_key)? {
            let Some(instance_key) = open_key(&monitor_key, &instance)? else {
                continue;
            };

            if open_key(&instance_key, "Control")?.is_none() {
                continue;
            }

            let edid = match open_key(&instance_key, "Device Parameters")? {
                Some(params) => binary_value(&params, "EDID")?,
                None => None,
            };

            match edid {
                Some(edid) => displays.push(Display::new(format!(r"{monitor}\{instance}"), edid)),
                None => log::debug!(r"monitor {monitor}\{instance} has no EDID"),
            }
        }
    }

    Ok(displays)
}

/// Every driver instance registered under the media device class.
pub(super) fn sound_cards() -> HalResult<Vec<SoundCard>> {
    let Some(class) = hklm(MEDIA_CLASS_KEY)? else {
        return Ok(Vec::new());
    };

    let mut cards = Vec::new();

    // Besides the numbered driver instances the class key holds `Properties`.
    for instance in sorted_subkeys(&class)?
        .into_iter()
        .filter(|name| name.bytes().all(|b| b.is_ascii_digit()))
    {
        let Some(key) = open_key(&class, &instance)? else {
            continue;
        };

        if let Some(card) = sound_card(
            string_value(&key, "DriverDesc")?,
            string_value(&key, "ProviderName")?,
            string_value(&key, "DriverVersion")?,
        ) {
            cards.push(card);
        }
    }

    Ok(cards)
}

/// A driver without a description is a leftover and is skipped.
fn sound_card(
    description: Option<String>, provider: Option<String>, version: Option<String>,
) -> Option<SoundCard> {
    let description = description?;
    let prefixed = |value: &str| match &provider {
        Some(provider) => format!("{provider} {value}"),
        None => value.to_string(),
    };

    Some(SoundCard {
        driver_version: prefixed(version.as_deref().unwrap_or_default()).trim().to_string(),
        name: prefixed(&description),
        codec: description,
    })
}
