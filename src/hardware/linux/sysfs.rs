//! Device enumeration through sysfs and procfs.
//!
//! Every function takes the root it reads from, so it can be pointed at a fake tree.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{
    hardware::{
        computer_system::Firmware,
        displays::Display,
        error::{HalError, HalResult},
        sound::SoundCard,
        usb::UsbRecord,
    },
    utils::strings::non_empty,
};

/// Reads a sysfs attribute. Attributes that do not exist or that we may not read are
/// [`None`]; anything else is an error.
pub(crate) fn read_attribute(path: &Path) -> HalResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(value) => Ok(non_empty(&value)),
        Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            Ok(None)
        }
        Err(err) => Err(HalError::from_io(path.display().to_string(), &err)),
    }
}

/// Lists the entries of a directory sorted by name. A missing directory has no entries.
fn sorted_entries(dir: &Path) -> HalResult<Vec<(String, PathBuf)>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::debug!("{} does not exist, nothing to enumerate", dir.display());
            return Ok(Vec::new());
        }
        Err(err) => return Err(HalError::from_io(dir.display().to_string(), &err)),
    };

    let mut entries = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            Some((name, entry.path()))
        })
        .collect::<Vec<_>>();

    entries.sort();
    Ok(entries)
}

/// Whether the device should actually be read during enumeration. Will return false if the
/// state is not D0/unknown.
///
/// `device` is a path to the device itself (e.g. `/sys/class/hwmon/hwmon1/device`).
fn is_device_awake(device: &Path) -> bool {
    // Documented at https://www.kernel.org/doc/Documentation/ABI/testing/sysfs-devices-power_state
    match fs::read_to_string(device.join("power_state")) {
        Ok(state) => {
            let state = state.trim();
            // zenpower3 reports "unknown" for awake devices.
            state == "D0" || state == "unknown"
        }
        Err(_) => true,
    }
}

/// `/sys/class/dmi/id`.
pub(crate) struct Dmi {
    root: PathBuf,
}

impl Dmi {
    pub(crate) fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub(crate) fn attribute(&self, name: &str) -> HalResult<Option<String>> {
        read_attribute(&self.root.join(name))
    }

    pub(crate) fn firmware(&self) -> HalResult<Firmware> {
        Ok(Firmware {
            vendor: self.attribute("bios_vendor")?,
            version: self.attribute("bios_version")?,
            release_date: self.attribute("bios_date")?,
        })
    }
}

/// Fan speeds in rpm from every `fan*_input` of every hwmon device.
pub(crate) fn hwmon_fan_speeds(hwmon_root: &Path) -> HalResult<Vec<u32>> {
    let mut speeds = Vec::new();

    for (_, hwmon) in sorted_entries(hwmon_root)? {
        if !is_device_awake(&hwmon.join("device")) {
            continue;
        }

        for (name, path) in sorted_entries(&hwmon)? {
            if !(name.starts_with("fan") && name.ends_with("_input")) {
                continue;
            }

            // Some drivers fail reads of fans that are not connected.
            match read_attribute(&path) {
                Ok(value) => {
                    if let Some(rpm) = value.and_then(|rpm| rpm.parse().ok()) {
                        speeds.push(rpm);
                    }
                }
                Err(err) => log::debug!("skipping fan: {err}"),
            }
        }
    }

    Ok(speeds)
}

/// The parent of a device in `/sys/bus/usb/devices` naming: `1-1.2` hangs off `1-1`, which
/// hangs off the root hub `usb1`.
pub(crate) fn usb_parent_id(id: &str) -> Option<String> {
    if id.starts_with("usb") {
        return None;
    }

    let (bus, ports) = id.split_once('-')?;
    match ports.rsplit_once('.') {
        Some((parent_ports, _)) => Some(format!("{bus}-{parent_ports}")),
        None => Some(format!("usb{bus}")),
    }
}

/// Enumerates `/sys/bus/usb/devices`, skipping interfaces.
pub(crate) fn usb_records(devices_root: &Path) -> HalResult<Vec<UsbRecord>> {
    let mut records = Vec::new();

    for (id, path) in sorted_entries(devices_root)? {
        // Interfaces look like "1-1:1.0".
        if id.contains(':') {
            continue;
        }

        let vendor = read_attribute(&path.join("manufacturer"))?.unwrap_or_default();
        let name = match read_attribute(&path.join("product"))? {
            Some(product) => product,
            None if id.starts_with("usb") => format!("USB root hub {}", &id[3..]),
            None => format!("USB device {id}"),
        };

        records.push(UsbRecord {
            parent_id: usb_parent_id(&id),
            name,
            vendor,
            vendor_id: read_attribute(&path.join("idVendor"))?.unwrap_or_default(),
            product_id: read_attribute(&path.join("idProduct"))?.unwrap_or_default(),
            serial_number: read_attribute(&path.join("serial"))?.unwrap_or_default(),
            id,
        });
    }

    Ok(records)
}

/// A card line of `/proc/asound/cards`, e.g. ` 0 [PCH ]: HDA-Intel - HDA Intel PCH`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct AsoundCard<'a> {
    pub index: u32,
    pub driver: &'a str,
    pub name: &'a str,
}

pub(crate) fn parse_asound_cards(cards: &str) -> Vec<AsoundCard<'_>> {
    cards
        .lines()
        .filter_map(|line| {
            let line = line.trim_start();
            let (index, rest) = line.split_once(' ')?;
            let index = index.parse().ok()?;
            let (_, description) = rest.split_once("]:")?;
            let (driver, name) = description.split_once(" - ")?;

            Some(AsoundCard {
                index,
                driver: driver.trim(),
                name: name.trim(),
            })
        })
        .collect()
}

/// The `Codec:` line of the first codec file of a card, if any.
fn asound_codec(card_dir: &Path) -> HalResult<String> {
    for (name, path) in sorted_entries(card_dir)? {
        if !name.starts_with("codec#") {
            continue;
        }

        if let Some(contents) = read_attribute(&path)? {
            if let Some(codec) = contents
                .lines()
                .find_map(|line| line.strip_prefix("Codec:"))
            {
                return Ok(codec.trim().to_string());
            }
        }
    }

    Ok(String::new())
}

/// Enumerates sound cards from `/proc/asound`.
pub(crate) fn sound_cards(asound_root: &Path) -> HalResult<Vec<SoundCard>> {
    let Some(cards) = read_attribute(&asound_root.join("cards"))? else {
        return Ok(Vec::new());
    };

    let driver_version = read_attribute(&asound_root.join("version"))?.unwrap_or_default();

    parse_asound_cards(&cards)
        .into_iter()
        .map(|card| {
            Ok(SoundCard {
                driver_version: driver_version.clone(),
                name: format!("{} {}", card.driver, card.name),
                codec: asound_codec(&asound_root.join(format!("card{}", card.index)))?,
            })
        })
        .collect()
}

/// Enumerates connectors under `/sys/class/drm` that expose a non-empty EDID.
pub(crate) fn drm_displays(drm_root: &Path) -> HalResult<Vec<Display>> {
    let mut displays = Vec::new();

    for (connector, path) in sorted_entries(drm_root)? {
        let edid = match fs::read(path.join("edid")) {
            Ok(edid) => edid,
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                continue;
            }
            Err(err) => return Err(HalError::from_io(path.display().to_string(), &err)),
        };

        if !edid.is_empty() {
            displays.push(Display::new(connector, edid));
        }
    }

    Ok(displays)
}

#[cfg(test)]
mod test {
    use indoc::indoc;

    use super::*;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn usb_parents() {
        assert_eq!(usb_parent_id("usb1"), None);
        assert_eq!(usb_parent_id("1-1").as_deref(), Some("usb1"));
        assert_eq!(usb_parent_id("1-1.2").as_deref(), Some("1-1"));
        assert_eq!(usb_parent_id("3-2.4.1").as_deref(), Some("3-2.4"));
        assert_eq!(usb_parent_id("garbage"), None);
    }

    #[test]
    fn usb_tree_from_sysfs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "usb1/product", "xHCI Host Controller\n");
        write(root, "usb1/idVendor", "1d6b\n");
        write(root, "1-1/product", "USB2.0 Hub\n");
        write(root, "1-1.3/product", "Keyboard\n");
        write(root, "1-1.3/manufacturer", "Logitech\n");
        write(root, "1-1.3/idVendor", "046d\n");
        write(root, "1-1.3/idProduct", "c31c\n");
        write(root, "1-1:1.0/bInterfaceClass", "09\n");
        write(root, "2-1/idVendor", "0bda\n");

        let records = usb_records(root).unwrap();
        assert_eq!(
            records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            ["1-1", "1-1.3", "2-1", "usb1"]
        );

        let forest = crate::hardware::usb::build_usb_forest(&records);
        // "2-1" points at a root hub that is not there, so it is its own root.
        assert_eq!(forest.len(), 2);
        let controller = forest.iter().find(|d| d.name == "xHCI Host Controller").unwrap();
        let hub = &controller.connected_devices[0];
        assert_eq!(hub.name, "USB2.0 Hub");
        assert_eq!(hub.connected_devices[0].name, "Keyboard");
        assert_eq!(hub.connected_devices[0].vendor, "Logitech");
        assert_eq!(hub.connected_devices[0].product_id, "c31c");
        assert!(forest.iter().any(|d| d.name == "USB device 2-1"));
    }

    #[test]
    fn missing_roots_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        assert!(usb_records(&missing).unwrap().is_empty());
        assert!(sound_cards(&missing).unwrap().is_empty());
        assert!(drm_displays(&missing).unwrap().is_empty());
        assert!(hwmon_fan_speeds(&missing).unwrap().is_empty());
    }

    #[test]
    fn asound_card_lines() {
        let cards = indoc! {"
             0 [PCH            ]: HDA-Intel - HDA Intel PCH
                                  HDA Intel PCH at 0xf7f10000 irq 32
             1 [NVidia         ]: HDA-Intel - HDA NVidia
                                  HDA NVidia at 0xf7080000 irq 17
        "};

        assert_eq!(
            parse_asound_cards(cards),
            [
                AsoundCard {
                    index: 0,
                    driver: "HDA-Intel",
                    name: "HDA Intel PCH"
                },
                AsoundCard {
                    index: 1,
                    driver: "HDA-Intel",
                    name: "HDA NVidia"
                },
            ]
        );
        assert!(parse_asound_cards("--- no soundcards ---").is_empty());
    }

    #[test]
    fn sound_cards_from_procfs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "cards",
            " 0 [PCH            ]: HDA-Intel - HDA Intel PCH\n                      HDA Intel PCH at 0xf7f10000 irq 32\n",
        );
        write(
            root,
            "version",
            "Advanced Linux Sound Architecture Driver Version k6.5.0.\n",
        );
        write(root, "card0/codec#0", "Codec: Realtek ALC892\nAddress: 0\n");

        let cards = sound_cards(root).unwrap();
        assert_eq!(
            cards,
            [SoundCard {
                driver_version: "Advanced Linux Sound Architecture Driver Version k6.5.0."
                    .to_string(),
                name: "HDA-Intel HDA Intel PCH".to_string(),
                codec: "Realtek ALC892".to_string(),
            }]
        );
    }

    #[test]
    fn displays_with_edid_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("card0-eDP-1")).unwrap();
        fs::write(
            root.join("card0-eDP-1/edid"),
            [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x10, 0xAC],
        )
        .unwrap();
        fs::create_dir_all(root.join("card0-HDMI-A-1")).unwrap();
        fs::write(root.join("card0-HDMI-A-1/edid"), []).unwrap();
        fs::create_dir_all(root.join("renderD128")).unwrap();

        let displays = drm_displays(root).unwrap();
        assert_eq!(displays.len(), 1);
        assert_eq!(displays[0].connector, "card0-eDP-1");
        assert_eq!(displays[0].manufacturer_id().as_deref(), Some("DEL"));
    }

    #[test]
    fn fans_skip_sleeping_devices() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "hwmon0/fan1_input", "1200\n");
        write(root, "hwmon0/fan2_input", "0\n");
        write(root, "hwmon0/temp1_input", "45000\n");
        write(root, "hwmon1/fan1_input", "900\n");
        write(root, "hwmon1/device/power_state", "D3cold\n");

        assert_eq!(hwmon_fan_speeds(root).unwrap(), [1200, 0]);
    }

    #[test]
    fn dmi_values() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "sys_vendor", "LENOVO\n");
        write(root, "bios_vendor", "LENOVO\n");
        write(root, "bios_version", "N2HET77W (1.60 )\n");

        let dmi = Dmi::new(root.to_path_buf());
        assert_eq!(dmi.attribute("sys_vendor").unwrap().as_deref(), Some("LENOVO"));
        assert_eq!(dmi.attribute("product_serial").unwrap(), None);
        assert_eq!(
            dmi.firmware().unwrap(),
            Firmware {
                vendor: Some("LENOVO".into()),
                version: Some("N2HET77W (1.60 )".into()),
                release_date: None,
            }
        );
    }
}
