//! USB devices, as a flat list or as a forest rooted at the host controllers.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// A USB device. In tree form, `connected_devices` holds the devices plugged into it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UsbDevice {
    pub name: String,
    pub vendor: String,
    pub vendor_id: String,
    pub product_id: String,
    pub serial_number: String,
    pub connected_devices: Vec<UsbDevice>,
}

impl UsbDevice {
    /// The number of devices in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .connected_devices
            .iter()
            .map(UsbDevice::subtree_len)
            .sum::<usize>()
    }
}

/// A device as a backend enumerates it: flat, with a link to its parent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsbRecord {
    /// Unique within one enumeration.
    pub id: String,
    /// The id of the hub or controller this device is attached to, if any.
    pub parent_id: Option<String>,
    pub name: String,
    pub vendor: String,
    pub vendor_id: String,
    pub product_id: String,
    pub serial_number: String,
}

impl UsbRecord {
    fn to_device(&self) -> UsbDevice {
        UsbDevice {
            name: self.name.clone(),
            vendor: self.vendor.clone(),
            vendor_id: self.vendor_id.clone(),
            product_id: self.product_id.clone(),
            serial_number: self.serial_number.clone(),
            connected_devices: Vec::new(),
        }
    }
}

/// Every record as a childless device, in enumeration order.
pub fn flatten_usb_records(records: &[UsbRecord]) -> Vec<UsbDevice> {
    records.iter().map(UsbRecord::to_device).collect()
}

/// Builds the device forest described by the records' parent links.
///
/// Roots are records without a parent, or whose parent is unknown or themselves. Every
/// record ends up in the forest exactly once; a record only reachable through a cycle of
/// parent links becomes a root where the cycle is first entered, in enumeration order.
/// Children keep enumeration order.
pub fn build_usb_forest(records: &[UsbRecord]) -> Vec<UsbDevice> {
    let index_of: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(index, record)| (record.id.as_str(), index))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut is_root = vec![true; records.len()];

    for (index, record) in records.iter().enumerate() {
        if let Some(&parent) = record
            .parent_id
            .as_deref()
            .and_then(|parent_id| index_of.get(parent_id))
        {
            if parent != index {
                children[parent].push(index);
                is_root[index] = false;
            }
        }
    }

    let mut visited = HashSet::with_capacity(records.len());
    let mut forest = Vec::new();

    for index in (0..records.len()).filter(|&index| is_root[index]) {
        if let Some(device) = build_subtree(index, records, &children, &mut visited) {
            forest.push(device);
        }
    }

    // Whatever is left hangs off a parent cycle.
    for index in 0..records.len() {
        if let Some(device) = build_subtree(index, records, &children, &mut visited) {
            log::debug!("usb device '{}' is part of a parent cycle", records[index].id);
            forest.push(device);
        }
    }

    forest
}

fn build_subtree(
    index: usize, records: &[UsbRecord], children: &[Vec<usize>], visited: &mut HashSet<usize>,
) -> Option<UsbDevice> {
    if !visited.insert(index) {
        return None;
    }

    let mut device = records[index].to_device();
    device.connected_devices = children[index]
        .iter()
        .filter_map(|&child| build_subtree(child, records, children, visited))
        .collect();

    Some(device)
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(id: &str, parent: Option<&str>) -> UsbRecord {
        UsbRecord {
            id: id.to_string(),
            parent_id: parent.map(str::to_string),
            name: format!("device {id}"),
            ..Default::default()
        }
    }

    fn names(devices: &[UsbDevice]) -> Vec<&str> {
        devices.iter().map(|device| device.name.as_str()).collect()
    }

    #[test]
    fn flat_list_keeps_order() {
        let records = [record("usb1", None), record("1-1", Some("usb1"))];
        let flat = flatten_usb_records(&records);

        assert_eq!(names(&flat), ["device usb1", "device 1-1"]);
        assert!(flat.iter().all(|device| device.connected_devices.is_empty()));
    }

    #[test]
    fn builds_hub_tree() {
        let records = [
            record("usb1", None),
            record("1-1", Some("usb1")),
            record("1-1.2", Some("1-1")),
            record("usb2", None),
            record("1-1.1", Some("1-1")),
            record("1-2", Some("usb1")),
        ];
        let forest = build_usb_forest(&records);

        assert_eq!(names(&forest), ["device usb1", "device usb2"]);
        let hub = &forest[0].connected_devices[0];
        assert_eq!(names(&forest[0].connected_devices), ["device 1-1", "device 1-2"]);
        assert_eq!(names(&hub.connected_devices), ["device 1-1.2", "device 1-1.1"]);
        assert_eq!(forest.iter().map(UsbDevice::subtree_len).sum::<usize>(), 6);
    }

    #[test]
    fn unknown_and_self_parents_become_roots() {
        let records = [record("a", Some("missing")), record("b", Some("b"))];
        let forest = build_usb_forest(&records);

        assert_eq!(names(&forest), ["device a", "device b"]);
    }

    #[test]
    fn cycles_are_broken() {
        let records = [
            record("usb1", None),
            record("x", Some("z")),
            record("y", Some("x")),
            record("z", Some("y")),
            record("w", Some("y")),
        ];
        let forest = build_usb_forest(&records);

        // Every record appears exactly once.
        assert_eq!(forest.iter().map(UsbDevice::subtree_len).sum::<usize>(), 5);
        assert_eq!(names(&forest), ["device usb1", "device x"]);

        let x = &forest[1];
        assert_eq!(names(&x.connected_devices), ["device y"]);
        assert_eq!(
            names(&x.connected_devices[0].connected_devices),
            ["device z", "device w"]
        );
        assert!(x.connected_devices[0].connected_devices[0]
            .connected_devices
            .is_empty());
    }

    #[test]
    fn empty_enumeration() {
        assert!(build_usb_forest(&[]).is_empty());
        assert!(flatten_usb_records(&[]).is_empty());
    }
}
