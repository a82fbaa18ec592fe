//! USB devices, found by walking the configuration manager's device tree.

use std::mem::size_of;

use windows::{
    core::PCWSTR,
    Win32::Devices::DeviceAndDriverInstallation::{
        CM_Get_Child, CM_Get_DevNode_Registry_PropertyW, CM_Get_Device_IDW, CM_Get_Sibling,
        CM_Locate_DevNodeW, CM_DRP_DEVICEDESC, CM_DRP_FRIENDLYNAME, CM_DRP_MFG,
        CM_LOCATE_DEVNODE_NORMAL, CONFIGRET, CR_NO_SUCH_DEVNODE, CR_SUCCESS, MAX_DEVICE_ID_LEN,
    },
};

use crate::{
    hardware::{
        error::{HalError, HalResult},
        usb::UsbRecord,
    },
    utils::strings::non_empty,
};

fn check(query: &'static str, result: CONFIGRET) -> HalResult<()> {
    if result == CR_SUCCESS {
        Ok(())
    } else {
        Err(HalError::native(
            query,
            result.0 as i32,
            format!("configuration manager returned {:#x}", result.0),
        ))
    }
}

fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}

fn device_id(node: u32) -> HalResult<String> {
    let mut buf = [0u16; MAX_DEVICE_ID_LEN as usize + 1];

    // SAFETY: The buffer is a live slice; the call writes at most its length.
    check("CM_Get_Device_IDW", unsafe {
        CM_Get_Device_IDW(node, &mut buf, 0)
    })?;

    Ok(wide_to_string(&buf))
}

/// A string property of the device's driver key. Devices routinely lack some of these, so
/// any failure is [`None`].
fn registry_property(node: u32, property: u32) -> Option<String> {
    let mut buf = [0u16; 256];
    let mut len = (buf.len() * size_of::<u16>()) as u32;

    // SAFETY: `len` is the size in bytes of `buf`, which outlives the call.
    let result = unsafe {
        CM_Get_DevNode_Registry_PropertyW(
            node,
            property,
            None,
            Some(buf.as_mut_ptr().cast()),
            &mut len,
            0,
        )
    };

    if result != CR_SUCCESS {
        return None;
    }

    non_empty(&wide_to_string(&buf))
}

fn children(node: u32) -> HalResult<Vec<u32>> {
    let mut children = Vec::new();
    let mut current = 0u32;

    // SAFETY: `current` is a live u32 the call writes the devnode handle into.
    let mut result = unsafe { CM_Get_Child(&mut current, node, 0) };

    while result == CR_SUCCESS {
        children.push(current);
        let previous = current;

        // SAFETY: As above.
        result = unsafe { CM_Get_Sibling(&mut current, previous, 0) };
    }

    if result == CR_NO_SUCH_DEVNODE {
        Ok(children)
    } else {
        check("CM_Get_Child", result).map(|_| children)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct UsbId {
    vendor_id: String,
    product_id: String,
    serial_number: String,
}

/// Splits a device instance id such as `USB\VID_046D&PID_C52B\5&2D6E1C8&0&3`. Interfaces
/// of composite devices (`&MI_xx`) are not devices of their own and give [`None`], as does
/// anything not on the USB enumerator. Instance ids Windows made up, rather than the
/// device's own serial, contain `&` and leave the serial empty.
fn parse_usb_id(id: &str) -> Option<UsbId> {
    let mut parts = id.split('\\');

    if !parts.next()?.eq_ignore_ascii_case("USB") {
        return None;
    }

    let hardware = parts.next()?;
    let instance = parts.next().unwrap_or_default();

    if hardware.to_ascii_uppercase().contains("&MI_") {
        return None;
    }

    let field = |prefix: &str| {
        hardware
            .split('&')
            .find_map(|part| {
                part.get(..prefix.len())
                    .filter(|head| head.eq_ignore_ascii_case(prefix))
                    .map(|_| part[prefix.len()..].to_ascii_lowercase())
            })
            .unwrap_or_default()
    };

    Some(UsbId {
        vendor_id: field("VID_"),
        product_id: field("PID_"),
        serial_number: if instance.contains('&') {
            String::new()
        } else {
            instance.to_string()
        },
    })
}

/// Every USB device and root hub, parented to the nearest USB device above it.
pub(super) fn usb_records() -> HalResult<Vec<UsbRecord>> {
    let mut root = 0u32;

    // SAFETY: `root` is a live u32 and a null device id asks for the root of the tree.
    check("CM_Locate_DevNodeW", unsafe {
        CM_Locate_DevNodeW(&mut root, PCWSTR::null(), CM_LOCATE_DEVNODE_NORMAL)
    })?;

    let mut records = Vec::new();
    let mut pending: Vec<(u32, Option<String>)> = vec![(root, None)];

    while let Some((node, usb_parent)) = pending.pop() {
        let id = device_id(node)?;

        let parent_of_children = match parse_usb_id(&id) {
            Some(usb) => {
                let name = registry_property(node, CM_DRP_FRIENDLYNAME)
                    .or_else(|| registry_property(node, CM_DRP_DEVICEDESC))
                    .unwrap_or_else(|| format!("USB device {id}"));

                records.push(UsbRecord {
                    id: id.clone(),
                    parent_id: usb_parent,
                    name,
                    vendor: registry_property(node, CM_DRP_MFG).unwrap_or_default(),
                    vendor_id: usb.vendor_id,
                    product_id: usb.product_id,
                    serial_number: usb.serial_number,
                });

                Some(id)
            }
            None => usb_parent,
        };

        for child in children(node)? {
            pending.push((child, parent_of_children.clone()));
        }
    }

    records.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(records)
}
