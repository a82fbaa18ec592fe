//! Disk stores, as mounted file systems.

use serde::Serialize;
use sysinfo::Disks;

use super::error::HalResult;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HwDiskStore {
    pub name: String,
    pub mount_point: String,
    pub file_system: String,
    /// The kind of the underlying drive, e.g. `SSD`, `HDD` or `Unknown`.
    pub kind: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub removable: bool,
}

impl HwDiskStore {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }
}

/// Enumerates disks through sysinfo, in the order the platform lists them.
pub(crate) fn sysinfo_disk_stores() -> HalResult<Vec<HwDiskStore>> {
    let disks = Disks::new_with_refreshed_list();

    Ok(disks
        .list()
        .iter()
        .map(|disk| {
            let name = {
                let name = disk.name();

                if name.is_empty() {
                    "No Name".to_string()
                } else {
                    name.to_string_lossy().into_owned()
                }
            };

            HwDiskStore {
                name,
                mount_point: disk.mount_point().to_string_lossy().into_owned(),
                file_system: disk.file_system().to_string_lossy().into_owned(),
                kind: format!("{:?}", disk.kind()),
                total_bytes: disk.total_space(),
                available_bytes: disk.available_space(),
                removable: disk.is_removable(),
            }
        })
        .collect())
}
