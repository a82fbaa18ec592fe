//! The hardware abstraction layer and the factory that picks a backend for the running
//! platform.

pub mod computer_system;
pub mod disks;
pub mod displays;
pub mod error;
pub mod memory;
pub mod network;
pub mod power;
pub mod processor;
pub mod sensors;
pub mod sound;
pub mod usb;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod linux;
        use self::linux::LinuxHardwareAbstractionLayer as HostLayer;
    } else if #[cfg(target_os = "windows")] {
        mod windows;
        use self::windows::WindowsHardwareAbstractionLayer as HostLayer;
    } else if #[cfg(target_os = "macos")] {
        mod macos;
        use self::macos::MacHardwareAbstractionLayer as HostLayer;
    } else if #[cfg(target_os = "freebsd")] {
        mod freebsd;
        use self::freebsd::FreeBsdHardwareAbstractionLayer as HostLayer;
    }
}

use self::{
    computer_system::ComputerSystem,
    disks::HwDiskStore,
    displays::Display,
    error::{HalError, HalResult},
    memory::GlobalMemory,
    network::NetworkIf,
    power::PowerSource,
    processor::CentralProcessor,
    sensors::Sensors,
    sound::SoundCard,
    usb::UsbDevice,
};
use crate::platform::Platform;

/// Access to the machine's hardware.
///
/// The `create_*` methods hand out component objects that query the system when asked.
/// The remaining methods enumerate devices fresh on every call.
pub trait HardwareAbstractionLayer: Send + Sync {
    /// The platform this layer reads.
    fn platform(&self) -> Platform;

    fn create_computer_system(&self) -> Box<dyn ComputerSystem>;

    fn create_memory(&self) -> Box<dyn GlobalMemory>;

    fn create_processor(&self) -> CentralProcessor;

    fn create_sensors(&self) -> Box<dyn Sensors>;

    fn disk_stores(&self) -> HalResult<Vec<HwDiskStore>>;

    fn displays(&self) -> HalResult<Vec<Display>>;

    fn network_ifs(&self) -> HalResult<Vec<NetworkIf>>;

    fn sound_cards(&self) -> HalResult<Vec<SoundCard>>;

    fn power_sources(&self) -> HalResult<Vec<PowerSource>>;

    /// USB devices. With `tree`, the result is a forest rooted at the host controllers;
    /// otherwise every device is listed once with no children.
    fn usb_devices(&self, tree: bool) -> HalResult<Vec<UsbDevice>>;
}

/// Creates the layer for the platform we are running on.
pub fn create_hardware_abstraction_layer() -> HalResult<Box<dyn HardwareAbstractionLayer>> {
    create_for(Platform::current())
}

/// Creates the layer for `platform`. Only the running platform's backend is compiled in, so
/// asking for any other platform fails with [`HalError::UnsupportedPlatform`].
pub fn create_for(platform: Platform) -> HalResult<Box<dyn HardwareAbstractionLayer>> {
    match platform {
        #[cfg(target_os = "linux")]
        Platform::Linux => Ok(Box::new(HostLayer::default())),
        #[cfg(target_os = "windows")]
        Platform::Windows => Ok(Box::new(HostLayer::default())),
        #[cfg(target_os = "macos")]
        Platform::MacOs => Ok(Box::new(HostLayer::default())),
        #[cfg(target_os = "freebsd")]
        Platform::FreeBsd => Ok(Box::new(HostLayer::default())),
        other => {
            log::debug!("no hardware backend for platform '{other}'");
            Err(HalError::UnsupportedPlatform(other))
        }
    }
}

/// The platforms [`create_for`] can build a layer for in this build.
pub fn registered_platforms() -> &'static [Platform] {
    #[cfg(target_os = "linux")]
    const REGISTERED: &[Platform] = &[Platform::Linux];
    #[cfg(target_os = "windows")]
    const REGISTERED: &[Platform] = &[Platform::Windows];
    #[cfg(target_os = "macos")]
    const REGISTERED: &[Platform] = &[Platform::MacOs];
    #[cfg(target_os = "freebsd")]
    const REGISTERED: &[Platform] = &[Platform::FreeBsd];
    #[cfg(not(any(
        target_os = "linux",
        target_os = "windows",
        target_os = "macos",
        target_os = "freebsd"
    )))]
    const REGISTERED: &[Platform] = &[];

    REGISTERED
}
