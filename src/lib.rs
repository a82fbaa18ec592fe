//! A hardware abstraction layer: processor identity and load, memory, sensors, disks,
//! displays, network interfaces, sound cards, power sources and USB devices, behind one
//! trait with a backend per platform.
//!
//! ```no_run
//! use hwscope::hardware::create_hardware_abstraction_layer;
//!
//! let hal = create_hardware_abstraction_layer()?;
//! let processor = hal.create_processor();
//! println!("{processor}: {:.1}% busy", processor.load()?);
//! # Ok::<(), hwscope::hardware::error::HalError>(())
//! ```

#![warn(rust_2018_idioms)]

pub mod constants;
pub mod hardware;
pub mod options;
pub mod platform;
pub mod report;

pub mod utils {
    pub mod cancellation_token;
    pub mod data_units;
    pub mod logging;
    pub mod strings;
}
