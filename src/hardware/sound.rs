//! Sound cards and the drivers that run them.

use serde::Serialize;

/// A sound card and the driver handling it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SoundCard {
    pub driver_version: String,
    pub name: String,
    pub codec: String,
}
