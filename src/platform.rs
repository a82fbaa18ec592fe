//! Detection of the platform the process is running on.

use std::{fmt, sync::OnceLock};

use serde::Serialize;

/// The operating system family a hardware backend targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    Solaris,
    FreeBsd,
    Unknown,
}

static CURRENT: OnceLock<Platform> = OnceLock::new();

impl Platform {
    /// Returns the platform of the running process.
    ///
    /// The check only happens once; every later call returns the same value.
    pub fn current() -> Platform {
        *CURRENT.get_or_init(|| {
            let platform = Platform::from_os_name(std::env::consts::OS);
            log::debug!("detected platform: {platform}");
            platform
        })
    }

    /// Maps an OS name as reported by [`std::env::consts::OS`] to a [`Platform`].
    pub fn from_os_name(os: &str) -> Platform {
        match os {
            "windows" => Platform::Windows,
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            "solaris" | "illumos" => Platform::Solaris,
            "freebsd" => Platform::FreeBsd,
            _ => Platform::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::Linux => "Linux",
            Platform::MacOs => "macOS",
            Platform::Solaris => "Solaris",
            Platform::FreeBsd => "FreeBSD",
            Platform::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
