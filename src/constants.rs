use std::time::Duration;

use indoc::indoc;

/// The config file location relative to the platform's config directory.
pub const DEFAULT_CONFIG_FILE_LOCATION: &str = "hwscope/hwscope.toml";

// Intervals
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Written out when no config file exists yet.
pub const CONFIG_TEXT: &str = indoc! {r#"
    # This is a default config file for hwscope. All of the settings are commented
    # out by default; if you wish to change them uncomment and modify as you see
    # fit.

    # This group of options represents a command-line option. Flags explicitly
    # added when running (ie: hws --json) will override this config file if an
    # option is also set here.
    [flags]
    # How long processor load is sampled for. Takes a number of milliseconds or a
    # human duration such as "1s" or "500ms". The minimum is 100ms.
    #interval = "1s"
    # Whether USB devices are shown as a tree of hubs and the devices plugged
    # into them, rather than a flat list.
    #usb_tree = true
    # Whether to print the report as JSON.
    #json = false
    # Which sections to report. Defaults to all of them. Possible values are
    # processor, memory, system, sensors, disks, displays, network, sound,
    # power, and usb.
    #sections = ["processor", "memory", "system", "sensors", "disks", "displays", "network", "sound", "power", "usb"]
"#};

#[cfg(test)]
mod test {
    use super::*;
    use crate::options::config::{Config, FlagConfig};

    #[test]
    fn default_config_is_commented_out() {
        let config: Config = toml_edit::de::from_str(CONFIG_TEXT).unwrap();
        assert_eq!(config.flags, Some(FlagConfig::default()));
    }

    /// Uncommenting every option in the default config should still give a valid config.
    #[test]
    fn default_config_uncommented() {
        let uncommented = CONFIG_TEXT
            .lines()
            .map(|line| {
                line.strip_prefix('#')
                    .filter(|rest| !rest.starts_with(' '))
                    .unwrap_or(line)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let config: Config = toml_edit::de::from_str(&uncommented).unwrap();
        let flags = config.flags.unwrap();

        assert_eq!(flags.usb_tree, Some(true));
        assert_eq!(flags.sections.map(|sections| sections.len()), Some(10));
    }
}
