//! How to handle config files and arguments.

pub mod args;
pub mod config;
mod error;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::ValueEnum;

pub use self::{
    args::{get_args, Args, Section},
    config::Config,
    error::{OptionError, OptionResult},
};
use self::config::{FlagConfig, StringOrNum};
use crate::constants::*;

/// Returns whether a flag is set, checking the arguments first and then the config file.
macro_rules! is_flag_enabled {
    ($flag_name:ident, $arg:expr, $config:expr) => {
        if $arg.$flag_name {
            true
        } else if let Some(flags) = &$config.flags {
            flags.$flag_name.unwrap_or(false)
        } else {
            false
        }
    };
}

/// What to report and how, after merging arguments with the config file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportOptions {
    /// How long processor load is sampled for.
    pub interval: Duration,
    /// Sections to report, in the order they were asked for, without duplicates.
    pub sections: Vec<Section>,
    pub usb_tree: bool,
    pub json: bool,
    pub watch: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            sections: Section::ALL.to_vec(),
            usb_tree: false,
            json: false,
            watch: false,
        }
    }
}

impl ReportOptions {
    pub fn includes(&self, section: Section) -> bool {
        self.sections.contains(&section)
    }
}

/// Merges the arguments and config file into a [`ReportOptions`]. Arguments win over the
/// config file, which wins over the defaults.
pub fn init_options(args: &Args, config: &Config) -> OptionResult<ReportOptions> {
    let general = &args.general_args;
    let output = &args.output_args;

    Ok(ReportOptions {
        interval: get_interval(general.interval.as_deref(), config)?,
        sections: get_sections(&output.section, config)?,
        usb_tree: is_flag_enabled!(usb_tree, output, config),
        json: is_flag_enabled!(json, output, config),
        watch: general.watch,
    })
}

/// Returns the config path to use. If `override_config_path` is set, then that is
/// used; otherwise the default location under the platform's config directory.
pub fn get_config_path(override_config_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = override_config_path {
        return Some(path.to_path_buf());
    }

    dirs::config_dir().map(|path| path.join(DEFAULT_CONFIG_FILE_LOCATION))
}

/// Get the config at `config_path`. If there is no config file at the specified path, it
/// will try to create a new file with the default settings, and return the default config.
pub fn get_or_create_config(config_path: Option<&Path>) -> OptionResult<Config> {
    let Some(path) = get_config_path(config_path) else {
        log::debug!("no config directory found, using the default config");
        return Ok(Config::default());
    };

    if path.exists() {
        let config_string = fs::read_to_string(&path)?;
        return Ok(toml_edit::de::from_str(&config_string)?);
    }

    if let Some(parent_path) = path.parent() {
        fs::create_dir_all(parent_path)?;
    }
    fs::write(&path, CONFIG_TEXT)?;
    log::debug!("wrote a default config to {}", path.display());

    Ok(Config::default())
}

/// Parses a number of milliseconds or a human duration like `2s`.
fn try_parse_interval(s: &str) -> Result<Duration, ()> {
    if let Ok(ms) = s.trim().parse::<u64>() {
        Ok(Duration::from_millis(ms))
    } else {
        humantime::parse_duration(s.trim()).map_err(|_| ())
    }
}

fn get_interval(arg: Option<&str>, config: &Config) -> OptionResult<Duration> {
    let flag = config.flags.as_ref().and_then(|flags| flags.interval.as_ref());

    let interval = if let Some(interval) = arg {
        let interval =
            try_parse_interval(interval).map_err(|_| OptionError::invalid_arg_value("interval"))?;

        if interval < MIN_INTERVAL {
            return Err(OptionError::arg(format!(
                "'--interval' must be at least {}ms.",
                MIN_INTERVAL.as_millis()
            )));
        }

        interval
    } else if let Some(interval) = flag {
        let interval = match interval {
            StringOrNum::String(s) => {
                try_parse_interval(s).map_err(|_| OptionError::invalid_config_value("interval"))?
            }
            StringOrNum::Num(ms) => Duration::from_millis(*ms),
        };

        if interval < MIN_INTERVAL {
            return Err(OptionError::config(format!(
                "'interval' must be at least {}ms.",
                MIN_INTERVAL.as_millis()
            )));
        }

        interval
    } else {
        DEFAULT_INTERVAL
    };

    Ok(interval)
}

fn get_sections(args: &[Section], config: &Config) -> OptionResult<Vec<Section>> {
    let sections = if !args.is_empty() {
        args.to_vec()
    } else if let Some(FlagConfig {
        sections: Some(sections),
        ..
    }) = &config.flags
    {
        if sections.is_empty() {
            return Err(OptionError::config(
                "'sections' must name at least one section.",
            ));
        }

        sections
            .iter()
            .map(|name| {
                Section::from_str(name, true).map_err(|_| {
                    OptionError::config(format!("'{name}' is not a valid section name."))
                })
            })
            .collect::<OptionResult<Vec<_>>>()?
    } else {
        Section::ALL.to_vec()
    };

    let mut deduped = Vec::with_capacity(sections.len());
    for section in sections {
        if !deduped.contains(&section) {
            deduped.push(section);
        }
    }

    Ok(deduped)
}
