//! Argument parsing via clap.
//!
//! Note that you probably want to keep this as a single file so the build script doesn't
//! trip all over itself.

use clap::*;
use indoc::indoc;

const TEMPLATE: &str = indoc! {
    "{name} {version}
    {author}

    {about}

    {usage-heading} {usage}

    {all-args}"
};

const USAGE: &str = "hws [OPTIONS]";

/// The arguments for hws.
#[derive(Parser, Debug)]
#[command(
    name = "hws",
    version = crate_version!(),
    author = crate_authors!(),
    about = crate_description!(),
    disable_help_flag = true,
    disable_version_flag = true,
    color = ColorChoice::Auto,
    help_template = TEMPLATE,
    override_usage = USAGE,
)]
pub struct Args {
    #[command(flatten)]
    pub general_args: GeneralArgs,

    #[command(flatten)]
    pub output_args: OutputArgs,

    #[cfg(feature = "logging")]
    #[command(flatten)]
    pub debug_args: DebugArgs,

    #[command(flatten)]
    pub other_args: OtherArgs,
}

#[derive(Args, Clone, Debug, Default)]
#[command(next_help_heading = "General Options")]
pub struct GeneralArgs {
    #[arg(
        short = 'C',
        long = "config_location",
        value_name = "PATH",
        help = "Sets the location of the config file.",
        long_help = "Sets the location of the config file. Expects a config file in the TOML format. \
                    If it doesn't exist, a default config file is created at the path."
    )]
    pub config_location: Option<String>,

    #[arg(
        short = 'i',
        long,
        value_name = "TIME",
        help = "How long processor load is sampled for.",
        long_help = "How long processor load is sampled for. Takes a number in milliseconds or a human \
                    duration (e.g. 2s). The minimum is 100ms, and the default is 1s."
    )]
    pub interval: Option<String>,

    #[arg(
        short = 'w',
        long,
        help = "Keeps reporting processor load until interrupted.",
        long_help = "After the report, keeps sampling and printing processor load once per interval \
                    until interrupted with Ctrl-C."
    )]
    pub watch: bool,
}

/// A part of the hardware report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum Section {
    Processor,
    Memory,
    System,
    Sensors,
    Disks,
    Displays,
    Network,
    Sound,
    Power,
    Usb,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::Processor,
        Section::Memory,
        Section::System,
        Section::Sensors,
        Section::Disks,
        Section::Displays,
        Section::Network,
        Section::Sound,
        Section::Power,
        Section::Usb,
    ];

    /// The name used on the command line and in the config file.
    pub fn name(self) -> String {
        self.to_possible_value()
            .map(|value| value.get_name().to_string())
            .unwrap_or_default()
    }
}

#[derive(Args, Clone, Debug, Default)]
#[command(next_help_heading = "Output Options")]
pub struct OutputArgs {
    #[arg(
        short = 's',
        long,
        value_name = "SECTION",
        value_enum,
        hide_possible_values = true,
        help = "Only reports the given section. Can be repeated.",
        long_help = indoc! {
            "Only reports the given section, and can be repeated to report several. By default every \
            section is reported. Supported values are:
            - processor (identity, frequency and load)
            - memory
            - system    (manufacturer, model and firmware)
            - sensors   (temperatures and fans)
            - disks
            - displays
            - network
            - sound
            - power     (batteries)
            - usb"
        }
    )]
    pub section: Vec<Section>,

    #[arg(
        long = "usb_tree",
        help = "Shows USB devices as a tree.",
        long_help = "Shows USB devices as a tree of controllers, hubs, and the devices plugged into \
                    them, rather than as a flat list."
    )]
    pub usb_tree: bool,

    #[arg(long, help = "Prints the report as JSON.")]
    pub json: bool,
}

#[cfg(feature = "logging")]
#[derive(Args, Clone, Debug, Default)]
#[command(next_help_heading = "Debug Options")]
pub struct DebugArgs {
    #[arg(
        long = "log_file",
        value_name = "PATH",
        help = "Writes debug logs to the given file.",
        long_help = "Writes debug logs to the given file. Defaults to 'debug.log' in the current directory."
    )]
    pub log_file: Option<String>,
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Other Options")]
pub struct OtherArgs {
    #[arg(short='h', long, action=ArgAction::Help, help="Prints help info (for more details use '--help').")]
    help: (),

    #[arg(short='V', long, action=ArgAction::Version, help="Prints version information.")]
    version: (),
}

/// Returns an [`Args`].
pub fn get_args() -> Args {
    Args::parse()
}

/// Returns a [`Command`] based off of [`Args`].
pub fn build_cmd() -> Command {
    Args::command()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verify_cli() {
        build_cmd().debug_assert();
    }

    #[test]
    fn no_default_help_heading() {
        let mut cmd = build_cmd();
        let help_str = cmd.render_help();

        assert!(
            !help_str.to_string().contains("\nOptions:\n"),
            "the default 'Options' heading should not exist; if it does then an argument is \
            missing a help heading."
        );
    }

    #[test]
    fn repeated_sections() {
        let args = Args::try_parse_from(["hws", "-s", "usb", "--section", "processor", "--json"]).unwrap();

        assert_eq!(args.output_args.section, [Section::Usb, Section::Processor]);
        assert!(args.output_args.json);
        assert!(!args.output_args.usb_tree);
        assert_eq!(args.general_args.interval, None);
    }

    #[test]
    fn section_names() {
        for section in Section::ALL {
            let name = section.to_possible_value().unwrap();
            assert_eq!(Section::from_str(name.get_name(), true), Ok(section));
        }
        assert!(Section::from_str("gpu", true).is_err());
        assert_eq!(Section::Usb.name(), "usb");
    }
}
