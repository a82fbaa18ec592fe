#![warn(rust_2018_idioms)]

use std::{
    io::{stdout, Write},
    path::Path,
    sync::Arc,
};

use anyhow::{Context, Result};
use hwscope::{
    hardware::{create_hardware_abstraction_layer, processor::CentralProcessor},
    options::{get_args, get_or_create_config, init_options, ReportOptions},
    report::Snapshot,
    utils::cancellation_token::CancellationToken,
};

fn main() -> Result<()> {
    let args = get_args();

    #[cfg(feature = "logging")]
    {
        let log_file = args.debug_args.log_file.as_deref().unwrap_or("debug.log");
        hwscope::utils::logging::init_logger(log::LevelFilter::Debug, std::ffi::OsStr::new(log_file))?;
    }

    let config = get_or_create_config(args.general_args.config_location.as_deref().map(Path::new))
        .context("Unable to properly parse or create the config file.")?;
    let options = init_options(&args, &config)?;

    let hal = create_hardware_abstraction_layer()
        .context("Unable to read hardware on this platform.")?;

    // Ctrl-C cancels any in-flight load sample.
    let token = Arc::new(CancellationToken::default());
    {
        let token = token.clone();
        ctrlc::set_handler(move || token.cancel())?;
    }

    let snapshot = Snapshot::collect(hal.as_ref(), &options, &token);
    print_snapshot(&snapshot, &options)?;

    if options.watch {
        watch_load(&hal.create_processor(), &options, &token)?;
    }

    Ok(())
}

fn print_snapshot(snapshot: &Snapshot, options: &ReportOptions) -> Result<()> {
    let mut out = stdout().lock();

    if options.json {
        serde_json::to_writer_pretty(&mut out, snapshot)?;
        writeln!(out)?;
    } else {
        write!(out, "{snapshot}")?;
    }

    out.flush()?;
    Ok(())
}

/// Prints processor load once per interval until cancelled.
fn watch_load(
    processor: &CentralProcessor, options: &ReportOptions, token: &CancellationToken,
) -> Result<()> {
    let mut out = stdout();

    while !token.is_cancelled() {
        let load = processor.load_over(options.interval, token)?;
        if token.is_cancelled() {
            break;
        }

        write_load(&mut out, load, options.json)?;
        out.flush()?;
    }

    Ok(())
}

fn write_load(out: &mut impl Write, load: f32, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer(&mut *out, &serde_json::json!({ "load": load }))?;
        writeln!(out)?;
    } else {
        writeln!(out, "Load: {load:.1}%")?;
    }

    Ok(())
}
