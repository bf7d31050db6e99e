use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConfigOverrides, CudaOverrides, OutputOverrides};

#[derive(Debug, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

pub fn command() -> Command {
    Command::new("cuda-check")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Verify that CUDA and cuDNN are installed and operational in this container")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("TOML configuration file")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("device")
                .long("device")
                .help("Device ordinal the probe multiplication runs on")
                .value_name("ORDINAL"),
        )
        .arg(
            Arg::new("matrix-size")
                .long("matrix-size")
                .help("Side length of the square probe matrices")
                .value_name("N"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Seed for the probe's random inputs")
                .value_name("NUMBER"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Append a machine-readable JSON report to stdout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Logging level")
                .value_name("LEVEL")
                .value_parser(["error", "warn", "info", "debug", "trace"]),
        )
}

pub fn parse_args() -> Result<CliArgs> {
    args_from_matches(&command().get_matches())
}

/// Parse an explicit argument list, the first item being the binary name
pub fn parse_args_from<I, T>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command()
        .try_get_matches_from(args)
        .context("Invalid command line")?;
    args_from_matches(&matches)
}

fn args_from_matches(matches: &ArgMatches) -> Result<CliArgs> {
    let parse_number = |name: &str| -> Result<Option<u64>> {
        matches
            .get_one::<String>(name)
            .map(|value| {
                value
                    .parse::<u64>()
                    .with_context(|| format!("Invalid --{name} value: {value}"))
            })
            .transpose()
    };

    let device = parse_number("device")?
        .map(u32::try_from)
        .transpose()
        .context("Device ordinal out of range")?;
    let matrix_size = parse_number("matrix-size")?
        .map(usize::try_from)
        .transpose()
        .context("Matrix size out of range")?;
    let seed = parse_number("seed")?;

    let log_level = if matches.get_flag("debug") {
        Some("debug".to_string())
    } else {
        matches.get_one::<String>("log-level").cloned()
    };

    Ok(CliArgs {
        config_path: matches.get_one::<String>("config").map(PathBuf::from),
        overrides: ConfigOverrides {
            cuda: CudaOverrides {
                device,
                matrix_size,
                seed,
            },
            output: OutputOverrides {
                json: matches.get_flag("json").then_some(true),
                log_level,
            },
        },
    })
}

/// Install a stderr `fmt` subscriber so stdout carries only the report
pub fn setup_logging(level: &str) -> Result<()> {
    let level_filter = match level {
        "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "info" => tracing::Level::INFO,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", level)),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_level(true)
                .with_target(false),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            level_filter,
        ))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
