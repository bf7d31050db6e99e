use anyhow::{Context, Result};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::info;

use cuda_check::{
    cli::{parse_args, setup_logging},
    report::{write_json, write_text},
    run_checks, CheckConfig,
};

/// Configuration or command line problems, as opposed to a failed check
const USAGE_ERROR: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(USAGE_ERROR)
        }
    }
}

fn run() -> Result<u8> {
    let args = parse_args()?;
    let config = CheckConfig::load(args.config_path.as_deref(), &args.overrides)
        .context("Failed to load configuration")?;
    setup_logging(&config.output.log_level)?;

    info!("Starting cuda-check v{}", env!("CARGO_PKG_VERSION"));

    let report = run_checks(&config);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_text(&report, &mut out).context("Failed to write report")?;
    if config.output.json {
        writeln!(out)?;
        write_json(&report, &mut out).context("Failed to write JSON report")?;
    }
    out.flush()?;

    Ok(report.exit_code())
}
