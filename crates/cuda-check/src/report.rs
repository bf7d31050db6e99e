//! Human-readable and JSON rendering of a [`DiagnosticReport`]
//!
//! The text layout is meant for people reading container build logs and is
//! not a stable interface; scripts should use `--json` or the exit code.

use crate::checks::{
    AccelerationOutcome, AccelerationReport, AvailabilityReport, DiagnosticReport, FailureKind,
};
use std::io::{self, Write};

const PASS: &str = "✅";
const FAIL: &str = "❌";
const WARN: &str = "⚠️ ";

fn banner<W: Write>(out: &mut W, title: &str, width: usize) -> io::Result<()> {
    let rule = "=".repeat(width);
    writeln!(out, "{rule}")?;
    writeln!(out, "{title}")?;
    writeln!(out, "{rule}")
}

pub fn write_text<W: Write>(report: &DiagnosticReport, out: &mut W) -> io::Result<()> {
    writeln!(out, "Starting CUDA installation verification...")?;
    writeln!(out)?;
    write_availability(&report.cuda, out)?;
    writeln!(out)?;
    write_acceleration(&report.cudnn, out)?;
    writeln!(out)?;
    write_summary(report, out)
}

fn write_availability<W: Write>(cuda: &AvailabilityReport, out: &mut W) -> io::Result<()> {
    banner(out, "CUDA Installation Test", 50)?;

    let Some(library) = &cuda.library else {
        let message = cuda
            .failure
            .as_ref()
            .map(|f| f.message.as_str())
            .unwrap_or("unknown error");
        return writeln!(out, "{FAIL} Failed to load CUDA driver: {message}");
    };
    writeln!(out, "{PASS} CUDA driver library: {library}")?;

    if cuda.accelerator_present {
        writeln!(out, "{PASS} CUDA available: true")?;
    } else if cuda.failure.is_none() {
        return writeln!(out, "{FAIL} CUDA is not available");
    }

    if cuda.device_count > 0 {
        writeln!(out, "{PASS} CUDA device count: {}", cuda.device_count)?;
    }
    if let Some(version) = cuda.driver_version {
        writeln!(out, "{PASS} CUDA driver version: {version}")?;
    }

    for device in &cuda.devices {
        let marker = if device.validate().is_ok() { PASS } else { FAIL };
        writeln!(out, "{marker} Device {}: {}", device.ordinal, device.name)?;
        writeln!(out, "   - Memory: {:.1} GB", device.total_memory_gib())?;
        writeln!(
            out,
            "   - Compute capability: {}",
            device.compute_capability
        )?;
    }

    if let Some(probe) = &cuda.probe {
        writeln!(out)?;
        banner(out, "Testing CUDA Operations", 30)?;
        writeln!(out, "{PASS} Matrix multiplication test passed")?;
        writeln!(out, "   Result shape: {:?}", probe.shape)?;
        writeln!(out, "   Result device: cuda:{}", probe.output_device)?;
        writeln!(out, "   Kernel time: {:.2} ms", probe.execution_time_ms)?;
        writeln!(
            out,
            "   Max relative error: {:.1e}",
            probe.max_relative_error
        )?;
    }

    if let Some(failure) = &cuda.failure {
        writeln!(out, "{FAIL} CUDA test failed: {}", failure.message)?;
    }

    Ok(())
}

fn write_acceleration<W: Write>(cudnn: &AccelerationReport, out: &mut W) -> io::Result<()> {
    match &cudnn.outcome {
        AccelerationOutcome::Skipped => {
            writeln!(out, "{WARN} cuDNN check skipped: no CUDA device available")
        }
        AccelerationOutcome::Disabled => writeln!(out, "{FAIL} cuDNN enabled: false"),
        AccelerationOutcome::Enabled(info) => {
            writeln!(out, "{PASS} cuDNN enabled: true ({})", info.library)?;
            writeln!(out, "{PASS} cuDNN version: {} ({})", info.version.0, info.version)?;
            writeln!(out, "{PASS} cuDNN built for CUDA: {}", info.cudart_version)
        }
        AccelerationOutcome::Failed(failure) => match failure.kind {
            FailureKind::MissingDependency => {
                writeln!(out, "{FAIL} Failed to load cuDNN: {}", failure.message)
            }
            FailureKind::Runtime => {
                writeln!(out, "{FAIL} cuDNN test failed: {}", failure.message)
            }
        },
    }
}

fn write_summary<W: Write>(report: &DiagnosticReport, out: &mut W) -> io::Result<()> {
    banner(out, "SUMMARY", 50)?;

    for (label, passed) in [
        ("CUDA installation", report.cuda.passed()),
        ("cuDNN installation", report.cudnn.passed()),
    ] {
        if passed {
            writeln!(out, "{PASS} {label}: PASSED")?;
        } else {
            writeln!(out, "{FAIL} {label}: FAILED")?;
        }
    }

    writeln!(out)?;
    if report.passed() {
        writeln!(
            out,
            "🎉 Container is ready for GPU-accelerated applications!"
        )
    } else {
        writeln!(out, "{WARN} Some issues detected. Check the output above.")
    }
}

/// Serialize the report as a single pretty-printed JSON document
pub fn write_json<W: Write>(report: &DiagnosticReport, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}
