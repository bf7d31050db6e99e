//! Accelerator availability check
//!
//! Loads the GPU runtime, confirms an accelerator is present, enumerates
//! every device and runs the matrix multiplication probe on the configured
//! one.

use super::CheckFailure;
use crate::config::CudaSettings;
use crate::error::{CheckError, Result};
use crate::gpu::{CudaVersion, DeviceDescriptor, GpuBackend, MatrixDimensions, ProbeResult};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    /// Library the runtime was loaded from, if it loaded at all
    pub library: Option<String>,
    pub accelerator_present: bool,
    pub driver_version: Option<CudaVersion>,
    pub device_count: u32,
    pub devices: Vec<DeviceDescriptor>,
    /// Only set when the probe ran and its result verified
    pub probe: Option<ProbeResult>,
    pub failure: Option<CheckFailure>,
}

impl AvailabilityReport {
    pub fn passed(&self) -> bool {
        self.failure.is_none() && self.accelerator_present && self.probe.is_some()
    }
}

/// Run the availability check against whatever `load` produces
///
/// Never fails: load errors and runtime errors end up in
/// [`AvailabilityReport::failure`].
pub fn check_availability<B, L>(load: L, settings: &CudaSettings) -> AvailabilityReport
where
    B: GpuBackend,
    L: FnOnce() -> Result<B>,
{
    let mut report = AvailabilityReport::default();

    let backend = match load() {
        Ok(backend) => backend,
        Err(e) => {
            warn!("GPU runtime could not be loaded: {}", e);
            report.failure = Some(CheckFailure::from(&e));
            return report;
        }
    };
    report.library = Some(backend.library_path());

    if let Err(e) = exercise_backend(&backend, settings, &mut report) {
        error!("CUDA availability check failed: {}", e);
        report.failure = Some(CheckFailure::from(&e));
    }

    report
}

fn exercise_backend<B: GpuBackend>(
    backend: &B,
    settings: &CudaSettings,
    report: &mut AvailabilityReport,
) -> Result<()> {
    report.accelerator_present = backend.is_available()?;
    if !report.accelerator_present {
        info!("No accelerator visible to the CUDA driver");
        return Ok(());
    }

    report.driver_version = Some(backend.driver_version()?);

    let count = backend.device_count()?;
    if count == 0 {
        info!("CUDA initialised but reports zero devices");
        report.accelerator_present = false;
        return Ok(());
    }
    report.device_count = count;

    for ordinal in 0..count {
        let device = backend.device(ordinal)?;
        info!(
            device = ordinal,
            name = %device.name,
            total_memory = device.total_memory,
            compute_capability = %device.compute_capability,
            "Enumerated device"
        );
        let valid = device.validate();
        report.devices.push(device);
        valid?;
    }

    if settings.device >= count {
        return Err(CheckError::InvalidDevice {
            ordinal: settings.device,
            details: format!("probe device requested but only {count} device(s) are visible"),
        });
    }

    let dimensions = MatrixDimensions::square(settings.matrix_size);
    let probe = backend.run_matmul_probe(settings.device, &dimensions, settings.seed)?;
    probe.verify(&dimensions, settings.tolerance)?;
    report.probe = Some(probe);

    Ok(())
}
