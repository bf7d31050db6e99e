//! The two installation checks and their combined verdict
//!
//! Checks never print and never return errors: every failure is captured in
//! the report they produce, which [`crate::report`] renders afterwards.

pub mod acceleration;
pub mod availability;

pub use acceleration::{check_acceleration_library, AccelerationOutcome, AccelerationReport};
pub use availability::{check_availability, AvailabilityReport};

use crate::config::CheckConfig;
use crate::cudnn::CudnnLibrary;
use crate::error::CheckError;
use crate::gpu::CudaDriver;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Why a check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A required shared library is absent or incomplete
    MissingDependency,
    /// The library loaded but failed while being exercised
    Runtime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&CheckError> for CheckFailure {
    fn from(err: &CheckError) -> Self {
        let kind = if err.is_missing_dependency() {
            FailureKind::MissingDependency
        } else {
            FailureKind::Runtime
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Outcome of both checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub cuda: AvailabilityReport,
    pub cudnn: AccelerationReport,
}

impl DiagnosticReport {
    pub fn passed(&self) -> bool {
        self.cuda.passed() && self.cudnn.passed()
    }

    /// `0` when both checks passed, `1` otherwise
    pub fn exit_code(&self) -> u8 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

/// Run both checks against the real CUDA driver and cuDNN
pub fn run_checks(config: &CheckConfig) -> DiagnosticReport {
    let cuda = check_availability(|| CudaDriver::load(&config.cuda.library_candidates), &config.cuda);

    let cudnn = check_acceleration_library(cuda.accelerator_present, &config.cudnn, || {
        CudnnLibrary::load(&config.cudnn.library_candidates)
    });

    info!(
        cuda_passed = cuda.passed(),
        cudnn_passed = cudnn.passed(),
        "Installation checks finished"
    );

    DiagnosticReport { cuda, cudnn }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cuda_report(passed: bool) -> AvailabilityReport {
        let mut report = AvailabilityReport::default();
        if passed {
            report.accelerator_present = true;
            report.probe = Some(crate::gpu::ProbeResult {
                shape: (1000, 1000),
                input_device: 0,
                output_device: 0,
                execution_time_ms: 2.0,
                max_relative_error: 1e-7,
            });
        }
        report
    }

    fn cudnn_report(passed: bool) -> AccelerationReport {
        AccelerationReport {
            outcome: if passed {
                AccelerationOutcome::Enabled(crate::cudnn::CudnnInfo {
                    library: "libcudnn.so.9".to_string(),
                    version: crate::cudnn::CudnnVersion(90100),
                    cudart_version: crate::gpu::CudaVersion(12040),
                })
            } else {
                AccelerationOutcome::Skipped
            },
        }
    }

    #[test]
    fn test_exit_code_requires_both_checks() {
        for (cuda_ok, cudnn_ok) in [(true, true), (true, false), (false, true), (false, false)] {
            let report = DiagnosticReport {
                cuda: cuda_report(cuda_ok),
                cudnn: cudnn_report(cudnn_ok),
            };
            let expected = if cuda_ok && cudnn_ok { 0 } else { 1 };
            assert_eq!(report.exit_code(), expected, "cuda={cuda_ok} cudnn={cudnn_ok}");
        }
    }

    #[test]
    fn test_failure_kind_from_error() {
        let missing = CheckFailure::from(&CheckError::LibraryNotFound {
            library: "CUDA driver",
            tried: "libcuda.so.1".to_string(),
            reason: "not found".to_string(),
        });
        assert_eq!(missing.kind, FailureKind::MissingDependency);

        let runtime = CheckFailure::from(&CheckError::NoDevice);
        assert_eq!(runtime.kind, FailureKind::Runtime);
        assert_eq!(runtime.message, "no CUDA-capable device is visible");
    }

    #[test]
    fn test_run_checks_without_libraries_fails_cleanly() {
        let mut config = CheckConfig::default();
        config.cuda.library_candidates = vec!["libcuda_absent_for_test.so.1".to_string()];
        config.cudnn.library_candidates = vec!["libcudnn_absent_for_test.so.9".to_string()];

        let report = run_checks(&config);
        assert!(!report.cuda.passed());
        assert!(!report.cuda.accelerator_present);
        assert_eq!(
            report.cuda.failure.as_ref().map(|f| f.kind),
            Some(FailureKind::MissingDependency)
        );
        assert_eq!(report.cudnn.outcome, AccelerationOutcome::Skipped);
        assert_eq!(report.exit_code(), 1);
    }
}
