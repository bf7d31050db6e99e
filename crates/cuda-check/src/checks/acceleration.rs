//! cuDNN check
//!
//! Only runs once an accelerator has been found; without one the result is
//! `Skipped` regardless of whether cuDNN itself is installed.

use super::CheckFailure;
use crate::config::CudnnSettings;
use crate::cudnn::{CudnnBackend, CudnnInfo};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "details", rename_all = "snake_case")]
pub enum AccelerationOutcome {
    /// No accelerator was found, so cuDNN was not consulted
    Skipped,
    /// cuDNN was turned off in configuration
    Disabled,
    Enabled(CudnnInfo),
    Failed(CheckFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccelerationReport {
    pub outcome: AccelerationOutcome,
}

impl AccelerationReport {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, AccelerationOutcome::Enabled(_))
    }
}

pub fn check_acceleration_library<C, L>(
    accelerator_present: bool,
    settings: &CudnnSettings,
    load: L,
) -> AccelerationReport
where
    C: CudnnBackend,
    L: FnOnce() -> Result<C>,
{
    let outcome = if !accelerator_present {
        info!("Skipping cuDNN check: no accelerator present");
        AccelerationOutcome::Skipped
    } else if !settings.enabled {
        info!("cuDNN disabled by configuration");
        AccelerationOutcome::Disabled
    } else {
        match load().and_then(|cudnn| inspect(&cudnn)) {
            Ok(info) => AccelerationOutcome::Enabled(info),
            Err(e) => {
                warn!("cuDNN check failed: {}", e);
                AccelerationOutcome::Failed(CheckFailure::from(&e))
            }
        }
    };

    AccelerationReport { outcome }
}

fn inspect<C: CudnnBackend>(cudnn: &C) -> Result<CudnnInfo> {
    cudnn.verify_handle()?;
    Ok(CudnnInfo {
        library: cudnn.library_path(),
        version: cudnn.version(),
        cudart_version: cudnn.cudart_version(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::FailureKind;
    use crate::cudnn::{CudnnVersion, MockCudnnBackend};
    use crate::error::CheckError;
    use crate::gpu::CudaVersion;

    fn unreachable_loader() -> Result<MockCudnnBackend> {
        panic!("cuDNN must not be loaded for this scenario")
    }

    #[test]
    fn test_skipped_without_accelerator() {
        let report =
            check_acceleration_library(false, &CudnnSettings::default(), unreachable_loader);

        assert_eq!(report.outcome, AccelerationOutcome::Skipped);
        assert!(!report.passed());
    }

    #[test]
    fn test_disabled_by_configuration() {
        let settings = CudnnSettings {
            enabled: false,
            ..CudnnSettings::default()
        };
        let report = check_acceleration_library(true, &settings, unreachable_loader);

        assert_eq!(report.outcome, AccelerationOutcome::Disabled);
        assert!(!report.passed());
    }

    #[test]
    fn test_enabled_reports_versions() {
        let mut cudnn = MockCudnnBackend::new();
        cudnn.expect_verify_handle().times(1).returning(|| Ok(()));
        cudnn
            .expect_library_path()
            .return_const("libcudnn.so.8".to_string());
        cudnn.expect_version().return_const(CudnnVersion(8902));
        cudnn
            .expect_cudart_version()
            .return_const(CudaVersion(12020));

        let report = check_acceleration_library(true, &CudnnSettings::default(), || Ok(cudnn));

        assert!(report.passed());
        match report.outcome {
            AccelerationOutcome::Enabled(info) => {
                assert_eq!(info.version.to_string(), "8.9.2");
                assert_eq!(info.cudart_version.to_string(), "12.2");
                assert_eq!(info.library, "libcudnn.so.8");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_missing_library_fails() {
        let report = check_acceleration_library(true, &CudnnSettings::default(), || {
            Err::<MockCudnnBackend, _>(CheckError::LibraryNotFound {
                library: "cuDNN",
                tried: "libcudnn.so.9".to_string(),
                reason: "not found".to_string(),
            })
        });

        assert!(!report.passed());
        assert!(matches!(
            report.outcome,
            AccelerationOutcome::Failed(CheckFailure {
                kind: FailureKind::MissingDependency,
                ..
            })
        ));
    }

    #[test]
    fn test_handle_creation_failure() {
        let mut cudnn = MockCudnnBackend::new();
        cudnn.expect_verify_handle().returning(|| {
            Err(CheckError::Cudnn {
                call: "cudnnCreate",
                status: 1,
                message: "CUDNN_STATUS_NOT_INITIALIZED".to_string(),
            })
        });

        let report = check_acceleration_library(true, &CudnnSettings::default(), || Ok(cudnn));

        match report.outcome {
            AccelerationOutcome::Failed(failure) => {
                assert_eq!(failure.kind, FailureKind::Runtime);
                assert!(failure.message.contains("CUDNN_STATUS_NOT_INITIALIZED"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
