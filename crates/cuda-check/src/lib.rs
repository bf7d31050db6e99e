pub mod checks;
pub mod cli;
pub mod config;
pub mod cudnn;
pub mod dylib;
pub mod error;
pub mod gpu;
pub mod report;

// Re-export commonly used items for convenience
pub use checks::{
    check_acceleration_library, check_availability, run_checks, AccelerationOutcome,
    AccelerationReport, AvailabilityReport, CheckFailure, DiagnosticReport, FailureKind,
};
pub use config::{CheckConfig, ConfigOverrides};
pub use cudnn::{CudnnBackend, CudnnInfo, CudnnLibrary, CudnnVersion};
pub use error::{CheckError, Result};
pub use gpu::{
    ComputeCapability, CudaDriver, CudaVersion, DeviceDescriptor, GpuBackend, MatrixDimensions,
    ProbeResult,
};
