use crate::error::Result;

use super::types::{CudaVersion, DeviceDescriptor, MatrixDimensions, ProbeResult};

/// Device-query and compute surface the availability check runs against
///
/// [`super::CudaDriver`] implements it over the real driver library; tests
/// substitute a mock.
#[cfg_attr(test, mockall::automock)]
pub trait GpuBackend {
    /// Name of the shared library backing this runtime
    fn library_path(&self) -> String;

    /// Initialise the runtime and report whether any accelerator is usable
    ///
    /// A runtime that loads but sees no device returns `Ok(false)`.
    fn is_available(&self) -> Result<bool>;

    fn driver_version(&self) -> Result<CudaVersion>;

    fn device_count(&self) -> Result<u32>;

    fn device(&self, ordinal: u32) -> Result<DeviceDescriptor>;

    /// Multiply two random matrices on `ordinal` and report what was observed
    fn run_matmul_probe(
        &self,
        ordinal: u32,
        dimensions: &MatrixDimensions,
        seed: u64,
    ) -> Result<ProbeResult>;
}
