//! Accelerator discovery and the matrix multiplication probe

pub mod backend;
pub mod cuda_driver;
pub mod types;

pub use backend::GpuBackend;
pub use cuda_driver::CudaDriver;
pub use types::{ComputeCapability, CudaVersion, DeviceDescriptor, MatrixDimensions, ProbeResult};

#[cfg(test)]
pub use backend::MockGpuBackend;
