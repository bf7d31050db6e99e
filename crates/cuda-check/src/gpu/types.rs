use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CheckError, Result};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Metadata the driver reports for one accelerator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub ordinal: u32,
    pub name: String,
    pub total_memory: u64,
    pub compute_capability: ComputeCapability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComputeCapability {
    pub major: u32,
    pub minor: u32,
}

/// CUDA version as reported by `cuDriverGetVersion` or `cudnnGetCudartVersion`
///
/// Both encode the version as `1000 * major + 10 * minor`, so 12.4
/// arrives as `12040`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CudaVersion(pub i32);

impl DeviceDescriptor {
    pub fn new(ordinal: u32, name: String) -> Self {
        Self {
            ordinal,
            name,
            total_memory: 0,
            compute_capability: ComputeCapability::new(0, 0),
        }
    }

    pub fn with_memory(mut self, total_memory: u64) -> Self {
        self.total_memory = total_memory;
        self
    }

    pub fn with_compute_capability(mut self, major: u32, minor: u32) -> Self {
        self.compute_capability = ComputeCapability::new(major, minor);
        self
    }

    pub fn total_memory_gib(&self) -> f64 {
        self.total_memory as f64 / BYTES_PER_GIB
    }

    /// Reject descriptors that cannot belong to a working device
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CheckError::InvalidDevice {
                ordinal: self.ordinal,
                details: "empty device name".to_string(),
            });
        }
        if self.total_memory == 0 {
            return Err(CheckError::InvalidDevice {
                ordinal: self.ordinal,
                details: "zero total memory".to_string(),
            });
        }
        Ok(())
    }
}

impl ComputeCapability {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ComputeCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl CudaVersion {
    pub fn major(&self) -> i32 {
        self.0 / 1000
    }

    pub fn minor(&self) -> i32 {
        (self.0 % 1000) / 10
    }
}

impl fmt::Display for CudaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

/// Shape of `A (rows × inner) · B (inner × cols)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixDimensions {
    pub rows: usize,
    pub inner: usize,
    pub cols: usize,
}

impl MatrixDimensions {
    pub fn new(rows: usize, inner: usize, cols: usize) -> Self {
        Self { rows, inner, cols }
    }

    pub fn square(n: usize) -> Self {
        Self::new(n, n, n)
    }

    pub fn lhs_len(&self) -> usize {
        self.rows * self.inner
    }

    pub fn rhs_len(&self) -> usize {
        self.inner * self.cols
    }

    pub fn output_len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn output_shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Device memory needed for both operands and the product, in bytes
    pub fn memory_required(&self) -> usize {
        (self.lhs_len() + self.rhs_len() + self.output_len()) * std::mem::size_of::<f32>()
    }
}

/// What the matrix multiplication probe observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub shape: (usize, usize),
    pub input_device: u32,
    pub output_device: u32,
    pub execution_time_ms: f32,
    /// Largest relative deviation between `C·r` and `A·(B·r)`
    pub max_relative_error: f64,
}

impl ProbeResult {
    /// Confirm the product has the expected shape and lives next to its inputs
    pub fn verify(&self, dimensions: &MatrixDimensions, tolerance: f64) -> Result<()> {
        if self.shape != dimensions.output_shape() {
            return Err(CheckError::probe(format!(
                "result shape {:?} does not match expected {:?}",
                self.shape,
                dimensions.output_shape()
            )));
        }
        if self.input_device != self.output_device {
            return Err(CheckError::probe(format!(
                "result resides on cuda:{} but inputs reside on cuda:{}",
                self.output_device, self.input_device
            )));
        }
        if !self.max_relative_error.is_finite() || self.max_relative_error > tolerance {
            return Err(CheckError::probe(format!(
                "product deviates from host verification by {:e} (tolerance {:e})",
                self.max_relative_error, tolerance
            )));
        }
        Ok(())
    }
}
