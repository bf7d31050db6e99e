use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gpu::types::CudaVersion;

/// Version integer returned by `cudnnGetVersion`
///
/// cuDNN 8 and earlier encode `major * 1000 + minor * 100 + patch`
/// (8.9.2 is `8902`); cuDNN 9 switched to `major * 10000 + minor * 100 + patch`
/// (9.1.0 is `90100`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CudnnVersion(pub usize);

impl CudnnVersion {
    pub fn parts(&self) -> (usize, usize, usize) {
        let raw = self.0;
        if raw >= 90000 {
            (raw / 10000, (raw % 10000) / 100, raw % 100)
        } else {
            (raw / 1000, (raw % 1000) / 100, raw % 100)
        }
    }
}

impl fmt::Display for CudnnVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor, patch) = self.parts();
        write!(f, "{major}.{minor}.{patch}")
    }
}

/// What an enabled cuDNN reported about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CudnnInfo {
    pub library: String,
    pub version: CudnnVersion,
    /// CUDA runtime version cuDNN was built against
    pub cudart_version: CudaVersion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cudnn8_version_decoding() {
        assert_eq!(CudnnVersion(8902).parts(), (8, 9, 2));
        assert_eq!(CudnnVersion(8902).to_string(), "8.9.2");
        assert_eq!(CudnnVersion(7605).to_string(), "7.6.5");
    }

    #[test]
    fn test_cudnn9_version_decoding() {
        assert_eq!(CudnnVersion(90100).parts(), (9, 1, 0));
        assert_eq!(CudnnVersion(91002).to_string(), "9.10.2");
    }
}
