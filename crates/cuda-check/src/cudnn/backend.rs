use crate::error::Result;

use super::types::CudnnVersion;
use crate::gpu::types::CudaVersion;

/// Surface of the acceleration library the cuDNN check needs
#[cfg_attr(test, mockall::automock)]
pub trait CudnnBackend {
    fn library_path(&self) -> String;

    fn version(&self) -> CudnnVersion;

    fn cudart_version(&self) -> CudaVersion;

    /// Create and immediately destroy a cuDNN handle
    ///
    /// Handle creation initialises cuDNN on the current device, so success
    /// means the library is usable and not merely present on disk.
    fn verify_handle(&self) -> Result<()>;
}
