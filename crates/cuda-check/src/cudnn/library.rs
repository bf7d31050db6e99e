//! [`CudnnBackend`] over a dynamically loaded `libcudnn`

use super::backend::CudnnBackend;
use super::ffi::*;
use super::types::CudnnVersion;
use crate::dylib::{load_symbol, open_first};
use crate::error::{CheckError, Result};
use crate::gpu::types::CudaVersion;
use libloading::Library;
use std::ffi::CStr;
use tracing::{debug, warn};

const LABEL: &str = "cuDNN";

pub struct CudnnLibrary {
    get_version: cudnnGetVersion_t,
    get_cudart_version: cudnnGetCudartVersion_t,
    create: cudnnCreate_t,
    destroy: cudnnDestroy_t,
    get_error_string: cudnnGetErrorString_t,
    path: String,
    _library: Library,
}

impl CudnnLibrary {
    pub fn load(candidates: &[String]) -> Result<Self> {
        let loaded = open_first(LABEL, candidates)?;
        let lib = &loaded.library;

        // SAFETY: the aliases in `ffi` match the cuDNN C API declarations.
        let library = unsafe {
            Self {
                get_version: load_symbol(lib, LABEL, "cudnnGetVersion")?,
                get_cudart_version: load_symbol(lib, LABEL, "cudnnGetCudartVersion")?,
                create: load_symbol(lib, LABEL, "cudnnCreate")?,
                destroy: load_symbol(lib, LABEL, "cudnnDestroy")?,
                get_error_string: load_symbol(lib, LABEL, "cudnnGetErrorString")?,
                path: loaded.path,
                _library: loaded.library,
            }
        };
        debug!(library = %library.path, "cuDNN entry points resolved");
        Ok(library)
    }

    fn error_message(&self, status: cudnnStatus_t) -> String {
        let message = unsafe { (self.get_error_string)(status) };
        if message.is_null() {
            return format!("status {status}");
        }
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    }
}

impl CudnnBackend for CudnnLibrary {
    fn library_path(&self) -> String {
        self.path.clone()
    }

    fn version(&self) -> CudnnVersion {
        CudnnVersion(unsafe { (self.get_version)() })
    }

    fn cudart_version(&self) -> CudaVersion {
        let raw = unsafe { (self.get_cudart_version)() };
        CudaVersion(i32::try_from(raw).unwrap_or(i32::MAX))
    }

    fn verify_handle(&self) -> Result<()> {
        let mut handle: cudnnHandle_t = std::ptr::null_mut();
        let status = unsafe { (self.create)(&mut handle) };
        if status != CUDNN_STATUS_SUCCESS {
            return Err(CheckError::Cudnn {
                call: "cudnnCreate",
                status,
                message: self.error_message(status),
            });
        }

        let status = unsafe { (self.destroy)(handle) };
        if status != CUDNN_STATUS_SUCCESS {
            warn!("cudnnDestroy returned {}", self.error_message(status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_cudnn_is_missing_dependency() {
        match CudnnLibrary::load(&["libcudnn_not_installed.so.9".to_string()]) {
            Ok(_) => panic!("bogus cuDNN library loaded"),
            Err(e) => assert!(e.is_missing_dependency()),
        }
    }

    #[test]
    #[ignore] // Requires cuDNN and a CUDA device
    fn test_real_cudnn_handle() {
        let cudnn = CudnnLibrary::load(&["libcudnn.so.9".to_string(), "libcudnn.so.8".to_string()])
            .unwrap();
        assert!(cudnn.version().0 > 0);
        assert!(cudnn.verify_handle().is_ok());
    }
}
