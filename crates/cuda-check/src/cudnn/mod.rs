//! cuDNN, the acceleration library layered on top of CUDA

pub mod backend;
pub mod ffi;
pub mod library;
pub mod types;

pub use backend::CudnnBackend;
pub use library::CudnnLibrary;
pub use types::{CudnnInfo, CudnnVersion};

#[cfg(test)]
pub use backend::MockCudnnBackend;
