//! CUDA Driver API backend
//!
//! `libcuda` is opened at run time, device metadata is read through the
//! driver API, and the probe multiplication runs as an embedded PTX kernel.

pub mod api;
pub mod context;
pub mod driver;
pub mod ffi;
pub mod matmul;
pub mod ptx_source;

pub use driver::CudaDriver;
pub use matmul::freivalds_residual;
