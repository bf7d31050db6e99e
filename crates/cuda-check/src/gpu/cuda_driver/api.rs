//! Dynamically loaded CUDA driver entry points

use super::ffi::*;
use crate::dylib::{load_symbol, open_first};
use crate::error::Result;
use libloading::Library;

const LABEL: &str = "CUDA driver";

/// Function table resolved from `libcuda`
///
/// Pointers stay valid while `_library` is alive, which is tied to the
/// lifetime of this struct.
pub struct CudaDriverApi {
    pub(crate) cu_init: cuInit_t,
    pub(crate) cu_driver_get_version: cuDriverGetVersion_t,
    pub(crate) cu_device_get_count: cuDeviceGetCount_t,
    pub(crate) cu_device_get: cuDeviceGet_t,
    pub(crate) cu_device_get_name: cuDeviceGetName_t,
    pub(crate) cu_device_total_mem: cuDeviceTotalMem_t,
    pub(crate) cu_device_get_attribute: cuDeviceGetAttribute_t,
    pub(crate) cu_ctx_create: cuCtxCreate_t,
    pub(crate) cu_ctx_destroy: cuCtxDestroy_t,
    pub(crate) cu_ctx_synchronize: cuCtxSynchronize_t,
    pub(crate) cu_mem_alloc: cuMemAlloc_t,
    pub(crate) cu_mem_free: cuMemFree_t,
    pub(crate) cu_memcpy_htod: cuMemcpyHtoD_t,
    pub(crate) cu_memcpy_dtoh: cuMemcpyDtoH_t,
    pub(crate) cu_pointer_get_attribute: cuPointerGetAttribute_t,
    pub(crate) cu_module_load_data: cuModuleLoadData_t,
    pub(crate) cu_module_unload: cuModuleUnload_t,
    pub(crate) cu_module_get_function: cuModuleGetFunction_t,
    pub(crate) cu_launch_kernel: cuLaunchKernel_t,
    pub(crate) cu_event_create: cuEventCreate_t,
    pub(crate) cu_event_destroy: cuEventDestroy_t,
    pub(crate) cu_event_record: cuEventRecord_t,
    pub(crate) cu_event_synchronize: cuEventSynchronize_t,
    pub(crate) cu_event_elapsed_time: cuEventElapsedTime_t,
    path: String,
    _library: Library,
}

impl CudaDriverApi {
    /// Open the first loadable candidate and resolve every entry point
    pub fn load(candidates: &[String]) -> Result<Self> {
        let loaded = open_first(LABEL, candidates)?;
        let lib = &loaded.library;

        // SAFETY: each type alias in `ffi` mirrors the documented C signature
        // of the driver export it is resolved from.
        unsafe {
            Ok(Self {
                cu_init: load_symbol(lib, LABEL, "cuInit")?,
                cu_driver_get_version: load_symbol(lib, LABEL, "cuDriverGetVersion")?,
                cu_device_get_count: load_symbol(lib, LABEL, "cuDeviceGetCount")?,
                cu_device_get: load_symbol(lib, LABEL, "cuDeviceGet")?,
                cu_device_get_name: load_symbol(lib, LABEL, "cuDeviceGetName")?,
                cu_device_total_mem: load_symbol(lib, LABEL, "cuDeviceTotalMem_v2")?,
                cu_device_get_attribute: load_symbol(lib, LABEL, "cuDeviceGetAttribute")?,
                cu_ctx_create: load_symbol(lib, LABEL, "cuCtxCreate_v2")?,
                cu_ctx_destroy: load_symbol(lib, LABEL, "cuCtxDestroy_v2")?,
                cu_ctx_synchronize: load_symbol(lib, LABEL, "cuCtxSynchronize")?,
                cu_mem_alloc: load_symbol(lib, LABEL, "cuMemAlloc_v2")?,
                cu_mem_free: load_symbol(lib, LABEL, "cuMemFree_v2")?,
                cu_memcpy_htod: load_symbol(lib, LABEL, "cuMemcpyHtoD_v2")?,
                cu_memcpy_dtoh: load_symbol(lib, LABEL, "cuMemcpyDtoH_v2")?,
                cu_pointer_get_attribute: load_symbol(lib, LABEL, "cuPointerGetAttribute")?,
                cu_module_load_data: load_symbol(lib, LABEL, "cuModuleLoadData")?,
                cu_module_unload: load_symbol(lib, LABEL, "cuModuleUnload")?,
                cu_module_get_function: load_symbol(lib, LABEL, "cuModuleGetFunction")?,
                cu_launch_kernel: load_symbol(lib, LABEL, "cuLaunchKernel")?,
                cu_event_create: load_symbol(lib, LABEL, "cuEventCreate")?,
                cu_event_destroy: load_symbol(lib, LABEL, "cuEventDestroy_v2")?,
                cu_event_record: load_symbol(lib, LABEL, "cuEventRecord")?,
                cu_event_synchronize: load_symbol(lib, LABEL, "cuEventSynchronize")?,
                cu_event_elapsed_time: load_symbol(lib, LABEL, "cuEventElapsedTime")?,
                path: loaded.path,
                _library: loaded.library,
            })
        }
    }

    /// Name the library was opened under
    pub fn path(&self) -> &str {
        &self.path
    }
}
