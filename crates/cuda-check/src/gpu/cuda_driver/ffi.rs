//! CUDA Driver API FFI signatures
//!
//! The driver is opened with `libloading` rather than linked, so every entry
//! point is described here as a function pointer type and resolved by
//! [`super::api::CudaDriverApi`] at run time.

#![allow(non_camel_case_types)]

use libc::{c_char, c_float, c_int, c_uint, c_void, size_t};

use crate::error::{CheckError, Result};

pub type CUresult = c_int;
pub type CUdevice = c_int;
pub type CUcontext = *mut c_void;
pub type CUmodule = *mut c_void;
pub type CUfunction = *mut c_void;
pub type CUevent = *mut c_void;
pub type CUstream = *mut c_void;
pub type CUdeviceptr = u64;

pub const CUDA_SUCCESS: CUresult = 0;
pub const CUDA_ERROR_NO_DEVICE: CUresult = 100;

pub const CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MAJOR: c_int = 75;
pub const CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MINOR: c_int = 76;

pub const CU_POINTER_ATTRIBUTE_DEVICE_ORDINAL: c_int = 9;

pub type cuInit_t = unsafe extern "C" fn(flags: c_uint) -> CUresult;
pub type cuDriverGetVersion_t = unsafe extern "C" fn(version: *mut c_int) -> CUresult;
pub type cuDeviceGetCount_t = unsafe extern "C" fn(count: *mut c_int) -> CUresult;
pub type cuDeviceGet_t = unsafe extern "C" fn(device: *mut CUdevice, ordinal: c_int) -> CUresult;
pub type cuDeviceGetName_t =
    unsafe extern "C" fn(name: *mut c_char, len: c_int, dev: CUdevice) -> CUresult;
pub type cuDeviceTotalMem_t = unsafe extern "C" fn(bytes: *mut size_t, dev: CUdevice) -> CUresult;
pub type cuDeviceGetAttribute_t =
    unsafe extern "C" fn(pi: *mut c_int, attrib: c_int, dev: CUdevice) -> CUresult;

pub type cuCtxCreate_t =
    unsafe extern "C" fn(pctx: *mut CUcontext, flags: c_uint, dev: CUdevice) -> CUresult;
pub type cuCtxDestroy_t = unsafe extern "C" fn(ctx: CUcontext) -> CUresult;
pub type cuCtxSynchronize_t = unsafe extern "C" fn() -> CUresult;

pub type cuMemAlloc_t = unsafe extern "C" fn(dptr: *mut CUdeviceptr, bytesize: size_t) -> CUresult;
pub type cuMemFree_t = unsafe extern "C" fn(dptr: CUdeviceptr) -> CUresult;
pub type cuMemcpyHtoD_t =
    unsafe extern "C" fn(dst: CUdeviceptr, src: *const c_void, bytesize: size_t) -> CUresult;
pub type cuMemcpyDtoH_t =
    unsafe extern "C" fn(dst: *mut c_void, src: CUdeviceptr, bytesize: size_t) -> CUresult;
pub type cuPointerGetAttribute_t =
    unsafe extern "C" fn(data: *mut c_void, attribute: c_int, ptr: CUdeviceptr) -> CUresult;

pub type cuModuleLoadData_t =
    unsafe extern "C" fn(module: *mut CUmodule, image: *const c_void) -> CUresult;
pub type cuModuleUnload_t = unsafe extern "C" fn(hmod: CUmodule) -> CUresult;
pub type cuModuleGetFunction_t =
    unsafe extern "C" fn(hfunc: *mut CUfunction, hmod: CUmodule, name: *const c_char) -> CUresult;
pub type cuLaunchKernel_t = unsafe extern "C" fn(
    f: CUfunction,
    grid_dim_x: c_uint,
    grid_dim_y: c_uint,
    grid_dim_z: c_uint,
    block_dim_x: c_uint,
    block_dim_y: c_uint,
    block_dim_z: c_uint,
    shared_mem_bytes: c_uint,
    stream: CUstream,
    kernel_params: *mut *mut c_void,
    extra: *mut *mut c_void,
) -> CUresult;

pub type cuEventCreate_t = unsafe extern "C" fn(event: *mut CUevent, flags: c_uint) -> CUresult;
pub type cuEventDestroy_t = unsafe extern "C" fn(event: CUevent) -> CUresult;
pub type cuEventRecord_t = unsafe extern "C" fn(event: CUevent, stream: CUstream) -> CUresult;
pub type cuEventSynchronize_t = unsafe extern "C" fn(event: CUevent) -> CUresult;
pub type cuEventElapsedTime_t =
    unsafe extern "C" fn(millis: *mut c_float, start: CUevent, end: CUevent) -> CUresult;

/// Map the driver result codes this tool is likely to meet onto their names
pub fn result_name(code: CUresult) -> &'static str {
    match code {
        0 => "CUDA_SUCCESS",
        1 => "CUDA_ERROR_INVALID_VALUE",
        2 => "CUDA_ERROR_OUT_OF_MEMORY",
        3 => "CUDA_ERROR_NOT_INITIALIZED",
        4 => "CUDA_ERROR_DEINITIALIZED",
        34 => "CUDA_ERROR_STUB_LIBRARY",
        35 => "CUDA_ERROR_INSUFFICIENT_DRIVER",
        100 => "CUDA_ERROR_NO_DEVICE",
        101 => "CUDA_ERROR_INVALID_DEVICE",
        200 => "CUDA_ERROR_INVALID_IMAGE",
        201 => "CUDA_ERROR_INVALID_CONTEXT",
        209 => "CUDA_ERROR_NO_BINARY_FOR_GPU",
        218 => "CUDA_ERROR_INVALID_PTX",
        222 => "CUDA_ERROR_UNSUPPORTED_PTX_VERSION",
        223 => "CUDA_ERROR_JIT_COMPILER_NOT_FOUND",
        303 => "CUDA_ERROR_SHARED_OBJECT_INIT_FAILED",
        500 => "CUDA_ERROR_NOT_FOUND",
        700 => "CUDA_ERROR_ILLEGAL_ADDRESS",
        701 => "CUDA_ERROR_LAUNCH_OUT_OF_RESOURCES",
        702 => "CUDA_ERROR_LAUNCH_TIMEOUT",
        719 => "CUDA_ERROR_LAUNCH_FAILED",
        802 => "CUDA_ERROR_SYSTEM_NOT_READY",
        803 => "CUDA_ERROR_SYSTEM_DRIVER_MISMATCH",
        804 => "CUDA_ERROR_COMPAT_NOT_SUPPORTED_ON_DEVICE",
        999 => "CUDA_ERROR_UNKNOWN",
        _ => "unrecognised CUDA error",
    }
}

/// Turn a driver result code into a `Result`, naming the call that failed
pub fn check(call: &'static str, code: CUresult) -> Result<()> {
    match code {
        CUDA_SUCCESS => Ok(()),
        CUDA_ERROR_NO_DEVICE => Err(CheckError::NoDevice),
        _ => Err(CheckError::Driver {
            call,
            code,
            name: result_name(code),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_maps_codes() {
        assert!(check("cuInit", CUDA_SUCCESS).is_ok());
        assert!(matches!(
            check("cuInit", CUDA_ERROR_NO_DEVICE),
            Err(CheckError::NoDevice)
        ));

        match check("cuMemAlloc_v2", 2) {
            Err(CheckError::Driver { call, code, name }) => {
                assert_eq!(call, "cuMemAlloc_v2");
                assert_eq!(code, 2);
                assert_eq!(name, "CUDA_ERROR_OUT_OF_MEMORY");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_code_name() {
        assert_eq!(result_name(12345), "unrecognised CUDA error");
    }
}
