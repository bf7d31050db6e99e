//! RAII guards over driver-owned resources
//!
//! Each guard borrows the [`CudaDriverApi`] it was created from, so the
//! library cannot be unloaded while a context, buffer, module or event is
//! still alive.

use super::api::CudaDriverApi;
use super::ffi::*;
use crate::error::{CheckError, Result};
use libc::{c_int, c_void};
use std::ffi::CString;
use tracing::warn;

/// A CUDA context bound to one device and made current on creation
pub struct CudaContext<'a> {
    api: &'a CudaDriverApi,
    raw: CUcontext,
    ordinal: u32,
}

impl<'a> CudaContext<'a> {
    pub fn create(api: &'a CudaDriverApi, ordinal: u32) -> Result<Self> {
        let mut device: CUdevice = 0;
        let mut raw: CUcontext = std::ptr::null_mut();

        unsafe {
            check("cuDeviceGet", (api.cu_device_get)(&mut device, ordinal as c_int))?;
            check("cuCtxCreate_v2", (api.cu_ctx_create)(&mut raw, 0, device))?;
        }

        Ok(Self { api, raw, ordinal })
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn synchronize(&self) -> Result<()> {
        unsafe { check("cuCtxSynchronize", (self.api.cu_ctx_synchronize)()) }
    }
}

impl Drop for CudaContext<'_> {
    fn drop(&mut self) {
        let result = unsafe { (self.api.cu_ctx_destroy)(self.raw) };
        if result != CUDA_SUCCESS {
            warn!(device = self.ordinal, "cuCtxDestroy_v2 returned {}", result_name(result));
        }
    }
}

/// Device allocation holding `len` single-precision values
pub struct DeviceBuffer<'a> {
    api: &'a CudaDriverApi,
    ptr: CUdeviceptr,
    len: usize,
}

impl<'a> DeviceBuffer<'a> {
    /// Allocate `len` floats in the current context
    pub fn alloc(context: &CudaContext<'a>, len: usize) -> Result<Self> {
        let api = context.api;
        let mut ptr: CUdeviceptr = 0;
        unsafe {
            check(
                "cuMemAlloc_v2",
                (api.cu_mem_alloc)(&mut ptr, len * std::mem::size_of::<f32>()),
            )?;
        }
        Ok(Self { api, ptr, len })
    }

    /// Allocate and fill from a host slice
    pub fn from_host(context: &CudaContext<'a>, data: &[f32]) -> Result<Self> {
        let buffer = Self::alloc(context, data.len())?;
        unsafe {
            check(
                "cuMemcpyHtoD_v2",
                (buffer.api.cu_memcpy_htod)(
                    buffer.ptr,
                    data.as_ptr() as *const c_void,
                    std::mem::size_of_val(data),
                ),
            )?;
        }
        Ok(buffer)
    }

    pub fn to_host(&self) -> Result<Vec<f32>> {
        let mut host = vec![0f32; self.len];
        unsafe {
            check(
                "cuMemcpyDtoH_v2",
                (self.api.cu_memcpy_dtoh)(
                    host.as_mut_ptr() as *mut c_void,
                    self.ptr,
                    self.len * std::mem::size_of::<f32>(),
                ),
            )?;
        }
        Ok(host)
    }

    /// Ordinal of the device this allocation physically resides on
    pub fn device_ordinal(&self) -> Result<u32> {
        let mut ordinal: c_int = -1;
        unsafe {
            check(
                "cuPointerGetAttribute",
                (self.api.cu_pointer_get_attribute)(
                    &mut ordinal as *mut c_int as *mut c_void,
                    CU_POINTER_ATTRIBUTE_DEVICE_ORDINAL,
                    self.ptr,
                ),
            )?;
        }
        u32::try_from(ordinal).map_err(|_| {
            CheckError::probe(format!("driver reported device ordinal {ordinal}"))
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn raw(&self) -> CUdeviceptr {
        self.ptr
    }
}

impl Drop for DeviceBuffer<'_> {
    fn drop(&mut self) {
        unsafe {
            (self.api.cu_mem_free)(self.ptr);
        }
    }
}

/// A loaded PTX module
pub struct Module<'a> {
    api: &'a CudaDriverApi,
    raw: CUmodule,
}

impl<'a> Module<'a> {
    pub fn from_ptx(context: &CudaContext<'a>, ptx: &str) -> Result<Self> {
        let api = context.api;
        let image = CString::new(ptx).map_err(|e| CheckError::probe(format!("invalid PTX: {e}")))?;
        let mut raw: CUmodule = std::ptr::null_mut();
        unsafe {
            check(
                "cuModuleLoadData",
                (api.cu_module_load_data)(&mut raw, image.as_ptr() as *const c_void),
            )?;
        }
        Ok(Self { api, raw })
    }

    pub fn function(&self, name: &str) -> Result<CUfunction> {
        let name = CString::new(name)
            .map_err(|e| CheckError::probe(format!("invalid kernel name: {e}")))?;
        let mut function: CUfunction = std::ptr::null_mut();
        unsafe {
            check(
                "cuModuleGetFunction",
                (self.api.cu_module_get_function)(&mut function, self.raw, name.as_ptr()),
            )?;
        }
        Ok(function)
    }
}

impl Drop for Module<'_> {
    fn drop(&mut self) {
        unsafe {
            (self.api.cu_module_unload)(self.raw);
        }
    }
}

/// Pair of events measuring GPU time on the default stream
pub struct EventTimer<'a> {
    api: &'a CudaDriverApi,
    start: CUevent,
    stop: CUevent,
}

impl<'a> EventTimer<'a> {
    pub fn new(context: &CudaContext<'a>) -> Result<Self> {
        let api = context.api;
        let mut start: CUevent = std::ptr::null_mut();
        let mut stop: CUevent = std::ptr::null_mut();

        unsafe {
            check("cuEventCreate", (api.cu_event_create)(&mut start, 0))?;
            if let Err(e) = check("cuEventCreate", (api.cu_event_create)(&mut stop, 0)) {
                (api.cu_event_destroy)(start);
                return Err(e);
            }
        }

        Ok(Self { api, start, stop })
    }

    pub fn start(&self) -> Result<()> {
        unsafe {
            check(
                "cuEventRecord",
                (self.api.cu_event_record)(self.start, std::ptr::null_mut()),
            )
        }
    }

    pub fn stop(&self) -> Result<()> {
        unsafe {
            check(
                "cuEventRecord",
                (self.api.cu_event_record)(self.stop, std::ptr::null_mut()),
            )?;
            check("cuEventSynchronize", (self.api.cu_event_synchronize)(self.stop))
        }
    }

    pub fn elapsed_ms(&self) -> Result<f32> {
        let mut elapsed: f32 = 0.0;
        unsafe {
            check(
                "cuEventElapsedTime",
                (self.api.cu_event_elapsed_time)(&mut elapsed, self.start, self.stop),
            )?;
        }
        Ok(elapsed)
    }
}

impl Drop for EventTimer<'_> {
    fn drop(&mut self) {
        unsafe {
            (self.api.cu_event_destroy)(self.start);
            (self.api.cu_event_destroy)(self.stop);
        }
    }
}
