//! [`GpuBackend`] over the dynamically loaded CUDA driver

use super::api::CudaDriverApi;
use super::ffi::*;
use super::matmul::run_matmul_probe;
use crate::error::{CheckError, Result};
use crate::gpu::backend::GpuBackend;
use crate::gpu::types::{CudaVersion, DeviceDescriptor, MatrixDimensions, ProbeResult};
use libc::{c_char, c_int, size_t};
use std::ffi::CStr;
use tracing::debug;

const DEVICE_NAME_LEN: usize = 256;

pub struct CudaDriver {
    api: CudaDriverApi,
}

impl CudaDriver {
    /// Open the driver library from the given candidates
    ///
    /// Only the library is loaded here; `cuInit` runs in
    /// [`GpuBackend::is_available`] so that a present-but-unusable driver is
    /// reported separately from a missing one.
    pub fn load(candidates: &[String]) -> Result<Self> {
        let api = CudaDriverApi::load(candidates)?;
        debug!(library = %api.path(), "CUDA driver entry points resolved");
        Ok(Self { api })
    }

    fn device_handle(&self, ordinal: u32) -> Result<CUdevice> {
        let mut device: CUdevice = 0;
        unsafe {
            check(
                "cuDeviceGet",
                (self.api.cu_device_get)(&mut device, ordinal as c_int),
            )?;
        }
        Ok(device)
    }

    fn attribute(&self, device: CUdevice, attribute: c_int) -> Result<u32> {
        let mut value: c_int = 0;
        unsafe {
            check(
                "cuDeviceGetAttribute",
                (self.api.cu_device_get_attribute)(&mut value, attribute, device),
            )?;
        }
        Ok(value.max(0) as u32)
    }
}

impl GpuBackend for CudaDriver {
    fn library_path(&self) -> String {
        self.api.path().to_string()
    }

    fn is_available(&self) -> Result<bool> {
        match unsafe { check("cuInit", (self.api.cu_init)(0)) } {
            Ok(()) => Ok(self.device_count()? > 0),
            Err(CheckError::NoDevice) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn driver_version(&self) -> Result<CudaVersion> {
        let mut version: c_int = 0;
        unsafe {
            check(
                "cuDriverGetVersion",
                (self.api.cu_driver_get_version)(&mut version),
            )?;
        }
        Ok(CudaVersion(version))
    }

    fn device_count(&self) -> Result<u32> {
        let mut count: c_int = 0;
        unsafe {
            check("cuDeviceGetCount", (self.api.cu_device_get_count)(&mut count))?;
        }
        Ok(count.max(0) as u32)
    }

    fn device(&self, ordinal: u32) -> Result<DeviceDescriptor> {
        let device = self.device_handle(ordinal)?;

        let mut name_buf = [0 as c_char; DEVICE_NAME_LEN];
        let mut total_memory: size_t = 0;
        unsafe {
            check(
                "cuDeviceGetName",
                (self.api.cu_device_get_name)(
                    name_buf.as_mut_ptr(),
                    DEVICE_NAME_LEN as c_int,
                    device,
                ),
            )?;
            check(
                "cuDeviceTotalMem_v2",
                (self.api.cu_device_total_mem)(&mut total_memory, device),
            )?;
        }
        // The driver always NUL-terminates within the buffer length
        let name = unsafe { CStr::from_ptr(name_buf.as_ptr()) }
            .to_string_lossy()
            .into_owned();

        let major = self.attribute(device, CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MAJOR)?;
        let minor = self.attribute(device, CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MINOR)?;

        Ok(DeviceDescriptor::new(ordinal, name)
            .with_memory(total_memory as u64)
            .with_compute_capability(major, minor))
    }

    fn run_matmul_probe(
        &self,
        ordinal: u32,
        dimensions: &MatrixDimensions,
        seed: u64,
    ) -> Result<ProbeResult> {
        run_matmul_probe(&self.api, ordinal, dimensions, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_without_driver_is_missing_dependency() {
        let err = match CudaDriver::load(&["libcuda_not_present_anywhere.so.1".to_string()]) {
            Ok(_) => panic!("bogus driver library loaded"),
            Err(e) => e,
        };
        assert!(err.is_missing_dependency());
    }

    #[test]
    #[ignore] // Requires CUDA hardware
    fn test_real_driver_reports_devices() {
        let driver = CudaDriver::load(&["libcuda.so.1".to_string()]).unwrap();
        assert!(driver.is_available().unwrap());

        let count = driver.device_count().unwrap();
        assert!(count >= 1);
        for ordinal in 0..count {
            let device = driver.device(ordinal).unwrap();
            assert!(device.validate().is_ok());
        }
    }

    #[test]
    #[ignore] // Requires CUDA hardware
    fn test_real_driver_matmul_probe() {
        let driver = CudaDriver::load(&["libcuda.so.1".to_string()]).unwrap();
        assert!(driver.is_available().unwrap());

        let dims = MatrixDimensions::square(1000);
        let result = driver.run_matmul_probe(0, &dims, 42).unwrap();
        assert_eq!(result.shape, (1000, 1000));
        assert_eq!(result.input_device, 0);
        assert_eq!(result.output_device, 0);
        assert!(result.verify(&dims, 1e-3).is_ok());
    }
}
