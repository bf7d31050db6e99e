#![allow(non_camel_case_types)]

use libc::{c_char, c_int, c_void, size_t};

pub type cudnnStatus_t = c_int;
pub type cudnnHandle_t = *mut c_void;

pub const CUDNN_STATUS_SUCCESS: cudnnStatus_t = 0;

pub type cudnnGetVersion_t = unsafe extern "C" fn() -> size_t;
pub type cudnnGetCudartVersion_t = unsafe extern "C" fn() -> size_t;
pub type cudnnCreate_t = unsafe extern "C" fn(handle: *mut cudnnHandle_t) -> cudnnStatus_t;
pub type cudnnDestroy_t = unsafe extern "C" fn(handle: cudnnHandle_t) -> cudnnStatus_t;
pub type cudnnGetErrorString_t = unsafe extern "C" fn(status: cudnnStatus_t) -> *const c_char;
