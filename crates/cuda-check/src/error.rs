//! Error handling for cuda-check
//!
//! Every failure a check can hit falls into one of two kinds:
//! - a missing dependency: a shared library cannot be opened or lacks a symbol
//! - a runtime failure: the library loaded but reported an error, or the
//!   accelerator produced results that do not hold up
//!
//! Checks convert both kinds into a printed failure and a `false` result; the
//! error type only carries enough detail to make that message actionable.

use thiserror::Error;

/// Errors raised while querying the CUDA driver or cuDNN
#[derive(Error, Debug)]
pub enum CheckError {
    /// None of the candidate shared objects could be opened
    #[error("{library} could not be loaded (tried {tried}): {reason}")]
    LibraryNotFound {
        library: &'static str,
        tried: String,
        reason: String,
    },

    /// The library opened but does not export a required entry point
    #[error("{library} does not export {symbol}: {reason}")]
    MissingSymbol {
        library: &'static str,
        symbol: &'static str,
        reason: String,
    },

    /// A CUDA driver API call returned a non-success code
    #[error("{call} failed with CUDA error {code} ({name})")]
    Driver {
        call: &'static str,
        code: i32,
        name: &'static str,
    },

    /// The driver initialised but no accelerator is visible
    #[error("no CUDA-capable device is visible")]
    NoDevice,

    /// A device reported metadata that cannot describe real hardware
    #[error("device {ordinal} reported invalid metadata: {details}")]
    InvalidDevice { ordinal: u32, details: String },

    /// A cuDNN call returned a non-success status
    #[error("{call} failed with cuDNN status {status}: {message}")]
    Cudnn {
        call: &'static str,
        status: i32,
        message: String,
    },

    /// The matrix multiplication probe ran but its result is wrong
    #[error("matrix multiplication probe failed: {details}")]
    Probe { details: String },

    /// Configuration could not be loaded or is inconsistent
    #[error("configuration error: {details}")]
    Config { details: String },
}

impl CheckError {
    /// Whether this error means a required library is absent, as opposed to
    /// a library that loaded and then failed at run time
    pub fn is_missing_dependency(&self) -> bool {
        matches!(
            self,
            CheckError::LibraryNotFound { .. } | CheckError::MissingSymbol { .. }
        )
    }

    pub fn probe(details: impl Into<String>) -> Self {
        CheckError::Probe {
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_classification() {
        let not_found = CheckError::LibraryNotFound {
            library: "CUDA driver",
            tried: "libcuda.so.1".to_string(),
            reason: "cannot open shared object file".to_string(),
        };
        assert!(not_found.is_missing_dependency());

        let symbol = CheckError::MissingSymbol {
            library: "cuDNN",
            symbol: "cudnnGetVersion",
            reason: "undefined symbol".to_string(),
        };
        assert!(symbol.is_missing_dependency());

        assert!(!CheckError::NoDevice.is_missing_dependency());
        assert!(!CheckError::probe("shape mismatch").is_missing_dependency());
    }

    #[test]
    fn test_driver_error_display() {
        let err = CheckError::Driver {
            call: "cuCtxCreate_v2",
            code: 2,
            name: "CUDA_ERROR_OUT_OF_MEMORY",
        };
        assert_eq!(
            err.to_string(),
            "cuCtxCreate_v2 failed with CUDA error 2 (CUDA_ERROR_OUT_OF_MEMORY)"
        );
    }
}
