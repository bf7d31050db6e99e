//! Run-time loading of vendor shared libraries
//!
//! Libraries are tried in the configured order and the first that opens wins.
//! Resolved function pointers are copied out of their `Symbol` wrappers; the
//! caller must keep the returned [`Library`] alive for as long as any of them
//! is used.

use libloading::Library;
use tracing::debug;

use crate::error::{CheckError, Result};

/// An opened shared library together with the name it was opened under
pub struct LoadedLibrary {
    pub library: Library,
    pub path: String,
}

/// Open the first candidate that the dynamic loader accepts
pub fn open_first(label: &'static str, candidates: &[String]) -> Result<LoadedLibrary> {
    let mut last_error = String::from("no candidates configured");

    for candidate in candidates {
        // SAFETY: loading a vendor library runs its initialisers; the CUDA
        // and cuDNN initialisers have no preconditions on the caller.
        match unsafe { Library::new(candidate) } {
            Ok(library) => {
                debug!(library = %candidate, "Opened {}", label);
                return Ok(LoadedLibrary {
                    library,
                    path: candidate.clone(),
                });
            }
            Err(e) => {
                debug!(library = %candidate, error = %e, "Failed to open {}", label);
                last_error = e.to_string();
            }
        }
    }

    Err(CheckError::LibraryNotFound {
        library: label,
        tried: candidates.join(", "),
        reason: last_error,
    })
}

/// Resolve `symbol` from `library` as a function pointer of type `T`
///
/// # Safety
/// `T` must match the C signature of the exported symbol.
pub unsafe fn load_symbol<T: Copy>(
    library: &Library,
    label: &'static str,
    symbol: &'static str,
) -> Result<T> {
    library
        .get::<T>(symbol.as_bytes())
        .map(|sym| *sym)
        .map_err(|e| CheckError::MissingSymbol {
            library: label,
            symbol,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_first_reports_every_candidate() {
        let candidates = vec![
            "libdefinitely_not_installed_a.so".to_string(),
            "libdefinitely_not_installed_b.so".to_string(),
        ];

        match open_first("test library", &candidates) {
            Err(CheckError::LibraryNotFound { library, tried, .. }) => {
                assert_eq!(library, "test library");
                assert!(tried.contains("libdefinitely_not_installed_a.so"));
                assert!(tried.contains("libdefinitely_not_installed_b.so"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("nonexistent library opened"),
        }
    }

    #[test]
    fn test_open_first_with_no_candidates() {
        let err = open_first("test library", &[]).err().map(|e| e.to_string());
        assert!(err.unwrap().contains("no candidates configured"));
    }
}
