//! Configuration layering tests

use cuda_check::cli::parse_args_from;
use cuda_check::{CheckConfig, CheckError, ConfigOverrides};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_file_values_override_defaults() {
    let file = write_config(
        r#"
[cuda]
matrix_size = 512
seed = 7
library_candidates = ["/usr/lib/x86_64-linux-gnu/libcuda.so.1"]

[cudnn]
enabled = false

[output]
log_level = "info"
"#,
    );

    let config = CheckConfig::load(Some(file.path()), &ConfigOverrides::default()).unwrap();

    assert_eq!(config.cuda.matrix_size, 512);
    assert_eq!(config.cuda.seed, 7);
    assert_eq!(config.cuda.device, 0);
    assert_eq!(
        config.cuda.library_candidates,
        vec!["/usr/lib/x86_64-linux-gnu/libcuda.so.1".to_string()]
    );
    assert!(!config.cudnn.enabled);
    assert_eq!(config.cudnn.library_candidates.len(), 3);
    assert_eq!(config.output.log_level, "info");
    assert!(!config.output.json);
}

#[test]
fn test_command_line_overrides_file() {
    let file = write_config(
        r#"
[cuda]
matrix_size = 512
device = 1

[output]
json = false
"#,
    );
    let path = file.path().to_string_lossy().into_owned();

    let args = parse_args_from([
        "cuda-check",
        "--config",
        path.as_str(),
        "--matrix-size",
        "64",
        "--json",
    ])
    .unwrap();
    let config = CheckConfig::load(args.config_path.as_deref(), &args.overrides).unwrap();

    assert_eq!(config.cuda.matrix_size, 64);
    assert_eq!(config.cuda.device, 1);
    assert!(config.output.json);
}

#[test]
fn test_malformed_file_is_config_error() {
    let file = write_config("[cuda\nmatrix_size = ");

    let err = CheckConfig::load(Some(file.path()), &ConfigOverrides::default()).unwrap_err();
    assert!(matches!(err, CheckError::Config { .. }));
}

#[test]
fn test_invalid_values_in_file_are_rejected() {
    let file = write_config(
        r#"
[cuda]
matrix_size = 0
"#,
    );

    let err = CheckConfig::load(Some(file.path()), &ConfigOverrides::default()).unwrap_err();
    assert!(err.to_string().contains("matrix_size"));
}
