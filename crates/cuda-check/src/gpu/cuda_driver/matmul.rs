//! Matrix multiplication probe
//!
//! Inputs are generated on the host from a seed, uploaded, multiplied by the
//! embedded PTX kernel and read back. Correctness is confirmed with a
//! Freivalds-style check, `C·r ≈ A·(B·r)` for a random ±1 vector `r`, which
//! costs O(n²) on the host instead of recomputing the full product.

use super::api::CudaDriverApi;
use super::context::{CudaContext, DeviceBuffer, EventTimer, Module};
use super::ffi::check;
use super::ptx_source::{KERNEL_NAME, PTX_SOURCE};
use crate::error::{CheckError, Result};
use crate::gpu::types::{MatrixDimensions, ProbeResult};
use libc::{c_uint, c_void};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

const BLOCK_SIZE: usize = 16;

/// Run the probe on device `ordinal`
pub fn run_matmul_probe(
    api: &CudaDriverApi,
    ordinal: u32,
    dimensions: &MatrixDimensions,
    seed: u64,
) -> Result<ProbeResult> {
    if dimensions.output_len() == 0 || dimensions.inner == 0 {
        return Err(CheckError::probe(format!(
            "degenerate matrix dimensions {dimensions:?}"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let a = random_matrix(&mut rng, dimensions.lhs_len())?;
    let b = random_matrix(&mut rng, dimensions.rhs_len())?;

    debug!(
        device = ordinal,
        bytes = dimensions.memory_required(),
        "Allocating probe matrices"
    );

    // Declared first so it is destroyed after every resource created in it
    let context = CudaContext::create(api, ordinal)?;
    let module = Module::from_ptx(&context, PTX_SOURCE)?;
    let kernel = module.function(KERNEL_NAME)?;

    let d_a = DeviceBuffer::from_host(&context, &a)?;
    let d_b = DeviceBuffer::from_host(&context, &b)?;
    let d_c = DeviceBuffer::alloc(&context, dimensions.output_len())?;

    let timer = EventTimer::new(&context)?;

    let mut a_ptr = d_a.raw();
    let mut b_ptr = d_b.raw();
    let mut c_ptr = d_c.raw();
    let mut rows = dimensions.rows as c_uint;
    let mut inner = dimensions.inner as c_uint;
    let mut cols = dimensions.cols as c_uint;
    let mut params = [
        &mut a_ptr as *mut _ as *mut c_void,
        &mut b_ptr as *mut _ as *mut c_void,
        &mut c_ptr as *mut _ as *mut c_void,
        &mut rows as *mut _ as *mut c_void,
        &mut inner as *mut _ as *mut c_void,
        &mut cols as *mut _ as *mut c_void,
    ];

    let grid_x = dimensions.cols.div_ceil(BLOCK_SIZE) as c_uint;
    let grid_y = dimensions.rows.div_ceil(BLOCK_SIZE) as c_uint;

    timer.start()?;
    unsafe {
        check(
            "cuLaunchKernel",
            (api.cu_launch_kernel)(
                kernel,
                grid_x,
                grid_y,
                1,
                BLOCK_SIZE as c_uint,
                BLOCK_SIZE as c_uint,
                1,
                0,
                std::ptr::null_mut(),
                params.as_mut_ptr(),
                std::ptr::null_mut(),
            ),
        )?;
    }
    timer.stop()?;
    context.synchronize()?;
    let execution_time_ms = timer.elapsed_ms()?;

    let input_device = d_a.device_ordinal()?;
    let rhs_device = d_b.device_ordinal()?;
    check_operand_residency(ordinal, input_device, rhs_device)?;
    let output_device = d_c.device_ordinal()?;

    let c = d_c.to_host()?;
    let shape = observed_shape(c.len(), dimensions);
    let max_relative_error = freivalds_residual(&a, &b, &c, dimensions, &mut rng);

    info!(
        device = context.ordinal(),
        execution_time_ms, max_relative_error, "Matrix multiplication probe finished"
    );

    Ok(ProbeResult {
        shape,
        input_device,
        output_device,
        execution_time_ms,
        max_relative_error,
    })
}

/// Both operands must sit on the device the context was created for
fn check_operand_residency(requested: u32, lhs: u32, rhs: u32) -> Result<()> {
    if lhs != requested || rhs != requested {
        return Err(CheckError::probe(format!(
            "operands reside on cuda:{lhs} and cuda:{rhs}, expected cuda:{requested}"
        )));
    }
    Ok(())
}

/// Shape of the product as read back, `(rows, len / rows)`
fn observed_shape(len: usize, dimensions: &MatrixDimensions) -> (usize, usize) {
    let cols = if len % dimensions.rows == 0 {
        len / dimensions.rows
    } else {
        0
    };
    (dimensions.rows, cols)
}

fn random_matrix(rng: &mut StdRng, len: usize) -> Result<Vec<f32>> {
    let mut values = Vec::new();
    values.try_reserve_exact(len).map_err(|e| {
        CheckError::probe(format!("cannot allocate {len} host values for the probe: {e}"))
    })?;
    values.extend((0..len).map(|_| rng.gen_range(-1.0f32..1.0)));
    Ok(values)
}

/// Largest deviation between `C·r` and `A·(B·r)`, relative to `|A·(B·r)|∞`
///
/// All matrices are row-major. Returns infinity when `c` is the wrong size.
pub fn freivalds_residual<R: Rng>(
    a: &[f32],
    b: &[f32],
    c: &[f32],
    dimensions: &MatrixDimensions,
    rng: &mut R,
) -> f64 {
    if a.len() != dimensions.lhs_len()
        || b.len() != dimensions.rhs_len()
        || c.len() != dimensions.output_len()
    {
        return f64::INFINITY;
    }

    let r: Vec<f64> = (0..dimensions.cols)
        .map(|_| if rng.gen::<bool>() { 1.0 } else { -1.0 })
        .collect();

    let br = mat_vec(b, dimensions.inner, dimensions.cols, &r);
    let abr = mat_vec(a, dimensions.rows, dimensions.inner, &br);
    let cr = mat_vec(c, dimensions.rows, dimensions.cols, &r);

    let scale = abr.iter().fold(1.0f64, |acc, v| acc.max(v.abs()));
    abr.iter()
        .zip(&cr)
        .map(|(expected, actual)| (expected - actual).abs() / scale)
        .fold(0.0, |worst: f64, deviation| {
            if deviation.is_nan() {
                f64::INFINITY
            } else {
                worst.max(deviation)
            }
        })
}

fn mat_vec(m: &[f32], rows: usize, cols: usize, v: &[f64]) -> Vec<f64> {
    m.chunks_exact(cols)
        .take(rows)
        .map(|row| row.iter().zip(v).map(|(x, y)| *x as f64 * y).sum::<f64>())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_matmul(a: &[f32], b: &[f32], dims: &MatrixDimensions) -> Vec<f32> {
        let mut c = vec![0f32; dims.output_len()];
        for i in 0..dims.rows {
            for k in 0..dims.inner {
                let a_ik = a[i * dims.inner + k];
                for j in 0..dims.cols {
                    c[i * dims.cols + j] += a_ik * b[k * dims.cols + j];
                }
            }
        }
        c
    }

    #[test]
    fn test_freivalds_accepts_correct_product() {
        let dims = MatrixDimensions::new(32, 48, 24);
        let mut rng = StdRng::seed_from_u64(7);
        let a = random_matrix(&mut rng, dims.lhs_len()).unwrap();
        let b = random_matrix(&mut rng, dims.rhs_len()).unwrap();
        let c = host_matmul(&a, &b, &dims);

        let residual = freivalds_residual(&a, &b, &c, &dims, &mut rng);
        assert!(residual < 1e-4, "residual {residual}");
    }

    #[test]
    fn test_freivalds_rejects_corrupted_product() {
        let dims = MatrixDimensions::square(16);
        let mut rng = StdRng::seed_from_u64(11);
        let a = random_matrix(&mut rng, dims.lhs_len()).unwrap();
        let b = random_matrix(&mut rng, dims.rhs_len()).unwrap();
        let mut c = host_matmul(&a, &b, &dims);
        c[5 * 16 + 3] += 10.0;

        let residual = freivalds_residual(&a, &b, &c, &dims, &mut rng);
        assert!(residual > 1e-3, "residual {residual}");
    }

    #[test]
    fn test_freivalds_rejects_nan_product() {
        let dims = MatrixDimensions::square(8);
        let mut rng = StdRng::seed_from_u64(5);
        let a = random_matrix(&mut rng, dims.lhs_len()).unwrap();
        let b = random_matrix(&mut rng, dims.rhs_len()).unwrap();
        let mut c = host_matmul(&a, &b, &dims);
        c[0] = f32::NAN;

        assert!(freivalds_residual(&a, &b, &c, &dims, &mut rng).is_infinite());
    }

    #[test]
    fn test_freivalds_rejects_wrong_output_size() {
        let dims = MatrixDimensions::square(4);
        let mut rng = StdRng::seed_from_u64(3);
        let a = vec![1.0; 16];
        let b = vec![1.0; 16];
        let c = vec![4.0; 12];

        assert!(freivalds_residual(&a, &b, &c, &dims, &mut rng).is_infinite());
    }

    #[test]
    fn test_random_matrix_is_seeded() {
        let first = random_matrix(&mut StdRng::seed_from_u64(42), 64).unwrap();
        let second = random_matrix(&mut StdRng::seed_from_u64(42), 64).unwrap();
        assert_eq!(first, second);
        assert!(first.iter().all(|v| (-1.0..1.0).contains(v)));
    }

    #[test]
    fn test_random_matrix_reports_unallocatable_size() {
        let err = random_matrix(&mut StdRng::seed_from_u64(1), usize::MAX).unwrap_err();
        assert!(matches!(err, CheckError::Probe { .. }));
    }

    #[test]
    fn test_operands_must_reside_on_requested_device() {
        assert!(check_operand_residency(1, 1, 1).is_ok());
        assert!(check_operand_residency(1, 0, 0).is_err());
        assert!(check_operand_residency(0, 0, 1).is_err());
    }

    #[test]
    fn test_observed_shape_follows_read_back_length() {
        let dims = MatrixDimensions::square(4);
        assert_eq!(observed_shape(16, &dims), (4, 4));
        assert_eq!(observed_shape(12, &dims), (4, 3));
        assert_eq!(observed_shape(10, &dims), (4, 0));

        let short = ProbeResult {
            shape: observed_shape(12, &dims),
            input_device: 0,
            output_device: 0,
            execution_time_ms: 1.0,
            max_relative_error: 0.0,
        };
        assert!(short.verify(&dims, 1e-3).is_err());
    }
}
