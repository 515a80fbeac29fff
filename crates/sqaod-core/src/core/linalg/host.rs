use super::scratch::ScratchPool;
use super::{LinearAlgebra, MatrixOp, kernels};
use crate::core::models::matrix::Matrix;
use crate::core::real::Real;

/// Row-major host engine.
///
/// Runs both kernels directly over the logical row-major layout; with the `parallel`
/// feature, independent output rows are spread across the rayon pool.
#[derive(Debug, Default)]
pub struct HostMath<R> {
    scratch: ScratchPool<R>,
}

impl<R: Real> HostMath<R> {
    pub fn new() -> Self {
        Self {
            scratch: ScratchPool::new(),
        }
    }
}

impl<R: Real> LinearAlgebra<R> for HostMath<R> {
    fn name(&self) -> &'static str {
        "host"
    }

    fn scratch(&mut self) -> &mut ScratchPool<R> {
        &mut self.scratch
    }

    fn gemv(&mut self, op_a: MatrixOp, alpha: R, a: &Matrix<R>, x: &[R], beta: R, y: &mut [R]) {
        kernels::gemv_row_major(
            op_a == MatrixOp::Transpose,
            a.rows(),
            a.cols(),
            alpha,
            a.as_slice(),
            x,
            beta,
            y,
        );
    }

    fn gemm(
        &mut self,
        op_a: MatrixOp,
        op_b: MatrixOp,
        alpha: R,
        a: &Matrix<R>,
        b: &Matrix<R>,
        beta: R,
        c: &mut Matrix<R>,
    ) {
        let (m, n) = (c.rows(), c.cols());
        let k = match op_a {
            MatrixOp::None => a.cols(),
            MatrixOp::Transpose => a.rows(),
        };
        kernels::gemm_row_major(
            op_a == MatrixOp::Transpose,
            op_b == MatrixOp::Transpose,
            m,
            n,
            k,
            alpha,
            a.as_slice(),
            a.cols(),
            b.as_slice(),
            b.cols(),
            beta,
            c.as_mut_slice(),
        );
    }
}
