use super::scratch::ScratchPool;
use super::{LinearAlgebra, MatrixOp};
use crate::core::models::matrix::Matrix;
use crate::core::real::Real;

/// Column-major BLAS-style kernels on top of nalgebra views.
///
/// Operands are raw slices interpreted column-major with the given stored dimensions.
mod colmajor {
    use crate::core::real::Real;
    use nalgebra::{DMatrixView, DMatrixViewMut, DVectorView, DVectorViewMut};

    /// `y = alpha * op(A) x + beta * y`, `A` stored `rows x cols`.
    #[allow(clippy::too_many_arguments)]
    pub fn gemv<R: Real>(
        transpose: bool,
        rows: usize,
        cols: usize,
        alpha: R,
        a: &[R],
        x: &[R],
        beta: R,
        y: &mut [R],
    ) {
        let a = DMatrixView::from_slice(a, rows, cols);
        let x = DVectorView::from_slice(x, x.len());
        let len = y.len();
        let mut y = DVectorViewMut::from_slice(y, len);
        if transpose {
            y.gemv_tr(alpha, &a, &x, beta);
        } else {
            y.gemv(alpha, &a, &x, beta);
        }
    }

    /// `C = alpha * op(A) op(B) + beta * C` with every operand given as
    /// `(data, stored rows, stored cols)`.
    #[allow(clippy::too_many_arguments)]
    pub fn gemm<R: Real>(
        transpose_a: bool,
        transpose_b: bool,
        alpha: R,
        a: (&[R], usize, usize),
        b: (&[R], usize, usize),
        beta: R,
        c: (&mut [R], usize, usize),
    ) {
        let a = DMatrixView::from_slice(a.0, a.1, a.2);
        let b = DMatrixView::from_slice(b.0, b.1, b.2);
        let mut c = DMatrixViewMut::from_slice(c.0, c.1, c.2);
        match (transpose_a, transpose_b) {
            (false, false) => c.gemm(alpha, &a, &b, beta),
            (true, false) => c.gemm_tr(alpha, &a, &b, beta),
            (false, true) => c.gemm(alpha, &a, &b.transpose(), beta),
            (true, true) => c.gemm_tr(alpha, &a, &b.transpose(), beta),
        }
    }
}

/// Column-major engine.
///
/// A row-major `r x c` buffer is the column-major `c x r` matrix holding its transpose, so
/// the row-major products are mapped onto column-major calls here and nowhere else:
///
/// - `y = op(A) x` runs as the column-major product with the opposite orientation;
/// - `C = op(A) op(B)` runs as `Cᵗ = op(B)ᵗ op(A)ᵗ`, which swaps the operands, keeps each
///   operand's orientation flag, and swaps the row and column counts of the result.
#[derive(Debug, Default)]
pub struct BlasMath<R> {
    scratch: ScratchPool<R>,
}

impl<R: Real> BlasMath<R> {
    pub fn new() -> Self {
        Self {
            scratch: ScratchPool::new(),
        }
    }
}

impl<R: Real> LinearAlgebra<R> for BlasMath<R> {
    fn name(&self) -> &'static str {
        "blas"
    }

    fn scratch(&mut self) -> &mut ScratchPool<R> {
        &mut self.scratch
    }

    fn gemv(&mut self, op_a: MatrixOp, alpha: R, a: &Matrix<R>, x: &[R], beta: R, y: &mut [R]) {
        colmajor::gemv(
            op_a == MatrixOp::None,
            a.cols(),
            a.rows(),
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
        let (rows, cols) = (c.rows(), c.cols());
        colmajor::gemm(
            op_b == MatrixOp::Transpose,
            op_a == MatrixOp::Transpose,
            alpha,
            (b.as_slice(), b.cols(), b.rows()),
            (a.as_slice(), a.cols(), a.rows()),
            beta,
            (c.as_mut_slice(), cols, rows),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::linalg::host::HostMath;
    use crate::core::linalg::{BatchOp, MatrixOp};
    use crate::core::models::matrix::Vector;

    fn lhs() -> Matrix<f64> {
        Matrix::from_rows(&[vec![1.0, -2.0, 3.0], vec![0.5, 4.0, -1.0]]).unwrap()
    }

    fn rhs() -> Matrix<f64> {
        Matrix::from_rows(&[
            vec![2.0, 1.0],
            vec![-1.0, 3.0],
            vec![0.0, 5.0],
        ])
        .unwrap()
    }

    fn transposed(m: &Matrix<f64>) -> Matrix<f64> {
        let mut t = Matrix::null();
        HostMath::<f64>::new().transpose(&mut t, m).unwrap();
        t
    }

    #[test]
    fn colmajor_gemm_reads_storage_column_major() {
        // Column-major 2x2 [[1, 3], [2, 4]] times identity.
        let a = [1.0, 2.0, 3.0, 4.0];
        let id = [1.0, 0.0, 0.0, 1.0];
        let mut c = [0.0; 4];
        colmajor::gemm(true, false, 1.0, (&a, 2, 2), (&id, 2, 2), 0.0, (&mut c, 2, 2));
        assert_eq!(c, [1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn mm_product_matches_host_for_every_orientation() {
        let a = lhs();
        let b = rhs();
        let at = transposed(&a);
        let bt = transposed(&b);
        let cases = [
            (&a, MatrixOp::None, &b, MatrixOp::None),
            (&at, MatrixOp::Transpose, &b, MatrixOp::None),
            (&a, MatrixOp::None, &bt, MatrixOp::Transpose),
            (&at, MatrixOp::Transpose, &bt, MatrixOp::Transpose),
        ];

        let mut host = HostMath::<f64>::new();
        let mut blas = BlasMath::<f64>::new();
        for (x, op_x, y, op_y) in cases {
            let mut expected = Matrix::null();
            host.mm_product(&mut expected, 2.0, x, op_x, y, op_y).unwrap();
            let mut actual = Matrix::null();
            blas.mm_product(&mut actual, 2.0, x, op_x, y, op_y).unwrap();
            assert_eq!(actual, expected, "{:?} x {:?}", op_x, op_y);
        }
        assert_eq!(
            {
                let mut c = Matrix::null();
                blas.mm_product(&mut c, 1.0, &a, MatrixOp::None, &b, MatrixOp::None)
                    .unwrap();
                c.to_rows()
            },
            vec![vec![4.0, 10.0], vec![-3.0, 7.5]]
        );
    }

    #[test]
    fn mv_and_vm_products_match_host() {
        let a = lhs();
        let x3 = Vector::from_vec(vec![1.0, 2.0, -1.0]);
        let x2 = Vector::from_vec(vec![-1.0, 2.0]);
        let mut host = HostMath::<f64>::new();
        let mut blas = BlasMath::<f64>::new();

        let (mut h, mut b) = (Vector::null(), Vector::null());
        host.mv_product(&mut h, 1.5, &a, MatrixOp::None, &x3).unwrap();
        blas.mv_product(&mut b, 1.5, &a, MatrixOp::None, &x3).unwrap();
        assert_eq!(h, b);

        let (mut h, mut b) = (Vector::null(), Vector::null());
        host.mv_product(&mut h, 1.0, &a, MatrixOp::Transpose, &x2).unwrap();
        blas.mv_product(&mut b, 1.0, &a, MatrixOp::Transpose, &x2).unwrap();
        assert_eq!(h, b);

        let (mut h, mut b) = (Vector::zeros(3), Vector::zeros(3));
        host.vm_product(&mut h, 1.0, &x2, &a, MatrixOp::None, 0.0).unwrap();
        blas.vm_product(&mut b, 1.0, &x2, &a, MatrixOp::None, 0.0).unwrap();
        assert_eq!(h, b);
        assert_eq!(b.to_vec(), vec![0.0, 10.0, -5.0]);
    }

    #[test]
    fn composite_products_match_host() {
        let a = lhs();
        let y = Matrix::from_rows(&[vec![1.0, -1.0], vec![-1.0, -1.0], vec![1.0, 1.0]]).unwrap();
        let x = Matrix::from_rows(&[
            vec![1.0, 1.0, 1.0],
            vec![-1.0, 1.0, -1.0],
            vec![1.0, -1.0, -1.0],
        ])
        .unwrap();
        let mut host = HostMath::<f64>::new();
        let mut blas = BlasMath::<f64>::new();

        let (mut h, mut b) = (Vector::null(), Vector::null());
        host.batched_vmv_product(&mut h, 1.0, &y, &a, &x).unwrap();
        blas.batched_vmv_product(&mut b, 1.0, &y, &a, &x).unwrap();
        assert_eq!(h, b);

        let (mut h, mut b) = (Vector::null(), Vector::null());
        host.sum_batched(&mut h, 1.0, &a, BatchOp::Colwise).unwrap();
        blas.sum_batched(&mut b, 1.0, &a, BatchOp::Colwise).unwrap();
        assert_eq!(h, b);
    }
}
