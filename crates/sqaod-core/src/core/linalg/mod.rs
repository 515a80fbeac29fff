//! # Linear Algebra Module
//!
//! Backend-abstracted dense linear algebra used by the problem formulation and the
//! annealer to compute fields, energies and bulk products.
//!
//! ## Data model
//!
//! Every operand is a logical **row-major** [`Matrix`] or a [`Vector`]. Outputs follow
//! allocate-if-null semantics: a null output is allocated to the result shape, a non-null
//! output must already have that shape. Every operation validates its operands before
//! touching memory and fails with a [`LinalgError`] on the first violation.
//!
//! ## Backends
//!
//! [`LinearAlgebra`] carries the whole operation set as provided methods built on two
//! backend kernels, [`LinearAlgebra::gemv`] and [`LinearAlgebra::gemm`]. Both kernels take
//! row-major operands and produce row-major results; backends differ only in how they
//! execute them:
//!
//! - [`host::HostMath`] - direct row-major loops over host memory (rayon-parallel rows
//!   with the `parallel` feature)
//! - [`blas::BlasMath`] - column-major BLAS-style kernels, with the row-major/column-major
//!   operand swap done once inside its `gemv`/`gemm`
//!
//! Intermediate results (column-wise reductions, transposed operands, chained products)
//! come from the engine's [`ScratchPool`](scratch::ScratchPool) and are returned to it
//! before the operation finishes.

pub mod blas;
pub mod error;
pub mod host;
pub(crate) mod kernels;
pub mod scratch;
pub(crate) mod shape;

use crate::core::models::matrix::{Matrix, Vector};
use crate::core::real::Real;
use error::LinalgError;
use scratch::ScratchPool;
use serde::Deserialize;
use shape::{
    allocate_matrix_if_null, allocate_vector_if_null, assert_same_shape, assert_valid_matrix,
    assert_valid_vector, require_matrix, require_vector,
};

/// Orientation of a matrix operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixOp {
    None,
    Transpose,
}

impl MatrixOp {
    pub fn flipped(self) -> Self {
        match self {
            MatrixOp::None => MatrixOp::Transpose,
            MatrixOp::Transpose => MatrixOp::None,
        }
    }
}

/// Direction of a batched operation over a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchOp {
    /// One result per row.
    Rowwise,
    /// One result per column.
    Colwise,
}

/// Which [`LinearAlgebra`] implementation a solver is constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[default]
    Host,
    Blas,
}

impl Backend {
    pub fn create<R: Real>(self) -> Box<dyn LinearAlgebra<R> + Send> {
        match self {
            Backend::Host => Box::new(host::HostMath::new()),
            Backend::Blas => Box::new(blas::BlasMath::new()),
        }
    }
}

/// Dense linear-algebra engine over row-major operands.
pub trait LinearAlgebra<R: Real> {
    fn name(&self) -> &'static str;

    fn scratch(&mut self) -> &mut ScratchPool<R>;

    /// Backend kernel: `y = alpha * op(A) x + beta * y`.
    ///
    /// Shapes are validated by the caller: `x` has `op(A).cols` elements and `y` has
    /// `op(A).rows`.
    fn gemv(&mut self, op_a: MatrixOp, alpha: R, a: &Matrix<R>, x: &[R], beta: R, y: &mut [R]);

    /// Backend kernel: `C = alpha * op(A) op(B) + beta * C`.
    ///
    /// Shapes are validated by the caller: `op(A).cols == op(B).rows` and `C` is
    /// `op(A).rows x op(B).cols`.
    #[allow(clippy::too_many_arguments)]
    fn gemm(
        &mut self,
        op_a: MatrixOp,
        op_b: MatrixOp,
        alpha: R,
        a: &Matrix<R>,
        b: &Matrix<R>,
        beta: R,
        c: &mut Matrix<R>,
    );

    /// Sets `A[i, i] = v` for `i < min(rows, cols)`.
    fn set_to_diagonals(&mut self, a: &mut Matrix<R>, v: R) -> Result<(), LinalgError> {
        require_matrix("set_to_diagonals", a)?;
        let n = a.rows().min(a.cols());
        for i in 0..n {
            a[(i, i)] = v;
        }
        Ok(())
    }

    /// `y = alpha * x + add_assign_factor * y`.
    fn scale_vector(
        &mut self,
        y: &mut Vector<R>,
        alpha: R,
        x: &Vector<R>,
        add_assign_factor: R,
    ) -> Result<(), LinalgError> {
        require_vector("scale_vector", x)?;
        allocate_vector_if_null(y, x.len());
        assert_valid_vector("scale_vector", y, x.len())?;
        kernels::axpby(y.as_mut_slice(), alpha, x.as_slice(), add_assign_factor);
        Ok(())
    }

    /// `B = alpha * A`.
    fn scale_matrix(&mut self, b: &mut Matrix<R>, alpha: R, a: &Matrix<R>) -> Result<(), LinalgError> {
        require_matrix("scale_matrix", a)?;
        allocate_matrix_if_null(b, a.dim());
        assert_same_shape("scale_matrix", a, b)?;
        kernels::axpby(b.as_mut_slice(), alpha, a.as_slice(), R::zero());
        Ok(())
    }

    /// `y *= alpha`.
    fn scale_vector_in_place(&mut self, y: &mut Vector<R>, alpha: R) -> Result<(), LinalgError> {
        require_vector("scale_vector_in_place", y)?;
        kernels::scale_in_place(y.as_mut_slice(), alpha);
        Ok(())
    }

    /// `A *= alpha`.
    fn scale_matrix_in_place(&mut self, a: &mut Matrix<R>, alpha: R) -> Result<(), LinalgError> {
        require_matrix("scale_matrix_in_place", a)?;
        kernels::scale_in_place(a.as_mut_slice(), alpha);
        Ok(())
    }

    /// `y[i] = alpha * x + add_assign_factor * y[i]`.
    fn scale_broadcast_vector(
        &mut self,
        y: &mut Vector<R>,
        alpha: R,
        x: R,
        add_assign_factor: R,
    ) -> Result<(), LinalgError> {
        require_vector("scale_broadcast_vector", y)?;
        kernels::broadcast(y.as_mut_slice(), alpha * x, add_assign_factor);
        Ok(())
    }

    /// Broadcasts `alpha * x` along rows (`x` indexed by column) or columns (`x` indexed by
    /// row), accumulating `add_assign_factor * A`.
    fn scale_broadcast_matrix(
        &mut self,
        a: &mut Matrix<R>,
        alpha: R,
        x: &Vector<R>,
        op: BatchOp,
        add_assign_factor: R,
    ) -> Result<(), LinalgError> {
        const OP: &str = "scale_broadcast_matrix";
        require_matrix(OP, a)?;
        let cols = a.cols();
        match op {
            BatchOp::Rowwise => {
                assert_valid_vector(OP, x, cols)?;
                for r in 0..a.rows() {
                    kernels::axpby(a.row_mut(r), alpha, x.as_slice(), add_assign_factor);
                }
            }
            BatchOp::Colwise => {
                assert_valid_vector(OP, x, a.rows())?;
                for r in 0..a.rows() {
                    kernels::broadcast(a.row_mut(r), alpha * x[r], add_assign_factor);
                }
            }
        }
        Ok(())
    }

    fn sum_vector(&mut self, alpha: R, x: &Vector<R>) -> Result<R, LinalgError> {
        require_vector("sum_vector", x)?;
        Ok(alpha * kernels::sum(x.as_slice()))
    }

    fn sum_matrix(&mut self, alpha: R, a: &Matrix<R>) -> Result<R, LinalgError> {
        require_matrix("sum_matrix", a)?;
        Ok(alpha * kernels::sum(a.as_slice()))
    }

    fn sum_diagonals(&mut self, a: &Matrix<R>) -> Result<R, LinalgError> {
        require_matrix("sum_diagonals", a)?;
        let n = a.rows().min(a.cols());
        Ok((0..n).fold(R::zero(), |acc, i| acc + a[(i, i)]))
    }

    /// Per-row (`Rowwise`, length `rows`) or per-column (`Colwise`, length `cols`) sums.
    fn sum_batched(
        &mut self,
        y: &mut Vector<R>,
        alpha: R,
        a: &Matrix<R>,
        op: BatchOp,
    ) -> Result<(), LinalgError> {
        const OP: &str = "sum_batched";
        require_matrix(OP, a)?;
        match op {
            BatchOp::Rowwise => {
                allocate_vector_if_null(y, a.rows());
                assert_valid_vector(OP, y, a.rows())?;
                kernels::row_sums(y.as_mut_slice(), alpha, a.as_slice(), a.cols());
            }
            BatchOp::Colwise => {
                allocate_vector_if_null(y, a.cols());
                assert_valid_vector(OP, y, a.cols())?;
                let mut at = self.scratch().matrix(a.dim().transposed());
                kernels::transpose(at.as_mut_slice(), a.as_slice(), a.rows(), a.cols());
                kernels::row_sums(y.as_mut_slice(), alpha, at.as_slice(), at.cols());
                self.scratch().recycle_matrix(at);
            }
        }
        Ok(())
    }

    fn dot(&mut self, alpha: R, x: &Vector<R>, y: &Vector<R>) -> Result<R, LinalgError> {
        require_vector("dot", x)?;
        assert_valid_vector("dot", y, x.len())?;
        Ok(alpha * kernels::dot(x.as_slice(), y.as_slice()))
    }

    /// `z[r] = alpha * op(A)[r, :] · op(B)[r, :]`; `op(A)` and `op(B)` must have equal shapes.
    fn dot_batched(
        &mut self,
        z: &mut Vector<R>,
        alpha: R,
        a: &Matrix<R>,
        op_a: MatrixOp,
        b: &Matrix<R>,
        op_b: MatrixOp,
    ) -> Result<(), LinalgError> {
        const OP: &str = "dot_batched";
        require_matrix(OP, a)?;
        require_matrix(OP, b)?;
        let dim = shape::matrix_shape(a.dim(), op_a);
        if shape::matrix_shape(b.dim(), op_b) != dim {
            return Err(LinalgError::ShapeMismatch {
                op: OP,
                expected: error::Shape::Matrix(dim),
                found: error::Shape::Matrix(shape::matrix_shape(b.dim(), op_b)),
            });
        }
        allocate_vector_if_null(z, dim.rows);
        assert_valid_vector(OP, z, dim.rows)?;

        let at = (op_a == MatrixOp::Transpose).then(|| {
            let mut t = self.scratch().matrix(dim);
            kernels::transpose(t.as_mut_slice(), a.as_slice(), a.rows(), a.cols());
            t
        });
        let bt = (op_b == MatrixOp::Transpose).then(|| {
            let mut t = self.scratch().matrix(dim);
            kernels::transpose(t.as_mut_slice(), b.as_slice(), b.rows(), b.cols());
            t
        });
        let lhs = at.as_ref().unwrap_or(a);
        let rhs = bt.as_ref().unwrap_or(b);
        kernels::row_dots(z.as_mut_slice(), alpha, lhs.as_slice(), rhs.as_slice(), dim.cols);

        if let Some(t) = at {
            self.scratch().recycle_matrix(t);
        }
        if let Some(t) = bt {
            self.scratch().recycle_matrix(t);
        }
        Ok(())
    }

    /// `y = alpha * op(A) x`.
    fn mv_product(
        &mut self,
        y: &mut Vector<R>,
        alpha: R,
        a: &Matrix<R>,
        op_a: MatrixOp,
        x: &Vector<R>,
    ) -> Result<(), LinalgError> {
        const OP: &str = "mv_product";
        require_matrix(OP, a)?;
        require_vector(OP, x)?;
        let len = shape::mv_shape(OP, a.dim(), op_a, x.len())?;
        allocate_vector_if_null(y, len);
        assert_valid_vector(OP, y, len)?;
        self.gemv(op_a, alpha, a, x.as_slice(), R::zero(), y.as_mut_slice());
        Ok(())
    }

    /// `y = alpha * xᵗ op(A) + add_assign_factor * y`.
    fn vm_product(
        &mut self,
        y: &mut Vector<R>,
        alpha: R,
        x: &Vector<R>,
        a: &Matrix<R>,
        op_a: MatrixOp,
        add_assign_factor: R,
    ) -> Result<(), LinalgError> {
        const OP: &str = "vm_product";
        require_matrix(OP, a)?;
        require_vector(OP, x)?;
        let len = shape::vm_shape(OP, x.len(), a.dim(), op_a)?;
        allocate_vector_if_null(y, len);
        assert_valid_vector(OP, y, len)?;
        // xᵗ op(A) = op(A)ᵗ x
        self.gemv(
            op_a.flipped(),
            alpha,
            a,
            x.as_slice(),
            add_assign_factor,
            y.as_mut_slice(),
        );
        Ok(())
    }

    /// `C = alpha * op(A) op(B)`.
    fn mm_product(
        &mut self,
        c: &mut Matrix<R>,
        alpha: R,
        a: &Matrix<R>,
        op_a: MatrixOp,
        b: &Matrix<R>,
        op_b: MatrixOp,
    ) -> Result<(), LinalgError> {
        const OP: &str = "mm_product";
        require_matrix(OP, a)?;
        require_matrix(OP, b)?;
        let dim = shape::product_shape(OP, a.dim(), op_a, b.dim(), op_b)?;
        allocate_matrix_if_null(c, dim);
        assert_valid_matrix(OP, c, dim)?;
        self.gemm(op_a, op_b, alpha, a, b, R::zero(), c);
        Ok(())
    }

    /// `alpha * yᵗ A x`.
    fn vmv_product(
        &mut self,
        alpha: R,
        y: &Vector<R>,
        a: &Matrix<R>,
        x: &Vector<R>,
    ) -> Result<R, LinalgError> {
        const OP: &str = "vmv_product";
        require_matrix(OP, a)?;
        require_vector(OP, x)?;
        require_vector(OP, y)?;
        let len = shape::mv_shape(OP, a.dim(), MatrixOp::None, x.len())?;
        assert_valid_vector(OP, y, len)?;

        let mut ax = self.scratch().vector(len);
        self.gemv(MatrixOp::None, R::one(), a, x.as_slice(), R::zero(), ax.as_mut_slice());
        let value = alpha * kernels::dot(y.as_slice(), ax.as_slice());
        self.scratch().recycle_vector(ax);
        Ok(value)
    }

    /// `z[k] = alpha * Y[k, :] A X[k, :]ᵗ` for every row `k` of `Y` (`m x rows(A)`) and `X`
    /// (`m x cols(A)`).
    fn batched_vmv_product(
        &mut self,
        z: &mut Vector<R>,
        alpha: R,
        y: &Matrix<R>,
        a: &Matrix<R>,
        x: &Matrix<R>,
    ) -> Result<(), LinalgError> {
        const OP: &str = "batched_vmv_product";
        require_matrix(OP, y)?;
        require_matrix(OP, a)?;
        require_matrix(OP, x)?;
        // Row k of X Aᵗ is (A X[k, :]ᵗ)ᵗ.
        let dim = shape::product_shape(OP, x.dim(), MatrixOp::None, a.dim(), MatrixOp::Transpose)?;
        assert_valid_matrix(OP, y, dim)?;
        allocate_vector_if_null(z, dim.rows);
        assert_valid_vector(OP, z, dim.rows)?;

        let mut ax = self.scratch().matrix(dim);
        self.gemm(MatrixOp::None, MatrixOp::Transpose, R::one(), x, a, R::zero(), &mut ax);
        kernels::row_dots(z.as_mut_slice(), alpha, ax.as_slice(), y.as_slice(), dim.cols);
        self.scratch().recycle_matrix(ax);
        Ok(())
    }

    /// `Z = alpha * op(Y) op(A) op(X)`.
    #[allow(clippy::too_many_arguments)]
    fn mmm_product(
        &mut self,
        z: &mut Matrix<R>,
        alpha: R,
        y: &Matrix<R>,
        op_y: MatrixOp,
        a: &Matrix<R>,
        op_a: MatrixOp,
        x: &Matrix<R>,
        op_x: MatrixOp,
    ) -> Result<(), LinalgError> {
        const OP: &str = "mmm_product";
        require_matrix(OP, y)?;
        require_matrix(OP, a)?;
        require_matrix(OP, x)?;
        let ax_dim = shape::product_shape(OP, a.dim(), op_a, x.dim(), op_x)?;
        let dim = shape::product_shape(OP, y.dim(), op_y, ax_dim, MatrixOp::None)?;
        allocate_matrix_if_null(z, dim);
        assert_valid_matrix(OP, z, dim)?;

        let mut ax = self.scratch().matrix(ax_dim);
        self.gemm(op_a, op_x, R::one(), a, x, R::zero(), &mut ax);
        self.gemm(op_y, MatrixOp::None, alpha, y, &ax, R::zero(), z);
        self.scratch().recycle_matrix(ax);
        Ok(())
    }

    /// Smallest element of `A`.
    fn min(&mut self, a: &Matrix<R>) -> Result<R, LinalgError> {
        require_matrix("min", a)?;
        let (first, rest) = a
            .as_slice()
            .split_first()
            .ok_or(LinalgError::EmptyOperand { op: "min" })?;
        Ok(rest.iter().fold(*first, |acc, &v| if v < acc { v } else { acc }))
    }

    fn transpose(&mut self, at: &mut Matrix<R>, a: &Matrix<R>) -> Result<(), LinalgError> {
        require_matrix("transpose", a)?;
        let dim = a.dim().transposed();
        allocate_matrix_if_null(at, dim);
        assert_valid_matrix("transpose", at, dim)?;
        kernels::transpose(at.as_mut_slice(), a.as_slice(), a.rows(), a.cols());
        Ok(())
    }
}

