//! Shape arithmetic and the precondition checks every engine operation runs before it
//! touches memory.

use super::MatrixOp;
use super::error::{LinalgError, Shape};
use crate::core::models::matrix::{Dim, Matrix, Vector};
use crate::core::real::Real;

#[inline]
pub fn matrix_shape(dim: Dim, op: MatrixOp) -> Dim {
    match op {
        MatrixOp::None => dim,
        MatrixOp::Transpose => dim.transposed(),
    }
}

/// Shape of `op_a(A) * op_b(B)`.
pub fn product_shape(
    op: &'static str,
    a: Dim,
    op_a: MatrixOp,
    b: Dim,
    op_b: MatrixOp,
) -> Result<Dim, LinalgError> {
    let a = matrix_shape(a, op_a);
    let b = matrix_shape(b, op_b);
    if a.cols != b.rows {
        return Err(LinalgError::ShapeMismatch {
            op,
            expected: Shape::Matrix(Dim::new(a.cols, b.cols)),
            found: Shape::Matrix(b),
        });
    }
    Ok(Dim::new(a.rows, b.cols))
}

/// Length of `op_a(A) * x`.
pub fn mv_shape(
    op: &'static str,
    a: Dim,
    op_a: MatrixOp,
    x_len: usize,
) -> Result<usize, LinalgError> {
    let a = matrix_shape(a, op_a);
    if a.cols != x_len {
        return Err(LinalgError::ShapeMismatch {
            op,
            expected: Shape::Vector(a.cols),
            found: Shape::Vector(x_len),
        });
    }
    Ok(a.rows)
}

/// Length of `xᵗ * op_a(A)`.
pub fn vm_shape(
    op: &'static str,
    x_len: usize,
    a: Dim,
    op_a: MatrixOp,
) -> Result<usize, LinalgError> {
    let a = matrix_shape(a, op_a);
    if a.rows != x_len {
        return Err(LinalgError::ShapeMismatch {
            op,
            expected: Shape::Vector(a.rows),
            found: Shape::Vector(x_len),
        });
    }
    Ok(a.cols)
}

pub fn require_matrix<R: Real>(op: &'static str, m: &Matrix<R>) -> Result<(), LinalgError> {
    if m.is_null() {
        return Err(LinalgError::NullOperand { op });
    }
    Ok(())
}

pub fn require_vector<R: Real>(op: &'static str, v: &Vector<R>) -> Result<(), LinalgError> {
    if v.is_null() {
        return Err(LinalgError::NullOperand { op });
    }
    Ok(())
}

pub fn assert_valid_matrix<R: Real>(
    op: &'static str,
    m: &Matrix<R>,
    dim: Dim,
) -> Result<(), LinalgError> {
    require_matrix(op, m)?;
    if m.dim() != dim {
        return Err(LinalgError::ShapeMismatch {
            op,
            expected: Shape::Matrix(dim),
            found: Shape::Matrix(m.dim()),
        });
    }
    Ok(())
}

pub fn assert_valid_vector<R: Real>(
    op: &'static str,
    v: &Vector<R>,
    len: usize,
) -> Result<(), LinalgError> {
    require_vector(op, v)?;
    if v.len() != len {
        return Err(LinalgError::ShapeMismatch {
            op,
            expected: Shape::Vector(len),
            found: Shape::Vector(v.len()),
        });
    }
    Ok(())
}

pub fn assert_same_shape<R: Real>(
    op: &'static str,
    a: &Matrix<R>,
    b: &Matrix<R>,
) -> Result<(), LinalgError> {
    require_matrix(op, a)?;
    assert_valid_matrix(op, b, a.dim())
}

/// Gives a null output the requested shape; a non-null output is left as is and shape
/// checked by the caller.
pub fn allocate_matrix_if_null<R: Real>(m: &mut Matrix<R>, dim: Dim) {
    if m.is_null() {
        m.resize(dim);
    }
}

pub fn allocate_vector_if_null<R: Real>(v: &mut Vector<R>, len: usize) {
    if v.is_null() {
        v.resize(len);
    }
}
