//! Slice kernels over row-major host memory. Shapes are checked by the callers.

use crate::core::real::Real;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// `y = alpha * x + beta * y`.
pub fn axpby<R: Real>(y: &mut [R], alpha: R, x: &[R], beta: R) {
    if beta == R::zero() {
        y.iter_mut().zip(x).for_each(|(yi, &xi)| *yi = alpha * xi);
    } else {
        y.iter_mut()
            .zip(x)
            .for_each(|(yi, &xi)| *yi = alpha * xi + beta * *yi);
    }
}

pub fn scale_in_place<R: Real>(y: &mut [R], alpha: R) {
    y.iter_mut().for_each(|v| *v *= alpha);
}

/// `y[i] = value + beta * y[i]`.
pub fn broadcast<R: Real>(y: &mut [R], value: R, beta: R) {
    if beta == R::zero() {
        y.iter_mut().for_each(|v| *v = value);
    } else {
        y.iter_mut().for_each(|v| *v = value + beta * *v);
    }
}

pub fn sum<R: Real>(x: &[R]) -> R {
    x.iter().fold(R::zero(), |acc, &v| acc + v)
}

pub fn dot<R: Real>(x: &[R], y: &[R]) -> R {
    x.iter().zip(y).fold(R::zero(), |acc, (&a, &b)| acc + a * b)
}

/// `out[r] = alpha * Σ_c a[r, c]` for a `out.len() x cols` matrix.
pub fn row_sums<R: Real>(out: &mut [R], alpha: R, a: &[R], cols: usize) {
    if cols == 0 {
        out.iter_mut().for_each(|v| *v = R::zero());
        return;
    }

    #[cfg(not(feature = "parallel"))]
    let iterator = out.iter_mut().zip(a.chunks(cols));

    #[cfg(feature = "parallel")]
    let iterator = out.par_iter_mut().zip(a.par_chunks(cols));

    iterator.for_each(|(o, row)| *o = alpha * sum(row));
}

/// `out[r] = alpha * a[r, :] · b[r, :]` for two `out.len() x cols` matrices.
pub fn row_dots<R: Real>(out: &mut [R], alpha: R, a: &[R], b: &[R], cols: usize) {
    if cols == 0 {
        out.iter_mut().for_each(|v| *v = R::zero());
        return;
    }

    #[cfg(not(feature = "parallel"))]
    let iterator = out.iter_mut().zip(a.chunks(cols).zip(b.chunks(cols)));

    #[cfg(feature = "parallel")]
    let iterator = out
        .par_iter_mut()
        .zip(a.par_chunks(cols).zip(b.par_chunks(cols)));

    iterator.for_each(|(o, (ra, rb))| *o = alpha * dot(ra, rb));
}

/// Writes the transpose of the `rows x cols` matrix `src` into `dst` (`cols x rows`).
pub fn transpose<R: Real>(dst: &mut [R], src: &[R], rows: usize, cols: usize) {
    for r in 0..rows {
        for c in 0..cols {
            dst[c * rows + r] = src[r * cols + c];
        }
    }
}

/// Row-major `y = alpha * A x + beta * y` (or `Aᵗ x` when `transpose`), `A` is `rows x cols`.
#[allow(clippy::too_many_arguments)]
pub fn gemv_row_major<R: Real>(
    transpose: bool,
    rows: usize,
    cols: usize,
    alpha: R,
    a: &[R],
    x: &[R],
    beta: R,
    y: &mut [R],
) {
    if !transpose {
        if cols == 0 {
            scale_or_clear(y, beta);
            return;
        }

        #[cfg(not(feature = "parallel"))]
        let iterator = y.iter_mut().zip(a.chunks(cols));

        #[cfg(feature = "parallel")]
        let iterator = y.par_iter_mut().zip(a.par_chunks(cols));

        iterator.for_each(|(yi, row)| {
            let acc = alpha * dot(row, x);
            *yi = if beta == R::zero() { acc } else { acc + beta * *yi };
        });
    } else {
        scale_or_clear(y, beta);
        for r in 0..rows {
            let coef = alpha * x[r];
            let row = &a[r * cols..(r + 1) * cols];
            y.iter_mut().zip(row).for_each(|(yi, &v)| *yi += coef * v);
        }
    }
}

/// Row-major `C = alpha * op(A) op(B) + beta * C` with `C` of shape `m x n` and inner size `k`.
/// `a_cols` / `b_cols` are the stored column counts of `A` and `B`.
#[allow(clippy::too_many_arguments)]
pub fn gemm_row_major<R: Real>(
    transpose_a: bool,
    transpose_b: bool,
    m: usize,
    n: usize,
    k: usize,
    alpha: R,
    a: &[R],
    a_cols: usize,
    b: &[R],
    b_cols: usize,
    beta: R,
    c: &mut [R],
) {
    debug_assert_eq!(c.len(), m * n);
    if n == 0 {
        return;
    }
    let a_at = |i: usize, p: usize| {
        if transpose_a {
            a[p * a_cols + i]
        } else {
            a[i * a_cols + p]
        }
    };
    let b_at = |p: usize, j: usize| {
        if transpose_b {
            b[j * b_cols + p]
        } else {
            b[p * b_cols + j]
        }
    };

    let compute_row = |(i, row): (usize, &mut [R])| {
        scale_or_clear(row, beta);
        for p in 0..k {
            let aip = alpha * a_at(i, p);
            if aip == R::zero() {
                continue;
            }
            row.iter_mut()
                .enumerate()
                .for_each(|(j, cij)| *cij += aip * b_at(p, j));
        }
    };

    #[cfg(not(feature = "parallel"))]
    c.chunks_mut(n).enumerate().for_each(compute_row);

    #[cfg(feature = "parallel")]
    c.par_chunks_mut(n).enumerate().for_each(compute_row);
}

fn scale_or_clear<R: Real>(y: &mut [R], beta: R) {
    if beta == R::zero() {
        y.iter_mut().for_each(|v| *v = R::zero());
    } else if beta != R::one() {
        scale_in_place(y, beta);
    }
}
