//! QUBO to Ising conversion for bipartite problems.
//!
//! A bipartite QUBO over `x0 ∈ {0,1}^N0`, `x1 ∈ {0,1}^N1` with energy
//! `b0·x0 + b1·x1 + x1ᵗ W x0` (`W` is `N1 x N0`) is rewritten through `x = (q + 1) / 2`
//! into the Ising form `h0·q0 + h1·q1 + q1ᵗ J q0 + c` over spins `q ∈ {-1, +1}`.

use super::linalg::error::LinalgError;
use super::linalg::{BatchOp, LinearAlgebra, MatrixOp};
use super::models::matrix::{Matrix, Vector};
use super::real::Real;
use std::cmp::Ordering;

/// Whether the solver looks for the lowest or the highest energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OptimizeDirection {
    #[default]
    Minimize,
    Maximize,
}

impl OptimizeDirection {
    /// Maps an energy between the caller's direction and the internal minimizing form.
    #[inline]
    pub fn sign<R: Real>(self, value: R) -> R {
        match self {
            OptimizeDirection::Minimize => value,
            OptimizeDirection::Maximize => -value,
        }
    }

    /// Index of the best energy; `None` for an empty slice.
    pub fn best<R: Real>(self, energies: &[R]) -> Option<usize> {
        let order = self.sort(energies);
        order.first().copied()
    }

    /// Indices ordered from best to worst. Ties keep their original order.
    pub fn sort<R: Real>(self, energies: &[R]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..energies.len()).collect();
        order.sort_by(|&a, &b| {
            let ord = energies[a]
                .partial_cmp(&energies[b])
                .unwrap_or(Ordering::Equal);
            match self {
                OptimizeDirection::Minimize => ord,
                OptimizeDirection::Maximize => ord.reverse(),
            }
        });
        order
    }
}

/// Ising coefficients of a bipartite problem, stored in minimizing form.
///
/// When the problem is maximized, `h0`, `h1`, `j` and `c` hold the negated
/// coefficients so that the annealer always minimizes.
#[derive(Debug, Clone, PartialEq)]
pub struct IsingParameters<R> {
    pub h0: Vector<R>,
    pub h1: Vector<R>,
    /// Couplings, `N1 x N0`.
    pub j: Matrix<R>,
    pub c: R,
    pub direction: OptimizeDirection,
}

impl<R: Real> IsingParameters<R> {
    pub fn n0(&self) -> usize {
        self.h0.len()
    }

    pub fn n1(&self) -> usize {
        self.h1.len()
    }
}

/// Computes `(h0, h1, J, c)` from `(b0, b1, W)`:
///
/// - `h0[i] = b0[i] / 2 + Σ_j W[j, i] / 4`
/// - `h1[j] = b1[j] / 2 + Σ_i W[j, i] / 4`
/// - `J = W / 4`
/// - `c = (Σ b0 + Σ b1) / 2 + Σ W / 4`
///
/// all negated for [`OptimizeDirection::Maximize`]. `W` must be `len(b1) x len(b0)`.
pub fn calculate_hjc<R: Real>(
    la: &mut dyn LinearAlgebra<R>,
    b0: &Vector<R>,
    b1: &Vector<R>,
    w: &Matrix<R>,
    direction: OptimizeDirection,
) -> Result<IsingParameters<R>, LinalgError> {
    let half = R::from_constant(0.5);
    let quarter = R::from_constant(0.25);

    let mut h0 = Vector::null();
    la.scale_vector(&mut h0, half, b0, R::zero())?;
    let mut col_sums = la.scratch().vector(w.cols());
    let merged = la
        .sum_batched(&mut col_sums, quarter, w, BatchOp::Colwise)
        .and_then(|()| la.scale_vector(&mut h0, R::one(), &col_sums, R::one()));
    la.scratch().recycle_vector(col_sums);
    merged?;

    let mut h1 = Vector::null();
    la.scale_vector(&mut h1, half, b1, R::zero())?;
    let mut row_sums = la.scratch().vector(w.rows());
    let merged = la
        .sum_batched(&mut row_sums, quarter, w, BatchOp::Rowwise)
        .and_then(|()| la.scale_vector(&mut h1, R::one(), &row_sums, R::one()));
    la.scratch().recycle_vector(row_sums);
    merged?;

    let mut j = Matrix::null();
    la.scale_matrix(&mut j, quarter, w)?;

    let c = half * (la.sum_vector(R::one(), b0)? + la.sum_vector(R::one(), b1)?)
        + la.sum_matrix(quarter, w)?;

    let mut params = IsingParameters {
        h0,
        h1,
        j,
        c,
        direction,
    };
    if direction == OptimizeDirection::Maximize {
        let minus_one = -R::one();
        la.scale_vector_in_place(&mut params.h0, minus_one)?;
        la.scale_vector_in_place(&mut params.h1, minus_one)?;
        la.scale_matrix_in_place(&mut params.j, minus_one)?;
        params.c = -params.c;
    }
    Ok(params)
}

/// Ising energy of every replica, `E[k] = h0·q0[k] + h1·q1[k] + q1[k]ᵗ J q0[k] + c`,
/// reported in the caller's direction.
///
/// `q0` is `m x N0`, `q1` is `m x N1`; `energies` follows allocate-if-null with length `m`.
pub fn calculate_ising_energies<R: Real>(
    la: &mut dyn LinearAlgebra<R>,
    params: &IsingParameters<R>,
    q0: &Matrix<R>,
    q1: &Matrix<R>,
    energies: &mut Vector<R>,
) -> Result<(), LinalgError> {
    let m = q0.rows();
    la.mv_product(energies, R::one(), q0, MatrixOp::None, &params.h0)?;

    let mut term = la.scratch().vector(m);
    let result = accumulate_coupled_terms(la, params, q0, q1, energies, &mut term);
    la.scratch().recycle_vector(term);
    result?;

    la.scale_broadcast_vector(energies, R::one(), params.c, R::one())?;
    if params.direction == OptimizeDirection::Maximize {
        la.scale_vector_in_place(energies, -R::one())?;
    }
    Ok(())
}

fn accumulate_coupled_terms<R: Real>(
    la: &mut dyn LinearAlgebra<R>,
    params: &IsingParameters<R>,
    q0: &Matrix<R>,
    q1: &Matrix<R>,
    energies: &mut Vector<R>,
    term: &mut Vector<R>,
) -> Result<(), LinalgError> {
    la.mv_product(term, R::one(), q1, MatrixOp::None, &params.h1)?;
    la.scale_vector(energies, R::one(), term, R::one())?;
    la.batched_vmv_product(term, R::one(), q1, &params.j, q0)?;
    la.scale_vector(energies, R::one(), term, R::one())
}

/// QUBO energy `b0·x0 + b1·x1 + x1ᵗ W x0` of one bit assignment.
pub fn calculate_qubo_energy<R: Real>(
    la: &mut dyn LinearAlgebra<R>,
    b0: &Vector<R>,
    b1: &Vector<R>,
    w: &Matrix<R>,
    x0: &[i8],
    x1: &[i8],
) -> Result<R, LinalgError> {
    let x0 = bits_as_reals(x0);
    let x1 = bits_as_reals(x1);
    Ok(la.dot(R::one(), b0, &x0)? + la.dot(R::one(), b1, &x1)? + la.vmv_product(R::one(), &x1, w, &x0)?)
}

fn bits_as_reals<R: Real>(bits: &[i8]) -> Vector<R> {
    bits.iter()
        .map(|&b| if b != 0 { R::one() } else { R::zero() })
        .collect::<Vec<_>>()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::linalg::host::HostMath;
    use crate::core::models::bits::bits_to_spins;

    fn problem() -> (Vector<f64>, Vector<f64>, Matrix<f64>) {
        let b0 = Vector::from_vec(vec![1.0, -2.0]);
        let b1 = Vector::from_vec(vec![0.5, 3.0, -1.0]);
        let w = Matrix::from_rows(&[vec![1.0, -1.0], vec![2.0, 0.0], vec![-3.0, 4.0]]).unwrap();
        (b0, b1, w)
    }

    #[test]
    fn hjc_uses_half_and_quarter_coefficients() {
        let (b0, b1, w) = problem();
        let mut la = HostMath::<f64>::new();
        let p = calculate_hjc(&mut la, &b0, &b1, &w, OptimizeDirection::Minimize).unwrap();

        assert_eq!(p.h0.to_vec(), vec![0.5 + 0.0, -1.0 + 0.75]);
        assert_eq!(p.h1.to_vec(), vec![0.25 + 0.0, 1.5 + 0.5, -0.5 + 0.25]);
        assert_eq!(p.j[(2, 1)], 1.0);
        assert_eq!(p.c, 0.5 * (-1.0 + 2.5) + 0.75);
        assert_eq!((p.n0(), p.n1()), (2, 3));
    }

    #[test]
    fn maximize_negates_every_coefficient() {
        let (b0, b1, w) = problem();
        let mut la = HostMath::<f64>::new();
        let min = calculate_hjc(&mut la, &b0, &b1, &w, OptimizeDirection::Minimize).unwrap();
        let max = calculate_hjc(&mut la, &b0, &b1, &w, OptimizeDirection::Maximize).unwrap();

        assert!(min.h0.iter().zip(max.h0.iter()).all(|(a, b)| *a == -*b));
        assert!(min.h1.iter().zip(max.h1.iter()).all(|(a, b)| *a == -*b));
        assert!(min.j.as_slice().iter().zip(max.j.as_slice()).all(|(a, b)| *a == -*b));
        assert_eq!(min.c, -max.c);
    }

    #[test]
    fn coupling_with_wrong_shape_is_rejected() {
        let (b0, b1, _) = problem();
        let w = Matrix::zeros(2, 3);
        let mut la = HostMath::<f64>::new();
        let err = calculate_hjc(&mut la, &b0, &b1, &w, OptimizeDirection::Minimize).unwrap_err();
        assert!(matches!(err, LinalgError::ShapeMismatch { .. }));
        assert_eq!(la.scratch().outstanding(), 0);
    }

    #[test]
    fn ising_energy_equals_qubo_energy_for_every_assignment() {
        let (b0, b1, w) = problem();
        let mut la = HostMath::<f64>::new();
        for direction in [OptimizeDirection::Minimize, OptimizeDirection::Maximize] {
            let p = calculate_hjc(&mut la, &b0, &b1, &w, direction).unwrap();
            for code in 0..32u32 {
                let x0: Vec<i8> = (0..2).map(|i| ((code >> i) & 1) as i8).collect();
                let x1: Vec<i8> = (0..3).map(|i| ((code >> (i + 2)) & 1) as i8).collect();
                let q0 = Matrix::from_row_major(1, 2, bits_to_spins(&x0)).unwrap();
                let q1 = Matrix::from_row_major(1, 3, bits_to_spins(&x1)).unwrap();

                let mut e = Vector::null();
                calculate_ising_energies(&mut la, &p, &q0, &q1, &mut e).unwrap();
                let qubo = calculate_qubo_energy(&mut la, &b0, &b1, &w, &x0, &x1).unwrap();
                assert!((e[0] - qubo).abs() < 1e-12, "{:?} {:?}: {} vs {}", x0, x1, e[0], qubo);
            }
        }
    }

    #[test]
    fn direction_orders_energies() {
        let energies = [3.0, -1.0, 2.0, -1.0];
        assert_eq!(OptimizeDirection::Minimize.sort(&energies), vec![1, 3, 2, 0]);
        assert_eq!(OptimizeDirection::Maximize.sort(&energies), vec![0, 2, 1, 3]);
        assert_eq!(OptimizeDirection::Maximize.best(&energies), Some(0));
        assert_eq!(OptimizeDirection::Minimize.best::<f64>(&[]), None);
        assert_eq!(OptimizeDirection::Maximize.sign(2.5), -2.5);
    }
}
