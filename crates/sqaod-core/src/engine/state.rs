use crate::core::models::bits::{Bits, bits_to_spins};
use crate::core::models::matrix::{Matrix, Vector};
use crate::core::random::Random;
use crate::core::real::Real;

/// How a piece of annealer state came to be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitState {
    #[default]
    Unset,
    /// Supplied by the caller.
    Explicit,
    /// Filled in by `init_anneal`.
    Defaulted,
}

impl InitState {
    #[inline]
    pub fn is_set(self) -> bool {
        self != InitState::Unset
    }
}

/// Per-slot initialization state consumed by `init_anneal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifecycleFlags {
    pub seed: InitState,
    pub trotters: InitState,
    pub spins: InitState,
}

impl LifecycleFlags {
    /// Every slot has been configured, explicitly or by default.
    pub fn is_ready(&self) -> bool {
        self.seed.is_set() && self.trotters.is_set() && self.spins.is_set()
    }
}

/// Spins of all Trotter replicas plus their per-replica energies.
///
/// Row `k` of `q0` (`m x N0`) and `q1` (`m x N1`) is replica `k`. Every spin is `-1` or
/// `+1`; `e` only reflects the spins while `energies_valid` holds.
#[derive(Debug, Clone)]
pub struct TrotterReplicaState<R> {
    pub q0: Matrix<R>,
    pub q1: Matrix<R>,
    pub e: Vector<R>,
    energies_valid: bool,
}

impl<R: Real> TrotterReplicaState<R> {
    /// Replicas for `m` Trotter slices, every spin set to `-1`.
    pub fn new(n0: usize, n1: usize, m: usize) -> Self {
        Self {
            q0: Matrix::filled(m, n0, -R::one()),
            q1: Matrix::filled(m, n1, -R::one()),
            e: Vector::zeros(m),
            energies_valid: false,
        }
    }

    pub fn num_trotters(&self) -> usize {
        self.q0.rows()
    }

    pub fn energies_valid(&self) -> bool {
        self.energies_valid
    }

    pub fn mark_energies_valid(&mut self) {
        self.energies_valid = true;
    }

    pub fn invalidate_energies(&mut self) {
        self.energies_valid = false;
    }

    /// Writes the spin pattern `2x - 1` of each partition into every replica.
    pub fn broadcast_bits(&mut self, x0: &Bits, x1: &Bits) {
        fill_rows(&mut self.q0, &bits_to_spins(x0));
        fill_rows(&mut self.q1, &bits_to_spins(x1));
        self.invalidate_energies();
    }

    /// Draws every spin independently, `q0` first, then `q1`, in row-major order.
    pub fn randomize(&mut self, random: &mut Random) {
        for q in [&mut self.q0, &mut self.q1] {
            q.as_mut_slice().iter_mut().for_each(|s| {
                *s = if random.rand_int(2) != 0 {
                    R::one()
                } else {
                    -R::one()
                };
            });
        }
        self.invalidate_energies();
    }
}

fn fill_rows<R: Real>(q: &mut Matrix<R>, pattern: &[R]) {
    for r in 0..q.rows() {
        q.row_mut(r).copy_from_slice(pattern);
    }
}
