use crate::core::models::bits::{BitsPair, BitsPairArray, spins_to_bits, spins_to_signs};
use crate::core::models::matrix::Matrix;
use crate::core::real::Real;

/// Per-replica snapshots of the spins, rebuilt wholesale on every sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultView {
    x: BitsPairArray,
    q: BitsPairArray,
}

impl ResultView {
    /// Rebuilds both snapshots from the replica spin matrices (`m x N0` and `m x N1`).
    pub fn rebuild<R: Real>(&mut self, q0: &Matrix<R>, q1: &Matrix<R>) {
        self.x.clear();
        self.q.clear();
        for k in 0..q0.rows() {
            let (s0, s1) = (q0.row(k), q1.row(k));
            self.q.push(BitsPair::new(spins_to_signs(s0), spins_to_signs(s1)));
            self.x.push(BitsPair::new(spins_to_bits(s0), spins_to_bits(s1)));
        }
    }

    pub fn clear(&mut self) {
        self.x.clear();
        self.q.clear();
    }

    /// Bit assignments `x = (q + 1) / 2`, one pair per replica.
    pub fn x(&self) -> &BitsPairArray {
        &self.x
    }

    /// Spin assignments (`-1`/`+1`), one pair per replica.
    pub fn q(&self) -> &BitsPairArray {
        &self.q
    }
}
