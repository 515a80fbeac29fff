use crate::core::real::Real;

/// One value per variable: `0`/`1` for bit snapshots, `-1`/`+1` for spin snapshots.
pub type Bits = Vec<i8>;

/// Values of both partitions for a single replica.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitsPair {
    pub x0: Bits,
    pub x1: Bits,
}

impl BitsPair {
    pub fn new(x0: Bits, x1: Bits) -> Self {
        Self { x0, x1 }
    }
}

/// One [`BitsPair`] per Trotter replica, in replica order.
pub type BitsPairArray = Vec<BitsPair>;

#[inline]
pub fn is_bit_vector(bits: &[i8]) -> bool {
    bits.iter().all(|&b| b == 0 || b == 1)
}

/// Maps bits to spins with `q = 2x - 1`.
pub fn bits_to_spins<R: Real>(bits: &[i8]) -> Vec<R> {
    bits.iter()
        .map(|&b| if b != 0 { R::one() } else { -R::one() })
        .collect()
}

/// Maps spins to bits with `x = (q + 1) / 2`.
pub fn spins_to_bits<R: Real>(spins: &[R]) -> Bits {
    spins
        .iter()
        .map(|&q| if q > R::zero() { 1 } else { 0 })
        .collect()
}

pub fn spins_to_signs<R: Real>(spins: &[R]) -> Bits {
    spins
        .iter()
        .map(|&q| if q > R::zero() { 1 } else { -1 })
        .collect()
}
