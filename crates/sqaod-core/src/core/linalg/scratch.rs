use crate::core::models::matrix::{Dim, Matrix, Vector};
use crate::core::real::Real;

const MAX_POOLED_BUFFERS: usize = 8;

/// Pool of transient buffers for intermediate results inside one engine operation.
///
/// Buffers are handed out by value, exactly sized and zero-filled, so a scratch buffer is
/// owned by the operation that requested it and can never alias an operand. The operation
/// hands it back before returning; only the backing allocation is kept for reuse.
#[derive(Debug)]
pub struct ScratchPool<R> {
    free: Vec<Vec<R>>,
    outstanding: usize,
}

impl<R> Default for ScratchPool<R> {
    fn default() -> Self {
        Self {
            free: Vec::new(),
            outstanding: 0,
        }
    }
}

impl<R: Real> ScratchPool<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matrix(&mut self, dim: Dim) -> Matrix<R> {
        Matrix::from_storage(dim, self.take(dim.len()))
    }

    pub fn vector(&mut self, len: usize) -> Vector<R> {
        Vector::from_vec(self.take(len))
    }

    pub fn recycle_matrix(&mut self, m: Matrix<R>) {
        self.give_back(m.into_storage());
    }

    pub fn recycle_vector(&mut self, v: Vector<R>) {
        self.give_back(v.into_storage());
    }

    /// Buffers currently handed out and not yet returned.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Allocations parked in the pool.
    pub fn pooled(&self) -> usize {
        self.free.len()
    }

    fn take(&mut self, len: usize) -> Vec<R> {
        self.outstanding += 1;
        // Smallest parked allocation that fits, else a fresh one.
        let best = self
            .free
            .iter()
            .enumerate()
            .filter(|(_, buf)| buf.capacity() >= len)
            .min_by_key(|(_, buf)| buf.capacity())
            .map(|(idx, _)| idx);
        let mut buf = match best {
            Some(idx) => self.free.swap_remove(idx),
            None => Vec::with_capacity(len),
        };
        buf.clear();
        buf.resize(len, R::zero());
        buf
    }

    fn give_back(&mut self, buf: Vec<R>) {
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.free.len() < MAX_POOLED_BUFFERS {
            self.free.push(buf);
        }
    }
}
