use crate::core::real::Real;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Shape of a dense matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dim {
    pub rows: usize,
    pub cols: usize,
}

impl Dim {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub const fn transposed(self) -> Self {
        Self {
            rows: self.cols,
            cols: self.rows,
        }
    }

    pub const fn len(self) -> usize {
        self.rows * self.cols
    }

    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Dense row-major matrix.
///
/// Element `(r, c)` lives at `data[r * cols + c]`. A matrix that owns no storage is
/// *null* (see [`Matrix::null`]); linear-algebra operations allocate null outputs on
/// demand and shape-check non-null ones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix<R> {
    rows: usize,
    cols: usize,
    data: Vec<R>,
    allocated: bool,
}

impl<R: Real> Matrix<R> {
    /// A matrix with no storage, to be allocated by the first operation writing into it.
    pub fn null() -> Self {
        Self {
            rows: 0,
            cols: 0,
            data: Vec::new(),
            allocated: false,
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, R::zero())
    }

    pub fn filled(rows: usize, cols: usize, value: R) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
            allocated: true,
        }
    }

    /// Wraps row-major data. Returns `None` when `data.len() != rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<R>) -> Option<Self> {
        if data.len() != rows * cols {
            return None;
        }
        Some(Self {
            rows,
            cols,
            data,
            allocated: true,
        })
    }

    /// Builds a matrix from nested rows; `None` if the rows are ragged.
    pub fn from_rows(rows: &[Vec<R>]) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return None;
        }
        let data = rows.iter().flatten().copied().collect();
        Self::from_row_major(rows.len(), cols, data)
    }

    pub(crate) fn from_storage(dim: Dim, data: Vec<R>) -> Self {
        debug_assert_eq!(data.len(), dim.len());
        Self {
            rows: dim.rows,
            cols: dim.cols,
            data,
            allocated: true,
        }
    }

    pub(crate) fn into_storage(self) -> Vec<R> {
        self.data
    }

    pub fn is_null(&self) -> bool {
        !self.allocated
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dim(&self) -> Dim {
        Dim::new(self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[R] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [R] {
        &mut self.data
    }

    pub fn row(&self, r: usize) -> &[R] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [R] {
        let cols = self.cols;
        &mut self.data[r * cols..(r + 1) * cols]
    }

    /// Reshapes to `dim`, zero-filled. Existing contents are discarded.
    pub fn resize(&mut self, dim: Dim) {
        self.rows = dim.rows;
        self.cols = dim.cols;
        self.data.clear();
        self.data.resize(dim.len(), R::zero());
        self.allocated = true;
    }

    pub fn fill(&mut self, value: R) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    pub fn to_rows(&self) -> Vec<Vec<R>> {
        (0..self.rows).map(|r| self.row(r).to_vec()).collect()
    }
}

impl<R: Real> Index<(usize, usize)> for Matrix<R> {
    type Output = R;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &R {
        &self.data[r * self.cols + c]
    }
}

impl<R: Real> IndexMut<(usize, usize)> for Matrix<R> {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut R {
        &mut self.data[r * self.cols + c]
    }
}

/// Dense vector with the same null/allocated semantics as [`Matrix`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vector<R> {
    data: Vec<R>,
    allocated: bool,
}

impl<R: Real> Vector<R> {
    pub fn null() -> Self {
        Self {
            data: Vec::new(),
            allocated: false,
        }
    }

    pub fn zeros(len: usize) -> Self {
        Self::from_vec(vec![R::zero(); len])
    }

    pub fn from_vec(data: Vec<R>) -> Self {
        Self {
            data,
            allocated: true,
        }
    }

    pub fn from_slice(data: &[R]) -> Self {
        Self::from_vec(data.to_vec())
    }

    pub(crate) fn into_storage(self) -> Vec<R> {
        self.data
    }

    pub fn is_null(&self) -> bool {
        !self.allocated
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[R] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [R] {
        &mut self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.data.iter()
    }

    pub fn resize(&mut self, len: usize) {
        self.data.clear();
        self.data.resize(len, R::zero());
        self.allocated = true;
    }

    pub fn to_vec(&self) -> Vec<R> {
        self.data.clone()
    }
}

impl<R: Real> Index<usize> for Vector<R> {
    type Output = R;

    #[inline]
    fn index(&self, i: usize) -> &R {
        &self.data[i]
    }
}

impl<R: Real> IndexMut<usize> for Vector<R> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut R {
        &mut self.data[i]
    }
}

impl<R: Real> From<Vec<R>> for Vector<R> {
    fn from(data: Vec<R>) -> Self {
        Self::from_vec(data)
    }
}
