use crate::core::models::matrix::Dim;
use std::fmt;
use thiserror::Error;

/// Shape of an operand as reported in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Matrix(Dim),
    Vector(usize),
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Matrix(dim) => write!(f, "matrix {}", dim),
            Shape::Vector(len) => write!(f, "vector of length {}", len),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinalgError {
    #[error("{op}: shape mismatch (expected {expected}, found {found})")]
    ShapeMismatch {
        op: &'static str,
        expected: Shape,
        found: Shape,
    },

    #[error("{op}: operand has no storage")]
    NullOperand { op: &'static str },

    #[error("{op}: operand is empty")]
    EmptyOperand { op: &'static str },
}
