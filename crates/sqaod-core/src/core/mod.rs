//! # Core Module
//!
//! Stateless building blocks of the solver.
//!
//! ## Overview
//!
//! The core module holds the numeric foundation shared by every annealer: the scalar
//! abstraction over `f32`/`f64`, dense row-major containers and bit vectors, the seeded
//! random source, the backend-abstracted linear-algebra engine and the QUBO to Ising
//! formulation built on top of it.
//!
//! ## Architecture
//!
//! - **Precision** ([`real`]) - The [`real::Real`] trait the whole crate is generic over
//! - **Containers** ([`models`]) - Matrices, vectors and bit snapshots
//! - **Randomness** ([`random`]) - Seedable integer and uniform real draws
//! - **Linear Algebra** ([`linalg`]) - Shape-checked dense operations on host and
//!   column-major backends with scratch-buffer pooling
//! - **Formulation** ([`formulation`]) - Ising coefficients and energies of bipartite
//!   QUBO problems

pub mod formulation;
pub mod linalg;
pub mod models;
pub mod random;
pub mod real;
