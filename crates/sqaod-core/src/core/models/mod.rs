//! # Core Models Module
//!
//! Dense containers shared by the linear-algebra engines and the annealer.
//!
//! - [`matrix`] - Row-major [`Matrix`](matrix::Matrix), [`Vector`](matrix::Vector) and
//!   their [`Dim`](matrix::Dim), with the null/allocated distinction used by
//!   allocate-if-null outputs
//! - [`bits`] - Bit and spin snapshots per replica ([`BitsPair`](bits::BitsPair))

pub mod bits;
pub mod matrix;
