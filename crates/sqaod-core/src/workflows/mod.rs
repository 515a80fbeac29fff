//! # Workflows Module
//!
//! High-level procedures that drive an annealer from start to finish.
//!
//! - **Annealing Schedule** ([`anneal`]) - Runs a caller-supplied geometric schedule
//!   `G ← G · tau` from `g_initial` down to `g_final` at fixed `kT`, reports progress and
//!   picks the best replica.

pub mod anneal;
