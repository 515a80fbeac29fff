//! # Engine Module
//!
//! The stateful layer of the solver: the simulated quantum annealer and everything it
//! owns while a problem is being solved.
//!
//! ## Overview
//!
//! [`annealer::BipartiteGraphAnnealer`] holds the Ising coefficients of one bipartite
//! problem, `m` Trotter replicas of both spin partitions, its random source and its
//! linear-algebra engine. Callers drive it through a small lifecycle
//! (`set_problem`, optional configuration, `init_anneal`, repeated `anneal_one_step`,
//! `fin_anneal`) and read bit snapshots and energies back.
//!
//! ## Architecture
//!
//! - **Annealer** ([`annealer`]) - Lifecycle, Monte Carlo update and energy evaluation
//! - **Replica State** ([`state`]) - Spin matrices, energy staleness and the per-slot
//!   initialization flags consumed by `init_anneal`
//! - **Results** ([`result`]) - Bit and spin snapshots rebuilt on every sync
//! - **Configuration** ([`config`]) - Backend choice, seed and replica count, TOML loading
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-level errors wrapping linear-algebra and
//!   configuration failures
//!
//! Every mutating operation validates its inputs before writing, so a failed call leaves
//! the annealer as it was.

pub mod annealer;
pub mod config;
pub mod error;
pub mod progress;
pub mod result;
pub mod state;
