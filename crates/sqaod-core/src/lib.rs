//! # sqaod
//!
//! Simulated quantum annealing for bipartite QUBO problems.
//!
//! A bipartite QUBO assigns binary variables `x0 ∈ {0,1}^N0`, `x1 ∈ {0,1}^N1` the energy
//! `b0·x0 + b1·x1 + x1ᵗ W x0`. The solver rewrites it in Ising form, splits the
//! transverse-field system into `m` coupled Trotter replicas and runs single-spin-flip
//! Metropolis sweeps while the caller lowers the transverse field `G`.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Scalars, dense containers, random numbers, the
//!   backend-abstracted linear-algebra engine and the QUBO to Ising formulation.
//!
//! - **[`engine`]: The Logic Core.** The stateful [`engine::annealer::BipartiteGraphAnnealer`]
//!   with its replica state, lifecycle flags, result snapshots and configuration.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built on the engine, such as
//!   running a geometric annealing schedule end to end with progress reporting.

pub mod core;
pub mod engine;
pub mod workflows;
