#![allow(non_snake_case)]

//! Randomized benchmarking circuit generation for Clifford gate sets.
//!
//! Circuits are sampled layer by layer under a device's connectivity
//! constraints and assembled into Clifford, direct, mirror, and germ-power
//! benchmarks. Every assembled circuit is checked against the binary
//! symplectic representation of its gates, which also gives its ideal
//! computational-basis outcome without simulating the full quantum state.
//!
//! Module overview:
//! - [`symplectic`], [`stabilizer`]: GF(2) algebra of Clifford
//!   representations and stabilizer-state evolution
//! - [`gate`], [`circuit`], [`device`]: gate labels and the standard gate
//!   library, layered circuits, and device descriptions
//! - [`compiler`]: compilation of Clifford representations into native gates
//! - [`sampler`]: random layer samplers
//! - [`rb`], [`germ`]: benchmark circuit builders
//! - [`experiment`]: experiment designs over depths, repetitions, and qubit
//!   subsets
//!
//! All randomness comes from a caller-supplied [`rand::Rng`], so designs are
//! reproducible from a seed and independent streams can be used in parallel.

pub mod error;
pub mod symplectic;
pub mod stabilizer;
pub mod gate;
pub mod circuit;
pub mod device;
pub mod compiler;
pub mod sampler;
pub mod rb;
pub mod germ;
pub mod experiment;

pub use error::{ RbError, RbResult };
