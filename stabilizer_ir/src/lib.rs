//! Intermediate representation and symbolic-analysis core for stabilizer
//! circuits: a gate catalog, a circuit data model, a validator, a
//! reverse-time Pauli frame tracker, gate decomposers, classical-feedback
//! inlining, base-alphabet simplification, and QASM/Quirk exporters.
//!
//! This crate performs no numeric simulation, samples no measurements, and
//! computes no detector error models — it exposes the structural circuit
//! those passes operate on.

pub mod circuit;
pub mod decompose;
pub mod dem_target;
pub mod error;
pub mod export;
pub mod feedback;
pub mod gate_data;
pub mod gate_flags;
pub mod gate_target;
pub mod gate_type;
pub mod simplify;
pub mod sparse_xor_vec;
pub mod stats;
pub mod surft;
pub mod validate;

pub use circuit::{Circuit, CircuitInstruction, GateInstruction, Operation};
pub use dem_target::DemTarget;
pub use error::{Error, Result};
pub use feedback::{circuit_with_identical_adjacent_loops_fused, circuit_with_inlined_feedback};
pub use gate_data::{Gate, GATE_DATA};
pub use gate_flags::GateFlags;
pub use gate_target::GateTarget;
pub use gate_type::GateType;
pub use simplify::simplify_to_h_s_cx_m_r;
pub use sparse_xor_vec::SparseXorVec;
pub use stats::CircuitStats;
pub use surft::SurfTracker;
