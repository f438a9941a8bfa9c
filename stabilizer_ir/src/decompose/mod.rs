//! Gate decomposers (spec §4.4): rewriting one high-level instruction into
//! a short sequence of simpler ones.

pub mod mpp;
pub mod pair_segment;
pub mod spp;

pub use mpp::{decompose_mpp_operation, MppBatch};
pub use pair_segment::decompose_pair_instruction_into_segments_with_single_use_controls;
pub use spp::decompose_spp_operation;
