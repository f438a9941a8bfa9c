//! Decomposes `MPP` (multi-Pauli-product measurement) into `H`, `H_YZ`,
//! `CX`, and `M` (spec §4.4).
//!
//! Grounded on `original_source/src/stim/circuit/gate_decomposition.cc`
//! (`decompose_mpp_operation`): rotate every non-Z Pauli term into the Z
//! basis, CNOT the parity of each group onto that group's first qubit,
//! measure the representatives, and flush into a fresh batch whenever the
//! next group would reuse a qubit already conjugated by this batch.

use rustc_hash::FxHashSet;

use crate::circuit::{CircuitInstruction, GateInstruction};
use crate::error::{Error, Result};
use crate::gate_target::GateTarget;
use crate::gate_type::GateType;
use crate::validate::for_combined_target_groups;

/// One flushed batch: `H` on X-basis qubits, `H_YZ` on Y-basis qubits, `CX`
/// cascading parity onto each group's representative, then `M` measuring
/// the representatives (carrying the original instruction's noise args).
pub struct MppBatch {
    pub h: GateInstruction,
    pub h_yz: GateInstruction,
    pub cx: GateInstruction,
    pub m: GateInstruction,
}

struct Batch {
    used: FxHashSet<u32>,
    h_xz: Vec<GateTarget>,
    h_yz: Vec<GateTarget>,
    cnot: Vec<GateTarget>,
    meas: Vec<GateTarget>,
}

impl Batch {
    fn new() -> Self {
        Batch {
            used: FxHashSet::default(),
            h_xz: Vec::new(),
            h_yz: Vec::new(),
            cnot: Vec::new(),
            meas: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.meas.is_empty()
    }

    fn into_batch(self, args: &[f64]) -> MppBatch {
        MppBatch {
            h: GateInstruction::new(GateType::H, vec![], self.h_xz),
            h_yz: GateInstruction::new(GateType::HYz, vec![], self.h_yz),
            cx: GateInstruction::new(GateType::Cx, vec![], self.cnot),
            m: GateInstruction::new(GateType::M, args.to_vec(), self.meas),
        }
    }
}

/// Decomposes one `MPP` instruction, invoking `callback` once per flushed
/// batch (spec §4.4). Returns an error if the instruction is not `MPP`, or
/// if a single Pauli product repeats a qubit.
pub fn decompose_mpp_operation(
    instruction: CircuitInstruction<'_>,
    mut callback: impl FnMut(MppBatch) -> Result<()>,
) -> Result<()> {
    debug_assert_eq!(instruction.gate_type, GateType::Mpp);
    let mut batch = Batch::new();

    for_combined_target_groups(instruction, |group| {
        let mut inner_used = FxHashSet::default();
        for target in group {
            if target.is_combiner() {
                continue;
            }
            let qubit = target.qubit_value();
            if !inner_used.insert(qubit) {
                return Err(Error::PauliProductRepeatedQubit(instruction.to_string()));
            }
        }

        if inner_used.iter().any(|q| batch.used.contains(q)) {
            if !batch.is_empty() {
                let flushed = std::mem::replace(&mut batch, Batch::new());
                callback(flushed.into_batch(instruction.args))?;
            }
        }
        batch.used.extend(inner_used);

        let mut representative: Option<u32> = None;
        for target in group {
            if target.is_combiner() {
                continue;
            }
            let qubit = target.qubit_value();
            if target.is_x() {
                batch.h_xz.push(GateTarget::qubit(qubit));
            } else if target.is_y() {
                batch.h_yz.push(GateTarget::qubit(qubit));
            }
            match representative {
                None => {
                    representative = Some(qubit);
                    let mut rec_target = GateTarget::qubit(qubit);
                    if target.is_inverted() {
                        rec_target = rec_target.inverted();
                    }
                    batch.meas.push(rec_target);
                }
                Some(rep) => {
                    batch.cnot.push(GateTarget::qubit(qubit));
                    batch.cnot.push(GateTarget::qubit(rep));
                    if target.is_inverted() {
                        let last = batch.meas.last_mut().expect("representative was just pushed");
                        *last = last.inverted();
                    }
                }
            }
        }
        Ok(())
    })?;

    if !batch.is_empty() {
        callback(batch.into_batch(instruction.args))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;

    #[test]
    fn single_group_xyz_product() {
        let instruction = GateInstruction::new(
            GateType::Mpp,
            vec![],
            vec![GateTarget::x(0), GateTarget::combiner(), GateTarget::y(1), GateTarget::combiner(), GateTarget::z(2)],
        );
        let mut circuit = Circuit::new();
        decompose_mpp_operation(instruction.as_view(), |batch| {
            circuit.safe_append(batch.h)?;
            circuit.safe_append(batch.h_yz)?;
            circuit.safe_append(batch.cx)?;
            circuit.safe_append(batch.m)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(circuit.to_string(), "H 0\nH_YZ 1\nCX 1 0 2 0\nM 0\n");
    }

    #[test]
    fn reused_qubit_forces_a_flush() {
        let instruction = GateInstruction::new(
            GateType::Mpp,
            vec![],
            vec![
                GateTarget::x(0),
                GateTarget::combiner(),
                GateTarget::x(1),
                GateTarget::x(1),
            ],
        );
        let mut flushes = 0;
        decompose_mpp_operation(instruction.as_view(), |_| {
            flushes += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(flushes, 2);
    }

    #[test]
    fn repeated_qubit_within_one_product_is_an_error() {
        let instruction = GateInstruction::new(
            GateType::Mpp,
            vec![],
            vec![GateTarget::x(0), GateTarget::combiner(), GateTarget::z(0)],
        );
        let err = decompose_mpp_operation(instruction.as_view(), |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::PauliProductRepeatedQubit(_)));
    }
}
