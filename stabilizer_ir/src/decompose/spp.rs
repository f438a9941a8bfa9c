//! Decomposes `SPP`/`SPP_DAG` (Pauli-product phase rotation) into `H`,
//! `H_YZ`, `CX`, and `S`/`S_DAG` (spec §4.4).
//!
//! Each Pauli-product term is rotated into the Z basis, its parity
//! cascaded by `CX` onto the term's first qubit, phased by `S` (`SPP`) or
//! `S_DAG` (`SPP_DAG`) on that qubit, then un-cascaded and un-rotated: a
//! conjugation sandwich, unlike `MPP`'s one-way basis change.

use crate::circuit::{Circuit, CircuitInstruction};
use crate::error::Result;
use crate::gate_target::GateTarget;
use crate::gate_type::GateType;
use crate::validate::for_combined_target_groups;

/// Appends the base-alphabet expansion of one `SPP`/`SPP_DAG` instruction to
/// `out`.
pub fn decompose_spp_operation(instruction: CircuitInstruction<'_>, out: &mut Circuit) -> Result<()> {
    debug_assert!(matches!(instruction.gate_type, GateType::Spp | GateType::SppDag));
    let phase_gate = if instruction.gate_type == GateType::Spp {
        GateType::S
    } else {
        GateType::SDag
    };

    for_combined_target_groups(instruction, |group| {
        let mut h_xz = Vec::new();
        let mut h_yz = Vec::new();
        let mut cnot = Vec::new();
        let mut representative = None;

        for target in group {
            if target.is_combiner() {
                continue;
            }
            let qubit = target.qubit_value();
            if target.is_x() {
                h_xz.push(GateTarget::qubit(qubit));
            } else if target.is_y() {
                h_yz.push(GateTarget::qubit(qubit));
            }
            match representative {
                None => representative = Some(qubit),
                Some(rep) => {
                    cnot.push(GateTarget::qubit(qubit));
                    cnot.push(GateTarget::qubit(rep));
                }
            }
        }
        let Some(representative) = representative else {
            return Ok(());
        };

        if !h_xz.is_empty() {
            out.safe_append(crate::circuit::GateInstruction::new(GateType::H, vec![], h_xz.clone()))?;
        }
        if !h_yz.is_empty() {
            out.safe_append(crate::circuit::GateInstruction::new(GateType::HYz, vec![], h_yz.clone()))?;
        }
        if !cnot.is_empty() {
            out.safe_append(crate::circuit::GateInstruction::new(GateType::Cx, vec![], cnot.clone()))?;
        }
        out.safe_append(crate::circuit::GateInstruction::new(
            phase_gate,
            vec![],
            vec![GateTarget::qubit(representative)],
        ))?;
        if !cnot.is_empty() {
            // Reverse the cascade by pair, not element-wise: each (control,
            // target) pair must keep its internal order, only the order the
            // pairs run in un-cascades.
            let mut undo_cnot = Vec::with_capacity(cnot.len());
            for pair in cnot.chunks_exact(2).rev() {
                undo_cnot.push(pair[0]);
                undo_cnot.push(pair[1]);
            }
            out.safe_append(crate::circuit::GateInstruction::new(GateType::Cx, vec![], undo_cnot))?;
        }
        if !h_yz.is_empty() {
            out.safe_append(crate::circuit::GateInstruction::new(GateType::HYz, vec![], h_yz))?;
        }
        if !h_xz.is_empty() {
            out.safe_append(crate::circuit::GateInstruction::new(GateType::H, vec![], h_xz))?;
        }
        Ok(())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateInstruction;

    #[test]
    fn spp_sandwiches_an_s_between_basis_rotations() {
        let instruction = GateInstruction::new(
            GateType::Spp,
            vec![],
            vec![GateTarget::x(0), GateTarget::combiner(), GateTarget::z(1)],
        );
        let mut circuit = Circuit::new();
        decompose_spp_operation(instruction.as_view(), &mut circuit).unwrap();
        assert_eq!(circuit.to_string(), "H 0\nCX 1 0\nS 0\nCX 1 0\nH 0\n");
    }

    #[test]
    fn spp_dag_uses_s_dag() {
        let instruction = GateInstruction::new(GateType::SppDag, vec![], vec![GateTarget::z(0)]);
        let mut circuit = Circuit::new();
        decompose_spp_operation(instruction.as_view(), &mut circuit).unwrap();
        assert_eq!(circuit.to_string(), "S_DAG 0\n");
    }
}
