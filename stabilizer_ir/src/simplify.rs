//! Rewrites a circuit into the `H`/`S`/`CX`/`M`/`R` base alphabet (spec
//! §4.6, §8 scenario (d)).
//!
//! Every non-base gate either has a fixed per-application template stored as
//! [`crate::gate_data::Gate::h_s_cx_m_r_decomposition`] (grounded on
//! `original_source/src/stim/gates/gate_data_*.cc`'s
//! `h_s_cx_m_r_decomposition` fields) or, for the variable-arity Pauli
//! product gates `MPP`/`SPP`/`SPP_DAG`, is expanded with
//! [`crate::decompose`] first. Expansion recurses until only base-alphabet
//! gates and annotations remain.

use crate::circuit::{Circuit, CircuitInstruction, GateInstruction, Operation};
use crate::decompose::{decompose_mpp_operation, decompose_spp_operation};
use crate::error::Result;
use crate::gate_data::GATE_DATA;
use crate::gate_flags::GateFlags;
use crate::gate_target::GateTarget;
use crate::gate_type::GateType;

const BASE_ALPHABET: [GateType; 5] = [GateType::H, GateType::S, GateType::Cx, GateType::M, GateType::R];

const ANNOTATIONS: [GateType; 5] = [
    GateType::Detector,
    GateType::ObservableInclude,
    GateType::Tick,
    GateType::QubitCoords,
    GateType::ShiftCoords,
];

/// Rewrites `circuit` into the `H`/`S`/`CX`/`M`/`R` base alphabet, leaving
/// annotation instructions (`DETECTOR`, `OBSERVABLE_INCLUDE`, `TICK`,
/// `QUBIT_COORDS`, `SHIFT_COORDS`) untouched and recursing into `REPEAT`
/// bodies. A gate with no registered decomposition (noise channels, `MPAD`,
/// `I`/`II`) is passed through unchanged.
pub fn simplify_to_h_s_cx_m_r(circuit: &Circuit) -> Result<Circuit> {
    let mut out = Circuit::new();
    for op in &circuit.operations {
        match op {
            Operation::Gate(instruction) => simplify_instruction(instruction.as_view(), &mut out)?,
            Operation::Repeat { repetitions, body } => {
                let folded_body = simplify_to_h_s_cx_m_r(body)?;
                out.append_repeat_block(*repetitions, folded_body)?;
            }
        }
    }
    Ok(out)
}

fn simplify_instruction(instruction: CircuitInstruction<'_>, out: &mut Circuit) -> Result<()> {
    if ANNOTATIONS.contains(&instruction.gate_type) {
        out.operations.push(Operation::Gate(instruction.to_owned_instruction()));
        return Ok(());
    }
    if BASE_ALPHABET.contains(&instruction.gate_type) {
        out.safe_append(instruction.to_owned_instruction())?;
        return Ok(());
    }

    match instruction.gate_type {
        GateType::Mpp => decompose_mpp_operation(instruction, |batch| {
            for piece in [batch.h, batch.h_yz, batch.cx, batch.m] {
                if !piece.targets.is_empty() {
                    simplify_instruction(piece.as_view(), out)?;
                }
            }
            Ok(())
        }),
        GateType::Spp | GateType::SppDag => {
            let mut expanded = Circuit::new();
            decompose_spp_operation(instruction, &mut expanded)?;
            for op in &expanded.operations {
                if let Operation::Gate(piece) = op {
                    simplify_instruction(piece.as_view(), out)?;
                }
            }
            Ok(())
        }
        _ => simplify_via_template(instruction, out),
    }
}

fn simplify_via_template(instruction: CircuitInstruction<'_>, out: &mut Circuit) -> Result<()> {
    let gate = GATE_DATA.get(instruction.gate_type);
    // Noise channels, MPAD, I/II, and anything else with no registered
    // decomposition have no circuit-level effect on the base alphabet's
    // control flow; pass them through unchanged rather than rejecting them.
    let Some(template) = gate.h_s_cx_m_r_decomposition else {
        out.operations.push(Operation::Gate(instruction.to_owned_instruction()));
        return Ok(());
    };
    let arity = if gate.flags.contains(GateFlags::TARGETS_PAIRS) { 2 } else { 1 };
    for chunk in instruction.targets.chunks(arity) {
        for piece in parse_template(template, chunk) {
            simplify_instruction(piece.as_view(), out)?;
        }
    }
    Ok(())
}

/// Expands one gate-per-line decomposition template for a single
/// gate-arity chunk of targets. Shared with the QASM exporter, which falls
/// back to this same template for gates with no native QASM name.
pub(crate) fn expand_template_for_export(template: &'static str, chunk: &[GateTarget]) -> Vec<GateInstruction> {
    parse_template(template, chunk)
}

/// Expands one gate-per-line decomposition template (placeholder qubit
/// indices `0`, `1`, ... referring to `chunk`) into concrete instructions.
fn parse_template(template: &'static str, chunk: &[GateTarget]) -> Vec<GateInstruction> {
    template
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next().expect("template line has a gate name");
            let gate_type = GATE_DATA
                .at(name)
                .unwrap_or_else(|_| panic!("decomposition template references unknown gate '{name}'"))
                .id;
            let targets = parts
                .map(|token| {
                    let placeholder: usize = token.parse().expect("template placeholder is a qubit index");
                    GateTarget::qubit(chunk[placeholder].qubit_value())
                })
                .collect();
            GateInstruction::new(gate_type, vec![], targets)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate_target::GateTarget;

    #[test]
    fn swap_simplifies_into_three_cx() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(
                GateType::Swap,
                vec![],
                vec![GateTarget::qubit(0), GateTarget::qubit(1)],
            ))
            .unwrap();
        let simplified = simplify_to_h_s_cx_m_r(&circuit).unwrap();
        assert_eq!(simplified.to_string(), "CX 0 1\nCX 1 0\nCX 0 1\n");
    }

    #[test]
    fn mxx_simplifies_into_the_sandwiched_measurement() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(
                GateType::Mxx,
                vec![],
                vec![GateTarget::qubit(0), GateTarget::qubit(1)],
            ))
            .unwrap();
        let simplified = simplify_to_h_s_cx_m_r(&circuit).unwrap();
        assert_eq!(simplified.to_string(), "CX 0 1\nH 0\nM 0\nH 0\nCX 0 1\n");
    }

    #[test]
    fn annotations_pass_through_unchanged() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(GateType::M, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();
        circuit
            .safe_append(GateInstruction::new(GateType::Detector, vec![], vec![GateTarget::rec(1)]))
            .unwrap();
        let simplified = simplify_to_h_s_cx_m_r(&circuit).unwrap();
        assert_eq!(simplified.to_string(), "M 0\nDETECTOR rec[-1]\n");
    }

    #[test]
    fn undecomposed_gates_pass_through_unchanged() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(
                GateType::XError,
                vec![0.1],
                vec![GateTarget::qubit(0)],
            ))
            .unwrap();
        circuit
            .safe_append(GateInstruction::new(GateType::Mpad, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();
        let simplified = simplify_to_h_s_cx_m_r(&circuit).unwrap();
        assert_eq!(simplified.to_string(), "X_ERROR(0.1) 0\nMPAD 0\n");
    }

    #[test]
    fn repeat_blocks_are_simplified_recursively() {
        let mut body = Circuit::new();
        body.safe_append(GateInstruction::new(
            GateType::Swap,
            vec![],
            vec![GateTarget::qubit(0), GateTarget::qubit(1)],
        ))
        .unwrap();
        let mut circuit = Circuit::new();
        circuit.append_repeat_block(2, body).unwrap();
        let simplified = simplify_to_h_s_cx_m_r(&circuit).unwrap();
        assert_eq!(simplified.to_string(), "REPEAT 2 {\n    CX 0 1\n    CX 1 0\n    CX 0 1\n}\n");
    }
}
