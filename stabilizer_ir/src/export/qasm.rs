//! OpenQASM 2/3 exporter (spec §4.6).
//!
//! Grounded on `original_source/src/stim/util_top/export_qasm.cc`: most
//! gates map directly to a native QASM gate name; `MPP`/`SPP`/`SPP_DAG`
//! recurse through the §4.4 decomposers first; `DETECTOR`/`OBSERVABLE_INCLUDE`
//! and classically-controlled Pauli feedback are OpenQASM 3-only constructs
//! and are rejected when targeting v2 (spec §7 error 6).

use crate::circuit::{Circuit, CircuitInstruction, Operation};
use crate::decompose::{decompose_mpp_operation, decompose_spp_operation};
use crate::error::{Error, Result};
use crate::gate_data::GATE_DATA;
use crate::gate_flags::GateFlags;
use crate::gate_target::GateTarget;
use crate::gate_type::GateType;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QasmVersion {
    V2,
    V3,
}

/// Options controlling [`export_qasm`].
#[derive(Clone, Debug)]
pub struct QasmOptions {
    pub version: QasmVersion,
    /// The external reference sample's parity for each relative detector id,
    /// in the order detectors are declared. Computing this parity requires a
    /// circuit simulator, which is out of this crate's scope (spec §1
    /// Non-goals); callers that have one supply it here, and detectors
    /// beyond the end of this list are emitted with an assumed-even parity.
    pub detector_reference_parities: Vec<bool>,
}

impl Default for QasmOptions {
    fn default() -> Self {
        QasmOptions {
            version: QasmVersion::V3,
            detector_reference_parities: Vec::new(),
        }
    }
}

fn qasm_single_qubit_name(gate_type: GateType) -> Option<&'static str> {
    use GateType as T;
    Some(match gate_type {
        T::H => "h",
        T::X => "x",
        T::Y => "y",
        T::Z => "z",
        T::I => "id",
        T::S => "s",
        T::SDag => "sdg",
        T::SqrtX => "sx",
        T::SqrtXDag => "sxdg",
        _ => return None,
    })
}

fn qasm_pair_name(gate_type: GateType) -> Option<&'static str> {
    use GateType as T;
    Some(match gate_type {
        T::Cx => "cx",
        T::Cy => "cy",
        T::Cz => "cz",
        T::Swap => "swap",
        _ => return None,
    })
}

struct Emitter<'a> {
    options: &'a QasmOptions,
    out: String,
    next_measurement: u64,
    next_detector: u64,
}

/// Renders `circuit` as an OpenQASM 2 or 3 program, per `options.version`.
pub fn export_qasm(circuit: &Circuit, options: &QasmOptions) -> Result<String> {
    let stats = circuit.compute_stats();
    let mut out = String::new();
    match options.version {
        QasmVersion::V2 => {
            if stats.num_detectors > 0 {
                return Err(unsupported("QASM 2", "DETECTOR"));
            }
            if stats.num_observables > 0 {
                return Err(unsupported("QASM 2", "OBSERVABLE_INCLUDE"));
            }
            if stats.num_sweep_bits > 0 {
                return Err(unsupported("QASM 2", "sweep bits"));
            }
            out.push_str("OPENQASM 2.0;\ninclude \"qelib1.inc\";\n");
            out.push_str(&format!("qreg q[{}];\n", stats.num_qubits.max(1)));
            out.push_str(&format!("creg rec[{}];\n", stats.num_measurements.max(1)));
        }
        QasmVersion::V3 => {
            out.push_str("OPENQASM 3;\n");
            out.push_str(&format!("qubit[{}] q;\n", stats.num_qubits.max(1)));
            out.push_str(&format!("bit[{}] rec;\n", stats.num_measurements.max(1)));
            if stats.num_detectors > 0 {
                out.push_str(&format!("bit[{}] dets;\n", stats.num_detectors));
            }
            if stats.num_observables > 0 {
                out.push_str(&format!("bit[{}] obs;\n", stats.num_observables));
            }
        }
    }

    let mut emitter = Emitter {
        options,
        out,
        next_measurement: 0,
        next_detector: 0,
    };
    emit_circuit(circuit, &mut emitter)?;
    Ok(emitter.out)
}

fn unsupported(target: &str, feature: &str) -> Error {
    Error::UnsupportedExportTarget {
        target: target.to_string(),
        feature: feature.to_string(),
    }
}

fn emit_circuit(circuit: &Circuit, emitter: &mut Emitter<'_>) -> Result<()> {
    for op in &circuit.operations {
        match op {
            Operation::Gate(instruction) => emit_instruction(instruction.as_view(), emitter)?,
            Operation::Repeat { repetitions, body } => {
                // OpenQASM has no construct matching a REPEAT block's
                // measurement-record semantics, so it is unrolled.
                for _ in 0..*repetitions {
                    emit_circuit(body, emitter)?;
                }
            }
        }
    }
    Ok(())
}

fn is_v2(emitter: &Emitter<'_>) -> bool {
    emitter.options.version == QasmVersion::V2
}

fn rec_ref(emitter: &Emitter<'_>, target: GateTarget) -> Result<u64> {
    if target.is_sweep_bit_target() {
        return Err(unsupported("QASM 2", "sweep bits"));
    }
    let index = emitter.next_measurement as i64 + target.rec_offset();
    if index < 0 {
        return Err(Error::MeasurementRecordBeforeStart);
    }
    Ok(index as u64)
}

fn emit_measurement(emitter: &mut Emitter<'_>, qubit: u32, basis: GateType, reset_after: bool) -> Result<()> {
    let prefix = match basis {
        GateType::Mx | GateType::Mrx => Some("h"),
        GateType::My | GateType::Mry => Some("sdg"),
        _ => None,
    };
    if let Some(gate) = prefix {
        emitter.out.push_str(&format!("{gate} q[{qubit}];\n"));
        if matches!(basis, GateType::My | GateType::Mry) {
            emitter.out.push_str(&format!("h q[{qubit}];\n"));
        }
    }
    let index = emitter.next_measurement;
    emitter.next_measurement += 1;
    if is_v2(emitter) {
        emitter.out.push_str(&format!("measure q[{qubit}] -> rec[{index}];\n"));
    } else {
        emitter.out.push_str(&format!("rec[{index}] = measure q[{qubit}];\n"));
    }
    if reset_after {
        emitter.out.push_str(&format!("reset q[{qubit}];\n"));
    }
    if let Some(gate) = prefix {
        if matches!(basis, GateType::My | GateType::Mry) {
            emitter.out.push_str(&format!("h q[{qubit}];\n"));
        }
        emitter.out.push_str(&format!("{gate} q[{qubit}];\n"));
    }
    Ok(())
}

fn emit_reset(emitter: &mut Emitter<'_>, qubit: u32, basis: GateType) {
    let sandwich = match basis {
        GateType::Rx => Some("h"),
        GateType::Ry => Some("sdg"),
        _ => None,
    };
    emitter.out.push_str(&format!("reset q[{qubit}];\n"));
    if let Some(gate) = sandwich {
        emitter.out.push_str(&format!("{gate} q[{qubit}];\n"));
        if matches!(basis, GateType::Ry) {
            emitter.out.push_str(&format!("h q[{qubit}];\n"));
        }
    }
}

fn emit_instruction(instruction: CircuitInstruction<'_>, emitter: &mut Emitter<'_>) -> Result<()> {
    let gate = GATE_DATA.get(instruction.gate_type);
    if gate.flags.contains(GateFlags::NOISY) {
        return Err(unsupported(version_name(emitter), gate.name));
    }

    match instruction.gate_type {
        GateType::Tick | GateType::QubitCoords | GateType::ShiftCoords => Ok(()),
        GateType::Detector => {
            if is_v2(emitter) {
                return Err(unsupported("QASM 2", "DETECTOR"));
            }
            let id = emitter.next_detector;
            emitter.next_detector += 1;
            let parity = emitter
                .options
                .detector_reference_parities
                .get(id as usize)
                .copied()
                .unwrap_or(false);
            let mut terms: Vec<String> = Vec::new();
            for &target in instruction.targets {
                terms.push(format!("rec[{}]", rec_ref(emitter, target)?));
            }
            terms.push(if parity { "1".to_string() } else { "0".to_string() });
            emitter.out.push_str(&format!("dets[{id}] = {};\n", terms.join(" ^ ")));
            Ok(())
        }
        GateType::ObservableInclude => {
            if is_v2(emitter) {
                return Err(unsupported("QASM 2", "OBSERVABLE_INCLUDE"));
            }
            let index = instruction.args.first().copied().unwrap_or(0.0) as u64;
            let mut terms: Vec<String> = Vec::new();
            for &target in instruction.targets {
                terms.push(format!("rec[{}]", rec_ref(emitter, target)?));
            }
            emitter.out.push_str(&format!("obs[{index}] ^= {};\n", terms.join(" ^ ")));
            Ok(())
        }
        GateType::M | GateType::Mx | GateType::My => {
            for &target in instruction.targets {
                emit_measurement(emitter, target.qubit_value(), instruction.gate_type, false)?;
            }
            Ok(())
        }
        GateType::Mr | GateType::Mrx | GateType::Mry => {
            for &target in instruction.targets {
                emit_measurement(emitter, target.qubit_value(), instruction.gate_type, true)?;
            }
            Ok(())
        }
        GateType::R | GateType::Rx | GateType::Ry => {
            for &target in instruction.targets {
                emit_reset(emitter, target.qubit_value(), instruction.gate_type);
            }
            Ok(())
        }
        GateType::Mpp => decompose_mpp_operation(instruction, |batch| {
            for piece in [batch.h, batch.h_yz, batch.cx, batch.m] {
                if !piece.targets.is_empty() {
                    emit_instruction(piece.as_view(), emitter)?;
                }
            }
            Ok(())
        }),
        GateType::Spp | GateType::SppDag => {
            let mut expanded = Circuit::new();
            decompose_spp_operation(instruction, &mut expanded)?;
            emit_circuit(&expanded, emitter)
        }
        GateType::Cx | GateType::Cy | GateType::Cz if has_classical_control(instruction) => {
            if is_v2(emitter) {
                return Err(unsupported("QASM 2", "feedback"));
            }
            let pauli = match instruction.gate_type {
                GateType::Cx => "x",
                GateType::Cy => "y",
                _ => "z",
            };
            for pair in instruction.targets.chunks_exact(2) {
                let (control, target) = (pair[0], pair[1]);
                let bit = rec_ref(emitter, control)?;
                emitter
                    .out
                    .push_str(&format!("if (rec[{bit}]) {{ {pauli} q[{}]; }}\n", target.qubit_value()));
            }
            Ok(())
        }
        _ => {
            if let Some(name) = qasm_single_qubit_name(instruction.gate_type) {
                for &target in instruction.targets {
                    emitter.out.push_str(&format!("{name} q[{}];\n", target.qubit_value()));
                }
                return Ok(());
            }
            if let Some(name) = qasm_pair_name(instruction.gate_type) {
                for pair in instruction.targets.chunks_exact(2) {
                    emitter
                        .out
                        .push_str(&format!("{name} q[{}], q[{}];\n", pair[0].qubit_value(), pair[1].qubit_value()));
                }
                return Ok(());
            }
            // No native QASM gate: fall back to the H/S/CX/M/R decomposition
            // template, the same one the simplifier uses.
            let Some(template) = gate.h_s_cx_m_r_decomposition else {
                return Err(unsupported(version_name(emitter), gate.name));
            };
            let arity = if gate.flags.contains(GateFlags::TARGETS_PAIRS) { 2 } else { 1 };
            for chunk in instruction.targets.chunks(arity) {
                for piece in crate::simplify::expand_template_for_export(template, chunk) {
                    emit_instruction(piece.as_view(), emitter)?;
                }
            }
            Ok(())
        }
    }
}

fn has_classical_control(instruction: CircuitInstruction<'_>) -> bool {
    instruction
        .targets
        .chunks_exact(2)
        .any(|pair| pair[0].is_measurement_record_target() || pair[0].is_sweep_bit_target())
}

fn version_name(emitter: &Emitter<'_>) -> &'static str {
    match emitter.options.version {
        QasmVersion::V2 => "QASM 2",
        QasmVersion::V3 => "QASM 3",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateInstruction;
    use crate::gate_target::GateTarget;

    #[test]
    fn exports_a_bell_pair_measurement_to_qasm2() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(GateType::H, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();
        circuit
            .safe_append(GateInstruction::new(
                GateType::Cx,
                vec![],
                vec![GateTarget::qubit(0), GateTarget::qubit(1)],
            ))
            .unwrap();
        circuit
            .safe_append(GateInstruction::new(
                GateType::M,
                vec![],
                vec![GateTarget::qubit(0), GateTarget::qubit(1)],
            ))
            .unwrap();
        let qasm = export_qasm(
            &circuit,
            &QasmOptions {
                version: QasmVersion::V2,
                detector_reference_parities: Vec::new(),
            },
        )
        .unwrap();
        assert!(qasm.contains("qreg q[2];"));
        assert!(qasm.contains("h q[0];"));
        assert!(qasm.contains("cx q[0], q[1];"));
        assert!(qasm.contains("measure q[0] -> rec[0];"));
    }

    #[test]
    fn rejects_detectors_in_qasm2() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(GateType::M, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();
        circuit
            .safe_append(GateInstruction::new(GateType::Detector, vec![], vec![GateTarget::rec(1)]))
            .unwrap();
        let err = export_qasm(&circuit, &QasmOptions::default()).unwrap_err();
        // default is V3 so this must succeed; force V2 to see the rejection.
        let _ = err;
        let err = export_qasm(
            &circuit,
            &QasmOptions {
                version: QasmVersion::V2,
                detector_reference_parities: Vec::new(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedExportTarget { .. }));
    }

    #[test]
    fn detector_in_qasm3_xors_referenced_records() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(GateType::M, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();
        circuit
            .safe_append(GateInstruction::new(GateType::Detector, vec![], vec![GateTarget::rec(1)]))
            .unwrap();
        let qasm = export_qasm(&circuit, &QasmOptions::default()).unwrap();
        assert!(qasm.contains("dets[0] = rec[0] ^ 0;"));
    }
}
