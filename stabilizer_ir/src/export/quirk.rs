//! Quirk circuit-editor URL exporter (spec §4.6).
//!
//! Grounded on `original_source/src/stim/util_top/export_quirk_url.cc`: a
//! circuit becomes a 2D grid of columns × qubit rows, serialized as the
//! JSON payload of a `https://algassert.com/quirk#circuit=...` URL. `TICK`
//! reserves three empty columns (room for phase-gate scratch patterns);
//! single-qubit gates place one cell; paired gates place a glyph at each
//! row of the pair using a static glyph table.

use serde_json::{json, Value};

use crate::circuit::{Circuit, CircuitInstruction, Operation};
use crate::error::{Error, Result};
use crate::gate_type::GateType;

fn single_qubit_glyph(gate_type: GateType) -> Option<&'static str> {
    use GateType as T;
    Some(match gate_type {
        T::H => "H",
        T::X => "X",
        T::Y => "Y",
        T::Z => "Z",
        T::S => "Z^½",
        T::SDag => "Z^-½",
        T::SqrtX => "X^½",
        T::SqrtXDag => "X^-½",
        T::SqrtY => "Y^½",
        T::SqrtYDag => "Y^-½",
        T::M | T::Mx | T::My => "Measure",
        T::R | T::Rx | T::Ry => "|0>",
        _ => return None,
    })
}

/// Two-row glyphs for a gate that acts on one qubit pair at a time: `(row_a,
/// row_b)`, placed at `(col, a)` and `(col, b)` respectively.
fn pair_glyphs(gate_type: GateType) -> Option<(&'static str, &'static str)> {
    use GateType as T;
    Some(match gate_type {
        T::Cx => ("•", "X"),
        T::Cy => ("•", "Y"),
        T::Cz => ("•", "•"),
        T::Xcx => ("X", "X"),
        T::Swap => ("Swap", "Swap"),
        T::Mxx => ("XDetectControlRXX", "XDetectControlRXX"),
        T::Myy => ("YDetectControlRYY", "YDetectControlRYY"),
        T::Mzz => ("ZDetectControlRZZ", "ZDetectControlRZZ"),
        _ => return None,
    })
}

struct Grid {
    cols: Vec<Vec<Value>>,
    num_qubits: usize,
}

impl Grid {
    fn new(num_qubits: usize) -> Self {
        Grid {
            cols: vec![vec![Value::Null; num_qubits.max(1)]],
            num_qubits: num_qubits.max(1),
        }
    }

    fn ensure_blank_column(&mut self) -> usize {
        if self.cols.last().map(|c| c.iter().all(Value::is_null)) != Some(true) {
            self.cols.push(vec![Value::Null; self.num_qubits]);
        }
        self.cols.len() - 1
    }

    fn place(&mut self, row: usize, glyph: &str) {
        if row >= self.num_qubits {
            self.grow_to(row + 1);
        }
        let col = self.ensure_blank_column();
        self.cols[col][row] = Value::String(glyph.to_string());
    }

    fn place_pair(&mut self, row_a: usize, glyph_a: &str, row_b: usize, glyph_b: &str) {
        let needed = row_a.max(row_b) + 1;
        if needed > self.num_qubits {
            self.grow_to(needed);
        }
        let col = self.ensure_blank_column();
        self.cols[col][row_a] = Value::String(glyph_a.to_string());
        self.cols[col][row_b] = Value::String(glyph_b.to_string());
    }

    fn grow_to(&mut self, num_qubits: usize) {
        for col in &mut self.cols {
            col.resize(num_qubits, Value::Null);
        }
        self.num_qubits = num_qubits;
    }

    fn advance_tick(&mut self) {
        for _ in 0..3 {
            self.cols.push(vec![Value::Null; self.num_qubits]);
        }
    }

    fn to_json(&self) -> Value {
        json!({ "cols": self.cols })
    }
}

fn emit_instruction(instruction: CircuitInstruction<'_>, grid: &mut Grid) -> Result<()> {
    match instruction.gate_type {
        GateType::Tick => {
            grid.advance_tick();
            Ok(())
        }
        GateType::Detector | GateType::ObservableInclude | GateType::QubitCoords | GateType::ShiftCoords => Ok(()),
        _ => {
            if let Some((glyph_a, glyph_b)) = pair_glyphs(instruction.gate_type) {
                for pair in instruction.targets.chunks_exact(2) {
                    grid.place_pair(
                        pair[0].qubit_value() as usize,
                        glyph_a,
                        pair[1].qubit_value() as usize,
                        glyph_b,
                    );
                }
                return Ok(());
            }
            if let Some(glyph) = single_qubit_glyph(instruction.gate_type) {
                for &target in instruction.targets {
                    grid.place(target.qubit_value() as usize, glyph);
                }
                return Ok(());
            }
            Err(Error::NoQuirkVisual(
                crate::gate_data::GATE_DATA.get(instruction.gate_type).name.to_string(),
            ))
        }
    }
}

fn emit_circuit(circuit: &Circuit, grid: &mut Grid) -> Result<()> {
    for op in &circuit.operations {
        match op {
            Operation::Gate(instruction) => emit_instruction(instruction.as_view(), grid)?,
            Operation::Repeat { repetitions, body } => {
                for _ in 0..*repetitions {
                    emit_circuit(body, grid)?;
                }
            }
        }
    }
    Ok(())
}

/// Minimal percent-encoding for the characters that appear in a Quirk
/// `circuit=` JSON payload (`{}[]",: ` and non-ASCII), matching the escaping
/// a browser URL bar applies, without pulling in a dedicated crate for a
/// single fixed character set.
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Renders `circuit` as a `https://algassert.com/quirk#circuit=...` URL.
/// Errors with [`Error::NoQuirkVisual`] on a gate with no Quirk glyph (spec
/// §7 error 6).
pub fn export_quirk_url(circuit: &Circuit) -> Result<String> {
    let stats = circuit.compute_stats();
    let mut grid = Grid::new(stats.num_qubits.max(1) as usize);
    emit_circuit(circuit, &mut grid)?;
    let payload = percent_encode(&grid.to_json().to_string());
    Ok(format!("https://algassert.com/quirk#circuit={payload}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateInstruction;
    use crate::gate_target::GateTarget;

    #[test]
    fn bell_pair_circuit_exports_a_quirk_url() {
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
        let url = export_quirk_url(&circuit).unwrap();
        assert!(url.starts_with("https://algassert.com/quirk#circuit="));
        assert!(url.contains("%22H%22"));
        assert!(url.contains("%22%E2%80%A2%22"));
    }

    #[test]
    fn noise_gate_has_no_quirk_visual() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(GateType::XError, vec![0.1], vec![GateTarget::qubit(0)]))
            .unwrap();
        let err = export_quirk_url(&circuit).unwrap_err();
        assert!(matches!(err, Error::NoQuirkVisual(_)));
    }

    #[test]
    fn tick_reserves_three_columns() {
        let mut circuit = Circuit::new();
        circuit
            .safe_append(GateInstruction::new(GateType::H, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();
        circuit.safe_append(GateInstruction::new(GateType::Tick, vec![], vec![])).unwrap();
        circuit
            .safe_append(GateInstruction::new(GateType::H, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();
        let mut grid = Grid::new(1);
        emit_circuit(&circuit, &mut grid).unwrap();
        assert_eq!(grid.cols.len(), 5);
    }
}
