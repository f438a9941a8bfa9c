//! The circuit/instruction model (spec §3 "Circuit instruction", "Circuit",
//! §4.2).
//!
//! Grounded on `original_source/src/stim/circuit/circuit_instruction.h`, but
//! reshaped from the original's non-owning spans into borrows over owned
//! buffers is something the data itself dictates: here, an instruction owns
//! its argument and target vectors directly rather than slicing into a
//! shared arena, which keeps `REPEAT` bodies (themselves full `Circuit`s)
//! simple trees instead of requiring a bump allocator (spec §9).

use std::fmt;

use crate::error::{Error, Result};
use crate::gate_data::GATE_DATA;
use crate::gate_flags::GateFlags;
use crate::gate_target::GateTarget;
use crate::gate_type::GateType;
use crate::stats::CircuitStats;
use crate::validate;

/// One gate application, owning its arguments, targets, and tag.
#[derive(Clone, Debug, PartialEq)]
pub struct GateInstruction {
    pub gate_type: GateType,
    pub args: Vec<f64>,
    pub targets: Vec<GateTarget>,
    pub tag: String,
}

impl GateInstruction {
    #[must_use]
    pub fn new(gate_type: GateType, args: Vec<f64>, targets: Vec<GateTarget>) -> Self {
        GateInstruction {
            gate_type,
            args,
            targets,
            tag: String::new(),
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    #[must_use]
    pub fn as_view(&self) -> CircuitInstruction<'_> {
        CircuitInstruction {
            gate_type: self.gate_type,
            args: &self.args,
            targets: &self.targets,
            tag: &self.tag,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate::validate_instruction(self.as_view())
    }
}

impl fmt::Display for GateInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_view().fmt(f)
    }
}

/// A non-owning view of one gate application, the unit most analysis passes
/// operate on.
#[derive(Clone, Copy)]
pub struct CircuitInstruction<'a> {
    pub gate_type: GateType,
    pub args: &'a [f64],
    pub targets: &'a [GateTarget],
    pub tag: &'a str,
}

impl<'a> CircuitInstruction<'a> {
    #[must_use]
    pub fn to_owned_instruction(self) -> GateInstruction {
        GateInstruction {
            gate_type: self.gate_type,
            args: self.args.to_vec(),
            targets: self.targets.to_vec(),
            tag: self.tag.to_string(),
        }
    }

    #[must_use]
    pub fn gate_name(self) -> &'static str {
        GATE_DATA.get(self.gate_type).name
    }

    #[must_use]
    pub fn flags(self) -> GateFlags {
        GATE_DATA.get(self.gate_type).flags
    }

    /// Whether `self` and `other` can be merged into a single instruction
    /// by concatenating their target lists (spec §4.2 fusion rule): same
    /// gate, same tag, same args, and the gate isn't marked `NOT_FUSABLE`.
    #[must_use]
    pub fn can_fuse(self, other: CircuitInstruction<'_>) -> bool {
        self.gate_type == other.gate_type
            && self.tag == other.tag
            && self.args == other.args
            && !self.flags().contains(GateFlags::NOT_FUSABLE)
    }

    /// The per-application contribution to [`CircuitStats`]: how many
    /// detectors/measurements/qubits/etc. this single instruction accounts
    /// for.
    #[must_use]
    pub fn compute_stats(self) -> CircuitStats {
        let flags = self.flags();
        let mut stats = CircuitStats::new();
        match self.gate_type {
            GateType::Detector => stats.num_detectors = 1,
            GateType::ObservableInclude => {
                let index = self.args.first().copied().unwrap_or(0.0) as u32 + 1;
                stats.num_observables = index;
            }
            GateType::Tick => stats.num_ticks = 1,
            _ => {}
        }
        if flags.contains(GateFlags::PRODUCES_RESULTS) {
            stats.num_measurements = self.count_measurement_results() as u64;
        }
        for &target in self.targets {
            if target.is_qubit_target() || target.is_pauli_target() {
                stats.num_qubits = stats.num_qubits.max(target.qubit_value() + 1);
            }
            if target.is_measurement_record_target() {
                stats.max_lookback = stats.max_lookback.max(target.value() as u64);
            }
            if target.is_sweep_bit_target() {
                stats.num_sweep_bits = stats.num_sweep_bits.max(target.value() + 1);
            }
        }
        stats
    }

    /// How many measurement results this instruction appends to the record.
    /// For `MPP`, one result per group of combined Pauli targets; for every
    /// other `PRODUCES_RESULTS` gate, one result per target (pairs count as
    /// one result per pair).
    #[must_use]
    pub fn count_measurement_results(self) -> usize {
        if !self.flags().contains(GateFlags::PRODUCES_RESULTS) {
            return 0;
        }
        match self.gate_type {
            GateType::Mpp => validate::for_combined_target_groups(self, |_| Ok(())).unwrap_or(0),
            _ if self.flags().contains(GateFlags::TARGETS_PAIRS) => self.targets.len() / 2,
            _ => self.targets.len(),
        }
    }
}

impl fmt::Display for CircuitInstruction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.gate_name())?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            for (index, arg) in self.args.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ")")?;
        }
        for target in self.targets {
            write!(f, " {target}")?;
        }
        if !self.tag.is_empty() {
            write!(f, "[{}]", self.tag)?;
        }
        Ok(())
    }
}

/// One top-level entry of a [`Circuit`]: a gate application, or a nested
/// block repeated some number of times.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    Gate(GateInstruction),
    Repeat { repetitions: u64, body: Box<Circuit> },
}

/// A sequence of operations: the unit every pass in this crate consumes and
/// produces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Circuit {
    pub operations: Vec<Operation>,
}

impl Circuit {
    #[must_use]
    pub fn new() -> Self {
        Circuit::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Validates, then appends `instruction`, fusing it into the previous
    /// operation's target list when possible (spec §4.2).
    pub fn safe_append(&mut self, instruction: GateInstruction) -> Result<()> {
        instruction.validate()?;
        if let Some(Operation::Gate(last)) = self.operations.last_mut() {
            if last.as_view().can_fuse(instruction.as_view()) {
                last.targets.extend_from_slice(&instruction.targets);
                return Ok(());
            }
        }
        self.operations.push(Operation::Gate(instruction));
        Ok(())
    }

    /// Appends a `REPEAT <repetitions> { body }` block.
    pub fn append_repeat_block(&mut self, repetitions: u64, body: Circuit) -> Result<()> {
        if repetitions == 0 {
            return Err(Error::EmptyRepeatBlock);
        }
        self.operations.push(Operation::Repeat {
            repetitions,
            body: Box::new(body),
        });
        Ok(())
    }

    /// Validates every instruction in this circuit, recursing into
    /// `REPEAT` bodies.
    pub fn validate(&self) -> Result<()> {
        for op in &self.operations {
            match op {
                Operation::Gate(instruction) => instruction.validate()?,
                Operation::Repeat { repetitions, body } => {
                    if *repetitions == 0 {
                        return Err(Error::EmptyRepeatBlock);
                    }
                    body.validate()?;
                }
            }
        }
        Ok(())
    }

    /// Folds this circuit's stats through any `REPEAT` blocks (spec §4.2,
    /// `CircuitStats::repeated`).
    #[must_use]
    pub fn compute_stats(&self) -> CircuitStats {
        let mut stats = CircuitStats::new();
        for op in &self.operations {
            match op {
                Operation::Gate(instruction) => stats.accumulate(&instruction.as_view().compute_stats()),
                Operation::Repeat { repetitions, body } => {
                    stats.accumulate(&body.compute_stats().repeated(*repetitions));
                }
            }
        }
        stats
    }

    /// Total number of gate applications, unrolling `REPEAT` blocks. Useful
    /// for asserting that loop folding in [`crate::surft`] avoids doing this
    /// (spec §8 loop-folding performance claim).
    #[must_use]
    pub fn num_operations_unrolled(&self) -> u128 {
        let mut total: u128 = 0;
        for op in &self.operations {
            total += match op {
                Operation::Gate(_) => 1,
                Operation::Repeat { repetitions, body } => {
                    body.num_operations_unrolled() * u128::from(*repetitions)
                }
            };
        }
        total
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_indented(f, self, 0)
    }
}

fn write_indented(f: &mut fmt::Formatter<'_>, circuit: &Circuit, depth: usize) -> fmt::Result {
    let indent = "    ".repeat(depth);
    for op in &circuit.operations {
        match op {
            Operation::Gate(instruction) => writeln!(f, "{indent}{instruction}")?,
            Operation::Repeat { repetitions, body } => {
                writeln!(f, "{indent}REPEAT {repetitions} {{")?;
                write_indented(f, body, depth + 1)?;
                writeln!(f, "{indent}}}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(q: u32) -> GateInstruction {
        GateInstruction::new(GateType::H, vec![], vec![GateTarget::qubit(q)])
    }

    #[test]
    fn adjacent_single_qubit_gates_fuse() {
        let mut circuit = Circuit::new();
        circuit.safe_append(h(0)).unwrap();
        circuit.safe_append(h(1)).unwrap();
        assert_eq!(circuit.operations.len(), 1);
        let Operation::Gate(instruction) = &circuit.operations[0] else {
            panic!("expected a fused gate instruction");
        };
        assert_eq!(instruction.targets, vec![GateTarget::qubit(0), GateTarget::qubit(1)]);
    }

    #[test]
    fn different_gates_do_not_fuse() {
        let mut circuit = Circuit::new();
        circuit.safe_append(h(0)).unwrap();
        circuit
            .safe_append(GateInstruction::new(GateType::S, vec![], vec![GateTarget::qubit(1)]))
            .unwrap();
        assert_eq!(circuit.operations.len(), 2);
    }

    #[test]
    fn repeat_block_folds_stats_with_saturation() {
        let mut body = Circuit::new();
        body.safe_append(GateInstruction::new(GateType::M, vec![], vec![GateTarget::qubit(0)]))
            .unwrap();
        let mut circuit = Circuit::new();
        circuit.append_repeat_block(1_000_000, body).unwrap();
        let stats = circuit.compute_stats();
        assert_eq!(stats.num_measurements, 1_000_000);
    }

    #[test]
    fn empty_repeat_block_is_rejected() {
        let mut circuit = Circuit::new();
        let err = circuit.append_repeat_block(0, Circuit::new()).unwrap_err();
        assert_eq!(err, Error::EmptyRepeatBlock);
    }

    #[test]
    fn display_matches_the_lexical_surface() {
        let mut circuit = Circuit::new();
        circuit.safe_append(h(0)).unwrap();
        circuit
            .safe_append(GateInstruction::new(
                GateType::Cx,
                vec![],
                vec![GateTarget::qubit(0), GateTarget::qubit(1)],
            ))
            .unwrap();
        assert_eq!(circuit.to_string(), "H 0\nCX 0 1\n");
    }
}
